use anyhow::{Context, Result};
use session_sync::cli::{Args, ConfigDiscovery, ConsoleNavigator, ExecutionMode, HostConfig};
use session_sync::{
    FetchOutcome, FileCache, HttpSessionClient, RevalidationScheduler, SessionStateMachine,
    SessionSyncConfig, UserState,
};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(if args.verbose {
            "session_sync=debug"
        } else {
            "session_sync=info"
        })
        .init();

    let mode = match args.mode() {
        Ok(mode) => mode,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    match mode {
        ExecutionMode::Status(host) => run_status(host).await,
        ExecutionMode::Fetch(host) => run_fetch(host).await,
        ExecutionMode::Focus(host) => run_focus(host).await,
        ExecutionMode::Logout(host) => run_logout(host).await,
        ExecutionMode::Watch(host) => run_watch(host).await,
        ExecutionMode::ShowConfig => {
            ConfigDiscovery::show_discovery_info();
            Ok(())
        }
        ExecutionMode::InitConfig => {
            let path = ConfigDiscovery::create_default_user_config()?;
            println!("Configuration file: {}", path.display());
            Ok(())
        }
    }
}

/// Wire the configured transport, cache and navigator into a scheduler
fn build_scheduler(host: &HostConfig) -> Result<(SessionSyncConfig, RevalidationScheduler)> {
    let config = ConfigDiscovery::load(host)?;
    let cache_path = config.resolved_cache_path(ConfigDiscovery::get_home_dir().as_deref());
    info!("Using cache directory {:?}", cache_path);

    let client = HttpSessionClient::new(&config).context("Failed to build session client")?;
    let machine = SessionStateMachine::new(
        &config,
        Arc::new(client),
        Arc::new(FileCache::new(cache_path)),
        Arc::new(ConsoleNavigator::new(host.current_path.clone())),
    );
    let scheduler = RevalidationScheduler::new(machine, config.refresh_threshold_ms);
    Ok((config, scheduler))
}

async fn run_status(host: HostConfig) -> Result<()> {
    let (_, scheduler) = build_scheduler(&host)?;
    let handle = scheduler.mount().await;
    print_state(&scheduler.machine().state());
    handle.teardown();
    Ok(())
}

async fn run_fetch(host: HostConfig) -> Result<()> {
    let (_, scheduler) = build_scheduler(&host)?;
    let machine = scheduler.machine();
    let outcome = machine.fetch_user().await;
    println!("Fetch outcome: {}", describe_outcome(&outcome));
    print_state(&machine.state());
    Ok(())
}

async fn run_focus(host: HostConfig) -> Result<()> {
    let (_, scheduler) = build_scheduler(&host)?;
    let outcome = scheduler.handle_focus().await;
    println!(
        "Cached user merged: {}",
        if outcome.merged { "yes" } else { "no" }
    );

    if let Some(refresh) = outcome.refresh {
        let fetched = refresh.await.context("Revalidation task failed")?;
        println!("Revalidated: {}", describe_outcome(&fetched));
    }
    print_state(&scheduler.machine().state());
    Ok(())
}

async fn run_logout(host: HostConfig) -> Result<()> {
    let (_, scheduler) = build_scheduler(&host)?;
    match scheduler.machine().logout().await {
        Ok(()) => {
            println!("✅ Logged out");
            Ok(())
        }
        Err(e) => {
            error!("Logout failed: {}", e);
            println!("❌ Logout failed: {}", e);
            std::process::exit(1);
        }
    }
}

async fn run_watch(host: HostConfig) -> Result<()> {
    let (config, scheduler) = build_scheduler(&host)?;
    let machine = scheduler.machine().clone();

    let mut states = machine.subscribe();
    let printer = tokio::spawn(async move {
        while states.changed().await.is_ok() {
            let state = states.borrow_and_update().clone();
            print_state(&state);
        }
    });

    let handle = scheduler.mount().await;
    let notifier = scheduler.focus_notifier();
    info!("Watching session at {}", config.base_url);
    print_watch_help();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match line.trim() {
            "" | "focus" => {
                notifier.notify();
            }
            "fetch" => {
                let outcome = machine.refresh_user().await;
                println!("Fetch outcome: {}", describe_outcome(&outcome));
            }
            "logout" => {
                if let Err(e) = machine.logout().await {
                    println!("❌ Logout failed: {}", e);
                }
            }
            "status" => print_state(&machine.state()),
            "help" => print_watch_help(),
            "quit" | "exit" => break,
            other => println!("Unknown command: {}", other),
        }
    }

    handle.teardown();
    printer.abort();
    Ok(())
}

fn print_watch_help() {
    println!("📖 Watch Mode Commands:");
    println!("  <enter> / focus - Signal that the view regained focus");
    println!("  fetch           - Revalidate the session now");
    println!("  logout          - End the session");
    println!("  status          - Show the current state");
    println!("  quit            - Exit");
}

fn describe_outcome(outcome: &FetchOutcome) -> String {
    match outcome {
        FetchOutcome::Authenticated => "authenticated".to_string(),
        FetchOutcome::Unauthenticated { status } => format!("session rejected ({})", status),
        FetchOutcome::ProxyAnomaly(guard) => format!("proxy anomaly, {:?}", guard),
        FetchOutcome::TransportFailed => "request failed".to_string(),
        FetchOutcome::Coalesced => "joined an in-flight request".to_string(),
    }
}

fn print_state(state: &UserState) {
    println!("\n📊 Session State:");
    println!("  Phase: {:?}", state.phase);
    match &state.user {
        Some(user) => {
            println!("  User: {} ({})", user.username, user.id);
            if !user.features.is_empty() {
                println!("  Features: {}", user.features.join(", "));
            }
            println!("  TabCoins: {}  TabCash: {}", user.tabcoins, user.tabcash);
            if user.proxy_response {
                println!("  ⚠️  Last response looked like a stale proxy response");
            }
        }
        None => println!("  User: signed out"),
    }
    if let Some(error) = &state.error {
        println!("  Error: {}", error);
    }
}
