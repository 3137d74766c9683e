//! Command line argument parsing
//!
//! Subcommands:
//! - `status`: initial load (cached user, then revalidation) and print the result
//! - `fetch`: revalidate the session against the server
//! - `focus`: simulate the view regaining focus
//! - `logout`: end the session and clear local state
//! - `watch`: mount the scheduler and drive it from stdin
//! - `show-config`: show configuration discovery information
//! - `init-config`: write a default user configuration file

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug)]
pub enum ExecutionMode {
    Status(HostConfig),
    Fetch(HostConfig),
    Focus(HostConfig),
    Logout(HostConfig),
    Watch(HostConfig),
    ShowConfig,
    InitConfig,
}

/// Options shared by every command that talks to the session service
#[derive(Debug, Clone, Default)]
pub struct HostConfig {
    pub config_override: Option<PathBuf>,
    pub base_url: Option<String>,
    pub cache_path: Option<PathBuf>,
    pub session_token: Option<String>,
    pub production: bool,
    /// Path of the view the host pretends to be showing
    pub current_path: String,
    pub verbose: bool,
}

#[derive(Debug, Parser)]
#[command(name = "session-sync")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Keep a local user session in sync with a remote session service")]
#[command(long_about = None)]
#[command(arg_required_else_help = true)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Configuration file path
    #[arg(short = 'c', long = "config", global = true)]
    pub config: Option<PathBuf>,

    /// Session service origin, overrides the configuration
    #[arg(long = "base-url", global = true)]
    pub base_url: Option<String>,

    /// Cache directory, overrides the configuration
    #[arg(long = "cache", global = true)]
    pub cache: Option<PathBuf>,

    /// Session token sent as the session cookie
    #[arg(long = "token", env = "SESSION_SYNC_TOKEN", global = true)]
    pub token: Option<String>,

    /// Treat the service as a production deployment behind an edge proxy
    #[arg(long = "production", global = true)]
    pub production: bool,

    /// Path of the current view
    #[arg(long = "path", default_value = "/", global = true)]
    pub path: String,

    /// Enable verbose output
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Load the cached user, revalidate it and print the session state
    Status,
    /// Revalidate the session against the server
    Fetch,
    /// Merge the cached user as if the view regained focus
    Focus,
    /// End the session and clear all local state
    Logout,
    /// Mount the scheduler; each line on stdin is a focus signal, `logout` or `quit`
    Watch,
    /// Show configuration discovery information
    ShowConfig,
    /// Write a default configuration file to ~/.session-sync/config.toml
    InitConfig,
}

impl Args {
    pub fn parse() -> Self {
        Parser::parse()
    }

    fn host_config(&self) -> HostConfig {
        HostConfig {
            config_override: self.config.clone(),
            base_url: self.base_url.clone(),
            cache_path: self.cache.clone(),
            session_token: self.token.clone(),
            production: self.production,
            current_path: self.path.clone(),
            verbose: self.verbose,
        }
    }

    pub fn mode(&self) -> Result<ExecutionMode, String> {
        match &self.command {
            Some(Commands::Status) => Ok(ExecutionMode::Status(self.host_config())),
            Some(Commands::Fetch) => Ok(ExecutionMode::Fetch(self.host_config())),
            Some(Commands::Focus) => Ok(ExecutionMode::Focus(self.host_config())),
            Some(Commands::Logout) => Ok(ExecutionMode::Logout(self.host_config())),
            Some(Commands::Watch) => Ok(ExecutionMode::Watch(self.host_config())),
            Some(Commands::ShowConfig) => Ok(ExecutionMode::ShowConfig),
            Some(Commands::InitConfig) => Ok(ExecutionMode::InitConfig),
            None => Err(
                "No command specified. Use 'session-sync --help' to see available commands."
                    .to_string(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_global_options_after_subcommand() {
        let args = Args::try_parse_from([
            "session-sync",
            "fetch",
            "--base-url",
            "https://www.tabnews.com.br",
            "--production",
            "--path",
            "/login",
        ])
        .unwrap();

        match args.mode().unwrap() {
            ExecutionMode::Fetch(host) => {
                assert_eq!(host.base_url.as_deref(), Some("https://www.tabnews.com.br"));
                assert!(host.production);
                assert_eq!(host.current_path, "/login");
            }
            other => panic!("Expected Fetch mode, got {:?}", other),
        }
    }

    #[test]
    fn test_path_defaults_to_root() {
        let args = Args::try_parse_from(["session-sync", "status"]).unwrap();
        match args.mode().unwrap() {
            ExecutionMode::Status(host) => {
                assert_eq!(host.current_path, "/");
                assert!(!host.production);
            }
            other => panic!("Expected Status mode, got {:?}", other),
        }
    }

    #[test]
    fn test_show_config() {
        let args = Args::try_parse_from(["session-sync", "show-config"]).unwrap();
        assert!(matches!(args.mode().unwrap(), ExecutionMode::ShowConfig));

        let args = Args::try_parse_from(["session-sync", "init-config"]).unwrap();
        assert!(matches!(args.mode().unwrap(), ExecutionMode::InitConfig));
    }

    #[test]
    fn test_no_command_error() {
        let args = Args {
            command: None,
            config: None,
            base_url: None,
            cache: None,
            token: None,
            production: false,
            path: "/".to_string(),
            verbose: false,
        };
        assert!(args.mode().is_err());
    }
}
