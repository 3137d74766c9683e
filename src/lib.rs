//! # session-sync
//!
//! Authenticated-user state for client applications, kept in sync with a remote
//! session service.
//!
//! ## Architecture Overview
//!
//! - **[`cache`]**: durable key-value store holding a trimmed user snapshot and the
//!   reload cooldown marker
//! - **[`client`]**: the two network calls, `GET /api/v1/user` and
//!   `DELETE /api/v1/sessions`
//! - **[`guard`]**: tells a genuine 401/403 apart from a stale response served by an
//!   edge proxy, without reloading in a loop
//! - **[`session`]**: the observable state machine and the revalidation scheduler
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use session_sync::{
//!     FileCache, HttpSessionClient, RecordingNavigator, RevalidationScheduler,
//!     SessionStateMachine, SessionSyncConfig,
//! };
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = SessionSyncConfig::default();
//!     let machine = SessionStateMachine::new(
//!         &config,
//!         Arc::new(HttpSessionClient::new(&config)?),
//!         Arc::new(FileCache::new(".session-sync/cache")),
//!         Arc::new(RecordingNavigator::new("/")),
//!     );
//!
//!     let scheduler = RevalidationScheduler::new(machine.clone(), config.refresh_threshold_ms);
//!     let _handle = scheduler.mount().await;
//!
//!     if let Some(user) = machine.user() {
//!         println!("Signed in as {}", user.username);
//!     }
//!     Ok(())
//! }
//! ```

/// Persistent key-value cache and the typed entries stored in it.
pub mod cache;

/// Transport to the remote session service.
pub mod client;

/// Proxy-misdetection guard and the navigation boundary it drives.
pub mod guard;

/// Session state machine, observable state and revalidation scheduling.
pub mod session;

/// Runtime configuration loaded from TOML.
pub mod config;

/// Injectable time source.
pub mod clock;

/// Endpoint paths, storage keys, defaults and file locations.
pub mod env;

// CLI module for the command-line host
pub mod cli;

pub use cache::{CachedSnapshot, CooldownMarker, FileCache, MemoryCache, PersistentCache};
pub use client::{ClientError, HttpSessionClient, MockSessionClient, SessionClient, SessionResponse};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::SessionSyncConfig;
pub use guard::{GuardOutcome, NavigationError, Navigator, ProxyGuard, RecordingNavigator};
pub use session::{
    FetchOutcome, FocusNotifier, FocusOutcome, Phase, RevalidationScheduler, SchedulerHandle,
    SessionStateMachine, SessionSyncError, User, UserState,
};
