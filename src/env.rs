//! Environment constants and path utilities for session-sync.
//!
//! This module centralizes the endpoint paths, storage keys, timing defaults and
//! configuration file locations used throughout the crate.

use std::path::{Path, PathBuf};

/// Main application directory name (hidden directory like .git, .vscode)
pub const APP_DIR_NAME: &str = ".session-sync";

/// Configuration file name inside [`APP_DIR_NAME`]
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Configuration file name looked up directly in the current directory
pub const LOCAL_CONFIG_FILE_NAME: &str = "session-sync.toml";

/// Default directory name for the on-disk cache, one file per key
pub const CACHE_DIR_NAME: &str = "cache";

/// Remote API endpoints
pub mod endpoints {
    /// Current user (GET)
    pub const USER: &str = "/api/v1/user";

    /// Current session (DELETE)
    pub const SESSIONS: &str = "/api/v1/sessions";

    /// Cookie carrying the session token
    pub const SESSION_COOKIE_NAME: &str = "session_id";
}

/// Persistent cache keys
pub mod keys {
    /// Trimmed snapshot of the last fetched user
    pub const USER: &str = "user";

    /// Epoch milliseconds of the last automatic reload
    pub const RELOAD_TIME: &str = "reloadTime";
}

/// Timing and routing defaults
pub mod defaults {
    /// Cached snapshots older than this are re-fetched on focus (10 minutes)
    pub const REFRESH_THRESHOLD_MS: i64 = 600_000;

    /// Minimum spacing between automatic reloads
    pub const REDIRECT_COOLDOWN_MS: i64 = 30_000;

    /// Header present on responses produced by the real backend platform
    pub const PLATFORM_HEADER: &str = "x-vercel-id";

    /// Path of the login view
    pub const LOGIN_PATH: &str = "/login";

    /// Query parameter carrying the path to return to after login
    pub const REDIRECT_PARAM: &str = "redirect";

    pub const BASE_URL: &str = "http://localhost:3000";

    pub const REQUEST_TIMEOUT_SECS: u64 = 30;
}

/// Build the main application directory path from a root
pub fn app_dir_path(root: &Path) -> PathBuf {
    root.join(APP_DIR_NAME)
}

/// Build config file path in user's home directory
pub fn user_config_file_path(home_dir: &Path) -> PathBuf {
    app_dir_path(home_dir).join(CONFIG_FILE_NAME)
}

/// Build local config file path in current directory
pub fn local_config_file_path(current_dir: &Path) -> PathBuf {
    app_dir_path(current_dir).join(CONFIG_FILE_NAME)
}

/// Build the default cache directory path in user's home directory
pub fn default_cache_dir_path(home_dir: &Path) -> PathBuf {
    app_dir_path(home_dir).join(CACHE_DIR_NAME)
}
