use crate::env::{self, defaults};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Runtime configuration for the session layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSyncConfig {
    /// Origin of the session service
    pub base_url: String,
    /// Enables the proxy-misdetection guard
    pub production: bool,
    /// Header that genuine backend responses carry
    pub platform_header: String,
    pub login_path: String,
    /// Cached snapshots older than this are re-fetched when the view regains focus
    pub refresh_threshold_ms: i64,
    /// Minimum spacing between automatic reloads of the login view
    pub redirect_cooldown_ms: i64,
    pub request_timeout_secs: u64,
    /// Directory backing the persistent cache; defaults to `~/.session-sync/cache`
    pub cache_path: Option<PathBuf>,
    /// Value of the `session_id` cookie sent with every request
    pub session_token: Option<String>,
    /// Revalidate on startup even when nothing is cached
    pub fetch_without_snapshot: bool,
}

impl Default for SessionSyncConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::BASE_URL.to_string(),
            production: false,
            platform_header: defaults::PLATFORM_HEADER.to_string(),
            login_path: defaults::LOGIN_PATH.to_string(),
            refresh_threshold_ms: defaults::REFRESH_THRESHOLD_MS,
            redirect_cooldown_ms: defaults::REDIRECT_COOLDOWN_MS,
            request_timeout_secs: defaults::REQUEST_TIMEOUT_SECS,
            cache_path: None,
            session_token: None,
            fetch_without_snapshot: false,
        }
    }
}

impl SessionSyncConfig {
    /// Load configuration from a TOML file
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_toml_str(&content)
    }

    /// Load configuration from a TOML string
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(content).context("Failed to parse TOML configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn to_toml_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = self.to_toml_string()?;
        std::fs::write(path, content).context("Failed to write config file")
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")
    }

    pub fn validate(&self) -> Result<()> {
        url::Url::parse(&self.base_url)
            .with_context(|| format!("Invalid base_url: {}", self.base_url))?;
        anyhow::ensure!(
            self.login_path.starts_with('/'),
            "login_path must be absolute, got {:?}",
            self.login_path
        );
        anyhow::ensure!(
            !self.platform_header.is_empty(),
            "platform_header must not be empty"
        );
        anyhow::ensure!(
            self.refresh_threshold_ms >= 0 && self.redirect_cooldown_ms >= 0,
            "refresh_threshold_ms and redirect_cooldown_ms must not be negative"
        );
        Ok(())
    }

    /// Cache directory to use, falling back to the home directory default
    pub fn resolved_cache_path(&self, home_dir: Option<&Path>) -> PathBuf {
        if let Some(path) = &self.cache_path {
            return path.clone();
        }
        match home_dir {
            Some(home) => env::default_cache_dir_path(home),
            None => PathBuf::from(env::APP_DIR_NAME).join(env::CACHE_DIR_NAME),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_documented_constants() {
        let config = SessionSyncConfig::default();
        assert_eq!(config.refresh_threshold_ms, 600_000);
        assert_eq!(config.redirect_cooldown_ms, 30_000);
        assert_eq!(config.platform_header, "x-vercel-id");
        assert_eq!(config.login_path, "/login");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = SessionSyncConfig::from_toml_str(
            "base_url = \"https://www.tabnews.com.br\"\nproduction = true\n",
        )
        .unwrap();
        assert!(config.production);
        assert_eq!(config.base_url, "https://www.tabnews.com.br");
        assert_eq!(config.redirect_cooldown_ms, defaults::REDIRECT_COOLDOWN_MS);
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert!(SessionSyncConfig::from_toml_str("base_url = \"nope\"").is_err());
        assert!(SessionSyncConfig::from_toml_str("login_path = \"login\"").is_err());
        assert!(SessionSyncConfig::from_toml_str("redirect_cooldown_ms = -1").is_err());
    }

    #[test]
    fn test_resolved_cache_path() {
        let config = SessionSyncConfig::default();
        assert_eq!(
            config.resolved_cache_path(Some(Path::new("/home/ana"))),
            Path::new("/home/ana/.session-sync/cache")
        );

        let explicit = SessionSyncConfig {
            cache_path: Some(PathBuf::from("/tmp/session-cache")),
            ..SessionSyncConfig::default()
        };
        assert_eq!(
            explicit.resolved_cache_path(None),
            Path::new("/tmp/session-cache")
        );
    }
}
