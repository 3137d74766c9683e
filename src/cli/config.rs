//! Configuration discovery and loading
//!
//! This module handles the configuration discovery hierarchy:
//! 1. Current directory: ./session-sync.toml or ./.session-sync/config.toml
//! 2. User config: ~/.session-sync/config.toml
//! 3. Built-in defaults
//!
//! Command line options are applied on top of whichever file was found.

use super::args::HostConfig;
use crate::{config::SessionSyncConfig, env};
use anyhow::{Context, Result};
use std::env as std_env;
use std::fs;
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// Configuration discovery system
pub struct ConfigDiscovery;

impl ConfigDiscovery {
    /// Discover and load configuration using the hierarchy
    pub fn discover_config() -> Result<SessionSyncConfig> {
        if let Some(config_path) = Self::find_config_file() {
            info!("Loading configuration from: {:?}", config_path);
            return SessionSyncConfig::from_toml_file(config_path);
        }

        info!("No configuration file found, using defaults");
        Ok(SessionSyncConfig::default())
    }

    /// Load the explicit override or the discovered file, then apply command line options
    pub fn load(host: &HostConfig) -> Result<SessionSyncConfig> {
        let mut config = match &host.config_override {
            Some(path) => {
                info!("Loading configuration override from: {:?}", path);
                SessionSyncConfig::from_toml_file(path)?
            }
            None => Self::discover_config()?,
        };

        if let Some(base_url) = &host.base_url {
            config.base_url = base_url.clone();
        }
        if let Some(cache_path) = &host.cache_path {
            config.cache_path = Some(cache_path.clone());
        }
        if let Some(token) = &host.session_token {
            config.session_token = Some(token.clone());
        }
        if host.production {
            config.production = true;
        }

        config
            .validate()
            .context("Invalid configuration after applying command line options")?;
        Ok(config)
    }

    /// Find configuration file using discovery hierarchy
    pub fn find_config_file() -> Option<PathBuf> {
        for candidate in Self::get_config_candidates() {
            debug!("Checking for config file: {:?}", candidate);
            if candidate.is_file() {
                debug!("Found config file: {:?}", candidate);
                return Some(candidate);
            }
        }

        debug!("No config file found in discovery hierarchy");
        None
    }

    /// Get list of configuration file candidates in priority order
    fn get_config_candidates() -> Vec<PathBuf> {
        let mut candidates = Vec::new();

        if let Ok(current_dir) = std_env::current_dir() {
            candidates.push(current_dir.join(env::LOCAL_CONFIG_FILE_NAME));
            candidates.push(env::local_config_file_path(&current_dir));
        }

        if let Some(home_dir) = Self::get_home_dir() {
            candidates.push(env::user_config_file_path(&home_dir));
        }

        candidates
    }

    /// Get home directory path
    pub fn get_home_dir() -> Option<PathBuf> {
        std_env::var("HOME")
            .ok()
            .or_else(|| std_env::var("USERPROFILE").ok())
            .map(PathBuf::from)
    }

    /// Create a default config file in the user's home directory
    pub fn create_default_user_config() -> Result<PathBuf> {
        let home_dir = Self::get_home_dir().context("Could not determine home directory")?;
        let config_path = env::user_config_file_path(&home_dir);

        if let Some(config_dir) = config_path.parent()
            && !config_dir.exists()
        {
            fs::create_dir_all(config_dir).with_context(|| {
                format!("Failed to create directory: {}", config_dir.display())
            })?;
            info!("Created configuration directory: {:?}", config_dir);
        }

        if !config_path.exists() {
            SessionSyncConfig::default().to_toml_file(&config_path)?;
            info!("Created default configuration file: {:?}", config_path);
        } else {
            warn!("Configuration file already exists: {:?}", config_path);
        }

        Ok(config_path)
    }

    /// Show configuration discovery information for debugging
    pub fn show_discovery_info() {
        println!("Configuration Discovery Hierarchy:");
        println!();

        for (i, candidate) in Self::get_config_candidates().iter().enumerate() {
            let status = if candidate.exists() {
                if candidate.is_file() {
                    "✓ EXISTS"
                } else {
                    "✗ NOT A FILE"
                }
            } else {
                "✗ NOT FOUND"
            };

            println!("  {}. {:?} - {}", i + 1, candidate, status);
        }

        println!();
        match Self::find_config_file() {
            Some(found) => println!("Active configuration: {:?}", found),
            None => println!("Active configuration: Built-in defaults"),
        }
    }
}
