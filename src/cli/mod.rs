//! CLI-specific functionality for session-sync
//!
//! This module contains the command-line host: argument parsing, configuration
//! discovery and a terminal navigator.

pub mod args;
pub mod config;
pub mod navigator;

pub use args::{Args, ExecutionMode, HostConfig};
pub use config::ConfigDiscovery;
pub use navigator::ConsoleNavigator;
