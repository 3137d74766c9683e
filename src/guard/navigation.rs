//! Boundary to the host application's router.

use async_trait::async_trait;
use std::sync::Mutex;

#[derive(Debug, Clone, thiserror::Error)]
pub enum NavigationError {
    #[error("Navigation to {path} failed: {reason}")]
    NavigateFailed { path: String, reason: String },
    #[error("Reload failed: {0}")]
    ReloadFailed(String),
}

#[async_trait]
pub trait Navigator: Send + Sync {
    /// Path of the active view, including any query string
    fn current_path(&self) -> String;

    async fn navigate_to(&self, path: &str) -> Result<(), NavigationError>;

    /// Reload the active view, bypassing whatever the intermediary cached
    async fn reload_current_view(&self) -> Result<(), NavigationError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationEvent {
    Navigated(String),
    Reloaded,
}

/// In-memory router that records every request it receives
#[derive(Debug)]
pub struct RecordingNavigator {
    path: Mutex<String>,
    events: Mutex<Vec<NavigationEvent>>,
}

impl RecordingNavigator {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: Mutex::new(path.into()),
            events: Mutex::new(Vec::new()),
        }
    }

    pub fn set_path(&self, path: impl Into<String>) {
        *self.path.lock().unwrap_or_else(|p| p.into_inner()) = path.into();
    }

    pub fn events(&self) -> Vec<NavigationEvent> {
        self.events.lock().unwrap_or_else(|p| p.into_inner()).clone()
    }

    pub fn reload_count(&self) -> usize {
        self.events()
            .iter()
            .filter(|event| matches!(event, NavigationEvent::Reloaded))
            .count()
    }

    fn record(&self, event: NavigationEvent) {
        self.events
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .push(event);
    }
}

#[async_trait]
impl Navigator for RecordingNavigator {
    fn current_path(&self) -> String {
        self.path.lock().unwrap_or_else(|p| p.into_inner()).clone()
    }

    async fn navigate_to(&self, path: &str) -> Result<(), NavigationError> {
        self.set_path(path);
        self.record(NavigationEvent::Navigated(path.to_string()));
        Ok(())
    }

    async fn reload_current_view(&self) -> Result<(), NavigationError> {
        self.record(NavigationEvent::Reloaded);
        Ok(())
    }
}
