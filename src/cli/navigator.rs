//! Terminal stand-in for the host application's router.

use crate::guard::{NavigationError, Navigator};
use async_trait::async_trait;
use std::sync::Mutex;
use tracing::info;

/// Tracks a current path and reports navigation requests on stdout
#[derive(Debug)]
pub struct ConsoleNavigator {
    path: Mutex<String>,
}

impl ConsoleNavigator {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: Mutex::new(path.into()),
        }
    }
}

#[async_trait]
impl Navigator for ConsoleNavigator {
    fn current_path(&self) -> String {
        self.path.lock().unwrap_or_else(|p| p.into_inner()).clone()
    }

    async fn navigate_to(&self, path: &str) -> Result<(), NavigationError> {
        info!("Navigating to {}", path);
        println!("→ navigate to {}", path);
        *self.path.lock().unwrap_or_else(|p| p.into_inner()) = path.to_string();
        Ok(())
    }

    async fn reload_current_view(&self) -> Result<(), NavigationError> {
        let path = self.current_path();
        info!("Reloading {}", path);
        println!("↻ reload {}", path);
        Ok(())
    }
}
