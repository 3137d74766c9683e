//! Proxy-misdetection guard.
//!
//! An edge proxy can answer `GET /api/v1/user` with a cached 401/403 that never
//! reached the backend. Genuine backend responses in production always carry the
//! platform header, so a rejection without it is attributed to the proxy. The guard
//! then either reloads the login view or sends the user there, and a persisted
//! cooldown marker keeps it from reloading in a loop.

use crate::cache::{self, CooldownMarker, PersistentCache};
use crate::client::SessionResponse;
use crate::clock::Clock;
use crate::config::SessionSyncConfig;
use crate::env::defaults;
use crate::guard::Navigator;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// How a 401/403 was attributed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// The backend itself rejected the session
    Genuine,
    /// An intermediary answered without reaching the backend
    ProxyAnomaly,
}

/// What the guard decided to do about an authentication failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardOutcome {
    Genuine,
    /// Proxy anomaly inside the cooldown window; nothing done
    Suppressed,
    /// Proxy anomaly on the login view; marker set and view reloaded
    Reloaded,
    /// Proxy anomaly elsewhere; the caller flags the user, then calls
    /// [`ProxyGuard::redirect_to_login`] with `target`
    RedirectToLogin { target: String },
}

impl GuardOutcome {
    pub fn is_proxy_anomaly(&self) -> bool {
        !matches!(self, GuardOutcome::Genuine)
    }
}

pub struct ProxyGuard {
    production: bool,
    platform_header: String,
    login_path: String,
    cooldown_ms: i64,
    cache: Arc<dyn PersistentCache>,
    navigator: Arc<dyn Navigator>,
    clock: Arc<dyn Clock>,
}

impl ProxyGuard {
    pub fn new(
        config: &SessionSyncConfig,
        cache: Arc<dyn PersistentCache>,
        navigator: Arc<dyn Navigator>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            production: config.production,
            platform_header: config.platform_header.to_ascii_lowercase(),
            login_path: config.login_path.clone(),
            cooldown_ms: config.redirect_cooldown_ms,
            cache,
            navigator,
            clock,
        }
    }

    /// Attribute an authentication failure without side effects
    pub fn classify(&self, response: &SessionResponse) -> Classification {
        if self.production && !response.has_header(&self.platform_header) {
            Classification::ProxyAnomaly
        } else {
            Classification::Genuine
        }
    }

    /// Classify a 401/403 and, for proxy anomalies, apply the cooldown and reload policy
    pub async fn inspect(&self, response: &SessionResponse) -> GuardOutcome {
        if self.classify(response) == Classification::Genuine {
            return GuardOutcome::Genuine;
        }

        warn!(
            "Status {} without {} header, attributing to proxy",
            response.status, self.platform_header
        );

        let now = self.clock.now_millis();
        if let Some(marker) = cache::load_cooldown(self.cache.as_ref()).await
            && marker.is_active(now, self.cooldown_ms)
        {
            debug!(
                "Reload issued {}ms ago, inside {}ms cooldown",
                now.saturating_sub(marker.reloaded_at),
                self.cooldown_ms
            );
            return GuardOutcome::Suppressed;
        }

        let current_path = self.navigator.current_path();
        if self.is_login_view(&current_path) {
            if let Err(e) = cache::store_cooldown(self.cache.as_ref(), CooldownMarker::new(now)).await
            {
                warn!("Failed to persist reload cooldown marker: {}", e);
            }
            info!("Reloading login view to bypass stale proxy response");
            if let Err(e) = self.navigator.reload_current_view().await {
                warn!("Reload failed: {}", e);
            }
            return GuardOutcome::Reloaded;
        }

        GuardOutcome::RedirectToLogin {
            target: self.login_target(&current_path),
        }
    }

    pub async fn redirect_to_login(&self, target: &str) {
        info!("Redirecting to {}", target);
        if let Err(e) = self.navigator.navigate_to(target).await {
            warn!("Redirect to login failed: {}", e);
        }
    }

    fn is_login_view(&self, path: &str) -> bool {
        let pathname = path.split(['?', '#']).next().unwrap_or_default();
        pathname == self.login_path
    }

    /// Login path with a parameter pointing back at `current_path`
    pub fn login_target(&self, current_path: &str) -> String {
        let encoded: String = url::form_urlencoded::byte_serialize(current_path.as_bytes()).collect();
        format!(
            "{}?{}={}",
            self.login_path,
            defaults::REDIRECT_PARAM,
            encoded
        )
    }
}

impl std::fmt::Debug for ProxyGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProxyGuard")
            .field("production", &self.production)
            .field("platform_header", &self.platform_header)
            .field("login_path", &self.login_path)
            .field("cooldown_ms", &self.cooldown_ms)
            .field("cache", &self.cache.cache_type())
            .finish()
    }
}
