use crate::session::types::User;
use serde::{Deserialize, Serialize};

/// Trimmed projection of the last successfully fetched [`User`], persisted under the
/// `"user"` key so the identity survives restarts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedSnapshot {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default)]
    pub tabcoins: i64,
    #[serde(default)]
    pub tabcash: i64,
    /// Epoch milliseconds of the fetch that produced this snapshot
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_time: Option<i64>,
}

impl CachedSnapshot {
    /// Project a freshly fetched user into a snapshot stamped with `cache_time`
    pub fn from_user(user: &User, cache_time: i64) -> Self {
        Self {
            id: user.id.clone(),
            username: user.username.clone(),
            features: user.features.clone(),
            tabcoins: user.tabcoins,
            tabcash: user.tabcash,
            cache_time: Some(cache_time),
        }
    }

    pub fn has_username(&self) -> bool {
        !self.username.is_empty()
    }

    /// Milliseconds elapsed since the snapshot was written. `None` when there is no
    /// timestamp or the stored one is too far off to subtract.
    pub fn age_millis(&self, now_millis: i64) -> Option<i64> {
        self.cache_time
            .and_then(|cached_at| now_millis.checked_sub(cached_at))
    }

    /// A snapshot without a usable timestamp is never considered stale
    pub fn is_stale(&self, now_millis: i64, threshold_millis: i64) -> bool {
        self.age_millis(now_millis)
            .is_some_and(|age| age > threshold_millis)
    }
}

/// Timestamp of the last automatic reload, persisted under `"reloadTime"`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CooldownMarker {
    pub reloaded_at: i64,
}

impl CooldownMarker {
    pub fn new(reloaded_at: i64) -> Self {
        Self { reloaded_at }
    }

    /// Parse the stored decimal string; anything else reads as absent
    pub fn parse(raw: &str) -> Option<Self> {
        raw.trim().parse::<i64>().ok().map(Self::new)
    }

    pub fn encode(&self) -> String {
        self.reloaded_at.to_string()
    }

    /// True while `now` is still inside the cooldown window opened by this marker
    pub fn is_active(&self, now_millis: i64, cooldown_millis: i64) -> bool {
        self.reloaded_at > now_millis.saturating_sub(cooldown_millis)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("Cache I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Cache serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Cache unavailable: {0}")]
    Unavailable(String),
}
