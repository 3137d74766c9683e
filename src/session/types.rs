use crate::cache::CachedSnapshot;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Server-confirmed identity of the signed-in user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default)]
    pub tabcoins: i64,
    #[serde(default)]
    pub tabcash: i64,
    /// Set while a proxy-layer auth anomaly is suspected; never sent by the server
    #[serde(
        rename = "proxyResponse",
        default,
        skip_serializing_if = "std::ops::Not::not"
    )]
    pub proxy_response: bool,
    /// Every other field of the server payload, kept verbatim
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl User {
    pub fn has_id(&self) -> bool {
        !self.id.is_empty()
    }

    pub fn has_feature(&self, feature: &str) -> bool {
        self.features.iter().any(|f| f == feature)
    }

    /// Overlay the snapshot's fields, keeping everything the snapshot does not carry
    pub fn apply_snapshot(&mut self, snapshot: &CachedSnapshot) {
        self.id = snapshot.id.clone();
        self.username = snapshot.username.clone();
        self.features = snapshot.features.clone();
        self.tabcoins = snapshot.tabcoins;
        self.tabcash = snapshot.tabcash;
    }
}

impl From<&CachedSnapshot> for User {
    fn from(snapshot: &CachedSnapshot) -> Self {
        Self {
            id: snapshot.id.clone(),
            username: snapshot.username.clone(),
            features: snapshot.features.clone(),
            tabcoins: snapshot.tabcoins,
            tabcash: snapshot.tabcash,
            proxy_response: false,
            extra: Map::new(),
        }
    }
}

/// Coarse lifecycle of the session state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Phase {
    #[default]
    Uninitialized,
    Loading,
    Ready,
}

/// Everything subscribers observe
#[derive(Debug, Clone, PartialEq, Default)]
pub struct UserState {
    pub phase: Phase,
    pub user: Option<User>,
    pub error: Option<SessionSyncError>,
}

impl UserState {
    pub fn is_loading(&self) -> bool {
        self.phase != Phase::Ready
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionSyncError {
    #[error("Transport error: {0}")]
    Transport(String),
    #[error("Session rejected ({status}): {message}")]
    Session { status: u16, message: String },
    #[error("Logout failed with status {status}")]
    LogoutFailure { status: u16 },
    #[error("Cache error: {0}")]
    Cache(String),
}

impl SessionSyncError {
    /// HTTP status carried by the error, for callers that branch on it
    pub fn status(&self) -> Option<u16> {
        match self {
            SessionSyncError::Session { status, .. } | SessionSyncError::LogoutFailure { status } => {
                Some(*status)
            }
            SessionSyncError::Transport(_) | SessionSyncError::Cache(_) => None,
        }
    }
}

impl From<crate::client::ClientError> for SessionSyncError {
    fn from(error: crate::client::ClientError) -> Self {
        SessionSyncError::Transport(error.to_string())
    }
}

impl From<crate::cache::CacheError> for SessionSyncError {
    fn from(error: crate::cache::CacheError) -> Self {
        SessionSyncError::Cache(error.to_string())
    }
}

/// Result of a single `fetch_user` call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Server confirmed the session; user and snapshot replaced
    Authenticated,
    /// Server rejected the session; user and snapshot cleared
    Unauthenticated { status: u16 },
    /// 401/403 attributed to an intermediary proxy
    ProxyAnomaly(crate::guard::GuardOutcome),
    /// Request never produced a usable response
    TransportFailed,
    /// Another fetch was already in flight; its result was adopted
    Coalesced,
}
