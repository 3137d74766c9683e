use crate::cache::types::CacheError;
use async_trait::async_trait;

/// Durable key-value store that survives restarts of the host application.
///
/// Values are opaque strings. Implementations do no validation of what is stored;
/// callers own the serialization format and must tolerate corrupt or missing entries.
#[async_trait]
pub trait PersistentCache: Send + Sync {
    /// Read the value stored under `key`
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    /// Store `value` under `key`, replacing any previous value
    async fn set(&self, key: &str, value: &str) -> Result<(), CacheError>;

    /// Remove `key`; removing a missing key is not an error
    async fn remove(&self, key: &str) -> Result<(), CacheError>;

    /// Remove every entry
    async fn clear(&self) -> Result<(), CacheError>;

    /// Short identifier used in logs
    fn cache_type(&self) -> &'static str;
}
