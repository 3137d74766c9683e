//! Typed access to the two entries the session layer keeps in the cache.

use super::{CacheError, CachedSnapshot, CooldownMarker, PersistentCache};
use crate::env::keys;
use tracing::warn;

/// Read the user snapshot. Missing, unreadable and corrupt entries all read as `None`.
pub async fn load_snapshot(cache: &dyn PersistentCache) -> Option<CachedSnapshot> {
    let raw = match cache.get(keys::USER).await {
        Ok(raw) => raw?,
        Err(e) => {
            warn!("Failed to read cached user from {} cache: {}", cache.cache_type(), e);
            return None;
        }
    };

    match serde_json::from_str(&raw) {
        Ok(snapshot) => Some(snapshot),
        Err(e) => {
            warn!("Ignoring corrupt cached user: {}", e);
            None
        }
    }
}

pub async fn store_snapshot(
    cache: &dyn PersistentCache,
    snapshot: &CachedSnapshot,
) -> Result<(), CacheError> {
    let raw = serde_json::to_string(snapshot)?;
    cache.set(keys::USER, &raw).await
}

pub async fn remove_snapshot(cache: &dyn PersistentCache) -> Result<(), CacheError> {
    cache.remove(keys::USER).await
}

/// Read the reload cooldown marker, treating unreadable values as absent
pub async fn load_cooldown(cache: &dyn PersistentCache) -> Option<CooldownMarker> {
    match cache.get(keys::RELOAD_TIME).await {
        Ok(Some(raw)) => {
            let marker = CooldownMarker::parse(&raw);
            if marker.is_none() {
                warn!("Ignoring corrupt reload cooldown marker: {:?}", raw);
            }
            marker
        }
        Ok(None) => None,
        Err(e) => {
            warn!("Failed to read reload cooldown marker: {}", e);
            None
        }
    }
}

pub async fn store_cooldown(
    cache: &dyn PersistentCache,
    marker: CooldownMarker,
) -> Result<(), CacheError> {
    cache.set(keys::RELOAD_TIME, &marker.encode()).await
}

pub async fn clear_cooldown(cache: &dyn PersistentCache) -> Result<(), CacheError> {
    cache.remove(keys::RELOAD_TIME).await
}
