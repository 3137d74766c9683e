use crate::cache::*;
use crate::env::keys;
use crate::session::User;
use tempfile::TempDir;

fn sample_user() -> User {
    serde_json::from_value(serde_json::json!({
        "id": "1",
        "username": "ana",
        "features": ["create:content"],
        "tabcoins": 5,
        "tabcash": 2,
        "email": "ana@example.com"
    }))
    .unwrap()
}

#[tokio::test]
async fn test_memory_cache_basic_operations() {
    let cache = MemoryCache::new();

    assert_eq!(cache.get("missing").await.unwrap(), None);

    cache.set("a", "1").await.unwrap();
    cache.set("b", "2").await.unwrap();
    assert_eq!(cache.get("a").await.unwrap().as_deref(), Some("1"));

    cache.remove("a").await.unwrap();
    assert_eq!(cache.get("a").await.unwrap(), None);
    // removing twice is fine
    cache.remove("a").await.unwrap();

    cache.clear().await.unwrap();
    assert!(cache.is_empty());
}

#[tokio::test]
async fn test_file_cache_survives_new_instance() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("nested").join("cache");

    let cache = FileCache::new(&path);
    cache.set(keys::USER, "{\"id\":\"1\"}").await.unwrap();
    cache.set(keys::RELOAD_TIME, "42").await.unwrap();
    assert!(cache.entry_path(keys::USER).is_file());

    let reopened = FileCache::new(&path);
    assert_eq!(
        reopened.get(keys::RELOAD_TIME).await.unwrap().as_deref(),
        Some("42")
    );
    assert!(reopened.get(keys::USER).await.unwrap().is_some());

    reopened.remove(keys::USER).await.unwrap();
    assert_eq!(cache.get(keys::USER).await.unwrap(), None);
    // removing twice is fine
    reopened.remove(keys::USER).await.unwrap();

    cache.clear().await.unwrap();
    assert_eq!(reopened.get(keys::RELOAD_TIME).await.unwrap(), None);
    assert_eq!(std::fs::read_dir(&path).unwrap().count(), 0);
}

#[tokio::test]
async fn test_file_cache_missing_directory_reads_as_empty() {
    let temp_dir = TempDir::new().unwrap();
    let cache = FileCache::new(temp_dir.path().join("never-created"));

    assert_eq!(cache.get(keys::USER).await.unwrap(), None);
    cache.remove(keys::USER).await.unwrap();
    cache.clear().await.unwrap();
}

#[tokio::test]
async fn test_file_cache_unreadable_entry_reads_as_absent() {
    let temp_dir = TempDir::new().unwrap();
    let cache = FileCache::new(temp_dir.path());
    std::fs::write(cache.entry_path(keys::USER), [0xff, 0xfe, 0x00]).unwrap();

    assert_eq!(cache.get(keys::USER).await.unwrap(), None);

    // a write replaces the bad entry
    cache.set(keys::USER, "{}").await.unwrap();
    assert_eq!(cache.get(keys::USER).await.unwrap().as_deref(), Some("{}"));
}

#[tokio::test]
async fn test_file_cache_keys_stay_inside_directory() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("cache");
    let cache = FileCache::new(&path);

    for key in ["../escape", "a/b", ".hidden", ""] {
        let entry = cache.entry_path(key);
        assert_eq!(entry.parent(), Some(path.as_path()), "key {:?}", key);
        cache.set(key, key).await.unwrap();
    }
    for key in ["../escape", "a/b", ".hidden", ""] {
        assert_eq!(cache.get(key).await.unwrap().as_deref(), Some(key));
    }
    assert!(!temp_dir.path().join("escape").exists());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_file_cache_instances_do_not_lose_each_others_writes() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("cache");

    for round in 0..50 {
        let first = FileCache::new(&path);
        let second = FileCache::new(&path);
        let value = round.to_string();

        let (a, b) = tokio::join!(
            first.set(keys::USER, &value),
            second.set(keys::RELOAD_TIME, &value)
        );
        a.unwrap();
        b.unwrap();

        assert_eq!(
            first.get(keys::RELOAD_TIME).await.unwrap().as_deref(),
            Some(value.as_str()),
            "round {}",
            round
        );
        assert_eq!(
            second.get(keys::USER).await.unwrap().as_deref(),
            Some(value.as_str()),
            "round {}",
            round
        );
    }
}

#[tokio::test]
async fn test_snapshot_roundtrip_uses_wire_field_names() {
    let cache = MemoryCache::new();
    let snapshot = CachedSnapshot::from_user(&sample_user(), 1_000);

    store_snapshot(&cache, &snapshot).await.unwrap();

    let raw = cache.get(keys::USER).await.unwrap().unwrap();
    let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(value["cacheTime"], 1_000);
    assert_eq!(value["username"], "ana");
    // only the trimmed projection is persisted
    assert!(value.get("email").is_none());

    assert_eq!(load_snapshot(&cache).await, Some(snapshot));

    remove_snapshot(&cache).await.unwrap();
    assert_eq!(load_snapshot(&cache).await, None);
}

#[tokio::test]
async fn test_corrupt_snapshot_reads_as_absent() {
    let cache = MemoryCache::new();
    cache.set(keys::USER, "{broken").await.unwrap();
    assert_eq!(load_snapshot(&cache).await, None);
}

#[tokio::test]
async fn test_cooldown_marker_storage() {
    let cache = MemoryCache::new();
    assert_eq!(load_cooldown(&cache).await, None);

    store_cooldown(&cache, CooldownMarker::new(12_345)).await.unwrap();
    assert_eq!(
        cache.get(keys::RELOAD_TIME).await.unwrap().as_deref(),
        Some("12345")
    );
    assert_eq!(load_cooldown(&cache).await, Some(CooldownMarker::new(12_345)));

    cache.set(keys::RELOAD_TIME, "yesterday").await.unwrap();
    assert_eq!(load_cooldown(&cache).await, None);

    clear_cooldown(&cache).await.unwrap();
    assert!(!cache.contains_key(keys::RELOAD_TIME));
}

#[test]
fn test_cooldown_window() {
    let marker = CooldownMarker::new(100_000);
    assert!(marker.is_active(100_000 + 5_000, 30_000));
    assert!(marker.is_active(100_000 + 29_999, 30_000));
    assert!(!marker.is_active(100_000 + 30_000, 30_000));

    // extreme values saturate instead of overflowing
    assert!(CooldownMarker::new(0).is_active(i64::MIN, 30_000));
    assert!(!CooldownMarker::new(i64::MIN).is_active(0, 30_000));
}

#[test]
fn test_snapshot_staleness() {
    let snapshot = CachedSnapshot::from_user(&sample_user(), 0);
    assert!(!snapshot.is_stale(600_000, 600_000));
    assert!(snapshot.is_stale(700_000, 600_000));

    let untimed = CachedSnapshot {
        cache_time: None,
        ..snapshot
    };
    assert!(!untimed.is_stale(i64::MAX, 600_000));

    let bogus = CachedSnapshot {
        cache_time: Some(i64::MIN),
        ..untimed
    };
    assert_eq!(bogus.age_millis(1_700_000_000_000), None);
    assert!(!bogus.is_stale(1_700_000_000_000, 600_000));
}
