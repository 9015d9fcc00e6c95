//! In-memory TTL cache for backend responses.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::clock::{Clock, SystemClock};

/// Default entry lifetime when neither the store nor the caller sets one.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(5 * 60);

#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    stored_at: Instant,
    ttl: Duration,
}

impl<V> CacheEntry<V> {
    fn is_expired(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.stored_at) > self.ttl
    }
}

#[derive(Debug)]
struct CacheInner<V> {
    map: HashMap<String, CacheEntry<V>>,
    default_ttl: Duration,
}

impl<V: Clone> CacheInner<V> {
    fn new(default_ttl: Duration) -> Self {
        Self {
            map: HashMap::new(),
            default_ttl,
        }
    }

    fn get(&mut self, key: &str, now: Instant) -> Option<V> {
        let expired = self.map.get(key)?.is_expired(now);
        if expired {
            self.map.remove(key);
            return None;
        }
        self.map.get(key).map(|entry| entry.value.clone())
    }

    fn put(&mut self, key: String, value: V, ttl_override: Option<Duration>, now: Instant) {
        let ttl = ttl_override.unwrap_or(self.default_ttl);
        self.map.insert(
            key,
            CacheEntry {
                value,
                stored_at: now,
                ttl,
            },
        );
    }

    fn purge_expired(&mut self, now: Instant) -> usize {
        let before = self.map.len();
        self.map.retain(|_, entry| !entry.is_expired(now));
        before - self.map.len()
    }
}

/// Shared key/value cache with per-entry expiry.
///
/// Expired entries are evicted lazily when looked up, or in bulk through
/// [`CacheStore::purge_expired`]; nothing runs in the background.
pub struct CacheStore<V> {
    inner: Arc<tokio::sync::RwLock<CacheInner<V>>>,
    clock: Arc<dyn Clock>,
}

impl<V> Clone for CacheStore<V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            clock: Arc::clone(&self.clock),
        }
    }
}

impl<V: Clone + Send + Sync> CacheStore<V> {
    /// Create a cache store with a default TTL.
    pub fn new(default_ttl: Duration) -> Self {
        Self::with_clock(default_ttl, Arc::new(SystemClock))
    }

    /// Create a cache store that reads time from `clock`.
    pub fn with_clock(default_ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            inner: Arc::new(tokio::sync::RwLock::new(CacheInner::new(default_ttl))),
            clock,
        }
    }

    /// Create a cache store with a default TTL of 5 minutes.
    pub fn with_default_ttl() -> Self {
        Self::new(DEFAULT_CACHE_TTL)
    }

    /// Create a disabled cache; every `put` is dropped.
    pub fn disabled() -> Self {
        Self::new(Duration::ZERO)
    }

    /// Returns the value for `key` if it has not expired. An expired entry
    /// is removed as a side effect.
    pub async fn get(&self, key: &str) -> Option<V> {
        let now = self.clock.now();
        let mut store = self.inner.write().await;
        store.get(key, now)
    }

    /// Stores `value` under `key`, replacing any previous entry.
    ///
    /// `ttl_override` replaces the store's default TTL for this entry. On a
    /// disabled store this is a no-op.
    pub async fn put(&self, key: impl Into<String>, value: V, ttl_override: Option<Duration>) {
        let now = self.clock.now();
        let mut store = self.inner.write().await;

        if store.default_ttl == Duration::ZERO {
            return;
        }

        store.put(key.into(), value, ttl_override, now);
    }

    /// Removes `key` unconditionally. Returns whether an entry was present.
    pub async fn delete(&self, key: &str) -> bool {
        let mut store = self.inner.write().await;
        store.map.remove(key).is_some()
    }

    /// Removes every key starting with `prefix`. Returns the number removed.
    pub async fn delete_prefix(&self, prefix: &str) -> usize {
        let mut store = self.inner.write().await;
        let before = store.map.len();
        store.map.retain(|key, _| !key.starts_with(prefix));
        before - store.map.len()
    }

    /// Removes expired entries. Returns the number removed.
    pub async fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let mut store = self.inner.write().await;
        store.purge_expired(now)
    }

    /// Clear all entries from the cache.
    pub async fn clear(&self) {
        let mut store = self.inner.write().await;
        store.map.clear();
    }

    /// Number of entries held, expired ones included.
    pub async fn len(&self) -> usize {
        let store = self.inner.read().await;
        store.map.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Check if the cache is disabled (TTL is ZERO).
    pub async fn is_disabled(&self) -> bool {
        let store = self.inner.read().await;
        store.default_ttl == Duration::ZERO
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    fn manual_store(ttl: Duration) -> (CacheStore<String>, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new());
        let store = CacheStore::with_clock(ttl, Arc::clone(&clock) as Arc<dyn Clock>);
        (store, clock)
    }

    #[tokio::test]
    async fn get_returns_value_right_after_put() {
        let (cache, _clock) = manual_store(Duration::from_secs(60));

        assert!(cache.get("key1").await.is_none());
        cache.put("key1", String::from("value1"), None).await;
        assert_eq!(cache.get("key1").await, Some(String::from("value1")));
    }

    #[tokio::test]
    async fn overwrite_keeps_latest_value() {
        let (cache, _clock) = manual_store(Duration::from_secs(60));

        cache.put("key1", String::from("value1"), None).await;
        cache.put("key1", String::from("value2"), None).await;
        assert_eq!(cache.get("key1").await, Some(String::from("value2")));
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn expired_entry_is_evicted_and_not_resurrected_by_rewinding() {
        let (cache, clock) = manual_store(Duration::from_secs(5 * 60));

        cache.put("key1", String::from("value1"), None).await;
        clock.advance(Duration::from_secs(5 * 60));
        assert!(cache.get("key1").await.is_some(), "exactly at ttl is still fresh");

        clock.advance(Duration::from_secs(1));
        assert!(cache.get("key1").await.is_none());
        assert_eq!(cache.len().await, 0, "lookup evicts the stale entry");

        clock.rewind(Duration::from_secs(10 * 60));
        assert!(cache.get("key1").await.is_none());
    }

    #[tokio::test]
    async fn ttl_override_applies_per_entry() {
        let (cache, clock) = manual_store(Duration::from_secs(60 * 60));

        cache
            .put("short", String::from("a"), Some(Duration::from_secs(60)))
            .await;
        cache.put("long", String::from("b"), None).await;

        clock.advance(Duration::from_secs(61));
        assert!(cache.get("short").await.is_none());
        assert_eq!(cache.get("long").await, Some(String::from("b")));
    }

    #[tokio::test]
    async fn unread_expired_entries_stay_until_purged() {
        let (cache, clock) = manual_store(Duration::from_secs(10));

        cache.put("key1", String::from("value1"), None).await;
        cache.put("key2", String::from("value2"), None).await;
        clock.advance(Duration::from_secs(11));
        cache.put("key3", String::from("value3"), None).await;

        assert_eq!(cache.len().await, 3);
        assert_eq!(cache.purge_expired().await, 2);
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn delete_and_delete_prefix_remove_entries() {
        let (cache, _clock) = manual_store(Duration::from_secs(60));

        cache.put("comments:post=1", String::from("a"), None).await;
        cache.put("comments:post=2", String::from("b"), None).await;
        cache.put("posts:limit=5", String::from("c"), None).await;

        assert!(cache.delete("posts:limit=5").await);
        assert!(!cache.delete("posts:limit=5").await);
        assert_eq!(cache.delete_prefix("comments:").await, 2);
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn clear_drops_everything() {
        let (cache, _clock) = manual_store(Duration::from_secs(60));

        cache.put("key1", String::from("value1"), None).await;
        cache.put("key2", String::from("value2"), None).await;
        cache.clear().await;
        assert_eq!(cache.len().await, 0);
    }

    #[tokio::test]
    async fn disabled_cache_ignores_puts() {
        let cache: CacheStore<String> = CacheStore::disabled();

        assert!(cache.is_disabled().await);
        cache.put("key1", String::from("value1"), None).await;
        assert!(cache.get("key1").await.is_none());
        assert_eq!(cache.len().await, 0);
    }

    #[tokio::test]
    async fn clones_share_entries() {
        let (cache, _clock) = manual_store(Duration::from_secs(60));
        let other = cache.clone();

        cache.put("key1", String::from("value1"), None).await;
        assert_eq!(other.get("key1").await, Some(String::from("value1")));
    }
}
