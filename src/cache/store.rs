//! TTL Cache Module
//!
//! Main cache engine: a mutex-guarded HashMap with lazy expiry on read and an
//! explicit sweep. No timers are started by the cache itself.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use tokio::time::Instant;
use tracing::debug;

use crate::cache::{CacheEntry, CacheStats};

#[derive(Debug)]
struct Inner<V> {
    entries: HashMap<String, CacheEntry<V>>,
    stats: CacheStats,
}

// == TTL Cache ==
/// Time-bounded key/value cache.
///
/// All methods take `&self`; share the cache across tasks with `Arc`.
#[derive(Debug)]
pub struct TtlCache<V> {
    inner: Mutex<Inner<V>>,
    /// TTL applied when `set` receives None
    default_ttl: Duration,
}

impl<V: Clone> TtlCache<V> {
    // == Constructor ==
    /// Creates an empty cache.
    ///
    /// # Arguments
    /// * `default_ttl` - TTL for entries stored without an explicit TTL
    pub fn new(default_ttl: Duration) -> Self {
        Self {
            inner: Mutex::new(Inner {
                entries: HashMap::new(),
                stats: CacheStats::new(),
            }),
            default_ttl,
        }
    }

    // == Set ==
    /// Stores a value, overwriting any entry under `key` and resetting its clock.
    ///
    /// # Arguments
    /// * `key` - The key to store
    /// * `value` - The value to store
    /// * `ttl` - Optional TTL (uses the default TTL if None)
    pub fn set(&self, key: impl Into<String>, value: V, ttl: Option<Duration>) {
        let ttl = ttl.unwrap_or(self.default_ttl);
        let mut inner = self.lock();
        inner.entries.insert(key.into(), CacheEntry::new(value, ttl));
        let len = inner.entries.len();
        inner.stats.set_total_entries(len);
    }

    // == Get ==
    /// Retrieves a value by key.
    ///
    /// Returns None if the key is absent or its TTL has elapsed; an expired
    /// entry is removed as a side effect.
    pub fn get(&self, key: &str) -> Option<V> {
        let mut guard = self.lock();
        let inner = &mut *guard;

        let expired = match inner.entries.get(key) {
            Some(entry) if !entry.is_expired() => {
                let value = entry.value.clone();
                inner.stats.record_hit();
                return Some(value);
            }
            Some(_) => true,
            None => false,
        };

        if expired {
            inner.entries.remove(key);
            inner.stats.record_expirations(1);
            let len = inner.entries.len();
            inner.stats.set_total_entries(len);
            debug!(key, "evicted expired cache entry on read");
        }
        inner.stats.record_miss();
        None
    }

    // == Get Or Insert ==
    /// Read-through lookup: returns the cached value, or runs `fetch`,
    /// stores its output under `key` and returns it.
    ///
    /// The lock is not held while `fetch` runs, so two concurrent misses on
    /// the same key may both fetch; the later write wins.
    pub async fn get_or_try_insert_with<F, Fut, E>(
        &self,
        key: &str,
        ttl: Option<Duration>,
        fetch: F,
    ) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        if let Some(value) = self.get(key) {
            debug!(key, "cache hit");
            return Ok(value);
        }

        let value = fetch().await?;
        self.set(key, value.clone(), ttl);
        Ok(value)
    }

    // == Remove ==
    /// Removes an entry by key. Returns true if an entry was present.
    pub fn remove(&self, key: &str) -> bool {
        let mut inner = self.lock();
        let removed = inner.entries.remove(key).is_some();
        let len = inner.entries.len();
        inner.stats.set_total_entries(len);
        removed
    }

    // == Clear ==
    /// Removes all entries unconditionally.
    pub fn clear(&self) {
        let mut inner = self.lock();
        inner.entries.clear();
        inner.stats.set_total_entries(0);
    }

    // == Cleanup ==
    /// Evicts every expired entry without requiring a `get`.
    ///
    /// Returns the number of entries removed.
    pub fn cleanup(&self) -> usize {
        let now = Instant::now();
        let mut inner = self.lock();

        let before = inner.entries.len();
        inner.entries.retain(|_, entry| !entry.is_expired_at(now));
        let removed = before - inner.entries.len();

        inner.stats.record_expirations(removed);
        let len = inner.entries.len();
        inner.stats.set_total_entries(len);
        removed
    }

    // == Stats ==
    /// Returns a snapshot of the cache statistics.
    pub fn stats(&self) -> CacheStats {
        self.lock().stats.clone()
    }

    /// Number of stored entries, expired ones included until swept.
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().entries.is_empty()
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    fn lock(&self) -> MutexGuard<'_, Inner<V>> {
        // Entry map updates are single inserts/removes; a poisoned guard is still consistent.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl<V: Clone> Default for TtlCache<V> {
    fn default() -> Self {
        Self::new(super::DEFAULT_CACHE_TTL)
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_cache_new() {
        let cache: TtlCache<String> = TtlCache::new(Duration::from_secs(300));
        assert_eq!(cache.len(), 0);
        assert!(cache.is_empty());
        assert_eq!(cache.default_ttl(), Duration::from_secs(300));
    }

    #[test]
    fn test_cache_set_and_get() {
        let cache = TtlCache::new(Duration::from_secs(300));

        cache.set("key1", "value1".to_string(), None);

        assert_eq!(cache.get("key1").as_deref(), Some("value1"));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_cache_get_nonexistent() {
        let cache: TtlCache<String> = TtlCache::default();
        assert!(cache.get("nonexistent").is_none());
    }

    #[test]
    fn test_cache_overwrite() {
        let cache = TtlCache::new(Duration::from_secs(300));

        cache.set("key1", 1, None);
        cache.set("key1", 2, None);

        assert_eq!(cache.get("key1"), Some(2));
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cache_ttl_expiration() {
        let cache = TtlCache::new(Duration::from_secs(300));
        cache.set("key1", "value1", Some(Duration::from_secs(1)));

        assert!(cache.get("key1").is_some());

        tokio::time::advance(Duration::from_millis(1001)).await;

        assert!(cache.get("key1").is_none());
        // Lazy eviction removed the entry
        assert_eq!(cache.len(), 0);
        assert_eq!(cache.stats().expirations, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_overwrite_resets_clock() {
        let cache = TtlCache::new(Duration::from_secs(300));
        cache.set("key1", "old", Some(Duration::from_secs(1)));

        tokio::time::advance(Duration::from_millis(800)).await;
        cache.set("key1", "new", Some(Duration::from_secs(1)));
        tokio::time::advance(Duration::from_millis(800)).await;

        assert_eq!(cache.get("key1"), Some("new"));
    }

    #[test]
    fn test_cache_clear() {
        let cache = TtlCache::new(Duration::from_secs(300));
        cache.set("a", 1, None);
        cache.set("b", 2, None);

        cache.clear();

        assert!(cache.get("a").is_none());
        assert!(cache.get("b").is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_cache_remove() {
        let cache = TtlCache::new(Duration::from_secs(300));
        cache.set("a", 1, None);

        assert!(cache.remove("a"));
        assert!(!cache.remove("a"));
        assert!(cache.get("a").is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cache_cleanup_only_removes_expired() {
        let cache = TtlCache::new(Duration::from_secs(300));
        cache.set("short", 1, Some(Duration::from_secs(1)));
        cache.set("long", 2, Some(Duration::from_secs(10)));

        tokio::time::advance(Duration::from_secs(2)).await;

        let removed = cache.cleanup();
        assert_eq!(removed, 1);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("long"), Some(2));
    }

    #[test]
    fn test_cache_stats() {
        let cache = TtlCache::new(Duration::from_secs(300));

        cache.set("key1", 1, None);
        cache.get("key1"); // hit
        cache.get("nonexistent"); // miss

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.total_entries, 1);
    }

    #[tokio::test]
    async fn test_get_or_try_insert_with_fetches_once() {
        let cache = TtlCache::new(Duration::from_secs(60));
        let calls = Arc::new(std::sync::atomic::AtomicUsize::new(0));

        for _ in 0..3 {
            let calls = Arc::clone(&calls);
            let value = cache
                .get_or_try_insert_with("k", None, || async move {
                    calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
                    Ok::<_, String>(42)
                })
                .await
                .unwrap();
            assert_eq!(value, 42);
        }

        assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_get_or_try_insert_with_does_not_cache_errors() {
        let cache: TtlCache<u32> = TtlCache::new(Duration::from_secs(60));

        let result = cache
            .get_or_try_insert_with("k", None, || async { Err::<u32, _>("down") })
            .await;

        assert_eq!(result, Err("down"));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_concurrent_readers_and_writers() {
        let cache = Arc::new(TtlCache::new(Duration::from_secs(60)));

        let handles: Vec<_> = (0..8)
            .map(|t| {
                let cache = Arc::clone(&cache);
                std::thread::spawn(move || {
                    for i in 0..200 {
                        let key = format!("k{}", i % 20);
                        cache.set(key.clone(), t * 1000 + i, None);
                        cache.get(&key);
                        if i % 50 == 0 {
                            cache.cleanup();
                        }
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(cache.len(), 20);
    }
}
