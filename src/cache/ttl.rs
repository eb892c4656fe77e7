//! Bounded in-memory store with per-entry expiry.

use super::key::{log_prefix, CacheKey};
use super::CacheStats;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use tracing::{debug, info};

#[derive(Clone)]
struct CacheEntry<V> {
    value: V,
    created_at: Instant,
    expires_at: Instant,
    /// Insertion counter; breaks ties between entries created in the same instant.
    seq: u64,
}

impl<V> CacheEntry<V> {
    fn is_expired(&self, now: Instant) -> bool {
        now > self.expires_at
    }
}

struct Inner<V> {
    entries: HashMap<String, CacheEntry<V>>,
    hits: u64,
    misses: u64,
    next_seq: u64,
}

/// Thread-safe TTL cache.
///
/// Capacity eviction removes the entry created first (FIFO), regardless of
/// how recently it was read. The lock is only held for the map operation
/// itself, so callers may share one instance across tasks freely.
pub struct TtlCache<V> {
    name: &'static str,
    inner: Mutex<Inner<V>>,
    default_ttl: Duration,
    max_entries: usize,
}

impl<V: Clone> TtlCache<V> {
    pub fn new(name: &'static str, default_ttl: Duration, max_entries: usize) -> Self {
        Self {
            name,
            inner: Mutex::new(Inner {
                entries: HashMap::new(),
                hits: 0,
                misses: 0,
                next_seq: 0,
            }),
            default_ttl,
            max_entries: max_entries.max(1),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    fn lock(&self) -> MutexGuard<'_, Inner<V>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn get(&self, key: &CacheKey) -> Option<V> {
        let now = Instant::now();
        let mut inner = self.lock();

        match inner.entries.get(key.as_str()).map(|e| e.is_expired(now)) {
            None => {
                inner.misses += 1;
                return None;
            }
            Some(true) => {
                inner.entries.remove(key.as_str());
                inner.misses += 1;
                debug!(cache = self.name, key = key.short(), "cache entry expired");
                return None;
            }
            Some(false) => {}
        }

        inner.hits += 1;
        let entry = inner.entries.get(key.as_str())?;
        debug!(
            cache = self.name,
            key = key.short(),
            age_secs = now.duration_since(entry.created_at).as_secs_f64(),
            "cache hit"
        );
        Some(entry.value.clone())
    }

    pub fn set(&self, key: &CacheKey, value: V) {
        self.set_with_ttl(key, value, self.default_ttl);
    }

    pub fn set_with_ttl(&self, key: &CacheKey, value: V, ttl: Duration) {
        let now = Instant::now();
        let mut inner = self.lock();

        if !inner.entries.contains_key(key.as_str()) && inner.entries.len() >= self.max_entries {
            Self::evict_oldest(self.name, &mut inner);
        }

        let seq = inner.next_seq;
        inner.next_seq += 1;
        inner.entries.insert(
            key.hash.clone(),
            CacheEntry {
                value,
                created_at: now,
                expires_at: now + ttl,
                seq,
            },
        );
        debug!(
            cache = self.name,
            key = key.short(),
            ttl_secs = ttl.as_secs_f64(),
            "cached value"
        );
    }

    fn evict_oldest(name: &str, inner: &mut Inner<V>) {
        let oldest = inner
            .entries
            .iter()
            .min_by_key(|(_, e)| (e.created_at, e.seq))
            .map(|(k, _)| k.clone());
        if let Some(k) = oldest {
            inner.entries.remove(&k);
            debug!(cache = name, key = log_prefix(&k), "evicted oldest cache entry");
        }
    }

    pub fn clear(&self) {
        let mut inner = self.lock();
        let count = inner.entries.len();
        inner.entries.clear();
        info!(cache = self.name, count, "cleared cache entries");
    }

    /// Remove every expired entry and return how many were dropped.
    pub fn cleanup_expired(&self) -> usize {
        let now = Instant::now();
        let mut inner = self.lock();
        let before = inner.entries.len();
        inner.entries.retain(|_, e| !e.is_expired(now));
        let removed = before - inner.entries.len();
        if removed > 0 {
            info!(cache = self.name, removed, "cleaned up expired cache entries");
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        let inner = self.lock();
        CacheStats::new(inner.entries.len(), self.max_entries, inner.hits, inner.misses)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cache(ttl_ms: u64, max: usize) -> TtlCache<String> {
        TtlCache::new("test", Duration::from_millis(ttl_ms), max)
    }

    #[test]
    fn test_get_returns_value_before_expiry() {
        let cache = cache(60_000, 10);
        let key = CacheKey::from("k");
        cache.set(&key, "v".to_string());
        assert_eq!(cache.get(&key).as_deref(), Some("v"));
        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 0);
    }

    #[test]
    fn test_expired_entry_is_removed_and_counted_as_miss() {
        let cache = cache(20, 10);
        let key = CacheKey::from("k");
        cache.set(&key, "v".to_string());
        std::thread::sleep(Duration::from_millis(40));

        assert_eq!(cache.get(&key), None);
        assert_eq!(cache.len(), 0);
        let stats = cache.stats();
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.hits, 0);
    }

    #[test]
    fn test_per_entry_ttl_overrides_default() {
        let cache = cache(60_000, 10);
        let short = CacheKey::from("short");
        let long = CacheKey::from("long");
        cache.set_with_ttl(&short, "s".to_string(), Duration::from_millis(10));
        cache.set(&long, "l".to_string());
        std::thread::sleep(Duration::from_millis(30));

        assert_eq!(cache.get(&short), None);
        assert_eq!(cache.get(&long).as_deref(), Some("l"));
    }

    #[test]
    fn test_capacity_evicts_earliest_created_not_least_recently_used() {
        let cache = cache(60_000, 3);
        let (a, b, c, d) = (
            CacheKey::from("a"),
            CacheKey::from("b"),
            CacheKey::from("c"),
            CacheKey::from("d"),
        );
        cache.set(&a, "a".to_string());
        cache.set(&b, "b".to_string());
        cache.set(&c, "c".to_string());

        // Reading `a` must not protect it: eviction is by creation time.
        assert!(cache.get(&a).is_some());
        cache.set(&d, "d".to_string());

        assert_eq!(cache.len(), 3);
        assert_eq!(cache.get(&a), None);
        assert!(cache.get(&b).is_some());
        assert!(cache.get(&c).is_some());
        assert!(cache.get(&d).is_some());
    }

    #[test]
    fn test_evicting_non_ascii_key() {
        let cache = cache(60_000, 1);
        let first = CacheKey::from("niveau d'acidité du sol");
        let second = CacheKey::from("croissance des plantes");
        cache.set(&first, "a".to_string());
        cache.set(&second, "b".to_string());

        assert_eq!(cache.get(&first), None);
        assert_eq!(cache.get(&second).as_deref(), Some("b"));
    }

    #[test]
    fn test_overwriting_existing_key_does_not_evict() {
        let cache = cache(60_000, 2);
        let (a, b) = (CacheKey::from("a"), CacheKey::from("b"));
        cache.set(&a, "a1".to_string());
        cache.set(&b, "b".to_string());
        cache.set(&a, "a2".to_string());

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get(&a).as_deref(), Some("a2"));
        assert_eq!(cache.get(&b).as_deref(), Some("b"));
    }

    #[test]
    fn test_clear_and_cleanup_expired() {
        let cache = cache(10, 10);
        cache.set(&CacheKey::from("x"), "x".to_string());
        cache.set_with_ttl(&CacheKey::from("y"), "y".to_string(), Duration::from_secs(60));
        std::thread::sleep(Duration::from_millis(30));

        assert_eq!(cache.cleanup_expired(), 1);
        assert_eq!(cache.len(), 1);

        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_stats_hit_rate() {
        let cache = cache(60_000, 5);
        let key = CacheKey::from("k");
        assert!(cache.get(&key).is_none());
        cache.set(&key, "v".to_string());
        assert!(cache.get(&key).is_some());

        let stats = cache.stats();
        assert_eq!(stats.size, 1);
        assert_eq!(stats.max_size, 5);
        assert_eq!(stats.total_requests, 2);
        assert_eq!(stats.hit_rate, "50.0%");
    }
}
