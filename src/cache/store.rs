//! Cache Store Module
//!
//! Bounded TTL cache combining HashMap storage with FIFO eviction, lazy
//! expiry and prefix invalidation.

use std::collections::HashMap;
use std::time::Duration;

use tracing::debug;

use crate::cache::stats::format_hit_rate;
use crate::cache::{CacheEntry, CacheStats, HitCounter, InsertionOrder};

// == Cache Store ==
/// In-memory read cache.
///
/// Invariant: `len() <= max_size` after every mutating call. When disabled,
/// every lookup misses and nothing is stored or counted.
#[derive(Debug)]
pub struct CacheStore<V> {
    /// Key-value storage
    entries: HashMap<String, CacheEntry<V>>,
    /// FIFO insertion tracker
    order: InsertionOrder,
    /// Hit/miss counters
    counter: HitCounter,
    max_size: usize,
    ttl: Duration,
    enabled: bool,
    /// Bumped by every invalidation, so loads that started earlier can be
    /// told apart from loads that saw the write
    generation: u64,
}

impl<V: Clone> CacheStore<V> {
    // == Constructor ==
    /// Creates an enabled cache.
    ///
    /// # Arguments
    /// * `max_size` - Maximum number of entries the cache can hold
    /// * `ttl` - Lifetime applied to every entry
    pub fn new(max_size: usize, ttl: Duration) -> Self {
        Self {
            entries: HashMap::new(),
            order: InsertionOrder::new(),
            counter: HitCounter::new(),
            max_size,
            ttl,
            enabled: true,
            generation: 0,
        }
    }

    /// Switches the cache on or off.
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Creates a cache from the `CACHE_*` settings.
    pub fn from_config(config: &crate::config::Config) -> Self {
        Self::new(config.cache_max_size, config.cache_ttl()).enabled(config.cache_enabled)
    }

    // == Get ==
    /// Returns a clone of the cached value if present and fresh.
    ///
    /// Expired entries are removed on the spot and count as misses.
    pub fn get(&mut self, key: &str) -> Option<V> {
        if !self.enabled {
            return None;
        }

        let expired = match self.entries.get(key) {
            Some(entry) if !entry.is_expired() => {
                self.counter.record_hit();
                return Some(entry.value.clone());
            }
            Some(_) => true,
            None => false,
        };

        if expired {
            self.entries.remove(key);
            self.order.remove(key);
            debug!(key, "cache entry expired");
        }
        self.counter.record_miss();
        None
    }

    // == Set ==
    /// Stores a value, resetting its expiry.
    ///
    /// A new key at capacity evicts the oldest inserted entry first. An
    /// overwritten key keeps its original position in the eviction queue.
    pub fn set(&mut self, key: impl Into<String>, value: V) {
        if !self.enabled || self.max_size == 0 {
            return;
        }

        let key = key.into();
        let entry = CacheEntry::new(value, self.ttl);

        if let Some(existing) = self.entries.get_mut(&key) {
            *existing = entry;
            return;
        }

        while self.entries.len() >= self.max_size {
            match self.order.pop_oldest() {
                Some(oldest) => {
                    self.entries.remove(&oldest);
                    debug!(key = %oldest, "evicted oldest cache entry");
                }
                None => break,
            }
        }

        self.order.push(&key);
        self.entries.insert(key, entry);
    }

    /// Stores a value only if no invalidation happened since `generation`
    /// was read. Returns whether the value was stored.
    pub fn set_if_generation(
        &mut self,
        key: impl Into<String>,
        value: V,
        generation: u64,
    ) -> bool {
        if self.generation != generation {
            return false;
        }
        self.set(key, value);
        true
    }

    /// Current invalidation generation.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    // == Delete ==
    /// Removes a single key. Returns whether it was present.
    pub fn delete(&mut self, key: &str) -> bool {
        if self.entries.remove(key).is_some() {
            self.order.remove(key);
            true
        } else {
            false
        }
    }

    // == Invalidate ==
    /// Removes every key starting with `prefix` and returns how many went.
    ///
    /// Keys merely containing the prefix elsewhere are left alone.
    pub fn invalidate(&mut self, prefix: &str) -> usize {
        self.generation = self.generation.wrapping_add(1);
        if !self.enabled {
            return 0;
        }

        let before = self.entries.len();
        self.entries.retain(|key, _| !key.starts_with(prefix));
        self.order.remove_prefix(prefix);
        let removed = before - self.entries.len();

        if removed > 0 {
            debug!(prefix, removed, "invalidated cache entries");
        }
        removed
    }

    /// Invalidates several prefixes in one call.
    pub fn invalidate_all<'a>(&mut self, prefixes: impl IntoIterator<Item = &'a str>) -> usize {
        prefixes
            .into_iter()
            .map(|prefix| self.invalidate(prefix))
            .sum()
    }

    // == Clear ==
    /// Drops every entry. Hit/miss counters are kept.
    pub fn clear(&mut self) {
        self.generation = self.generation.wrapping_add(1);
        self.entries.clear();
        self.order.clear();
    }

    // == Stats ==
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            enabled: self.enabled,
            size: self.entries.len(),
            max_size: self.max_size,
            ttl_seconds: self.ttl.as_secs_f64(),
            hits: self.counter.hits,
            misses: self.counter.misses,
            hit_rate: format_hit_rate(&self.counter),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Keys from oldest to newest insertion.
    pub fn keys_in_order(&self) -> Vec<String> {
        self.order.iter().map(str::to_string).collect()
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::advance;

    const TTL: Duration = Duration::from_secs(30);

    #[tokio::test(start_paused = true)]
    async fn test_store_set_and_get() {
        let mut store = CacheStore::new(100, TTL);

        store.set("funds:1", "alpha".to_string());

        assert_eq!(store.get("funds:1").as_deref(), Some("alpha"));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_store_get_nonexistent_counts_miss() {
        let mut store: CacheStore<String> = CacheStore::new(100, TTL);

        assert!(store.get("funds:missing").is_none());

        let stats = store.stats();
        assert_eq!(stats.hits, 0);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.hit_rate, "0.00%");
    }

    #[tokio::test(start_paused = true)]
    async fn test_store_fifo_eviction() {
        let mut store = CacheStore::new(3, TTL);

        store.set("a", 1);
        store.set("b", 2);
        store.set("c", 3);
        store.set("d", 4);

        assert_eq!(store.len(), 3);
        assert!(!store.contains_key("a"));
        assert_eq!(store.keys_in_order(), vec!["b", "c", "d"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_store_get_does_not_refresh_position() {
        let mut store = CacheStore::new(2, TTL);

        store.set("a", 1);
        store.set("b", 2);
        assert_eq!(store.get("a"), Some(1));

        store.set("c", 3);

        assert!(!store.contains_key("a"));
        assert!(store.contains_key("b"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_store_overwrite_keeps_position() {
        let mut store = CacheStore::new(2, TTL);

        store.set("a", 1);
        store.set("b", 2);
        store.set("a", 10);
        store.set("c", 3);

        // "a" was inserted first, the overwrite did not renew its place
        assert!(!store.contains_key("a"));
        assert_eq!(store.get("b"), Some(2));
        assert_eq!(store.get("c"), Some(3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_store_overwrite_resets_ttl() {
        let mut store = CacheStore::new(10, TTL);

        store.set("a", 1);
        advance(Duration::from_secs(20)).await;
        store.set("a", 2);
        advance(Duration::from_secs(20)).await;

        assert_eq!(store.get("a"), Some(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_store_ttl_expiration() {
        let mut store = CacheStore::new(10, Duration::from_secs(1));

        store.set("funds:1", 1);
        assert_eq!(store.get("funds:1"), Some(1));

        advance(Duration::from_millis(1100)).await;

        assert_eq!(store.get("funds:1"), None);
        assert!(store.is_empty());
        let stats = store.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_store_invalidate_prefix() {
        let mut store = CacheStore::new(10, TTL);

        store.set("funds:list:0:100", 1);
        store.set("funds:42", 2);
        store.set("investors:list:0:100", 3);
        store.set("investments:funds:7", 4);

        let removed = store.invalidate("funds:");

        assert_eq!(removed, 2);
        assert!(store.contains_key("investors:list:0:100"));
        // only a prefix match counts
        assert!(store.contains_key("investments:funds:7"));
        assert_eq!(store.keys_in_order().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_store_invalidate_all() {
        let mut store = CacheStore::new(10, TTL);

        store.set("funds:1", 1);
        store.set("investors:1", 2);
        store.set("investments:1", 3);

        assert_eq!(store.invalidate_all(["funds:", "investors:"]), 2);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_store_disabled_is_inert() {
        let mut store = CacheStore::new(10, TTL).enabled(false);

        store.set("funds:1", 1);

        assert_eq!(store.get("funds:1"), None);
        assert_eq!(store.invalidate("funds:"), 0);
        let stats = store.stats();
        assert!(!stats.enabled);
        assert_eq!(stats.size, 0);
        assert_eq!(stats.misses, 0);
        assert_eq!(stats.hit_rate, "0%");
    }

    #[tokio::test(start_paused = true)]
    async fn test_store_zero_capacity_never_stores() {
        let mut store = CacheStore::new(0, TTL);
        store.set("a", 1);
        assert!(store.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_store_clear_keeps_counters() {
        let mut store = CacheStore::new(10, TTL);
        store.set("a", 1);
        store.get("a");
        store.clear();

        assert!(store.is_empty());
        assert!(store.keys_in_order().is_empty());
        assert_eq!(store.stats().hits, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_store_invalidation_rejects_older_loads() {
        let mut store = CacheStore::new(10, TTL);
        let before = store.generation();

        store.invalidate("funds:");
        assert!(!store.set_if_generation("funds:list:0:100", 1, before));
        assert!(!store.contains_key("funds:list:0:100"));

        let current = store.generation();
        assert!(store.set_if_generation("funds:list:0:100", 2, current));
        assert_eq!(store.get("funds:list:0:100"), Some(2));

        store.clear();
        assert_ne!(store.generation(), current);
        store.invalidate_all(["investors:"]);
        assert!(!store.set_if_generation("funds:1", 3, current));
    }

    #[tokio::test(start_paused = true)]
    async fn test_store_delete() {
        let mut store = CacheStore::new(10, TTL);
        store.set("a", 1);

        assert!(store.delete("a"));
        assert!(!store.delete("a"));
        assert!(store.keys_in_order().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_store_stats_shape() {
        let mut store = CacheStore::new(1000, TTL);
        store.set("a", 1);
        store.get("a");

        let json = serde_json::to_value(store.stats()).unwrap();
        assert_eq!(json["enabled"], true);
        assert_eq!(json["size"], 1);
        assert_eq!(json["max_size"], 1000);
        assert_eq!(json["ttl_seconds"], 30.0);
        assert_eq!(json["hits"], 1);
        assert_eq!(json["misses"], 0);
        assert_eq!(json["hit_rate"], "100.00%");
    }
}
