//! Cache Statistics Module
//!
//! Tracks hit/miss counters and renders the report exposed on the health endpoint.

use serde::Serialize;

// == Hit Counter ==
/// Lookup counters accumulated over the lifetime of a cache.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HitCounter {
    /// Lookups answered from the cache
    pub hits: u64,
    /// Lookups that found nothing or an expired entry
    pub misses: u64,
}

impl HitCounter {
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// Fraction of lookups that hit, or None before the first lookup.
    pub fn hit_rate(&self) -> Option<f64> {
        let total = self.hits + self.misses;
        if total == 0 {
            None
        } else {
            Some(self.hits as f64 / total as f64)
        }
    }

    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }
}

// == Cache Stats ==
/// Point-in-time snapshot of a cache, serialized as-is into health reports.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CacheStats {
    pub enabled: bool,
    /// Live entries, including ones that expired but were not accessed yet
    pub size: usize,
    pub max_size: usize,
    pub ttl_seconds: f64,
    pub hits: u64,
    pub misses: u64,
    /// Percentage with two decimals, e.g. "89.51%", or "0%" before any lookup
    pub hit_rate: String,
}

/// Formats a hit ratio the way the health endpoint reports it.
pub fn format_hit_rate(counter: &HitCounter) -> String {
    match counter.hit_rate() {
        Some(rate) => format!("{:.2}%", rate * 100.0),
        None => "0%".to_string(),
    }
}
