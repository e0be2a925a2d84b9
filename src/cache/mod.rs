//! Cache Module
//!
//! Provides an in-memory read cache with TTL expiration, FIFO eviction and
//! prefix invalidation.

mod entry;
mod fifo;
mod stats;
mod store;


use std::sync::Arc;

use tokio::sync::RwLock;

// Re-export public types
pub use entry::CacheEntry;
pub use fifo::InsertionOrder;
pub use stats::{format_hit_rate, CacheStats, HitCounter};
pub use store::CacheStore;

/// Cache handle shared between services and the health endpoint.
///
/// Lookups take the write lock since they update counters and drop expired entries.
pub type SharedCache<V> = Arc<RwLock<CacheStore<V>>>;

/// Wraps a cache for sharing across tasks.
pub fn shared<V>(store: CacheStore<V>) -> SharedCache<V> {
    Arc::new(RwLock::new(store))
}
