//! Insertion Order Module
//!
//! Remembers the order in which keys first entered the cache so the oldest
//! one can be evicted when capacity is reached.

use std::collections::VecDeque;

// == Insertion Order ==
/// FIFO queue of live cache keys.
///
/// Front = oldest insertion, back = newest. Re-inserting a key that is
/// already tracked does not move it.
#[derive(Debug, Default)]
pub struct InsertionOrder {
    order: VecDeque<String>,
}

impl InsertionOrder {
    pub fn new() -> Self {
        Self::default()
    }

    // == Push ==
    /// Appends a newly inserted key at the back of the queue.
    pub fn push(&mut self, key: &str) {
        self.order.push_back(key.to_string());
    }

    // == Remove ==
    /// Drops a key that left the cache through delete, expiry or invalidation.
    pub fn remove(&mut self, key: &str) {
        if let Some(pos) = self.order.iter().position(|k| k == key) {
            self.order.remove(pos);
        }
    }

    // == Remove Prefix ==
    /// Drops every tracked key starting with `prefix`.
    pub fn remove_prefix(&mut self, prefix: &str) {
        self.order.retain(|k| !k.starts_with(prefix));
    }

    // == Pop Oldest ==
    /// Returns and forgets the oldest key, or None when empty.
    pub fn pop_oldest(&mut self) -> Option<String> {
        self.order.pop_front()
    }

    pub fn clear(&mut self) {
        self.order.clear();
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Keys from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }
}
