//! Fencing-token allocation
//!
//! A fencing token is a strictly increasing i64 per key, handed to each new
//! lock holder so downstream services can reject writes from stale holders.
//! Token space is effectively inexhaustible: at one million allocations per
//! second the i64 range lasts hundreds of thousands of years.

use std::collections::BTreeMap;

use dashmap::DashMap;

use terrane_core::{nil_to_empty, ByteKey, Region};

/// Allocates strictly increasing fencing tokens per key
#[derive(Debug, Default)]
pub struct FencingAllocator {
    counters: DashMap<ByteKey, i64>,
}

impl FencingAllocator {
    /// Create an empty allocator.
    pub fn new() -> Self {
        FencingAllocator::default()
    }

    /// Increment the counter at `key` and return the new token.
    ///
    /// An absent counter starts at 1. The key is normalized, mapping absent
    /// to empty, so callers may pass `None` for the default fencing key.
    pub fn next_token(&self, key: Option<&[u8]>) -> i64 {
        let key = ByteKey::from(nil_to_empty(key));
        let mut entry = self.counters.entry(key).or_insert(0);
        *entry += 1;
        *entry
    }

    /// Current counter value without allocating; `None` when absent.
    pub fn current(&self, key: Option<&[u8]>) -> Option<i64> {
        self.counters
            .get(&ByteKey::from(nil_to_empty(key)))
            .map(|entry| *entry)
    }

    /// Seed `child_key` from `parent_key`'s current value.
    ///
    /// Used when a region splits: the child's subsequent tokens continue the
    /// parent's monotonic sequence. No-op when the parent has no counter.
    pub fn init_child(&self, parent_key: Option<&[u8]>, child_key: &[u8]) {
        let parent = ByteKey::from(nil_to_empty(parent_key));
        if let Some(value) = self.counters.get(&parent).map(|entry| *entry) {
            self.counters.insert(ByteKey::from(child_key), value);
        }
    }

    /// Counters whose keys fall in `region`, for checkpointing.
    pub fn filtered(&self, region: &Region) -> BTreeMap<Vec<u8>, i64> {
        self.counters
            .iter()
            .filter(|entry| region.is_full_range() || region.contains(entry.key().as_slice()))
            .map(|entry| (entry.key().as_slice().to_vec(), *entry.value()))
            .collect()
    }

    /// Merge counters in by insert, overwriting existing keys.
    pub fn absorb(&self, counters: BTreeMap<Vec<u8>, i64>) {
        for (key, value) in counters {
            self.counters.insert(ByteKey::from(key), value);
        }
    }

    /// Remove every counter.
    pub fn clear(&self) {
        self.counters.clear();
    }
}
