//! Monotonic sequence allocation
//!
//! Each named counter stores only its end value. Allocation hands out the
//! half-open range `[current, current + step)` and advances the stored end;
//! the end value never decreases except by an explicit reset, which removes
//! the record entirely.

use std::collections::BTreeMap;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use terrane_core::{ByteKey, Error, Region, Result, Sequence};

/// Allocates monotonically increasing ranges from named counters
#[derive(Debug, Default)]
pub struct SequenceAllocator {
    counters: DashMap<ByteKey, i64>,
}

impl SequenceAllocator {
    /// Create an empty allocator.
    pub fn new() -> Self {
        SequenceAllocator::default()
    }

    /// Allocate `[current, current + step)` from the counter at `key`.
    ///
    /// A negative step is rejected. A zero step reads the current end
    /// without mutating. The end value saturates instead of wrapping, so it
    /// can never fall below the start.
    pub fn next(&self, key: &[u8], step: i64) -> Result<Sequence> {
        if step < 0 {
            return Err(Error::InvalidArgument("step must be >= 0".to_string()));
        }
        match self.counters.entry(ByteKey::from(key)) {
            Entry::Occupied(mut entry) => {
                let start = *entry.get();
                if step == 0 {
                    return Ok(Sequence::new(start, start));
                }
                let end = start.saturating_add(step);
                if end != start {
                    entry.insert(end);
                }
                Ok(Sequence::new(start, end))
            }
            Entry::Vacant(entry) => {
                if step == 0 {
                    return Ok(Sequence::new(0, 0));
                }
                entry.insert(step);
                Ok(Sequence::new(0, step))
            }
        }
    }

    /// Remove the counter at `key` unconditionally.
    pub fn reset(&self, key: &[u8]) {
        self.counters.remove(&ByteKey::from(key));
    }

    /// Counters whose keys fall in `region`, for checkpointing.
    ///
    /// The full-range sentinel region passes everything through.
    pub fn filtered(&self, region: &Region) -> BTreeMap<Vec<u8>, i64> {
        self.counters
            .iter()
            .filter(|entry| region.is_full_range() || region.contains(entry.key().as_slice()))
            .map(|entry| (entry.key().as_slice().to_vec(), *entry.value()))
            .collect()
    }

    /// Merge counters in by insert, overwriting existing keys.
    pub fn absorb(&self, counters: BTreeMap<Vec<u8>, i64>) {
        for (key, end) in counters {
            self.counters.insert(ByteKey::from(key), end);
        }
    }

    /// Number of live counters.
    pub fn len(&self) -> usize {
        self.counters.len()
    }

    /// Whether no counters are live.
    pub fn is_empty(&self) -> bool {
        self.counters.is_empty()
    }

    /// Remove every counter.
    pub fn clear(&self) {
        self.counters.clear();
    }
}
