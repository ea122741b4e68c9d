//! OrderedStore: the byte-keyed ordered primary store
//!
//! This module implements the primary store using:
//! - `BTreeMap<Vec<u8>, Vec<u8>>` for ordered key storage
//! - `parking_lot::RwLock` for thread-safe access
//!
//! # Design Notes
//!
//! - Keys iterate in unsigned lexicographic order; `[u8]` ordering is the
//!   authoritative comparator for range boundaries and region membership
//! - Range queries are half-open `[start, end)`; an absent end means the
//!   tail of the keyspace
//! - Point mutations (`put`, `get_and_put`, `put_if_absent`, `merge`,
//!   `delete`) take the write lock, so each is linearizable per key
//! - Scans take the read lock and copy out, so they observe a consistent
//!   view without blocking other readers

use std::collections::BTreeMap;
use std::collections::HashMap;
use std::ops::Bound::{Excluded, Included, Unbounded};
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use terrane_core::{nil_to_empty, ByteKey};

/// Single comma byte inserted between merged values
const MERGE_DELIMITER: u8 = b',';

/// One scan result entry; `value` is omitted for key-only scans
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KvEntry {
    /// Entry key
    pub key: Vec<u8>,
    /// Entry value, absent when the scan requested keys only
    pub value: Option<Vec<u8>>,
}

impl KvEntry {
    /// Create an entry with a value.
    pub fn new(key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) -> Self {
        KvEntry {
            key: key.into(),
            value: Some(value.into()),
        }
    }

    /// Create a key-only entry.
    pub fn key_only(key: impl Into<Vec<u8>>) -> Self {
        KvEntry {
            key: key.into(),
            value: None,
        }
    }
}

/// Thread-safe ordered mapping from byte key to byte value
///
/// The primary store behind every point, range, and tail query.
#[derive(Debug, Default)]
pub struct OrderedStore {
    data: RwLock<BTreeMap<Vec<u8>, Vec<u8>>>,
}

impl OrderedStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        OrderedStore::default()
    }

    /// Number of entries currently stored.
    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    /// Whether the store holds no entries.
    pub fn is_empty(&self) -> bool {
        self.data.read().is_empty()
    }

    /// Remove every entry.
    pub fn clear(&self) {
        self.data.write().clear();
    }

    /// Point read; missing keys are not an error.
    pub fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        self.data.read().get(key).cloned()
    }

    /// Batch point read under one read lock.
    ///
    /// The result contains only the keys that are present; absent keys are
    /// omitted rather than mapped to an empty value.
    pub fn multi_get(&self, keys: &[Vec<u8>]) -> HashMap<ByteKey, Vec<u8>> {
        let data = self.data.read();
        let mut result = HashMap::with_capacity(keys.len());
        for key in keys {
            if let Some(value) = data.get(key) {
                result.insert(ByteKey::new(key.clone()), value.clone());
            }
        }
        result
    }

    /// Store a value, discarding any prior one.
    pub fn put(&self, key: Vec<u8>, value: Vec<u8>) {
        self.data.write().insert(key, value);
    }

    /// Store a value and return the prior one, atomically.
    pub fn get_and_put(&self, key: Vec<u8>, value: Vec<u8>) -> Option<Vec<u8>> {
        self.data.write().insert(key, value)
    }

    /// Store a value only if the key is absent.
    ///
    /// Returns the existing value when there is one, in which case nothing
    /// is written. Atomic with respect to concurrent conditional writes on
    /// the same key.
    pub fn put_if_absent(&self, key: Vec<u8>, value: Vec<u8>) -> Option<Vec<u8>> {
        let mut data = self.data.write();
        match data.get(&key) {
            Some(prev) => Some(prev.clone()),
            None => {
                data.insert(key, value);
                None
            }
        }
    }

    /// Append `value` to the existing value with a comma delimiter.
    ///
    /// An absent key is set to `value` as-is. The compute runs under the
    /// write lock, so concurrent merges on one key never interleave.
    pub fn merge(&self, key: Vec<u8>, value: Vec<u8>) {
        let mut data = self.data.write();
        match data.get_mut(&key) {
            Some(existing) => {
                existing.reserve(1 + value.len());
                existing.push(MERGE_DELIMITER);
                existing.extend_from_slice(&value);
            }
            None => {
                data.insert(key, value);
            }
        }
    }

    /// Insert a batch of entries under one write lock.
    ///
    /// Entries without a value store the empty value.
    pub fn put_batch(&self, entries: Vec<KvEntry>) {
        let mut data = self.data.write();
        for entry in entries {
            data.insert(entry.key, entry.value.unwrap_or_default());
        }
    }

    /// Remove a key; succeeds whether or not it was present.
    pub fn delete(&self, key: &[u8]) {
        self.data.write().remove(key);
    }

    /// Scan up to `limit` entries with keys in `[start, end)`, ascending.
    ///
    /// `limit == 0` means unbounded. An absent `start` scans from the first
    /// key; an absent `end` scans to the last. With `only_keys` the returned
    /// entries carry no values.
    pub fn scan(
        &self,
        start: Option<&[u8]>,
        end: Option<&[u8]>,
        limit: usize,
        only_keys: bool,
    ) -> Vec<KvEntry> {
        let max_count = if limit > 0 { limit } else { usize::MAX };
        let start = nil_to_empty(start);
        if matches!(end, Some(end) if start > end) {
            // Inverted bounds describe an empty range.
            return Vec::new();
        }
        let data = self.data.read();
        let range = match end {
            Some(end) => data.range::<[u8], _>((Included(start), Excluded(end))),
            None => data.range::<[u8], _>((Included(start), Unbounded)),
        };

        let mut entries = Vec::new();
        for (key, value) in range {
            entries.push(if only_keys {
                KvEntry::key_only(key.clone())
            } else {
                KvEntry::new(key.clone(), value.clone())
            });
            if entries.len() >= max_count {
                break;
            }
        }
        entries
    }

    /// Remove every entry with a key in `[start, end)`.
    pub fn delete_range(&self, start: &[u8], end: &[u8]) {
        if start > end {
            return;
        }
        let mut data = self.data.write();
        let doomed: Vec<Vec<u8>> = data
            .range::<[u8], _>((Included(start), Excluded(end)))
            .map(|(key, _)| key.clone())
            .collect();
        for key in doomed {
            data.remove(&key);
        }
    }

    /// Size of the sub-range view `[start, end)`; tail size when `end` is absent.
    pub fn approximate_keys_in_range(&self, start: Option<&[u8]>, end: Option<&[u8]>) -> u64 {
        let start = nil_to_empty(start);
        if matches!(end, Some(end) if start > end) {
            return 0;
        }
        let data = self.data.read();
        let range = match end {
            Some(end) => data.range::<[u8], _>((Included(start), Excluded(end))),
            None => data.range::<[u8], _>((Included(start), Unbounded)),
        };
        range.count() as u64
    }

    /// The `distance`-th key at or after `start` (1-indexed), in a fresh buffer.
    ///
    /// When fewer keys remain, the last key is returned; `None` only when the
    /// tail starting at `start` is empty. The returned key is the found key
    /// itself; the caller chooses whether to treat it inclusively.
    pub fn jump_over(&self, start: Option<&[u8]>, distance: u64) -> Option<Vec<u8>> {
        let start = nil_to_empty(start);
        let data = self.data.read();
        let mut seen = 0u64;
        let mut last_key: Option<&Vec<u8>> = None;
        for (key, _) in data.range::<[u8], _>((Included(start), Unbounded)) {
            last_key = Some(key);
            seen += 1;
            if seen >= distance {
                break;
            }
        }
        last_key.map(|key| key.to_vec())
    }

    /// All entries with keys in `[start, end)`, in ascending key order.
    ///
    /// An absent `end` takes the tail from `start`. This copies the slice
    /// out under the read lock; region checkpointing consumes it in
    /// size-bounded segments.
    pub fn range_entries(&self, start: &[u8], end: Option<&[u8]>) -> Vec<(Vec<u8>, Vec<u8>)> {
        if matches!(end, Some(end) if start > end) {
            return Vec::new();
        }
        let data = self.data.read();
        let range = match end {
            Some(end) => data.range::<[u8], _>((Included(start), Excluded(end))),
            None => data.range::<[u8], _>((Included(start), Unbounded)),
        };
        range.map(|(k, v)| (k.clone(), v.clone())).collect()
    }

    /// Restartable forward iterator over a point-in-time copy of the store.
    ///
    /// Mutations after creation are never observed by the iterator.
    pub fn local_iterator(&self) -> LocalIterator {
        let data = self.data.read();
        let entries: Vec<(Vec<u8>, Vec<u8>)> =
            data.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
        LocalIterator {
            entries: Arc::new(entries),
            pos: 0,
        }
    }
}

/// Forward iterator over an immutable point-in-time copy of the store
///
/// Safe against concurrent mutation by construction: the entries are cloned
/// out at creation time. `rewind` and `seek` restart iteration without
/// touching the live store.
#[derive(Clone, Debug)]
pub struct LocalIterator {
    entries: Arc<Vec<(Vec<u8>, Vec<u8>)>>,
    pos: usize,
}

impl LocalIterator {
    /// Restart iteration from the first key.
    pub fn rewind(&mut self) {
        self.pos = 0;
    }

    /// Position the iterator at the first key `>= key`.
    pub fn seek(&mut self, key: &[u8]) {
        self.pos = self
            .entries
            .partition_point(|(k, _)| k.as_slice() < key);
    }

    /// Key/value at the current position without advancing.
    pub fn peek(&self) -> Option<(&[u8], &[u8])> {
        self.entries
            .get(self.pos)
            .map(|(k, v)| (k.as_slice(), v.as_slice()))
    }
}

impl Iterator for LocalIterator {
    type Item = (Vec<u8>, Vec<u8>);

    fn next(&mut self) -> Option<Self::Item> {
        let item = self.entries.get(self.pos).cloned();
        if item.is_some() {
            self.pos += 1;
        }
        item
    }
}
