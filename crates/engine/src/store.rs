//! RawStore: the per-region operation surface
//!
//! `RawStore` owns the four sub-stores (ordered primary store, sequence
//! counters, fencing counters, lock owners) and exposes every operation the
//! replicated-log apply path invokes. Operations that the apply path
//! dispatches complete through a [`Completion`] sink; read-side helpers and
//! checkpointing return directly.
//!
//! Each operation opens a timing guard on entry; the guard closes on every
//! exit path. Engine failures are logged with key context and converted to
//! the operation's canonical failure string, never propagated as panics.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use tracing::{error, info};

use terrane_concurrency::{FencingAllocator, LockManager, SequenceAllocator};
use terrane_core::{Acquirer, ByteKey, Error, Owner, Region, Result, Sequence};
use terrane_storage::snapshot::segment_name;
use terrane_storage::{
    FencingKeyDb, KvEntry, LocalIterator, LockerDb, OrderedStore, SectionIo, Segment, SequenceDb,
    TailIndex, FENCING_KEY_DB, LOCKER_DB, SEQUENCE_DB, TAIL_INDEX,
};

use crate::completion::Completion;
use crate::ops::Op;
use crate::options::StoreOptions;
use crate::timing::OpTimer;

/// In-memory raw key-value store backing one region's state machine
#[derive(Debug)]
pub struct RawStore {
    db: OrderedStore,
    sequences: SequenceAllocator,
    fencing: Arc<FencingAllocator>,
    locks: LockManager,
    opts: StoreOptions,
}

impl RawStore {
    /// Create a store with the given options.
    pub fn new(opts: StoreOptions) -> Result<Self> {
        opts.validate()?;
        let fencing = Arc::new(FencingAllocator::new());
        let store = RawStore {
            db: OrderedStore::new(),
            sequences: SequenceAllocator::new(),
            fencing: Arc::clone(&fencing),
            locks: LockManager::new(fencing),
            opts,
        };
        info!(
            keys_per_segment = store.opts.keys_per_segment,
            "raw store started"
        );
        Ok(store)
    }

    /// Log an engine failure with key context and fail the completion.
    fn fail<T>(&self, op: Op, key: &[u8], err: Error, done: &mut impl Completion<T>) {
        error!(
            op = op.as_str(),
            key = ?ByteKey::from(key),
            error = %err,
            "store operation failed"
        );
        done.set_failure(op.failure_for(&err));
    }

    // ========================================
    // Point operations
    // ========================================

    /// Point read; absent keys complete successfully with `None`.
    pub fn get(&self, key: &[u8], done: &mut impl Completion<Option<Vec<u8>>>) {
        let _timer = OpTimer::start(Op::Get);
        done.set_success(self.db.get(key));
    }

    /// Batch point read; absent keys are omitted from the result map.
    pub fn multi_get(&self, keys: &[Vec<u8>], done: &mut impl Completion<HashMap<ByteKey, Vec<u8>>>) {
        let _timer = OpTimer::start(Op::MultiGet);
        done.set_success(self.db.multi_get(keys));
    }

    /// Store a value, discarding any prior one.
    pub fn put(&self, key: Vec<u8>, value: Vec<u8>, done: &mut impl Completion<bool>) {
        let _timer = OpTimer::start(Op::Put);
        self.db.put(key, value);
        done.set_success(true);
    }

    /// Store a value and complete with the prior one.
    pub fn get_and_put(
        &self,
        key: Vec<u8>,
        value: Vec<u8>,
        done: &mut impl Completion<Option<Vec<u8>>>,
    ) {
        let _timer = OpTimer::start(Op::GetPut);
        done.set_success(self.db.get_and_put(key, value));
    }

    /// Store a value only if the key is absent; completes with the existing
    /// value when there is one.
    pub fn put_if_absent(
        &self,
        key: Vec<u8>,
        value: Vec<u8>,
        done: &mut impl Completion<Option<Vec<u8>>>,
    ) {
        let _timer = OpTimer::start(Op::PutIfAbsent);
        done.set_success(self.db.put_if_absent(key, value));
    }

    /// Append to the existing value with a comma delimiter.
    pub fn merge(&self, key: Vec<u8>, value: Vec<u8>, done: &mut impl Completion<bool>) {
        let _timer = OpTimer::start(Op::Merge);
        self.db.merge(key, value);
        done.set_success(true);
    }

    /// Insert a batch of entries.
    pub fn put_list(&self, entries: Vec<KvEntry>, done: &mut impl Completion<bool>) {
        let _timer = OpTimer::start(Op::PutList);
        self.db.put_batch(entries);
        done.set_success(true);
    }

    /// Remove a key; succeeds whether or not it was present.
    pub fn delete(&self, key: &[u8], done: &mut impl Completion<bool>) {
        let _timer = OpTimer::start(Op::Delete);
        self.db.delete(key);
        done.set_success(true);
    }

    // ========================================
    // Range operations
    // ========================================

    /// Ordered scan of `[start, end)`; see `OrderedStore::scan` for bounds.
    pub fn scan(
        &self,
        start: Option<&[u8]>,
        end: Option<&[u8]>,
        limit: usize,
        only_keys: bool,
        done: &mut impl Completion<Vec<KvEntry>>,
    ) {
        let _timer = OpTimer::start(Op::Scan);
        done.set_success(self.db.scan(start, end, limit, only_keys));
    }

    /// Remove every entry with a key in `[start, end)`.
    pub fn delete_range(&self, start: &[u8], end: &[u8], done: &mut impl Completion<bool>) {
        let _timer = OpTimer::start(Op::DeleteRange);
        self.db.delete_range(start, end);
        done.set_success(true);
    }

    /// Size of the sub-range view; tail size when `end` is absent.
    pub fn approximate_keys_in_range(&self, start: Option<&[u8]>, end: Option<&[u8]>) -> u64 {
        let _timer = OpTimer::start(Op::ApproximateKeys);
        self.db.approximate_keys_in_range(start, end)
    }

    /// The `distance`-th key at or after `start`; see `OrderedStore::jump_over`.
    pub fn jump_over(&self, start: Option<&[u8]>, distance: u64) -> Option<Vec<u8>> {
        let _timer = OpTimer::start(Op::JumpOver);
        self.db.jump_over(start, distance)
    }

    /// Restartable iterator over a point-in-time copy of the primary store.
    pub fn local_iterator(&self) -> LocalIterator {
        self.db.local_iterator()
    }

    // ========================================
    // Sequences and fencing
    // ========================================

    /// Allocate `[current, current + step)` from the counter at `key`.
    pub fn get_sequence(&self, key: &[u8], step: i64, done: &mut impl Completion<Sequence>) {
        let _timer = OpTimer::start(Op::GetSequence);
        match self.sequences.next(key, step) {
            Ok(sequence) => done.set_success(sequence),
            Err(err) => self.fail(Op::GetSequence, key, err, done),
        }
    }

    /// Remove the sequence counter at `key`.
    pub fn reset_sequence(&self, key: &[u8], done: &mut impl Completion<bool>) {
        let _timer = OpTimer::start(Op::ResetSequence);
        self.sequences.reset(key);
        done.set_success(true);
    }

    /// Seed a split region's fencing counter from its parent's.
    pub fn init_fencing_token(&self, parent_key: Option<&[u8]>, child_key: &[u8]) {
        let _timer = OpTimer::start(Op::InitFencingToken);
        self.fencing.init_child(parent_key, child_key);
    }

    // ========================================
    // Distributed locks
    // ========================================

    /// Attempt to acquire or extend the lock at `key`.
    ///
    /// Completes successfully in every non-engine-failure case; a conflict
    /// is reported through the owner record's `success` flag.
    pub fn try_lock(
        &self,
        key: &[u8],
        fencing_key: Option<&[u8]>,
        keep_lease: bool,
        acquirer: &Acquirer,
        done: &mut impl Completion<Owner>,
    ) {
        let _timer = OpTimer::start(Op::TryLock);
        done.set_success(self.locks.try_lock(key, fencing_key, keep_lease, acquirer));
    }

    /// Release one hold on the lock at `key`.
    pub fn release_lock(&self, key: &[u8], acquirer: &Acquirer, done: &mut impl Completion<Owner>) {
        let _timer = OpTimer::start(Op::ReleaseLock);
        done.set_success(self.locks.release(key, acquirer));
    }

    // ========================================
    // Region checkpointing
    // ========================================

    /// Write the region's slice of all four stores as named sections.
    ///
    /// Primary-store entries stream into segments of at most
    /// `keys_per_segment` entries each; `tailIndex` records the index of the
    /// last segment written, or -1 when the slice was empty. Callers quiesce
    /// writes at the replication layer before saving.
    pub fn snapshot_save<S: SectionIo>(&self, io: &S, region: &Region, path: &Path) -> Result<()> {
        let _timer = OpTimer::start(Op::SnapshotSave);
        io.write_section(path, SEQUENCE_DB, &SequenceDb(self.sequences.filtered(region)))?;
        io.write_section(path, FENCING_KEY_DB, &FencingKeyDb(self.fencing.filtered(region)))?;
        io.write_section(path, LOCKER_DB, &LockerDb(self.locks.filtered(region)))?;

        let entries = self.db.range_entries(region.start_key(), region.end_key());
        let mut index: i64 = 0;
        for chunk in entries.chunks(self.opts.keys_per_segment) {
            io.write_section(path, &segment_name(index), &Segment(chunk.to_vec()))?;
            index += 1;
        }
        io.write_section(path, TAIL_INDEX, &TailIndex(index - 1))?;

        info!(
            segments = index,
            entries = entries.len(),
            "region checkpoint saved"
        );
        Ok(())
    }

    /// Merge a saved checkpoint into the live stores.
    ///
    /// Existing keys are overwritten; nothing is cleared first. Callers that
    /// need full replacement call [`RawStore::clear`] before loading.
    pub fn snapshot_load<S: SectionIo>(&self, io: &S, path: &Path) -> Result<()> {
        let _timer = OpTimer::start(Op::SnapshotLoad);
        let sequences: SequenceDb = io.read_section(path, SEQUENCE_DB)?;
        self.sequences.absorb(sequences.0);
        let fencing: FencingKeyDb = io.read_section(path, FENCING_KEY_DB)?;
        self.fencing.absorb(fencing.0);
        let lockers: LockerDb = io.read_section(path, LOCKER_DB)?;
        self.locks.absorb(lockers.0);

        let tail: TailIndex = io.read_section(path, TAIL_INDEX)?;
        let mut loaded = 0usize;
        let mut index: i64 = 0;
        while index <= tail.0 {
            let segment: Segment = io.read_section(path, &segment_name(index))?;
            loaded += segment.0.len();
            for (key, value) in segment.0 {
                self.db.put(key, value);
            }
            index += 1;
        }

        info!(segments = index, entries = loaded, "region checkpoint loaded");
        Ok(())
    }

    /// Empty all four stores.
    pub fn clear(&self) {
        self.db.clear();
        self.sequences.clear();
        self.fencing.clear();
        self.locks.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::completion::OpCapture;

    #[test]
    fn test_invalid_options_rejected() {
        let result = RawStore::new(StoreOptions {
            keys_per_segment: 0,
        });
        assert!(result.unwrap_err().is_invalid_argument());
    }

    #[test]
    fn test_put_get_through_completions() {
        let store = RawStore::new(StoreOptions::default()).unwrap();
        let mut done = OpCapture::new();
        store.put(b"k".to_vec(), b"v".to_vec(), &mut done);
        assert!(done.into_success());

        let mut done = OpCapture::new();
        store.get(b"k", &mut done);
        assert_eq!(done.into_success(), Some(b"v".to_vec()));

        let mut done = OpCapture::new();
        store.get(b"missing", &mut done);
        assert_eq!(done.into_success(), None);
    }

    #[test]
    fn test_negative_step_fails_with_reason() {
        let store = RawStore::new(StoreOptions::default()).unwrap();
        let mut done = OpCapture::new();
        store.get_sequence(b"s", -5, &mut done);
        let reason = done.into_failure();
        assert!(reason.starts_with("Fail to [GET_SEQUENCE]"));
        assert!(reason.contains("step must be >= 0"));
    }

    #[test]
    fn test_lock_conflict_is_a_successful_completion() {
        let store = RawStore::new(StoreOptions::default()).unwrap();
        let mut done = OpCapture::new();
        store.try_lock(
            b"L",
            Some(b"F"),
            false,
            &Acquirer::new(b"A".to_vec(), 1000, 0),
            &mut done,
        );
        assert!(done.into_success().success);

        // The second caller's completion succeeds; the owner says no.
        let mut done = OpCapture::new();
        store.try_lock(
            b"L",
            Some(b"F"),
            false,
            &Acquirer::new(b"B".to_vec(), 1000, 500),
            &mut done,
        );
        let owner = done.into_success();
        assert!(!owner.success);
        assert_eq!(owner.id, b"A");
    }

    #[test]
    fn test_clear_empties_every_store() {
        let store = RawStore::new(StoreOptions::default()).unwrap();
        let mut done = OpCapture::new();
        store.put(b"k".to_vec(), b"v".to_vec(), &mut done);
        let mut done = OpCapture::new();
        store.get_sequence(b"s", 5, &mut done);
        let mut done = OpCapture::new();
        store.try_lock(
            b"L",
            Some(b"F"),
            false,
            &Acquirer::new(b"A".to_vec(), 1000, 0),
            &mut done,
        );

        store.clear();

        let mut done = OpCapture::new();
        store.get(b"k", &mut done);
        assert_eq!(done.into_success(), None);
        // A cleared sequence restarts from zero.
        let mut done = OpCapture::new();
        store.get_sequence(b"s", 0, &mut done);
        assert_eq!(done.into_success(), Sequence::new(0, 0));
    }
}
