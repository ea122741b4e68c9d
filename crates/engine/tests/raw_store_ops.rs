//! End-to-end behavior of the operation surface

use terrane_core::{AcquireCode, Acquirer};
use terrane_engine::{OpCapture, RawStore, StoreOptions};
use terrane_storage::KvEntry;

fn store() -> RawStore {
    RawStore::new(StoreOptions::default()).unwrap()
}

fn put(store: &RawStore, key: &[u8], value: &[u8]) {
    let mut done = OpCapture::new();
    store.put(key.to_vec(), value.to_vec(), &mut done);
    assert!(done.into_success());
}

// ========================================
// Scans and ordering
// ========================================

#[test]
fn test_scan_limit_and_tail() {
    let store = store();
    put(&store, b"a", b"1");
    put(&store, b"b", b"2");
    put(&store, b"c", b"3");

    let mut done = OpCapture::new();
    store.scan(None, None, 2, false, &mut done);
    assert_eq!(
        done.into_success(),
        vec![KvEntry::new(b"a".to_vec(), b"1".to_vec()), KvEntry::new(b"b".to_vec(), b"2".to_vec())]
    );

    let mut done = OpCapture::new();
    store.scan(Some(b"b"), None, 0, true, &mut done);
    assert_eq!(
        done.into_success(),
        vec![KvEntry::key_only(b"b".to_vec()), KvEntry::key_only(b"c".to_vec())]
    );
}

#[test]
fn test_scan_is_ascending_and_bounded() {
    let store = store();
    // Insert in descending order; scans still come back ascending.
    for i in (0..50u8).rev() {
        put(&store, &[i], &[i]);
    }

    let mut done = OpCapture::new();
    store.scan(None, None, 0, false, &mut done);
    let entries = done.into_success();
    assert_eq!(entries.len(), 50);
    for window in entries.windows(2) {
        assert!(window[0].key < window[1].key);
    }

    // Every key of a bounded scan lies in [start, end).
    let mut done = OpCapture::new();
    store.scan(Some(&[10]), Some(&[20]), 0, false, &mut done);
    let entries = done.into_success();
    assert_eq!(entries.len(), 10);
    for entry in &entries {
        assert!(entry.key.as_slice() >= [10u8].as_slice());
        assert!(entry.key.as_slice() < [20u8].as_slice());
    }
}

#[test]
fn test_multi_get_and_put_list() {
    let store = store();
    let mut done = OpCapture::new();
    store.put_list(
        vec![
            KvEntry::new(b"x".to_vec(), b"1".to_vec()),
            KvEntry::new(b"y".to_vec(), b"2".to_vec()),
        ],
        &mut done,
    );
    assert!(done.into_success());

    let mut done = OpCapture::new();
    store.multi_get(
        &[b"x".to_vec(), b"missing".to_vec(), b"y".to_vec()],
        &mut done,
    );
    let result = done.into_success();
    assert_eq!(result.len(), 2);
    assert_eq!(
        result.get(&terrane_core::ByteKey::from(&b"x"[..])),
        Some(&b"1".to_vec())
    );
}

#[test]
fn test_delete_and_delete_range() {
    let store = store();
    for key in [b"a", b"b", b"c", b"d"] {
        put(&store, key, b"v");
    }

    let mut done = OpCapture::new();
    store.delete(b"d", &mut done);
    assert!(done.into_success());

    let mut done = OpCapture::new();
    store.delete_range(b"a", b"c", &mut done);
    assert!(done.into_success());

    let mut done = OpCapture::new();
    store.scan(None, None, 0, true, &mut done);
    let entries = done.into_success();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].key, b"c");
}

#[test]
fn test_approximate_keys_and_jump_over() {
    let store = store();
    for i in 0..10u8 {
        put(&store, &[i], b"v");
    }
    assert_eq!(store.approximate_keys_in_range(None, None), 10);
    assert_eq!(store.approximate_keys_in_range(Some(&[5]), None), 5);
    assert_eq!(store.approximate_keys_in_range(Some(&[2]), Some(&[4])), 2);

    assert_eq!(store.jump_over(Some(&[0]), 4), Some(vec![3]));
    // Distance past the tail clamps to the last key.
    assert_eq!(store.jump_over(Some(&[8]), 100), Some(vec![9]));
    assert_eq!(store.jump_over(Some(&[10]), 1), None);
}

// ========================================
// Read-modify-write
// ========================================

#[test]
fn test_merge_accumulates_with_delimiter() {
    let store = store();
    let mut done = OpCapture::new();
    store.merge(b"m".to_vec(), b"x".to_vec(), &mut done);
    assert!(done.into_success());
    let mut done = OpCapture::new();
    store.merge(b"m".to_vec(), b"y".to_vec(), &mut done);
    assert!(done.into_success());

    let mut done = OpCapture::new();
    store.get(b"m", &mut done);
    assert_eq!(done.into_success(), Some(vec![0x78, 0x2C, 0x79]));
}

#[test]
fn test_get_and_put_returns_prior() {
    let store = store();
    let mut done = OpCapture::new();
    store.get_and_put(b"k".to_vec(), b"v1".to_vec(), &mut done);
    assert_eq!(done.into_success(), None);

    let mut done = OpCapture::new();
    store.get_and_put(b"k".to_vec(), b"v2".to_vec(), &mut done);
    assert_eq!(done.into_success(), Some(b"v1".to_vec()));
}

#[test]
fn test_put_if_absent_keeps_first_value() {
    let store = store();
    let mut done = OpCapture::new();
    store.put_if_absent(b"k".to_vec(), b"first".to_vec(), &mut done);
    assert_eq!(done.into_success(), None);

    let mut done = OpCapture::new();
    store.put_if_absent(b"k".to_vec(), b"second".to_vec(), &mut done);
    assert_eq!(done.into_success(), Some(b"first".to_vec()));

    let mut done = OpCapture::new();
    store.get(b"k", &mut done);
    assert_eq!(done.into_success(), Some(b"first".to_vec()));
}

// ========================================
// Sequences
// ========================================

#[test]
fn test_sequence_allocate_reset_reallocate() {
    let store = store();
    let mut done = OpCapture::new();
    store.get_sequence(b"s", 10, &mut done);
    let seq = done.into_success();
    assert_eq!((seq.start, seq.end), (0, 10));

    let mut done = OpCapture::new();
    store.get_sequence(b"s", 5, &mut done);
    let seq = done.into_success();
    assert_eq!((seq.start, seq.end), (10, 15));

    let mut done = OpCapture::new();
    store.reset_sequence(b"s", &mut done);
    assert!(done.into_success());

    let mut done = OpCapture::new();
    store.get_sequence(b"s", 1, &mut done);
    let seq = done.into_success();
    assert_eq!((seq.start, seq.end), (0, 1));
}

// ========================================
// Locks
// ========================================

#[test]
fn test_lock_exclusion_and_expiry() {
    let store = store();

    let mut done = OpCapture::new();
    store.try_lock(
        b"L",
        Some(b"F"),
        false,
        &Acquirer::new(b"A".to_vec(), 1000, 1000),
        &mut done,
    );
    let owner = done.into_success();
    assert!(owner.success);
    assert_eq!(owner.fencing_token, 1);
    assert_eq!(owner.acquires, 1);

    // A live lease excludes another acquirer and reports the holder.
    let mut done = OpCapture::new();
    store.try_lock(
        b"L",
        Some(b"F"),
        false,
        &Acquirer::new(b"B".to_vec(), 1000, 1500),
        &mut done,
    );
    let owner = done.into_success();
    assert!(!owner.success);
    assert_eq!(owner.id, b"A");
    assert_eq!(owner.remaining_millis, 500);

    // Past the deadline the lock is up for grabs with a fresh token.
    let mut done = OpCapture::new();
    store.try_lock(
        b"L",
        Some(b"F"),
        false,
        &Acquirer::new(b"B".to_vec(), 1000, 2500),
        &mut done,
    );
    let owner = done.into_success();
    assert!(owner.success);
    assert_eq!(owner.acquire_code(), Some(AcquireCode::NewAcquireSuccess));
    assert_eq!(owner.fencing_token, 2);
    assert_eq!(owner.acquires, 1);
}

#[test]
fn test_lock_reentrancy_and_release() {
    let store = store();

    let mut done = OpCapture::new();
    store.try_lock(
        b"L",
        Some(b"F"),
        false,
        &Acquirer::new(b"A".to_vec(), 1000, 0),
        &mut done,
    );
    assert_eq!(done.into_success().acquires, 1);

    let mut done = OpCapture::new();
    store.try_lock(
        b"L",
        Some(b"F"),
        false,
        &Acquirer::new(b"A".to_vec(), 1000, 100),
        &mut done,
    );
    let owner = done.into_success();
    assert_eq!(owner.acquires, 2);
    assert_eq!(owner.deadline_millis, 1100);

    // First release leaves the record with one hold.
    let mut done = OpCapture::new();
    store.release_lock(b"L", &Acquirer::new(b"A".to_vec(), 1000, 200), &mut done);
    let owner = done.into_success();
    assert!(owner.success);
    assert_eq!(owner.acquires, 1);

    // Second release removes it; a new acquirer now succeeds first-time.
    let mut done = OpCapture::new();
    store.release_lock(b"L", &Acquirer::new(b"A".to_vec(), 1000, 300), &mut done);
    assert_eq!(done.into_success().acquires, 0);

    let mut done = OpCapture::new();
    store.try_lock(
        b"L",
        Some(b"F"),
        false,
        &Acquirer::new(b"B".to_vec(), 1000, 400),
        &mut done,
    );
    let owner = done.into_success();
    assert!(owner.success);
    assert_eq!(owner.acquire_code(), Some(AcquireCode::FirstTimeSuccess));
}

#[test]
fn test_fencing_tokens_survive_region_split_seed() {
    let store = store();

    // Burn two tokens on the parent fencing key.
    for now in [0, 2000] {
        let mut done = OpCapture::new();
        store.try_lock(
            b"L",
            Some(b"parent"),
            false,
            &Acquirer::new(b"A".to_vec(), 1000, now),
            &mut done,
        );
        assert!(done.into_success().success);
    }

    store.init_fencing_token(Some(b"parent"), b"child");

    // The child's first token continues the parent's sequence.
    let mut done = OpCapture::new();
    store.try_lock(
        b"M",
        Some(b"child"),
        false,
        &Acquirer::new(b"A".to_vec(), 1000, 0),
        &mut done,
    );
    assert_eq!(done.into_success().fencing_token, 3);
}

// ========================================
// Local iterator
// ========================================

#[test]
fn test_local_iterator_is_stable_under_mutation() {
    let store = store();
    put(&store, b"a", b"1");
    put(&store, b"b", b"2");

    let mut iter = store.local_iterator();
    put(&store, b"c", b"3");

    let keys: Vec<Vec<u8>> = iter.by_ref().map(|(k, _)| k).collect();
    assert_eq!(keys, vec![b"a".to_vec(), b"b".to_vec()]);

    iter.rewind();
    assert_eq!(iter.next().map(|(k, _)| k), Some(b"a".to_vec()));
}
