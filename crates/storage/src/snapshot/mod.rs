//! Region snapshot sections
//!
//! A region snapshot is a directory of named section files. The engine
//! decides section names and payloads; framing and file I/O live in
//! [`section_io`]. Fixed section names:
//!
//! | Section | Payload |
//! |---------|---------|
//! | `sequenceDB` | sequence counters in the region, key -> i64 |
//! | `fencingKeyDB` | fencing counters in the region, key -> i64 |
//! | `lockerDB` | lock owner records in the region, key -> Owner |
//! | `segment0` … `segmentN` | ordered primary-store entries, size-bounded |
//! | `tailIndex` | index of the last segment written (-1 when empty) |
//!
//! Payload maps use `BTreeMap` so serialization order is deterministic,
//! which keeps section bytes stable across saves of identical state.

pub mod section_io;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use terrane_core::Owner;

/// Section name for the sequence-counter sub-map
pub const SEQUENCE_DB: &str = "sequenceDB";
/// Section name for the fencing-counter sub-map
pub const FENCING_KEY_DB: &str = "fencingKeyDB";
/// Section name for the lock-owner sub-map
pub const LOCKER_DB: &str = "lockerDB";
/// Section name for the last-segment index
pub const TAIL_INDEX: &str = "tailIndex";

/// Build the name of the `i`-th primary-store segment section.
pub fn segment_name(index: i64) -> String {
    format!("segment{index}")
}

/// Sequence counters filtered to a region
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequenceDb(pub BTreeMap<Vec<u8>, i64>);

/// Fencing counters filtered to a region
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FencingKeyDb(pub BTreeMap<Vec<u8>, i64>);

/// Lock owner records filtered to a region
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockerDb(pub BTreeMap<Vec<u8>, Owner>);

/// One size-bounded batch of primary-store entries, in ascending key order
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment(pub Vec<(Vec<u8>, Vec<u8>)>);

/// Index of the last segment written; -1 when the region slice was empty
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TailIndex(pub i64);
