//! Storage layer for terrane
//!
//! This crate implements the byte-keyed storage backends:
//! - `OrderedStore`: BTreeMap-based ordered primary store with RwLock
//! - Range operations: scan, delete-range, approximate count, jump-over
//! - `LocalIterator`: restartable point-in-time key iterator
//! - Snapshot sections: named, CRC-framed section files per region

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod ordered;
pub mod snapshot;

pub use ordered::{KvEntry, LocalIterator, OrderedStore};
pub use snapshot::{
    section_io::{DirSectionIo, SectionIo},
    FencingKeyDb, LockerDb, Segment, SequenceDb, TailIndex, FENCING_KEY_DB, LOCKER_DB,
    SEQUENCE_DB, TAIL_INDEX,
};
