//! Coordination primitives for terrane
//!
//! This crate implements the three auxiliary sub-stores and the semantics
//! layered on them:
//! - `SequenceAllocator`: monotonic range allocation from named counters
//! - `FencingAllocator`: strictly increasing fencing tokens per key
//! - `LockManager`: distributed locks with reentrancy and lease expiry
//!
//! Each store is a `DashMap` keyed by content-compared byte keys; per-key
//! read-modify-write steps run inside the map's entry guard so they appear
//! atomic to concurrent callers of the same key.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod fencing;
pub mod lock_manager;
pub mod sequence;

pub use fencing::FencingAllocator;
pub use lock_manager::LockManager;
pub use sequence::SequenceAllocator;
