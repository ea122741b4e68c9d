//! Core types for the terrane raw key-value engine
//!
//! This crate defines the vocabulary shared by every layer:
//! - Byte keys and the unsigned-lexicographic ordering contract
//! - `Region`: a contiguous key range that partitions the keyspace
//! - Lock ownership records and acquisition result codes
//! - `Sequence`: a half-open allocated counter range
//! - The unified `Error`/`Result` pair

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod bytes;
pub mod error;
pub mod lock;
pub mod region;
pub mod sequence;

pub use bytes::{nil_to_empty, ByteKey};
pub use error::{Error, Result};
pub use lock::{AcquireCode, Acquirer, Owner};
pub use region::Region;
pub use sequence::Sequence;
