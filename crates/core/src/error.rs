//! Error types for the terrane engine
//!
//! A single unified error enum covers every layer. We use `thiserror` for
//! automatic `Display` and `Error` trait implementations.
//!
//! ## Error Classification
//!
//! - **InvalidArgument**: the caller supplied an input the operation rejects
//!   (e.g. a negative sequence step). Not retryable; fix the input.
//! - **Io / Serialization / Corruption**: snapshot section I/O failures.
//! - **Storage**: an unexpected failure inside the store containers.
//!
//! Lock conflicts are *not* errors: a conflicting `try_lock` completes
//! successfully with an [`Owner`](crate::lock::Owner) whose `success` flag
//! is false, because the caller needs the owner record to decide what to do.

use std::io;
use thiserror::Error;

/// Result type alias for terrane operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the terrane engine
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error from snapshot section reads or writes
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Data integrity check failed (bad magic, version, or checksum)
    #[error("Data corruption: {0}")]
    Corruption(String),

    /// The caller supplied an input the operation rejects
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Unexpected failure inside the underlying containers
    #[error("Storage error: {0}")]
    Storage(String),
}

impl From<bincode::Error> for Error {
    fn from(e: bincode::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl Error {
    /// Check if this error is a caller-input rejection
    ///
    /// Invalid arguments carry their own reason in the operation's failure
    /// string instead of the bare canonical one.
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, Error::InvalidArgument(_))
    }

    /// Check if this error indicates damaged snapshot data
    pub fn is_corruption(&self) -> bool {
        matches!(self, Error::Corruption(_))
    }
}
