//! Request surface for the terrane raw key-value engine
//!
//! This crate orchestrates the lower layers behind a single facade:
//! - `RawStore`: the operation surface invoked from a replicated-log apply
//!   path, completing every call through a two-terminal completion sink
//! - Region checkpointing: save/load of the four sub-stores as named
//!   snapshot sections
//! - Per-operation timing guards released on every exit path
//!
//! # Quick Start
//!
//! ```
//! use terrane_engine::{OpCapture, RawStore, StoreOptions};
//!
//! let store = RawStore::new(StoreOptions::default()).unwrap();
//!
//! let mut done = OpCapture::new();
//! store.put(b"user:1".to_vec(), b"alice".to_vec(), &mut done);
//! assert!(done.is_success());
//!
//! let mut done = OpCapture::new();
//! store.get(b"user:1", &mut done);
//! assert_eq!(done.into_success(), Some(b"alice".to_vec()));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod completion;
pub mod ops;
pub mod options;
pub mod store;
pub mod timing;

pub use completion::{Completion, OpCapture};
pub use ops::Op;
pub use options::StoreOptions;
pub use store::RawStore;
