//! Sequence: a half-open allocated counter range

use serde::{Deserialize, Serialize};

/// Half-open range `[start, end)` allocated from a named counter
///
/// `start` is the counter value before the allocation and `end` the value
/// after it; the caller owns every value in between. A zero-step read
/// returns `start == end`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sequence {
    /// First allocated value (inclusive)
    pub start: i64,
    /// End of the allocated range (exclusive)
    pub end: i64,
}

impl Sequence {
    /// Create a sequence range.
    pub fn new(start: i64, end: i64) -> Self {
        Sequence { start, end }
    }

    /// Number of values allocated.
    pub fn len(&self) -> i64 {
        self.end - self.start
    }

    /// Whether the allocation is empty (zero-step read).
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}
