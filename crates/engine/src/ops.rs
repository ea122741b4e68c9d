//! Operation names and canonical failure strings
//!
//! Every operation on the request surface has a stable upper-case name.
//! When an operation fails inside the engine, the completion sink receives
//! the short canonical string `"Fail to [<NAME>]"`; input rejections append
//! their reason so the caller can tell the two apart.

use terrane_core::Error;

/// Names of the operations exposed by the request surface
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Op {
    /// Point read
    Get,
    /// Batch point read
    MultiGet,
    /// Ordered range read
    Scan,
    /// Point write
    Put,
    /// Write returning the prior value
    GetPut,
    /// Delimited append
    Merge,
    /// Batch write
    PutList,
    /// Conditional write
    PutIfAbsent,
    /// Point delete
    Delete,
    /// Range delete
    DeleteRange,
    /// Sequence range allocation
    GetSequence,
    /// Sequence counter removal
    ResetSequence,
    /// Lock acquisition
    TryLock,
    /// Lock release
    ReleaseLock,
    /// Fencing counter seeding for a split region
    InitFencingToken,
    /// Sub-range size estimate
    ApproximateKeys,
    /// Distance jump over the key tail
    JumpOver,
    /// Region checkpoint write
    SnapshotSave,
    /// Region checkpoint read
    SnapshotLoad,
}

impl Op {
    /// Stable upper-case operation name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Op::Get => "GET",
            Op::MultiGet => "MULTI_GET",
            Op::Scan => "SCAN",
            Op::Put => "PUT",
            Op::GetPut => "GET_PUT",
            Op::Merge => "MERGE",
            Op::PutList => "PUT_LIST",
            Op::PutIfAbsent => "PUT_IF_ABSENT",
            Op::Delete => "DELETE",
            Op::DeleteRange => "DELETE_RANGE",
            Op::GetSequence => "GET_SEQUENCE",
            Op::ResetSequence => "RESET_SEQUENCE",
            Op::TryLock => "TRY_LOCK",
            Op::ReleaseLock => "RELEASE_LOCK",
            Op::InitFencingToken => "INIT_FENCING_TOKEN",
            Op::ApproximateKeys => "APPROXIMATE_KEYS",
            Op::JumpOver => "JUMP_OVER",
            Op::SnapshotSave => "SNAPSHOT_SAVE",
            Op::SnapshotLoad => "SNAPSHOT_LOAD",
        }
    }

    /// Canonical failure string for this operation.
    pub fn failure(&self) -> String {
        format!("Fail to [{}]", self.as_str())
    }

    /// Failure string for an error, appending input-rejection reasons.
    pub fn failure_for(&self, err: &Error) -> String {
        if err.is_invalid_argument() {
            format!("{}, {}", self.failure(), err)
        } else {
            self.failure()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_strings() {
        assert_eq!(Op::Scan.failure(), "Fail to [SCAN]");
        assert_eq!(Op::GetSequence.failure(), "Fail to [GET_SEQUENCE]");
    }

    #[test]
    fn test_invalid_argument_carries_reason() {
        let err = Error::InvalidArgument("step must be >= 0".to_string());
        let reason = Op::GetSequence.failure_for(&err);
        assert!(reason.starts_with("Fail to [GET_SEQUENCE]"));
        assert!(reason.contains("step must be >= 0"));
    }

    #[test]
    fn test_engine_failures_stay_canonical() {
        let err = Error::Storage("boom".to_string());
        assert_eq!(Op::Scan.failure_for(&err), "Fail to [SCAN]");
    }
}
