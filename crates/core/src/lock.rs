//! Lock ownership records and acquisition result codes
//!
//! A distributed lock is a single `Owner` record per key. Every lock
//! operation, success or failure, responds with an `Owner` describing the
//! outcome; the `remaining_millis` field doubles as a result code channel.
//!
//! ## Result codes
//!
//! On a conflicting `try_lock`, `remaining_millis` carries the real owner's
//! remaining lease time (`deadline - now`, always >= 0). Every other outcome
//! is reported as one of the negative sentinel codes below. The numeric
//! codes are part of the external contract; [`AcquireCode`] is a typed view
//! over them for callers that prefer matching on an enum.

use serde::{Deserialize, Serialize};

/// First acquisition of a free lock succeeded
pub const FIRST_TIME_SUCCESS: i64 = -1;
/// Acquisition succeeded because the previous lease had expired
pub const NEW_ACQUIRE_SUCCESS: i64 = -2;
/// Reentrant acquisition by the current holder succeeded
pub const REENTRANT_SUCCESS: i64 = -3;
/// Lease extension by the current holder succeeded
pub const KEEP_LEASE_SUCCESS: i64 = -4;
/// Lease extension failed (no live lease held by the caller)
pub const KEEP_LEASE_FAIL: i64 = -5;

/// Typed view over the sentinel `remaining_millis` codes
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AcquireCode {
    /// First acquisition of a free lock
    FirstTimeSuccess,
    /// Takeover after the previous lease expired
    NewAcquireSuccess,
    /// Reentrant acquisition by the current holder
    ReentrantSuccess,
    /// Lease extension by the current holder
    KeepLeaseSuccess,
    /// Lease extension attempted without a live lease
    KeepLeaseFail,
}

impl AcquireCode {
    /// The authoritative numeric code.
    pub fn as_code(&self) -> i64 {
        match self {
            AcquireCode::FirstTimeSuccess => FIRST_TIME_SUCCESS,
            AcquireCode::NewAcquireSuccess => NEW_ACQUIRE_SUCCESS,
            AcquireCode::ReentrantSuccess => REENTRANT_SUCCESS,
            AcquireCode::KeepLeaseSuccess => KEEP_LEASE_SUCCESS,
            AcquireCode::KeepLeaseFail => KEEP_LEASE_FAIL,
        }
    }

    /// Parse a sentinel code; `None` for non-sentinel values
    /// (a conflict response carries the owner's remaining lease instead).
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            FIRST_TIME_SUCCESS => Some(AcquireCode::FirstTimeSuccess),
            NEW_ACQUIRE_SUCCESS => Some(AcquireCode::NewAcquireSuccess),
            REENTRANT_SUCCESS => Some(AcquireCode::ReentrantSuccess),
            KEEP_LEASE_SUCCESS => Some(AcquireCode::KeepLeaseSuccess),
            KEEP_LEASE_FAIL => Some(AcquireCode::KeepLeaseFail),
            _ => None,
        }
    }
}

/// Identity of a caller attempting a lock operation
///
/// Equality between acquirers is by `id` bytes only. The engine never reads
/// the system clock for lock decisions; `now_millis` is supplied here by
/// the caller, which keeps replay from a command log deterministic.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Acquirer {
    /// Opaque identity bytes
    pub id: Vec<u8>,
    /// Requested lease duration in milliseconds
    pub lease_millis: i64,
    /// Caller-observed wall clock in milliseconds
    pub now_millis: i64,
    /// Opaque caller context stored with the owner record
    pub context: Vec<u8>,
    /// Fencing token previously issued to this acquirer (0 if none)
    pub fencing_token: i64,
}

impl Acquirer {
    /// Create an acquirer with empty context and no prior fencing token.
    pub fn new(id: impl Into<Vec<u8>>, lease_millis: i64, now_millis: i64) -> Self {
        Acquirer {
            id: id.into(),
            lease_millis,
            now_millis,
            context: Vec::new(),
            fencing_token: 0,
        }
    }
}

/// Current holder of a lock, and the response shape of all lock operations
///
/// While stored, `acquires >= 1` always holds; a release that brings the
/// count to zero removes the record entirely.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Owner {
    /// Identity bytes of the holder (or of the real holder on failure)
    pub id: Vec<u8>,
    /// Wall-clock lease deadline in milliseconds
    pub deadline_millis: i64,
    /// Sentinel result code, or the real owner's remaining lease on conflict
    pub remaining_millis: i64,
    /// Fencing token issued for the current holding
    pub fencing_token: i64,
    /// Reentrancy count
    pub acquires: i32,
    /// Opaque context supplied by the holder
    pub context: Vec<u8>,
    /// Whether the operation that produced this response succeeded
    pub success: bool,
}

impl Owner {
    /// Whether `acquirer` is the holder this record describes.
    pub fn is_same_acquirer(&self, acquirer: &Acquirer) -> bool {
        self.id == acquirer.id
    }

    /// Typed view of the result code, when it is a sentinel.
    pub fn acquire_code(&self) -> Option<AcquireCode> {
        AcquireCode::from_code(self.remaining_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_round_trip() {
        for code in [
            AcquireCode::FirstTimeSuccess,
            AcquireCode::NewAcquireSuccess,
            AcquireCode::ReentrantSuccess,
            AcquireCode::KeepLeaseSuccess,
            AcquireCode::KeepLeaseFail,
        ] {
            assert_eq!(AcquireCode::from_code(code.as_code()), Some(code));
        }
    }

    #[test]
    fn test_non_sentinel_codes() {
        // A conflict response carries a non-negative remaining lease.
        assert_eq!(AcquireCode::from_code(0), None);
        assert_eq!(AcquireCode::from_code(500), None);
        assert_eq!(AcquireCode::from_code(-6), None);
    }

    #[test]
    fn test_same_acquirer_is_by_id() {
        let owner = Owner {
            id: b"node-a".to_vec(),
            acquires: 1,
            success: true,
            ..Owner::default()
        };
        let mut acquirer = Acquirer::new(b"node-a".to_vec(), 1000, 0);
        assert!(owner.is_same_acquirer(&acquirer));

        // Context and timing never participate in identity.
        acquirer.context = b"other ctx".to_vec();
        acquirer.now_millis = 99;
        assert!(owner.is_same_acquirer(&acquirer));

        acquirer.id = b"node-b".to_vec();
        assert!(!owner.is_same_acquirer(&acquirer));
    }

    #[test]
    fn test_owner_serde_round_trip() {
        let owner = Owner {
            id: b"holder".to_vec(),
            deadline_millis: 2_000,
            remaining_millis: FIRST_TIME_SUCCESS,
            fencing_token: 7,
            acquires: 2,
            context: vec![1, 2, 3],
            success: true,
        };
        let bytes = bincode::serialize(&owner).unwrap();
        let back: Owner = bincode::deserialize(&bytes).unwrap();
        assert_eq!(back, owner);
    }
}
