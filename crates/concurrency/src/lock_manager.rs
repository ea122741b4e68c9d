//! Distributed locks with reentrancy and lease expiry
//!
//! One `Owner` record per key. Acquisition and release each run inside the
//! key's entry guard, so the read of the prior owner and the conditional
//! write behave as one atomic step per key.
//!
//! The algorithm relies on the assumption that while there is no
//! synchronized clock across the processes, the local time in every process
//! flows at approximately the same rate, with an error that is small
//! compared to the auto-release time of the lock. The manager itself never
//! reads a clock: `now_millis` arrives with the acquirer.
//!
//! A lock conflict is not a failure of the operation. The response is an
//! `Owner` with `success == false` carrying the real holder's identity,
//! remaining lease, and context, so the caller can decide how to proceed.

use std::collections::BTreeMap;
use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tracing::{debug, warn};

use terrane_core::lock::{
    FIRST_TIME_SUCCESS, KEEP_LEASE_FAIL, KEEP_LEASE_SUCCESS, NEW_ACQUIRE_SUCCESS,
    REENTRANT_SUCCESS,
};
use terrane_core::{Acquirer, ByteKey, Owner, Region};

use crate::fencing::FencingAllocator;

/// Lock table plus the fencing allocator that tokens are drawn from
#[derive(Debug)]
pub struct LockManager {
    owners: DashMap<ByteKey, Owner>,
    fencing: Arc<FencingAllocator>,
}

impl LockManager {
    /// Create a lock manager drawing tokens from `fencing`.
    pub fn new(fencing: Arc<FencingAllocator>) -> Self {
        LockManager {
            owners: DashMap::new(),
            fencing,
        }
    }

    /// Attempt to acquire or extend the lock at `key`.
    ///
    /// With `keep_lease` the caller only extends a lease it already holds;
    /// extension of an absent or expired lease fails without writing. A new
    /// or replacing acquisition draws a fresh fencing token from
    /// `fencing_key`'s counter. The returned `Owner` describes the outcome
    /// in every case.
    pub fn try_lock(
        &self,
        key: &[u8],
        fencing_key: Option<&[u8]>,
        keep_lease: bool,
        acquirer: &Acquirer,
    ) -> Owner {
        let now = acquirer.now_millis;
        let lease = acquirer.lease_millis;

        match self.owners.entry(ByteKey::from(key)) {
            Entry::Vacant(entry) => {
                if keep_lease {
                    // Wanted to keep the lease but the record is already gone.
                    return Owner {
                        id: acquirer.id.clone(),
                        remaining_millis: KEEP_LEASE_FAIL,
                        success: false,
                        ..Owner::default()
                    };
                }
                // First acquisition (or the lock was fully released before).
                let owner = Owner {
                    id: acquirer.id.clone(),
                    deadline_millis: now + lease,
                    remaining_millis: FIRST_TIME_SUCCESS,
                    fencing_token: self.fencing.next_token(fencing_key),
                    acquires: 1,
                    context: acquirer.context.clone(),
                    success: true,
                };
                entry.insert(owner.clone());
                owner
            }
            Entry::Occupied(mut entry) => {
                let prev = entry.get().clone();
                let remaining = prev.deadline_millis - now;

                if remaining < 0 {
                    // The previous owner is out of lease.
                    if keep_lease {
                        return Owner {
                            id: prev.id,
                            deadline_millis: prev.deadline_millis,
                            remaining_millis: KEEP_LEASE_FAIL,
                            context: prev.context,
                            success: false,
                            ..Owner::default()
                        };
                    }
                    let owner = Owner {
                        id: acquirer.id.clone(),
                        deadline_millis: now + lease,
                        remaining_millis: NEW_ACQUIRE_SUCCESS,
                        fencing_token: self.fencing.next_token(fencing_key),
                        acquires: 1,
                        context: acquirer.context.clone(),
                        success: true,
                    };
                    entry.insert(owner.clone());
                    return owner;
                }

                if prev.is_same_acquirer(acquirer) {
                    let owner = if keep_lease {
                        // Extension only: count and context stay as they were.
                        Owner {
                            id: prev.id,
                            deadline_millis: now + lease,
                            remaining_millis: KEEP_LEASE_SUCCESS,
                            fencing_token: prev.fencing_token,
                            acquires: prev.acquires,
                            context: prev.context,
                            success: true,
                        }
                    } else {
                        // Reentrant acquisition refreshes the lease as well.
                        Owner {
                            id: prev.id,
                            deadline_millis: now + lease,
                            remaining_millis: REENTRANT_SUCCESS,
                            fencing_token: prev.fencing_token,
                            acquires: prev.acquires + 1,
                            context: acquirer.context.clone(),
                            success: true,
                        }
                    };
                    entry.insert(owner.clone());
                    return owner;
                }

                // A live lease held by someone else; report who and for how long.
                debug!(
                    key = ?ByteKey::from(key),
                    holder = ?ByteKey::new(prev.id.clone()),
                    remaining_millis = remaining,
                    "lock is held by another acquirer"
                );
                Owner {
                    id: prev.id,
                    remaining_millis: remaining,
                    context: prev.context,
                    success: false,
                    ..Owner::default()
                }
            }
        }
    }

    /// Release one hold on the lock at `key`.
    ///
    /// Releasing an absent record succeeds with a synthetic owner carrying
    /// the acquirer's own identity and token: the caller may be retrying a
    /// release that already went through. Releasing someone else's live
    /// lock fails and reports the real holder without mutating.
    pub fn release(&self, key: &[u8], acquirer: &Acquirer) -> Owner {
        match self.owners.entry(ByteKey::from(key)) {
            Entry::Vacant(_) => {
                warn!(key = ?ByteKey::from(key), "released lock does not exist");
                Owner {
                    id: acquirer.id.clone(),
                    fencing_token: acquirer.fencing_token,
                    acquires: 0,
                    success: true,
                    ..Owner::default()
                }
            }
            Entry::Occupied(mut entry) => {
                let prev = entry.get().clone();
                if prev.is_same_acquirer(acquirer) {
                    let acquires = prev.acquires - 1;
                    let owner = Owner {
                        id: prev.id,
                        deadline_millis: prev.deadline_millis,
                        remaining_millis: 0,
                        fencing_token: prev.fencing_token,
                        acquires,
                        context: prev.context,
                        success: true,
                    };
                    if acquires <= 0 {
                        entry.remove();
                    } else {
                        entry.insert(owner.clone());
                    }
                    return owner;
                }

                warn!(
                    key = ?ByteKey::from(key),
                    holder = ?ByteKey::new(prev.id.clone()),
                    "lock is held by another acquirer, cannot release"
                );
                Owner {
                    id: prev.id,
                    fencing_token: prev.fencing_token,
                    acquires: prev.acquires,
                    context: prev.context,
                    success: false,
                    ..Owner::default()
                }
            }
        }
    }

    /// Owner records whose keys fall in `region`, for checkpointing.
    pub fn filtered(&self, region: &Region) -> BTreeMap<Vec<u8>, Owner> {
        self.owners
            .iter()
            .filter(|entry| region.is_full_range() || region.contains(entry.key().as_slice()))
            .map(|entry| (entry.key().as_slice().to_vec(), entry.value().clone()))
            .collect()
    }

    /// Merge owner records in by insert, overwriting existing keys.
    pub fn absorb(&self, owners: BTreeMap<Vec<u8>, Owner>) {
        for (key, owner) in owners {
            self.owners.insert(ByteKey::from(key), owner);
        }
    }

    /// Number of live lock records.
    pub fn len(&self) -> usize {
        self.owners.len()
    }

    /// Whether no lock records are live.
    pub fn is_empty(&self) -> bool {
        self.owners.is_empty()
    }

    /// Remove every lock record.
    pub fn clear(&self) {
        self.owners.clear();
    }
}
