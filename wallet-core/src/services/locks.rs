//! Per-user mutual exclusion for ledger operations

use std::collections::HashSet;
use std::sync::{Condvar, Mutex, MutexGuard};

use uuid::Uuid;

/// Tracks which users have a ledger operation in flight
///
/// A caller claims all the users it touches at once, or waits until every
/// one of them is free. Claiming is all-or-nothing, so two transfers in
/// opposite directions can never each hold one side and wait for the other.
/// Operations on unrelated users never wait on each other.
#[derive(Default)]
pub struct UserLocks {
    busy: Mutex<HashSet<Uuid>>,
    released: Condvar,
}

/// Claimed users for one ledger operation; released on drop
pub struct LedgerGuard<'a> {
    locks: &'a UserLocks,
    user_ids: Vec<Uuid>,
}

impl UserLocks {
    pub fn new() -> Self {
        Self::default()
    }

    fn table(&self) -> MutexGuard<'_, HashSet<Uuid>> {
        // The set is only touched in short critical sections that cannot
        // leave it half-updated, so a poisoned lock is still consistent.
        self.busy.lock().unwrap_or_else(|p| p.into_inner())
    }

    /// Claim a single user
    pub fn lock(&self, user_id: Uuid) -> LedgerGuard<'_> {
        self.lock_many(&[user_id])
    }

    /// Claim several users together
    pub fn lock_many(&self, user_ids: &[Uuid]) -> LedgerGuard<'_> {
        let mut ids = user_ids.to_vec();
        ids.sort();
        ids.dedup();

        let mut busy = self.table();
        while ids.iter().any(|id| busy.contains(id)) {
            busy = self
                .released
                .wait(busy)
                .unwrap_or_else(|p| p.into_inner());
        }
        busy.extend(ids.iter().copied());

        LedgerGuard {
            locks: self,
            user_ids: ids,
        }
    }

    /// Number of users currently claimed
    #[cfg(test)]
    pub(crate) fn in_flight(&self) -> usize {
        self.table().len()
    }
}

impl Drop for LedgerGuard<'_> {
    fn drop(&mut self) {
        let mut busy = self.locks.table();
        for id in &self.user_ids {
            busy.remove(id);
        }
        drop(busy);
        self.locks.released.notify_all();
    }
}
