//! Page-granularity shared/exclusive locking with lock upgrade, blocking
//! acquisition, and cycle-based deadlock detection on the wait-for graph.
//!
//! Structurally this generalizes the teacher's
//! `transaction/concurrent_status.rs` (`s_latch_map`/`x_latch_map`/
//! `hold_pages`, deadlock-checked-then-retry) from B+-tree page ids to
//! heap page ids, and replaces its sleep-poll retry loop with a
//! `Condvar`-based monitor — the same "bounded wait, re-check on wake"
//! contract, expressed with `wait_timeout` instead of `thread::sleep`.

use crate::error::{DbError, DbResult};
use crate::types::{PageId, Permission, TransactionId};
use crate::wait_for_graph::WaitForGraph;
use log::debug;
use std::collections::{HashMap, HashSet};
use std::sync::{Condvar, Mutex};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockMode {
    Shared,
    Exclusive,
}

impl Permission {
    pub fn to_lock_mode(self) -> LockMode {
        match self {
            Permission::ReadOnly => LockMode::Shared,
            Permission::ReadWrite => LockMode::Exclusive,
        }
    }
}

struct LockRecord {
    mode: LockMode,
    holders: HashSet<TransactionId>,
}

struct LockTable {
    locks: HashMap<PageId, LockRecord>,
    held_by: HashMap<TransactionId, HashSet<PageId>>,
    wait_for: WaitForGraph,
}

/// Default bounded wait between grant re-checks, per the ~1s contract.
const DEFAULT_WAIT_TIMEOUT: Duration = Duration::from_millis(1000);

pub struct LockManager {
    state: Mutex<LockTable>,
    cond: Condvar,
    wait_timeout: Duration,
}

impl LockManager {
    pub fn new() -> LockManager {
        LockManager::with_timeout(DEFAULT_WAIT_TIMEOUT)
    }

    pub fn with_timeout(wait_timeout: Duration) -> LockManager {
        LockManager {
            state: Mutex::new(LockTable {
                locks: HashMap::new(),
                held_by: HashMap::new(),
                wait_for: WaitForGraph::new(),
            }),
            cond: Condvar::new(),
            wait_timeout,
        }
    }

    /// Blocking acquire: retries under the monitor's condition variable
    /// until granted, or returns `TransactionAborted` if granting would
    /// create a cycle in the wait-for graph.
    pub fn lock(&self, pid: PageId, tid: TransactionId, mode: LockMode) -> DbResult<()> {
        debug!("request lock, tid: {:?}, mode: {:?}, page: {:?}", tid, mode, pid);
        let mut guard = self.state.lock().unwrap();
        loop {
            match Self::try_grant(&mut guard, pid, tid, mode) {
                Grant::Granted => {
                    guard.wait_for.remove_waiter(tid);
                    return Ok(());
                }
                Grant::Blocked => {
                    for holder in Self::conflicting_holders(&guard, pid, tid, mode) {
                        guard.wait_for.add_edge(tid, holder);
                    }
                    if guard.wait_for.creates_cycle(tid) {
                        guard.wait_for.remove_waiter(tid);
                        debug!("deadlock detected, aborting tid: {:?} on page: {:?}", tid, pid);
                        return Err(DbError::TransactionAborted);
                    }
                    let (g, _timeout) = self.cond.wait_timeout(guard, self.wait_timeout).unwrap();
                    guard = g;
                }
            }
        }
    }

    fn conflicting_holders(
        table: &LockTable,
        pid: PageId,
        tid: TransactionId,
        _mode: LockMode,
    ) -> Vec<TransactionId> {
        match table.locks.get(&pid) {
            Some(rec) => rec.holders.iter().copied().filter(|&h| h != tid).collect(),
            None => Vec::new(),
        }
    }

    /// Non-blocking attempt to grant the lock; `Blocked` means the caller
    /// must wait and re-evaluate.
    fn try_grant(table: &mut LockTable, pid: PageId, tid: TransactionId, mode: LockMode) -> Grant {
        match table.locks.get_mut(&pid) {
            None => {
                table.locks.insert(
                    pid,
                    LockRecord {
                        mode,
                        holders: [tid].into_iter().collect(),
                    },
                );
                Self::record_hold(table, tid, pid);
                Grant::Granted
            }
            Some(rec) => {
                if rec.holders.len() == 1 && rec.holders.contains(&tid) {
                    if mode == LockMode::Exclusive && rec.mode == LockMode::Shared {
                        rec.mode = LockMode::Exclusive;
                    }
                    Grant::Granted
                } else if rec.mode == LockMode::Shared
                    && mode == LockMode::Shared
                {
                    rec.holders.insert(tid);
                    Self::record_hold(table, tid, pid);
                    Grant::Granted
                } else {
                    Grant::Blocked
                }
            }
        }
    }

    fn record_hold(table: &mut LockTable, tid: TransactionId, pid: PageId) {
        table.held_by.entry(tid).or_insert_with(HashSet::new).insert(pid);
    }

    pub fn release(&self, pid: PageId, tid: TransactionId) {
        let mut guard = self.state.lock().unwrap();
        Self::release_locked(&mut guard, pid, tid);
        self.cond.notify_all();
    }

    fn release_locked(table: &mut LockTable, pid: PageId, tid: TransactionId) {
        if let Some(rec) = table.locks.get_mut(&pid) {
            rec.holders.remove(&tid);
            if rec.holders.is_empty() {
                table.locks.remove(&pid);
            }
        }
        if let Some(pages) = table.held_by.get_mut(&tid) {
            pages.remove(&pid);
        }
    }

    /// Releases every lock held by `tid` and clears its wait-for edges.
    pub fn release_all(&self, tid: TransactionId) {
        let mut guard = self.state.lock().unwrap();
        let pages: Vec<PageId> = guard
            .held_by
            .get(&tid)
            .map(|s| s.iter().copied().collect())
            .unwrap_or_default();
        for pid in pages {
            Self::release_locked(&mut guard, pid, tid);
        }
        guard.held_by.remove(&tid);
        guard.wait_for.remove_transaction(tid);
        self.cond.notify_all();
    }

    pub fn holds(&self, pid: PageId, tid: TransactionId) -> bool {
        let guard = self.state.lock().unwrap();
        guard
            .locks
            .get(&pid)
            .map(|rec| rec.holders.contains(&tid))
            .unwrap_or(false)
    }
}

impl Default for LockManager {
    fn default() -> Self {
        LockManager::new()
    }
}

enum Grant {
    Granted,
    Blocked,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TableId;
    use std::sync::Arc;
    use std::thread;

    fn pid(n: usize) -> PageId {
        PageId::new(TableId(0), n)
    }

    #[test]
    fn shared_locks_are_concurrent() {
        let lm = LockManager::new();
        let t1 = TransactionId::new();
        let t2 = TransactionId::new();
        lm.lock(pid(0), t1, LockMode::Shared).unwrap();
        lm.lock(pid(0), t2, LockMode::Shared).unwrap();
        assert!(lm.holds(pid(0), t1));
        assert!(lm.holds(pid(0), t2));
    }

    #[test]
    fn exclusive_excludes_others() {
        let lm = Arc::new(LockManager::new());
        let t1 = TransactionId::new();
        let t2 = TransactionId::new();
        lm.lock(pid(0), t1, LockMode::Exclusive).unwrap();

        let lm2 = Arc::clone(&lm);
        let handle = thread::spawn(move || {
            // blocks until t1 releases
            lm2.lock(pid(0), t2, LockMode::Exclusive).unwrap();
        });

        thread::sleep(Duration::from_millis(50));
        lm.release(pid(0), t1);
        handle.join().unwrap();
        assert!(lm.holds(pid(0), t2));
    }

    #[test]
    fn upgrade_sole_holder_in_place() {
        let lm = LockManager::new();
        let t1 = TransactionId::new();
        lm.lock(pid(0), t1, LockMode::Shared).unwrap();
        lm.lock(pid(0), t1, LockMode::Exclusive).unwrap();
        assert!(lm.holds(pid(0), t1));
    }

    #[test]
    fn deadlock_aborts_requester() {
        let lm = Arc::new(LockManager::new());
        let t1 = TransactionId::new();
        let t2 = TransactionId::new();

        lm.lock(pid(1), t1, LockMode::Exclusive).unwrap();
        lm.lock(pid(2), t2, LockMode::Exclusive).unwrap();

        let lm2 = Arc::clone(&lm);
        let handle = thread::spawn(move || lm2.lock(pid(2), t1, LockMode::Exclusive));

        // give t1's request time to register a wait-for edge
        thread::sleep(Duration::from_millis(50));

        let result = lm.lock(pid(1), t2, LockMode::Exclusive);
        assert!(matches!(result, Err(DbError::TransactionAborted)));

        // release t2's stuff so t1 can proceed
        lm.release_all(t2);
        handle.join().unwrap().unwrap();
    }

    #[test]
    fn release_all_clears_holds() {
        let lm = LockManager::new();
        let t1 = TransactionId::new();
        lm.lock(pid(0), t1, LockMode::Exclusive).unwrap();
        lm.lock(pid(1), t1, LockMode::Shared).unwrap();
        lm.release_all(t1);
        assert!(!lm.holds(pid(0), t1));
        assert!(!lm.holds(pid(1), t1));
    }
}
