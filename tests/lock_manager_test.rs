mod test_utils;

use simpledb::error::DbError;
use simpledb::types::{PageId, TableId, TransactionId};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

fn pid(n: usize) -> PageId {
    PageId::new(TableId(42), n)
}

// spec scenario 3: upgrade.
#[test]
fn upgrade_sole_holder_is_immediate() {
    test_utils::setup();
    let lm = simpledb::lock_manager::LockManager::new();
    let t1 = TransactionId::new();
    lm.lock(pid(0), t1, simpledb::lock_manager::LockMode::Shared).unwrap();
    lm.lock(pid(0), t1, simpledb::lock_manager::LockMode::Exclusive).unwrap();
    assert!(lm.holds(pid(0), t1));
}

// spec scenario 2: deadlock. T1 holds P1 excl, T2 holds P2 excl, T1 wants
// P2 (blocks), T2 wants P1 -> cycle -> T2 aborts, then T1 proceeds.
#[test]
fn deadlock_cycle_aborts_requester() {
    test_utils::setup();
    let lm = Arc::new(simpledb::lock_manager::LockManager::new());
    let t1 = TransactionId::new();
    let t2 = TransactionId::new();

    lm.lock(pid(1), t1, simpledb::lock_manager::LockMode::Exclusive).unwrap();
    lm.lock(pid(2), t2, simpledb::lock_manager::LockMode::Exclusive).unwrap();

    let lm2 = Arc::clone(&lm);
    let t1_handle = thread::spawn(move || lm2.lock(pid(2), t1, simpledb::lock_manager::LockMode::Exclusive));

    thread::sleep(Duration::from_millis(50));

    let result = lm.lock(pid(1), t2, simpledb::lock_manager::LockMode::Exclusive);
    assert!(matches!(result, Err(DbError::TransactionAborted)));

    lm.release_all(t2);
    t1_handle.join().unwrap().unwrap();
    assert!(lm.holds(pid(2), t1));
}
