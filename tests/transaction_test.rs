mod test_utils;

use simpledb::database::Database;
use simpledb::types::{PageId, Permission, TransactionId};

// spec scenario 4: abort restoration.
#[test]
fn abort_restores_page_from_disk() {
    test_utils::setup();
    let (file, table_id) = test_utils::new_int_table(2);
    let desc = file.tuple_desc().clone();

    let bp = Database::global().buffer_pool();
    let tid = TransactionId::new();
    bp.insert_tuple(tid, table_id, test_utils::int_tuple(&desc, &[1, 2]))
        .unwrap();

    let pid = PageId::new(table_id, 0);
    {
        let page = bp.get_page(tid, pid, Permission::ReadOnly).unwrap();
        assert_eq!(page.read().unwrap().num_used_slots(), 1);
    }

    bp.transaction_complete(tid, false).unwrap();

    let tid2 = TransactionId::new();
    let page = bp.get_page(tid2, pid, Permission::ReadOnly).unwrap();
    assert_eq!(page.read().unwrap().num_used_slots(), 0);
}

#[test]
fn commit_persists_across_buffer_pool_clear() {
    test_utils::setup();
    let (file, table_id) = test_utils::new_int_table(2);
    let desc = file.tuple_desc().clone();

    let bp = Database::global().buffer_pool();
    let tid = TransactionId::new();
    bp.insert_tuple(tid, table_id, test_utils::int_tuple(&desc, &[7, 8]))
        .unwrap();
    bp.transaction_complete(tid, true).unwrap();

    bp.remove_page(&PageId::new(table_id, 0));

    let tid2 = TransactionId::new();
    let page = bp
        .get_page(tid2, PageId::new(table_id, 0), Permission::ReadOnly)
        .unwrap();
    assert_eq!(page.read().unwrap().num_used_slots(), 1);
}
