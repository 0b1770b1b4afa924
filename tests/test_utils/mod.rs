use simpledb::database::Database;
use simpledb::field::Field;
use simpledb::heap_file::HeapFile;
use simpledb::tuple::{Tuple, TupleDesc};
use simpledb::types::TableId;
use std::sync::{Arc, Once};

static INIT: Once = Once::new();

pub fn setup() {
    INIT.call_once(simpledb::log::init_log);
}

/// Creates a fresh heap file backed by a temp-dir path and registers it
/// with the global catalog. The temp dir is leaked for the test's
/// lifetime, matching the teacher's tests which never clean up scratch
/// tables.
pub fn new_int_table(num_columns: usize) -> (Arc<HeapFile>, TableId) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("table.dat");
    std::mem::forget(dir);
    let desc = TupleDesc::simple_ints(num_columns, "f");
    let file = Arc::new(HeapFile::new(path, desc, 4096).unwrap());
    let table_id = Database::global().add_table(Arc::clone(&file), "t");
    (file, table_id)
}

pub fn int_tuple(desc: &TupleDesc, values: &[i32]) -> Tuple {
    Tuple::new(desc.clone(), values.iter().map(|v| Field::Int(*v)).collect()).unwrap()
}
