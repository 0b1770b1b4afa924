mod test_utils;

use simpledb::database::Database;
use simpledb::delete::Delete;
use simpledb::field::Field;
use simpledb::filter::Filter;
use simpledb::insert::Insert;
use simpledb::join::Join;
use simpledb::operator::OpIterator;
use simpledb::predicate::{JoinPredicate, Op, Predicate};
use simpledb::seq_scan::SeqScan;
use simpledb::types::TransactionId;
use std::sync::Arc;

fn drain(op: &mut dyn OpIterator) -> Vec<simpledb::tuple::Tuple> {
    let mut out = Vec::new();
    op.open().unwrap();
    while op.has_next().unwrap() {
        out.push(op.next().unwrap());
    }
    op.close();
    out
}

#[test]
fn insert_then_scan_then_filter() {
    test_utils::setup();
    let (file, table_id) = test_utils::new_int_table(2);
    let desc = file.tuple_desc().clone();

    let bp = Arc::clone(Database::global().buffer_pool());

    let tid = TransactionId::new();
    let source: Vec<simpledb::tuple::Tuple> = (0..5)
        .map(|i| test_utils::int_tuple(&desc, &[i, i * 10]))
        .collect();
    let child = VecSource::new(desc.clone(), source);
    let mut insert = Insert::new(Arc::clone(&bp), tid, table_id, Box::new(child));
    let inserted = drain(&mut insert);
    assert_eq!(inserted.len(), 1);
    assert_eq!(*inserted[0].field(0), Field::Int(5));
    bp.transaction_complete(tid, true).unwrap();

    let tid2 = TransactionId::new();
    let scan = SeqScan::new(Arc::clone(&bp), tid2, table_id).unwrap();
    let mut filtered = Filter::new(Predicate::new(0, Op::GreaterThanOrEq, Field::Int(3)), Box::new(scan));
    let rows = drain(&mut filtered);
    assert_eq!(rows.len(), 2);
    bp.transaction_complete(tid2, true).unwrap();
}

#[test]
fn self_join_on_equal_key_then_delete() {
    test_utils::setup();
    let (file, table_id) = test_utils::new_int_table(2);
    let desc = file.tuple_desc().clone();

    let bp = Arc::clone(Database::global().buffer_pool());

    let tid = TransactionId::new();
    for (a, b) in [(1, 100), (2, 200), (1, 300)] {
        bp.insert_tuple(tid, table_id, test_utils::int_tuple(&desc, &[a, b]))
            .unwrap();
    }
    bp.transaction_complete(tid, true).unwrap();

    let tid2 = TransactionId::new();
    let left = SeqScan::new(Arc::clone(&bp), tid2, table_id).unwrap();
    let right = SeqScan::new(Arc::clone(&bp), tid2, table_id).unwrap();
    let mut join = Join::new(JoinPredicate::new(0, Op::Equals, 0), Box::new(left), Box::new(right));
    let rows = drain(&mut join);
    // (1,100)-(1,100), (1,100)-(1,300), (1,300)-(1,100), (1,300)-(1,300), (2,200)-(2,200)
    assert_eq!(rows.len(), 5);
    bp.transaction_complete(tid2, true).unwrap();

    let tid3 = TransactionId::new();
    let scan = SeqScan::new(Arc::clone(&bp), tid3, table_id).unwrap();
    let filtered = Filter::new(Predicate::new(0, Op::Equals, Field::Int(1)), Box::new(scan));
    let mut delete = Delete::new(Arc::clone(&bp), tid3, Box::new(filtered));
    let result = drain(&mut delete);
    assert_eq!(*result[0].field(0), Field::Int(2));
    bp.transaction_complete(tid3, true).unwrap();

    let tid4 = TransactionId::new();
    let mut remaining = SeqScan::new(Arc::clone(&bp), tid4, table_id).unwrap();
    let rows = drain(&mut remaining);
    assert_eq!(rows.len(), 1);
    assert_eq!(*rows[0].field(0), Field::Int(2));
    bp.transaction_complete(tid4, true).unwrap();
}

/// Minimal in-memory source operator used to feed `Insert` without a
/// pre-existing table, standing in for a `VALUES` clause.
struct VecSource {
    desc: simpledb::tuple::TupleDesc,
    rows: Vec<simpledb::tuple::Tuple>,
    pos: usize,
}

impl VecSource {
    fn new(desc: simpledb::tuple::TupleDesc, rows: Vec<simpledb::tuple::Tuple>) -> VecSource {
        VecSource { desc, rows, pos: 0 }
    }
}

impl OpIterator for VecSource {
    fn open(&mut self) -> simpledb::error::DbResult<()> {
        self.pos = 0;
        Ok(())
    }
    fn has_next(&mut self) -> simpledb::error::DbResult<bool> {
        Ok(self.pos < self.rows.len())
    }
    fn next(&mut self) -> simpledb::error::DbResult<simpledb::tuple::Tuple> {
        if self.pos < self.rows.len() {
            let t = self.rows[self.pos].clone();
            self.pos += 1;
            Ok(t)
        } else {
            Err(simpledb::error::DbError::NoSuchElement)
        }
    }
    fn rewind(&mut self) -> simpledb::error::DbResult<()> {
        self.pos = 0;
        Ok(())
    }
    fn close(&mut self) {}
    fn tuple_desc(&self) -> &simpledb::tuple::TupleDesc {
        &self.desc
    }
}
