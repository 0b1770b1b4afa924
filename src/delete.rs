//! Delete operator: drains its child on the first `next` call, deleting
//! every tuple from its owning table, then yields a single count tuple
//! and ends the stream.

use crate::buffer_pool::BufferPool;
use crate::error::{DbError, DbResult};
use crate::field::{Field, FieldType};
use crate::operator::{IterState, OpIterator};
use crate::tuple::{Tuple, TupleDesc};
use crate::types::TransactionId;
use std::sync::Arc;

pub struct Delete {
    tid: TransactionId,
    bp: Arc<BufferPool>,
    child: Box<dyn OpIterator>,
    desc: TupleDesc,
    done: bool,
    state: IterState,
}

impl Delete {
    pub fn new(bp: Arc<BufferPool>, tid: TransactionId, child: Box<dyn OpIterator>) -> Delete {
        Delete {
            tid,
            bp,
            child,
            desc: TupleDesc::from_types(&[FieldType::Int]),
            done: false,
            state: IterState::Created,
        }
    }
}

impl OpIterator for Delete {
    fn open(&mut self) -> DbResult<()> {
        self.child.open()?;
        self.done = false;
        self.state = IterState::Open;
        Ok(())
    }

    fn has_next(&mut self) -> DbResult<bool> {
        Ok(!self.done)
    }

    fn next(&mut self) -> DbResult<Tuple> {
        if self.done {
            return Err(DbError::NoSuchElement);
        }
        let mut count: i32 = 0;
        while self.child.has_next()? {
            let tuple = self.child.next()?;
            self.bp.delete_tuple(self.tid, &tuple)?;
            count += 1;
        }
        self.done = true;
        Tuple::new(self.desc.clone(), vec![Field::Int(count)])
    }

    fn rewind(&mut self) -> DbResult<()> {
        self.done = false;
        self.child.rewind()
    }

    fn close(&mut self) {
        self.child.close();
        self.state = IterState::Closed;
    }

    fn tuple_desc(&self) -> &TupleDesc {
        &self.desc
    }
}
