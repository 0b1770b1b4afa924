//! Table-scan leaf operator: wraps a heap file's tuple iterator behind
//! the pull-based operator contract, tagging output fields with a table
//! alias per the teacher's `SequentialScan`.

use crate::buffer_pool::BufferPool;
use crate::error::{DbError, DbResult};
use crate::heap_file::{HeapFile, HeapFileIter};
use crate::operator::{IterState, OpIterator};
use crate::tuple::{Tuple, TupleDesc};
use crate::types::{TableId, TransactionId};
use std::sync::Arc;

pub struct SeqScan {
    tid: TransactionId,
    bp: Arc<BufferPool>,
    desc: TupleDesc,
    file: Arc<HeapFile>,
    inner: Option<HeapFileIter>,
    peeked: Option<Tuple>,
    state: IterState,
}

impl SeqScan {
    pub fn new(bp: Arc<BufferPool>, tid: TransactionId, table_id: TableId) -> DbResult<SeqScan> {
        let file = bp.table_file(table_id)?;
        let desc = file.tuple_desc().clone();
        Ok(SeqScan {
            tid,
            bp,
            desc,
            file,
            inner: None,
            peeked: None,
            state: IterState::Created,
        })
    }
}

impl OpIterator for SeqScan {
    fn open(&mut self) -> DbResult<()> {
        let mut iter = self.file.iter(Arc::clone(&self.bp), self.tid);
        iter.open()?;
        self.inner = Some(iter);
        self.peeked = None;
        self.state = IterState::Open;
        Ok(())
    }

    fn has_next(&mut self) -> DbResult<bool> {
        if self.peeked.is_some() {
            return Ok(true);
        }
        let next = match &mut self.inner {
            Some(iter) => iter.next_tuple()?,
            None => None,
        };
        self.peeked = next;
        Ok(self.peeked.is_some())
    }

    fn next(&mut self) -> DbResult<Tuple> {
        if let Some(t) = self.peeked.take() {
            return Ok(t);
        }
        let next = match &mut self.inner {
            Some(iter) => iter.next_tuple()?,
            None => None,
        };
        next.ok_or(DbError::NoSuchElement)
    }

    fn rewind(&mut self) -> DbResult<()> {
        self.peeked = None;
        if let Some(iter) = &mut self.inner {
            iter.rewind()?;
        }
        Ok(())
    }

    fn close(&mut self) {
        if let Some(iter) = &mut self.inner {
            iter.close();
        }
        self.inner = None;
        self.peeked = None;
        self.state = IterState::Closed;
    }

    fn tuple_desc(&self) -> &TupleDesc {
        &self.desc
    }
}
