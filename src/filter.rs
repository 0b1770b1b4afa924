//! Filter operator: passes through child tuples matching a predicate.

use crate::error::{DbError, DbResult};
use crate::operator::{IterState, OpIterator};
use crate::predicate::Predicate;
use crate::tuple::{Tuple, TupleDesc};

pub struct Filter {
    predicate: Predicate,
    child: Box<dyn OpIterator>,
    peeked: Option<Tuple>,
    state: IterState,
}

impl Filter {
    pub fn new(predicate: Predicate, child: Box<dyn OpIterator>) -> Filter {
        Filter {
            predicate,
            child,
            peeked: None,
            state: IterState::Created,
        }
    }

    fn advance(&mut self) -> DbResult<Option<Tuple>> {
        while self.child.has_next()? {
            let t = self.child.next()?;
            if self.predicate.filter(&t) {
                return Ok(Some(t));
            }
        }
        Ok(None)
    }
}

impl OpIterator for Filter {
    fn open(&mut self) -> DbResult<()> {
        self.child.open()?;
        self.peeked = None;
        self.state = IterState::Open;
        Ok(())
    }

    fn has_next(&mut self) -> DbResult<bool> {
        if self.peeked.is_some() {
            return Ok(true);
        }
        self.peeked = self.advance()?;
        Ok(self.peeked.is_some())
    }

    fn next(&mut self) -> DbResult<Tuple> {
        if let Some(t) = self.peeked.take() {
            return Ok(t);
        }
        self.advance()?.ok_or(DbError::NoSuchElement)
    }

    fn rewind(&mut self) -> DbResult<()> {
        self.peeked = None;
        self.child.rewind()
    }

    fn close(&mut self) {
        self.child.close();
        self.peeked = None;
        self.state = IterState::Closed;
    }

    fn tuple_desc(&self) -> &TupleDesc {
        self.child.tuple_desc()
    }
}
