//! Nested-loops join: for each left tuple, scans the entire right child.
//! `rewind` resets both sides; the right child is re-scanned per left
//! tuple via its own rewind.

use crate::error::{DbError, DbResult};
use crate::operator::{IterState, OpIterator};
use crate::predicate::JoinPredicate;
use crate::tuple::{Tuple, TupleDesc};

pub struct Join {
    predicate: JoinPredicate,
    left: Box<dyn OpIterator>,
    right: Box<dyn OpIterator>,
    desc: TupleDesc,
    current_left: Option<Tuple>,
    pending: Option<Tuple>,
    state: IterState,
}

impl Join {
    pub fn new(predicate: JoinPredicate, left: Box<dyn OpIterator>, right: Box<dyn OpIterator>) -> Join {
        let desc = TupleDesc::merge(left.tuple_desc(), right.tuple_desc());
        Join {
            predicate,
            left,
            right,
            desc,
            current_left: None,
            pending: None,
            state: IterState::Created,
        }
    }

    fn combine(left: &Tuple, right: &Tuple, desc: &TupleDesc) -> DbResult<Tuple> {
        let mut fields = left.fields().to_vec();
        fields.extend(right.fields().iter().cloned());
        Tuple::new(desc.clone(), fields)
    }

    fn advance(&mut self) -> DbResult<Option<Tuple>> {
        loop {
            if self.current_left.is_none() {
                if !self.left.has_next()? {
                    return Ok(None);
                }
                self.current_left = Some(self.left.next()?);
                self.right.rewind()?;
            }
            let left_tuple = self.current_left.clone().unwrap();
            if self.right.has_next()? {
                let right_tuple = self.right.next()?;
                if self.predicate.filter(&left_tuple, &right_tuple) {
                    return Ok(Some(Self::combine(&left_tuple, &right_tuple, &self.desc)?));
                }
            } else {
                self.current_left = None;
            }
        }
    }
}

impl OpIterator for Join {
    fn open(&mut self) -> DbResult<()> {
        self.left.open()?;
        self.right.open()?;
        self.current_left = None;
        self.state = IterState::Open;
        Ok(())
    }

    fn has_next(&mut self) -> DbResult<bool> {
        if self.pending.is_some() {
            return Ok(true);
        }
        self.pending = self.advance()?;
        Ok(self.pending.is_some())
    }

    fn next(&mut self) -> DbResult<Tuple> {
        if let Some(t) = self.pending.take() {
            return Ok(t);
        }
        self.advance()?.ok_or(DbError::NoSuchElement)
    }

    fn rewind(&mut self) -> DbResult<()> {
        self.pending = None;
        self.current_left = None;
        self.left.rewind()?;
        self.right.rewind()
    }

    fn close(&mut self) {
        self.left.close();
        self.right.close();
        self.pending = None;
        self.current_left = None;
        self.state = IterState::Closed;
    }

    fn tuple_desc(&self) -> &TupleDesc {
        &self.desc
    }
}
