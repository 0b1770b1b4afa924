//! The pull-based (Volcano-style) query operator contract every scan,
//! filter, join, insert and delete operator implements.

use crate::error::DbResult;
use crate::tuple::{Tuple, TupleDesc};

/// Lifecycle state an operator moves through. `next`/`has_next` are only
/// valid while `Open`; calling them otherwise is a logic error in the
/// caller, not a recoverable `DbError`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IterState {
    Created,
    Open,
    Closed,
}

pub trait OpIterator {
    fn open(&mut self) -> DbResult<()>;
    fn has_next(&mut self) -> DbResult<bool>;
    /// Returns the next tuple, including one already buffered by a prior
    /// `has_next` call. Fails with `DbError::NoSuchElement` if the stream
    /// is exhausted, whether or not `has_next` was checked first.
    fn next(&mut self) -> DbResult<Tuple>;
    fn rewind(&mut self) -> DbResult<()>;
    fn close(&mut self);
    fn tuple_desc(&self) -> &TupleDesc;
}
