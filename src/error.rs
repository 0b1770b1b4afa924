//! Crate-wide error type.
//!
//! Mirrors the error kinds the kernel needs: a deadlock victim sees
//! `TransactionAborted`, programmer misuse sees `Db`, disk failures are
//! wrapped as `Io`, iterator contract violations are `NoSuchElement`, and
//! bad constructor arguments are `InvalidArgument`.

use std::fmt;
use std::io;

#[derive(Debug)]
pub enum DbError {
    /// Raised when the lock manager detects a deadlock and aborts the
    /// requester. Terminal for the transaction.
    TransactionAborted,

    /// Programmatic misuse: no evictable page under NO-STEAL, schema
    /// mismatch on insert, full page on insert, etc.
    Db(String),

    /// Propagated disk I/O failure. The transaction remains live.
    Io(io::Error),

    /// `next()` called past exhaustion.
    NoSuchElement,

    /// Invalid constructor argument (e.g. string aggregator with an
    /// operator other than COUNT).
    InvalidArgument(String),
}

impl DbError {
    pub fn db(msg: impl Into<String>) -> DbError {
        DbError::Db(msg.into())
    }

    pub fn invalid_argument(msg: impl Into<String>) -> DbError {
        DbError::InvalidArgument(msg.into())
    }
}

impl fmt::Display for DbError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            DbError::TransactionAborted => write!(f, "transaction aborted (deadlock)"),
            DbError::Db(msg) => write!(f, "db error: {}", msg),
            DbError::Io(e) => write!(f, "io error: {}", e),
            DbError::NoSuchElement => write!(f, "no such element"),
            DbError::InvalidArgument(msg) => write!(f, "invalid argument: {}", msg),
        }
    }
}

impl std::error::Error for DbError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DbError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for DbError {
    fn from(e: io::Error) -> Self {
        DbError::Io(e)
    }
}

pub type DbResult<T> = Result<T, DbError>;
