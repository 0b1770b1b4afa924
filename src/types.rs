//! Core identifiers shared across the storage and execution layers.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

/// Identifies a table by a stable hash of its backing heap file's
/// canonical path, per the on-disk-format contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TableId(pub i64);

impl TableId {
    pub fn from_path(path: &Path) -> TableId {
        let canonical = path
            .canonicalize()
            .unwrap_or_else(|_| path.to_path_buf());
        let mut hasher = DefaultHasher::new();
        canonical.hash(&mut hasher);
        TableId(hasher.finish() as i64)
    }
}

/// (table id, page number within table).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PageId {
    pub table_id: TableId,
    pub page_no: usize,
}

impl PageId {
    pub fn new(table_id: TableId, page_no: usize) -> PageId {
        PageId { table_id, page_no }
    }
}

/// Page id plus slot number; identifies a specific tuple slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RecordId {
    pub page_id: PageId,
    pub slot: usize,
}

impl RecordId {
    pub fn new(page_id: PageId, slot: usize) -> RecordId {
        RecordId { page_id, slot }
    }
}

/// Permissions a caller requests a page under; maps to shared/exclusive
/// lock modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    ReadOnly,
    ReadWrite,
}

/// Monotonically increasing transaction identifier. Transactions are not
/// re-entrant across threads, so a simple atomic counter (rather than the
/// teacher's `rand`-seeded id) is enough to guarantee uniqueness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TransactionId(u64);

static NEXT_TID: AtomicU64 = AtomicU64::new(1);

impl TransactionId {
    pub fn new() -> TransactionId {
        TransactionId(NEXT_TID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn id(&self) -> u64 {
        self.0
    }
}

impl Default for TransactionId {
    fn default() -> Self {
        TransactionId::new()
    }
}

impl std::fmt::Display for TransactionId {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "tx_{}", self.0)
    }
}
