//! Bounded LRU page cache coupling page residency, eviction, dirty-page
//! tracking and transaction-scoped commit/abort.
//!
//! Generalizes the teacher's map-only `bufferpool.rs` with the LRU
//! recency list shape used throughout the wider retrieval pack's
//! buffer/cache blocks, and the commit/abort split shown by the
//! teacher's `transaction/tx.rs` `Transaction::commit`/`Transaction::abort`.

use crate::catalog::Catalog;
use crate::error::{DbError, DbResult};
use crate::heap_page::HeapPage;
use crate::lock_manager::LockManager;
use crate::recovery_log::RecoveryLog;
use crate::tuple::Tuple;
use crate::types::{PageId, Permission, TableId, TransactionId};
use log::debug;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, RwLock};

struct Inner {
    resident: HashMap<PageId, Arc<RwLock<HeapPage>>>,
    /// Recency order, least-recently-used first.
    lru: VecDeque<PageId>,
}

pub struct BufferPool {
    capacity: usize,
    lock_manager: Arc<LockManager>,
    catalog: Arc<RwLock<Catalog>>,
    log: Arc<dyn RecoveryLog>,
    inner: Mutex<Inner>,
}

impl BufferPool {
    pub fn new(
        capacity: usize,
        lock_manager: Arc<LockManager>,
        catalog: Arc<RwLock<Catalog>>,
        log: Arc<dyn RecoveryLog>,
    ) -> BufferPool {
        BufferPool {
            capacity,
            lock_manager,
            catalog,
            log,
            inner: Mutex::new(Inner {
                resident: HashMap::new(),
                lru: VecDeque::new(),
            }),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn num_resident(&self) -> usize {
        self.inner.lock().unwrap().resident.len()
    }

    fn file_for(&self, table_id: TableId) -> DbResult<Arc<crate::heap_file::HeapFile>> {
        self.catalog
            .read()
            .unwrap()
            .table(table_id)
            .ok_or_else(|| DbError::db("unknown table id"))
    }

    /// Looks up the heap file backing `table_id` in this pool's own
    /// catalog, for callers (scan/insert/delete operators) that need to
    /// resolve a table without reaching for the process-wide singleton.
    pub fn table_file(&self, table_id: TableId) -> DbResult<Arc<crate::heap_file::HeapFile>> {
        self.file_for(table_id)
    }

    fn touch(inner: &mut Inner, pid: PageId) {
        if let Some(pos) = inner.lru.iter().position(|p| *p == pid) {
            inner.lru.remove(pos);
        }
        inner.lru.push_back(pid);
    }

    /// Acquires the page lock (blocking, may abort on deadlock), then
    /// returns the cached or freshly-read page.
    pub fn get_page(
        &self,
        tid: TransactionId,
        pid: PageId,
        permission: Permission,
    ) -> DbResult<Arc<RwLock<HeapPage>>> {
        self.lock_manager.lock(pid, tid, permission.to_lock_mode())?;

        let mut inner = self.inner.lock().unwrap();
        if let Some(page) = inner.resident.get(&pid) {
            let page = Arc::clone(page);
            Self::touch(&mut inner, pid);
            return Ok(page);
        }

        if inner.resident.len() >= self.capacity {
            self.evict_locked(&mut inner)?;
        }

        let file = self.file_for(pid.table_id)?;
        let page = file.read_page(pid.page_no)?;
        let page = Arc::new(RwLock::new(page));
        inner.resident.insert(pid, Arc::clone(&page));
        inner.lru.push_back(pid);
        Ok(page)
    }

    /// Scans LRU order and discards the first clean resident page.
    /// NO-STEAL: fails if every resident page is dirty.
    fn evict_locked(&self, inner: &mut Inner) -> DbResult<()> {
        let victim = inner
            .lru
            .iter()
            .copied()
            .find(|pid| {
                inner
                    .resident
                    .get(pid)
                    .map(|p| p.read().unwrap().is_dirty().is_none())
                    .unwrap_or(false)
            })
            .ok_or_else(|| DbError::db("no evictable page: all resident pages are dirty"))?;

        debug!("evicting page: {:?}", victim);
        inner.resident.remove(&victim);
        if let Some(pos) = inner.lru.iter().position(|p| *p == victim) {
            inner.lru.remove(pos);
        }
        Ok(())
    }

    pub fn insert_tuple(&self, tid: TransactionId, table_id: TableId, tuple: Tuple) -> DbResult<Vec<PageId>> {
        let file = self.file_for(table_id)?;
        file.insert_tuple(self, tid, tuple)
    }

    pub fn delete_tuple(&self, tid: TransactionId, tuple: &Tuple) -> DbResult<Vec<PageId>> {
        let rid = tuple
            .record_id()
            .ok_or_else(|| DbError::db("tuple has no record id"))?;
        let file = self.file_for(rid.page_id.table_id)?;
        file.delete_tuple(self, tid, tuple)
    }

    /// Commits (`commit = true`) by flushing the transaction's dirty
    /// pages through the log and releasing its locks, or aborts by
    /// discarding its dirty pages from the cache and re-reading
    /// authoritative copies from disk. Either way, releases all of
    /// `tid`'s locks.
    pub fn transaction_complete(&self, tid: TransactionId, commit: bool) -> DbResult<()> {
        debug!("transaction complete, tid: {:?}, commit: {}", tid, commit);
        let dirty_pids: Vec<PageId> = {
            let inner = self.inner.lock().unwrap();
            inner
                .resident
                .iter()
                .filter(|(_, p)| p.read().unwrap().is_dirty() == Some(tid))
                .map(|(pid, _)| *pid)
                .collect()
        };

        for pid in dirty_pids {
            let page_arc = {
                let inner = self.inner.lock().unwrap();
                inner.resident.get(&pid).cloned()
            };
            let page_arc = match page_arc {
                Some(p) => p,
                None => continue,
            };

            if commit {
                self.flush_page_arc(pid, &page_arc)?;
            } else {
                let file = self.file_for(pid.table_id)?;
                let fresh = file.read_page(pid.page_no)?;
                let mut guard = page_arc.write().unwrap();
                *guard = fresh;
            }
        }

        self.lock_manager.release_all(tid);
        Ok(())
    }

    fn flush_page_arc(&self, pid: PageId, page_arc: &Arc<RwLock<HeapPage>>) -> DbResult<()> {
        let file = self.file_for(pid.table_id)?;
        let mut page = page_arc.write().unwrap();
        if let Some(tid) = page.is_dirty() {
            let before = page.before_image_page()?.encode()?;
            let after = page.encode()?;
            self.log.log_write(tid, &before, &after);
            self.log.force();
            file.write_page(&page)?;
            page.mark_dirty(None);
            page.set_before_image()?;
        }
        Ok(())
    }

    /// Forces a specific resident dirty page to disk along the
    /// log-then-write path, regardless of transaction. Violates
    /// NO-STEAL if used mid-transaction.
    pub fn flush_page(&self, pid: PageId) -> DbResult<()> {
        let page_arc = {
            let inner = self.inner.lock().unwrap();
            inner.resident.get(&pid).cloned()
        };
        if let Some(page_arc) = page_arc {
            self.flush_page_arc(pid, &page_arc)?;
        }
        Ok(())
    }

    pub fn flush_all_pages(&self) -> DbResult<()> {
        let pids: Vec<PageId> = self.inner.lock().unwrap().resident.keys().copied().collect();
        for pid in pids {
            self.flush_page(pid)?;
        }
        Ok(())
    }

    pub fn flush_pages(&self, tid: TransactionId) -> DbResult<()> {
        let pids: Vec<PageId> = {
            let inner = self.inner.lock().unwrap();
            inner
                .resident
                .iter()
                .filter(|(_, p)| p.read().unwrap().is_dirty() == Some(tid))
                .map(|(pid, _)| *pid)
                .collect()
        };
        for pid in pids {
            self.flush_page(pid)?;
        }
        Ok(())
    }

    /// Drops a page from the cache without flushing.
    pub fn remove_page(&self, pid: &PageId) {
        let mut inner = self.inner.lock().unwrap();
        inner.resident.remove(pid);
        if let Some(pos) = inner.lru.iter().position(|p| p == pid) {
            inner.lru.remove(pos);
        }
    }

    pub fn clear(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.resident.clear();
        inner.lru.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::Field;
    use crate::heap_file::HeapFile;
    use crate::recovery_log::{InMemoryLog, NoOpLog};
    use crate::tuple::{Tuple, TupleDesc};
    use tempfile::tempdir;

    fn setup(capacity: usize) -> (BufferPool, Arc<HeapFile>, TableId) {
        setup_with_log(capacity, Arc::new(NoOpLog))
    }

    fn setup_with_log(capacity: usize, log: Arc<dyn RecoveryLog>) -> (BufferPool, Arc<HeapFile>, TableId) {
        let dir = tempdir().unwrap();
        let path = dir.path().join("t.dat");
        std::mem::forget(dir); // keep the tempdir alive for the test body
        let desc = TupleDesc::simple_ints(2, "f");
        let file = Arc::new(HeapFile::new(path, desc, 4096).unwrap());
        let mut catalog = Catalog::new();
        catalog.add_table(Arc::clone(&file), "t");
        let table_id = file.table_id();
        let bp = BufferPool::new(capacity, Arc::new(LockManager::new()), Arc::new(RwLock::new(catalog)), log);
        (bp, file, table_id)
    }

    fn int_tuple(a: i32, b: i32) -> Tuple {
        Tuple::new(TupleDesc::simple_ints(2, "f"), vec![Field::Int(a), Field::Int(b)]).unwrap()
    }

    #[test]
    fn insert_then_read_back() {
        let (bp, _file, table_id) = setup(10);
        let tid = TransactionId::new();
        bp.insert_tuple(tid, table_id, int_tuple(1, 2)).unwrap();
        bp.transaction_complete(tid, true).unwrap();

        let tid2 = TransactionId::new();
        let page = bp.get_page(tid2, PageId::new(table_id, 0), Permission::ReadOnly).unwrap();
        assert_eq!(page.read().unwrap().num_used_slots(), 1);
    }

    #[test]
    fn commit_writes_through_log() {
        let log = Arc::new(InMemoryLog::new());
        let (bp, _file, table_id) = setup_with_log(10, Arc::clone(&log) as Arc<dyn RecoveryLog>);
        let tid = TransactionId::new();
        bp.insert_tuple(tid, table_id, int_tuple(1, 2)).unwrap();
        bp.transaction_complete(tid, true).unwrap();

        let records = log.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].tid, tid);
        assert_ne!(records[0].before_image, records[0].after_image);
    }

    #[test]
    fn abort_discards_dirty_insert() {
        let (bp, _file, table_id) = setup(10);
        let tid = TransactionId::new();
        bp.insert_tuple(tid, table_id, int_tuple(1, 2)).unwrap();
        bp.transaction_complete(tid, false).unwrap();

        let tid2 = TransactionId::new();
        let page = bp.get_page(tid2, PageId::new(table_id, 0), Permission::ReadOnly).unwrap();
        assert_eq!(page.read().unwrap().num_used_slots(), 0);
    }

    #[test]
    fn eviction_picks_clean_page_under_no_steal() {
        // capacity 2: t1 reads p1 shared then writes (upgrade, dirty).
        // t2 reads p2 shared (clean). Getting p3 for t3 must evict p2.
        let (bp, file, table_id) = setup(2);
        // grow the file to 3 pages first.
        let t0 = TransactionId::new();
        for _ in 0..3 {
            bp.insert_tuple(t0, table_id, int_tuple(0, 0)).unwrap();
        }
        bp.transaction_complete(t0, true).unwrap();
        bp.clear();
        let _ = &file;

        let t1 = TransactionId::new();
        let t2 = TransactionId::new();
        let t3 = TransactionId::new();

        let p1 = PageId::new(table_id, 0);
        let p2 = PageId::new(table_id, 1);
        let p3 = PageId::new(table_id, 2);

        bp.get_page(t1, p1, Permission::ReadOnly).unwrap();
        bp.get_page(t2, p2, Permission::ReadOnly).unwrap();
        {
            let page1 = bp.get_page(t1, p1, Permission::ReadWrite).unwrap();
            page1.write().unwrap().mark_dirty(Some(t1));
        }

        bp.get_page(t3, p3, Permission::ReadOnly).unwrap();

        assert!(bp.get_page(t3, p3, Permission::ReadOnly).is_ok());
        // p2 was evicted: re-reading it allocates a fresh resident entry,
        // which only succeeds because there is still room (p1 kept, p2 gone).
        assert_eq!(bp.num_resident(), 2);
    }
}
