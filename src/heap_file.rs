//! On-disk layout of tuple pages: a regular file whose length is a
//! multiple of the page size, plus the transactional scan iterator that
//! funnels reads through the buffer pool.
//!
//! `read_page`/`write_page` follow the teacher's `HeapTable::read_page`
//! (`src/table.rs`) seek-then-read pattern, generalized to any
//! `TupleDesc` and extended with `write_page` and file-extension locking
//! per the on-disk format contract.

use crate::buffer_pool::BufferPool;
use crate::error::{DbError, DbResult};
use crate::heap_page::HeapPage;
use crate::tuple::{Tuple, TupleDesc};
use crate::types::{PageId, Permission, TableId, TransactionId};
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

pub struct HeapFile {
    path: PathBuf,
    table_id: TableId,
    desc: TupleDesc,
    page_size: usize,
    /// Serializes file-extension during `insert_tuple`: the spec calls out
    /// that appending a page is not otherwise coordinated across
    /// transactions.
    extend_lock: Mutex<()>,
}

impl HeapFile {
    pub fn new(path: impl AsRef<Path>, desc: TupleDesc, page_size: usize) -> DbResult<HeapFile> {
        let path = path.as_ref().to_path_buf();
        OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(&path)?;
        let table_id = TableId::from_path(&path);
        Ok(HeapFile {
            path,
            table_id,
            desc,
            page_size,
            extend_lock: Mutex::new(()),
        })
    }

    pub fn table_id(&self) -> TableId {
        self.table_id
    }

    pub fn tuple_desc(&self) -> &TupleDesc {
        &self.desc
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    fn open_file(&self) -> DbResult<File> {
        Ok(OpenOptions::new().read(true).write(true).open(&self.path)?)
    }

    pub fn num_pages(&self) -> DbResult<usize> {
        let len = self.open_file()?.metadata()?.len() as usize;
        Ok(len / self.page_size)
    }

    /// Seeks to `page_no * page_size` and reads exactly one page. Fails if
    /// the byte range is past end-of-file.
    pub fn read_page(&self, page_no: usize) -> DbResult<HeapPage> {
        let mut file = self.open_file()?;
        let offset = (page_no * self.page_size) as u64;
        if offset + self.page_size as u64 > file.metadata()?.len() {
            return Err(DbError::db("page offset past end of file"));
        }
        file.seek(SeekFrom::Start(offset))?;
        let mut buf = vec![0u8; self.page_size];
        file.read_exact(&mut buf)?;

        let pid = PageId::new(self.table_id, page_no);
        HeapPage::decode(pid, self.desc.clone(), self.page_size, &buf)
    }

    /// Seeks to the page's offset and writes its encoded bytes.
    pub fn write_page(&self, page: &HeapPage) -> DbResult<()> {
        let mut file = self.open_file()?;
        let offset = (page.pid().page_no * self.page_size) as u64;
        file.seek(SeekFrom::Start(offset))?;
        file.write_all(&page.encode()?)?;
        file.flush()?;
        Ok(())
    }

    fn append_empty_page(&self) -> DbResult<usize> {
        let _guard = self.extend_lock.lock().unwrap();
        let mut file = self.open_file()?;
        let len = file.metadata()?.len();
        let page_no = (len as usize) / self.page_size;
        file.seek(SeekFrom::End(0))?;
        file.write_all(&vec![0u8; self.page_size])?;
        file.flush()?;
        Ok(page_no)
    }

    /// Scans existing pages in order via the given buffer pool (exclusive
    /// permission per page) and inserts into the first page with a free
    /// slot; if none, appends a freshly zeroed page and inserts there.
    /// Returns the list of dirtied page ids.
    pub fn insert_tuple(&self, bp: &BufferPool, tid: TransactionId, tuple: Tuple) -> DbResult<Vec<PageId>> {
        let n = self.num_pages()?;
        for page_no in 0..n {
            let pid = PageId::new(self.table_id, page_no);
            let page_lock = bp.get_page(tid, pid, Permission::ReadWrite)?;
            let mut page = page_lock.write().unwrap();
            if page.num_empty_slots() > 0 {
                page.insert_tuple(tuple)?;
                page.mark_dirty(Some(tid));
                return Ok(vec![pid]);
            }
            drop(page);
        }

        let page_no = self.append_empty_page()?;
        let pid = PageId::new(self.table_id, page_no);
        let page_lock = bp.get_page(tid, pid, Permission::ReadWrite)?;
        let mut page = page_lock.write().unwrap();
        page.insert_tuple(tuple)?;
        page.mark_dirty(Some(tid));
        Ok(vec![pid])
    }

    /// Requests the containing page under exclusive permission and
    /// deletes the tuple.
    pub fn delete_tuple(&self, bp: &BufferPool, tid: TransactionId, tuple: &Tuple) -> DbResult<Vec<PageId>> {
        let rid = tuple
            .record_id()
            .ok_or_else(|| DbError::db("tuple has no record id"))?;
        let page_lock = bp.get_page(tid, rid.page_id, Permission::ReadWrite)?;
        let mut page = page_lock.write().unwrap();
        page.delete_tuple(tuple)?;
        page.mark_dirty(Some(tid));
        Ok(vec![rid.page_id])
    }

    /// Finite lazy sequence of all tuples across all pages in page order.
    /// Pages are obtained under shared permission via the given buffer
    /// pool. Does not prefetch beyond the current page and does not
    /// release previously visited page locks (strict two-phase locking).
    pub fn iter(self: &Arc<HeapFile>, bp: Arc<BufferPool>, tid: TransactionId) -> HeapFileIter {
        HeapFileIter {
            file: Arc::clone(self),
            bp,
            tid,
            page_no: 0,
            buf: Vec::new(),
            buf_pos: 0,
            opened: false,
            done: false,
        }
    }
}

pub struct HeapFileIter {
    file: Arc<HeapFile>,
    bp: Arc<BufferPool>,
    tid: TransactionId,
    page_no: usize,
    buf: Vec<Tuple>,
    buf_pos: usize,
    opened: bool,
    done: bool,
}

impl HeapFileIter {
    fn load_page(&mut self, page_no: usize) -> DbResult<bool> {
        let n = self.file.num_pages()?;
        if page_no >= n {
            return Ok(false);
        }
        let pid = PageId::new(self.file.table_id, page_no);
        let page_lock = self.bp.get_page(self.tid, pid, Permission::ReadOnly)?;
        let page = page_lock.read().unwrap();
        self.buf = page.iter().cloned().collect();
        self.buf_pos = 0;
        Ok(true)
    }

    pub fn open(&mut self) -> DbResult<()> {
        self.page_no = 0;
        self.opened = self.load_page(0)?;
        self.done = !self.opened;
        Ok(())
    }

    pub fn rewind(&mut self) -> DbResult<()> {
        self.open()
    }

    pub fn close(&mut self) {
        self.buf.clear();
        self.opened = false;
        self.done = true;
    }

    pub fn next_tuple(&mut self) -> DbResult<Option<Tuple>> {
        if !self.opened {
            self.open()?;
        }
        loop {
            if self.done {
                return Ok(None);
            }
            if self.buf_pos < self.buf.len() {
                let t = self.buf[self.buf_pos].clone();
                self.buf_pos += 1;
                return Ok(Some(t));
            }
            self.page_no += 1;
            if !self.load_page(self.page_no)? {
                self.done = true;
                return Ok(None);
            }
        }
    }
}

impl Iterator for HeapFileIter {
    type Item = Tuple;

    fn next(&mut self) -> Option<Tuple> {
        self.next_tuple().ok().flatten()
    }
}
