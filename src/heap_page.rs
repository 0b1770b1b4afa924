//! Heap page: a fixed-size byte block holding a header bitmap and a fixed
//! number of fixed-width tuple slots.
//!
//! The slot-count and header-size formulas follow the teacher's
//! `HeapPage::get_rows_count` / `get_header_size` (`src/page.rs`),
//! generalized from int-only tuples to any `TupleDesc`.

use crate::error::{DbError, DbResult};
use crate::tuple::{Tuple, TupleDesc};
use crate::types::{PageId, RecordId, TransactionId};
use bit_vec::BitVec;

/// Number of slots a page of `page_size` bytes holds for tuples of
/// `tuple_size` bytes: `floor((page_size*8) / (tuple_size*8 + 1))`.
pub fn num_slots(page_size: usize, tuple_size: usize) -> usize {
    if tuple_size == 0 {
        return 0;
    }
    (page_size * 8) / (tuple_size * 8 + 1)
}

/// `ceil(num_slots / 8)`.
pub fn header_size(num_slots: usize) -> usize {
    (num_slots + 7) / 8
}

pub struct HeapPage {
    pid: PageId,
    desc: TupleDesc,
    page_size: usize,
    header: BitVec,
    slots: Vec<Option<Tuple>>,
    dirty: Option<TransactionId>,
    before_image: Vec<u8>,
}

impl HeapPage {
    /// Parses a byte image of exactly `page_size` bytes.
    pub fn decode(pid: PageId, desc: TupleDesc, page_size: usize, bytes: &[u8]) -> DbResult<HeapPage> {
        if bytes.len() != page_size {
            return Err(DbError::db("heap page byte image has wrong length"));
        }
        let tuple_size = desc.size();
        let n_slots = num_slots(page_size, tuple_size);
        let hdr_size = header_size(n_slots);

        let header = BitVec::from_bytes(&bytes[0..hdr_size]);

        let mut slots = Vec::with_capacity(n_slots);
        let mut start = hdr_size;
        for i in 0..n_slots {
            let end = start + tuple_size;
            if header.get(i) == Some(true) {
                let mut tuple = Tuple::decode(desc.clone(), &bytes[start..end])?;
                tuple.set_record_id(RecordId::new(pid, i));
                slots.push(Some(tuple));
            } else {
                slots.push(None);
            }
            start = end;
        }

        let mut page = HeapPage {
            pid,
            desc,
            page_size,
            header,
            slots,
            dirty: None,
            before_image: bytes.to_vec(),
        };
        page.before_image = page.encode()?;
        Ok(page)
    }

    /// A page with no slots in use, suitable for a freshly extended file.
    pub fn empty(pid: PageId, desc: TupleDesc, page_size: usize) -> DbResult<HeapPage> {
        let zeros = vec![0u8; page_size];
        HeapPage::decode(pid, desc, page_size, &zeros)
    }

    pub fn pid(&self) -> PageId {
        self.pid
    }

    pub fn tuple_desc(&self) -> &TupleDesc {
        &self.desc
    }

    pub fn num_slots(&self) -> usize {
        self.slots.len()
    }

    pub fn num_used_slots(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    pub fn num_empty_slots(&self) -> usize {
        self.num_slots() - self.num_used_slots()
    }

    pub fn is_slot_used(&self, i: usize) -> bool {
        self.header.get(i) == Some(true)
    }

    fn mark_slot_used(&mut self, i: usize, used: bool) {
        self.header.set(i, used);
    }

    /// Produces the canonical byte image. `encode(decode(b)) == b`.
    pub fn encode(&self) -> DbResult<Vec<u8>> {
        let tuple_size = self.desc.size();
        let hdr_size = header_size(self.slots.len());
        let mut out = Vec::with_capacity(self.page_size);
        out.extend_from_slice(&self.header.to_bytes());
        // BitVec::to_bytes rounds up to a whole byte already; hdr_size matches.
        debug_assert_eq!(out.len(), hdr_size);

        for slot in &self.slots {
            match slot {
                Some(tuple) => out.extend(tuple.encode()?),
                None => out.extend(std::iter::repeat(0u8).take(tuple_size)),
            }
        }

        out.resize(self.page_size, 0);
        Ok(out)
    }

    /// Inserts `tuple` into the first free slot. Fails if the schema
    /// doesn't match or there is no free slot. Stamps the tuple's record
    /// id and returns the stamped copy.
    pub fn insert_tuple(&mut self, mut tuple: Tuple) -> DbResult<Tuple> {
        if tuple.desc() != &self.desc {
            return Err(DbError::db("tuple descriptor does not match page schema"));
        }
        let slot = (0..self.slots.len())
            .find(|&i| !self.is_slot_used(i))
            .ok_or_else(|| DbError::db("no free slot in page"))?;

        let rid = RecordId::new(self.pid, slot);
        tuple.set_record_id(rid);
        self.slots[slot] = Some(tuple.clone());
        self.mark_slot_used(slot, true);
        Ok(tuple)
    }

    /// Deletes the tuple identified by its record id. Fails if the record
    /// id doesn't reference this page or the slot isn't in use.
    pub fn delete_tuple(&mut self, tuple: &Tuple) -> DbResult<()> {
        let rid = tuple
            .record_id()
            .ok_or_else(|| DbError::db("tuple has no record id"))?;
        if rid.page_id != self.pid {
            return Err(DbError::db("tuple does not belong to this page"));
        }
        if !self.is_slot_used(rid.slot) {
            return Err(DbError::db("slot is not in use"));
        }
        self.slots[rid.slot] = None;
        self.mark_slot_used(rid.slot, false);
        Ok(())
    }

    /// Lazy, finite iterator over used tuples in slot order. Not
    /// restartable; callers re-request an iterator.
    pub fn iter(&self) -> impl Iterator<Item = &Tuple> {
        self.slots.iter().filter_map(|s| s.as_ref())
    }

    pub fn mark_dirty(&mut self, tid: Option<TransactionId>) {
        self.dirty = tid;
    }

    pub fn is_dirty(&self) -> Option<TransactionId> {
        self.dirty
    }

    /// Returns a page constructed from the saved before-image snapshot.
    pub fn before_image_page(&self) -> DbResult<HeapPage> {
        HeapPage::decode(self.pid, self.desc.clone(), self.page_size, &self.before_image)
    }

    /// Captures the current byte image as the new before-image snapshot.
    /// Called on commit.
    pub fn set_before_image(&mut self) -> DbResult<()> {
        self.before_image = self.encode()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::Field;

    fn desc() -> TupleDesc {
        TupleDesc::simple_ints(2, "f")
    }

    fn tuple(a: i32, b: i32) -> Tuple {
        Tuple::new(desc(), vec![Field::Int(a), Field::Int(b)]).unwrap()
    }

    fn pid() -> PageId {
        PageId::new(crate::types::TableId(1), 0)
    }

    #[test]
    fn slot_count_matches_formula() {
        // tuple size 8 bytes -> numSlots = floor(4096*8 / (8*8+1))
        assert_eq!(num_slots(4096, 8), (4096 * 8) / (8 * 8 + 1));
    }

    #[test]
    fn encode_decode_round_trip() {
        let mut page = HeapPage::empty(pid(), desc(), 4096).unwrap();
        page.insert_tuple(tuple(1, 2)).unwrap();
        page.insert_tuple(tuple(3, 4)).unwrap();
        let bytes = page.encode().unwrap();

        let decoded = HeapPage::decode(pid(), desc(), 4096, &bytes).unwrap();
        let again = decoded.encode().unwrap();
        assert_eq!(bytes, again);
        assert_eq!(decoded.num_used_slots(), 2);
    }

    #[test]
    fn insert_fills_first_free_slot_and_stamps_record_id() {
        let mut page = HeapPage::empty(pid(), desc(), 4096).unwrap();
        let stamped = page.insert_tuple(tuple(5, 6)).unwrap();
        assert_eq!(stamped.record_id().unwrap().slot, 0);
        assert_eq!(page.num_used_slots(), 1);
    }

    #[test]
    fn insert_rejects_schema_mismatch() {
        let mut page = HeapPage::empty(pid(), desc(), 4096).unwrap();
        let other = Tuple::new(TupleDesc::simple_ints(1, "g"), vec![Field::Int(1)]).unwrap();
        assert!(page.insert_tuple(other).is_err());
    }

    #[test]
    fn delete_then_insert_leaves_consistent_popcount() {
        let mut page = HeapPage::empty(pid(), desc(), 4096).unwrap();
        let t = page.insert_tuple(tuple(1, 1)).unwrap();
        assert_eq!(page.num_used_slots() + page.num_empty_slots(), page.num_slots());
        page.delete_tuple(&t).unwrap();
        assert_eq!(page.num_used_slots(), 0);
        assert_eq!(page.num_used_slots() + page.num_empty_slots(), page.num_slots());
    }

    #[test]
    fn delete_unknown_record_id_fails() {
        let mut page = HeapPage::empty(pid(), desc(), 4096).unwrap();
        let foreign = Tuple::new(desc(), vec![Field::Int(9), Field::Int(9)]).unwrap();
        assert!(page.delete_tuple(&foreign).is_err());
    }

    #[test]
    fn before_image_round_trips() {
        let mut page = HeapPage::empty(pid(), desc(), 4096).unwrap();
        page.insert_tuple(tuple(1, 2)).unwrap();
        page.set_before_image().unwrap();
        page.insert_tuple(tuple(3, 4)).unwrap();
        let before = page.before_image_page().unwrap();
        assert_eq!(before.num_used_slots(), 1);
        assert_eq!(page.num_used_slots(), 2);
    }
}
