use std::sync::Arc;

use super::{FieldType, Layout};
use crate::common::{DbError, DbResult};
use crate::file::BlockId;
use crate::tx::Transaction;

/// Slot is free.
pub const SLOT_EMPTY: i32 = 0;
/// Slot holds a record.
pub const SLOT_USED: i32 = 1;

/// Slot-structured view of one data block.
///
/// Every access routes through the owning transaction, so reads take shared
/// locks and writes take exclusive locks and are logged automatically.
pub struct RecordPage {
    blk: BlockId,
    layout: Arc<Layout>,
}

impl RecordPage {
    /// Pins `blk` for the lifetime of this view; the caller unpins it when
    /// moving on.
    pub fn new(tx: &mut Transaction, blk: BlockId, layout: Arc<Layout>) -> DbResult<Self> {
        tx.pin(&blk)?;
        Ok(RecordPage { blk, layout })
    }

    pub fn block(&self) -> &BlockId {
        &self.blk
    }

    pub fn get_int(&self, tx: &mut Transaction, slot: i32, fldname: &str) -> DbResult<i32> {
        let fldpos = self.field_pos(slot, fldname)?;
        tx.get_int(&self.blk, fldpos)
    }

    pub fn set_int(&self, tx: &mut Transaction, slot: i32, fldname: &str, val: i32) -> DbResult<()> {
        let fldpos = self.field_pos(slot, fldname)?;
        tx.set_int(&self.blk, fldpos, val, true)
    }

    pub fn get_string(&self, tx: &mut Transaction, slot: i32, fldname: &str) -> DbResult<String> {
        let fldpos = self.field_pos(slot, fldname)?;
        tx.get_string(&self.blk, fldpos)
    }

    pub fn set_string(
        &self,
        tx: &mut Transaction,
        slot: i32,
        fldname: &str,
        val: &str,
    ) -> DbResult<()> {
        let fldpos = self.field_pos(slot, fldname)?;
        tx.set_string(&self.blk, fldpos, val, true)
    }

    pub fn delete(&self, tx: &mut Transaction, slot: i32) -> DbResult<()> {
        self.set_flag(tx, slot, SLOT_EMPTY)
    }

    /// Marks every slot empty and zeroes every field. These writes are not
    /// logged: the block is fresh and has no pre-image worth keeping.
    pub fn format(&self, tx: &mut Transaction) -> DbResult<()> {
        let mut slot = 0;
        while self.is_valid_slot(tx, slot) {
            tx.set_int(&self.blk, self.slot_offset(slot), SLOT_EMPTY, false)?;
            for fldname in self.layout.schema().fields() {
                let fldpos = self.slot_offset(slot) + self.layout.offset(fldname).unwrap_or(0);
                match self.layout.schema().field_type(fldname) {
                    Some(FieldType::Integer) => tx.set_int(&self.blk, fldpos, 0, false)?,
                    Some(FieldType::Varchar) => tx.set_string(&self.blk, fldpos, "", false)?,
                    None => {}
                }
            }
            slot += 1;
        }
        Ok(())
    }

    /// Smallest used slot after `slot`, or -1.
    pub fn next_after(&self, tx: &mut Transaction, slot: i32) -> DbResult<i32> {
        self.search_after(tx, slot, SLOT_USED)
    }

    /// Claims the smallest empty slot after `slot`, or returns -1 when the
    /// block is full.
    pub fn insert_after(&self, tx: &mut Transaction, slot: i32) -> DbResult<i32> {
        let newslot = self.search_after(tx, slot, SLOT_EMPTY)?;
        if newslot >= 0 {
            self.set_flag(tx, newslot, SLOT_USED)?;
        }
        Ok(newslot)
    }

    fn search_after(&self, tx: &mut Transaction, mut slot: i32, flag: i32) -> DbResult<i32> {
        slot += 1;
        while self.is_valid_slot(tx, slot) {
            if tx.get_int(&self.blk, self.slot_offset(slot))? == flag {
                return Ok(slot);
            }
            slot += 1;
        }
        Ok(-1)
    }

    fn set_flag(&self, tx: &mut Transaction, slot: i32, flag: i32) -> DbResult<()> {
        tx.set_int(&self.blk, self.slot_offset(slot), flag, true)
    }

    fn is_valid_slot(&self, tx: &Transaction, slot: i32) -> bool {
        self.slot_offset(slot + 1) <= tx.block_size()
    }

    fn slot_offset(&self, slot: i32) -> usize {
        slot as usize * self.layout.slot_size()
    }

    fn field_pos(&self, slot: i32, fldname: &str) -> DbResult<usize> {
        let offset = self
            .layout
            .offset(fldname)
            .ok_or_else(|| DbError::InvalidArgument(format!("no such field: {}", fldname)))?;
        Ok(self.slot_offset(slot) + offset)
    }
}
