use std::sync::Arc;

use crate::common::DbResult;
use crate::file::{BlockId, FileManager, INT_SIZE, Page};

/// Walks log records from newest to oldest, one block at a time.
///
/// Within a block, records sit between the boundary and the end of the
/// block; when a block is exhausted the iterator moves to the previous one
/// and stops after block 0. Not thread-safe; hold one only for the duration
/// of a rollback or a restart recovery.
pub struct LogIterator {
    fm: Arc<FileManager>,
    blk: BlockId,
    page: Page,
    currentpos: usize,
}

impl LogIterator {
    pub(crate) fn new(fm: Arc<FileManager>, blk: BlockId) -> DbResult<Self> {
        let page = Page::new(fm.block_size())?;
        let mut it = LogIterator {
            fm,
            blk: blk.clone(),
            page,
            currentpos: 0,
        };
        it.move_to_block(blk)?;
        Ok(it)
    }

    fn has_next(&self) -> bool {
        self.currentpos < self.fm.block_size() || self.blk.number() > 0
    }

    fn next_record(&mut self) -> DbResult<Vec<u8>> {
        if self.currentpos == self.fm.block_size() {
            // current block exhausted, continue in the previous one
            let prev = BlockId::new(self.blk.filename().to_string(), self.blk.number() - 1)?;
            self.move_to_block(prev)?;
        }
        let rec = self.page.bytes(self.currentpos)?;
        self.currentpos += INT_SIZE + rec.len();
        Ok(rec)
    }

    fn move_to_block(&mut self, blk: BlockId) -> DbResult<()> {
        self.fm.read(&blk, &mut self.page)?;
        self.currentpos = self.page.int(0)? as usize;
        self.blk = blk;
        Ok(())
    }
}

impl Iterator for LogIterator {
    type Item = DbResult<Vec<u8>>;

    fn next(&mut self) -> Option<Self::Item> {
        if !self.has_next() {
            return None;
        }
        Some(self.next_record())
    }
}
