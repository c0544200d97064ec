use std::sync::Arc;

use crate::common::DbResult;
use crate::file::{BlockId, FileManager, Page};
use crate::log::LogManager;

/// One slot of the buffer pool: a page plus the bookkeeping that says which
/// block it holds, how many clients pinned it, and which transaction last
/// modified it.
///
/// `modifying_tx == -1` means the page matches the disk copy. While dirty,
/// `lsn` is the highest log record covering the modification.
pub struct Buffer {
    fm: Arc<FileManager>,
    lm: Arc<LogManager>,
    contents: Page,
    blk: Option<BlockId>,
    pins: i32,
    txnum: i32,
    lsn: i32,
}

impl Buffer {
    pub(crate) fn new(fm: Arc<FileManager>, lm: Arc<LogManager>) -> DbResult<Self> {
        let contents = Page::new(fm.block_size())?;
        Ok(Buffer {
            fm,
            lm,
            contents,
            blk: None,
            pins: 0,
            txnum: -1,
            lsn: -1,
        })
    }

    pub fn contents(&self) -> &Page {
        &self.contents
    }

    pub fn contents_mut(&mut self) -> &mut Page {
        &mut self.contents
    }

    pub fn block(&self) -> Option<&BlockId> {
        self.blk.as_ref()
    }

    pub fn modifying_tx(&self) -> i32 {
        self.txnum
    }

    pub fn is_pinned(&self) -> bool {
        self.pins > 0
    }

    /// Marks the page dirty on behalf of `txnum`. A non-positive `lsn` leaves
    /// the recorded LSN unchanged (unlogged writes).
    pub fn set_modified(&mut self, txnum: i32, lsn: i32) {
        self.txnum = txnum;
        if lsn > 0 {
            self.lsn = lsn;
        }
    }

    pub(crate) fn pin(&mut self) {
        self.pins += 1;
    }

    pub(crate) fn unpin(&mut self) {
        self.pins -= 1;
    }

    /// Writes the page back if it is dirty. The log is flushed through this
    /// buffer's LSN first, so the pre-image record is always on disk before
    /// the page itself.
    pub(crate) fn flush(&mut self) -> DbResult<()> {
        if self.txnum >= 0 {
            self.lm.flush(self.lsn)?;
            if let Some(blk) = &self.blk {
                self.fm.write(blk, &self.contents)?;
            }
            self.txnum = -1;
        }
        Ok(())
    }

    /// Repurposes this buffer for `blk`: flushes the old contents if dirty,
    /// then reads the new block in.
    pub(crate) fn assign_to_block(&mut self, blk: BlockId) -> DbResult<()> {
        self.flush()?;
        self.fm.read(&blk, &mut self.contents)?;
        self.blk = Some(blk);
        self.pins = 0;
        Ok(())
    }
}
