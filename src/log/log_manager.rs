use std::sync::{Arc, Mutex};

use tracing::debug;

use super::LogIterator;
use crate::common::DbResult;
use crate::file::{BlockId, FileManager, INT_SIZE, Page};

/// Append-only write-ahead log over a single file.
///
/// Records are packed from the tail of each block downwards; the first four
/// bytes of a block hold the boundary, the offset of the most recently
/// written record. `append` only touches the in-memory page; callers that
/// need durability ask for it with `flush`.
pub struct LogManager {
    fm: Arc<FileManager>,
    logfile: String,
    state: Mutex<LogState>,
}

struct LogState {
    logpage: Page,
    currentblk: BlockId,
    latest_lsn: i32,
    saved_lsn: i32,
}

impl LogManager {
    pub fn new(fm: Arc<FileManager>, logfile: impl Into<String>) -> DbResult<Self> {
        let logfile = logfile.into();
        let mut logpage = Page::new(fm.block_size())?;
        let logsize = fm.length(&logfile)?;
        let currentblk = if logsize == 0 {
            Self::append_new_block(&fm, &logfile, &mut logpage)?
        } else {
            let blk = BlockId::new(logfile.clone(), logsize - 1)?;
            fm.read(&blk, &mut logpage)?;
            blk
        };
        Ok(LogManager {
            fm,
            logfile,
            state: Mutex::new(LogState {
                logpage,
                currentblk,
                latest_lsn: 0,
                saved_lsn: 0,
            }),
        })
    }

    /// Appends a record and returns its LSN. LSNs are 1-based and strictly
    /// increasing. Nothing reaches disk here unless the record forces a move
    /// to a fresh block.
    pub fn append(&self, rec: &[u8]) -> DbResult<i32> {
        let mut st = self.state.lock().unwrap();
        let mut boundary = st.logpage.int(0)?;
        let bytes_needed = (INT_SIZE + rec.len()) as i32;

        if boundary - bytes_needed < INT_SIZE as i32 {
            // the record does not fit, so move to the next block
            self.write_page(&mut st)?;
            st.currentblk = Self::append_new_block(&self.fm, &self.logfile, &mut st.logpage)?;
            boundary = st.logpage.int(0)?;
        }

        let recpos = (boundary - bytes_needed) as usize;
        st.logpage.set_bytes(recpos, rec)?;
        st.logpage.set_int(0, recpos as i32)?;
        st.latest_lsn += 1;
        debug!("appended log record lsn={} ({} bytes)", st.latest_lsn, rec.len());
        Ok(st.latest_lsn)
    }

    /// Ensures every record up to and including `lsn` is on disk.
    pub fn flush(&self, lsn: i32) -> DbResult<()> {
        let mut st = self.state.lock().unwrap();
        if lsn >= st.saved_lsn {
            self.write_page(&mut st)?;
        }
        Ok(())
    }

    /// Flushes the tail and returns an iterator over the records from newest
    /// to oldest.
    pub fn iterator(&self) -> DbResult<LogIterator> {
        let mut st = self.state.lock().unwrap();
        self.write_page(&mut st)?;
        LogIterator::new(self.fm.clone(), st.currentblk.clone())
    }

    fn write_page(&self, st: &mut LogState) -> DbResult<()> {
        self.fm.write(&st.currentblk, &st.logpage)?;
        st.saved_lsn = st.latest_lsn;
        Ok(())
    }

    fn append_new_block(fm: &FileManager, logfile: &str, logpage: &mut Page) -> DbResult<BlockId> {
        let blk = fm.append(logfile)?;
        logpage.set_int(0, fm.block_size() as i32)?;
        fm.write(&blk, logpage)?;
        Ok(blk)
    }
}
