use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::{Arc, Mutex};

use tracing::debug;

use super::BufferList;
use super::concurrency::{ConcurrencyManager, LockTable};
use super::recovery::RecoveryManager;
use crate::buffer::{Buffer, BufferManager};
use crate::common::{DbError, DbResult};
use crate::file::{BlockId, FileManager};
use crate::log::LogManager;

static NEXT_TXNUM: AtomicI32 = AtomicI32::new(0);

fn next_txnum() -> i32 {
    NEXT_TXNUM.fetch_add(1, Ordering::SeqCst) + 1
}

/// One unit of work against the engine.
///
/// Reads take shared locks, writes take exclusive locks and log their
/// pre-images, and the transaction terminates exactly once through `commit`
/// or `rollback`. Blocks must be pinned before they are read or written;
/// the transaction tracks its pins and returns them when it ends.
pub struct Transaction {
    fm: Arc<FileManager>,
    bm: Arc<BufferManager>,
    txnum: i32,
    cm: ConcurrencyManager,
    rm: RecoveryManager,
    buffers: BufferList,
}

impl Transaction {
    pub fn new(
        fm: Arc<FileManager>,
        lm: Arc<LogManager>,
        bm: Arc<BufferManager>,
        lock_table: Arc<LockTable>,
    ) -> DbResult<Self> {
        let txnum = next_txnum();
        let rm = RecoveryManager::new(lm, bm.clone(), txnum)?;
        debug!("tx {} started", txnum);
        Ok(Transaction {
            fm,
            bm: bm.clone(),
            txnum,
            cm: ConcurrencyManager::new(lock_table),
            rm,
            buffers: BufferList::new(bm),
        })
    }

    pub fn tx_number(&self) -> i32 {
        self.txnum
    }

    pub fn pin(&mut self, blk: &BlockId) -> DbResult<()> {
        self.buffers.pin(blk)
    }

    pub fn unpin(&mut self, blk: &BlockId) {
        self.buffers.unpin(blk)
    }

    pub fn get_int(&mut self, blk: &BlockId, offset: usize) -> DbResult<i32> {
        self.cm.slock(blk)?;
        let buf = self.pinned(blk)?;
        let b = buf.lock().unwrap();
        b.contents().int(offset)
    }

    pub fn get_string(&mut self, blk: &BlockId, offset: usize) -> DbResult<String> {
        self.cm.slock(blk)?;
        let buf = self.pinned(blk)?;
        let b = buf.lock().unwrap();
        b.contents().string(offset)
    }

    /// Writes `val` at `offset`. With `should_log` the pre-image goes to the
    /// log first; undo writes pass `false` so they are never themselves
    /// undone.
    pub fn set_int(
        &mut self,
        blk: &BlockId,
        offset: usize,
        val: i32,
        should_log: bool,
    ) -> DbResult<()> {
        self.cm.xlock(blk)?;
        let buf = self.pinned(blk)?;
        let mut b = buf.lock().unwrap();
        let lsn = if should_log {
            self.rm.set_int(&b, offset, val)?
        } else {
            -1
        };
        b.contents_mut().set_int(offset, val)?;
        b.set_modified(self.txnum, lsn);
        Ok(())
    }

    pub fn set_string(
        &mut self,
        blk: &BlockId,
        offset: usize,
        val: &str,
        should_log: bool,
    ) -> DbResult<()> {
        self.cm.xlock(blk)?;
        let buf = self.pinned(blk)?;
        let mut b = buf.lock().unwrap();
        let lsn = if should_log {
            self.rm.set_string(&b, offset, val)?
        } else {
            -1
        };
        b.contents_mut().set_string(offset, val)?;
        b.set_modified(self.txnum, lsn);
        Ok(())
    }

    /// Number of blocks in `filename`. Takes a shared lock on the end-of-file
    /// sentinel so concurrent appenders cannot slip a phantom block in.
    pub fn size(&mut self, filename: &str) -> DbResult<i64> {
        let eof = BlockId::end_of_file(filename);
        self.cm.slock(&eof)?;
        self.fm.length(filename)
    }

    /// Appends a zero-filled block to `filename` under an exclusive lock on
    /// the end-of-file sentinel.
    pub fn append(&mut self, filename: &str) -> DbResult<BlockId> {
        let eof = BlockId::end_of_file(filename);
        self.cm.xlock(&eof)?;
        self.fm.append(filename)
    }

    pub fn block_size(&self) -> usize {
        self.fm.block_size()
    }

    pub fn available_buffs(&self) -> usize {
        self.bm.available()
    }

    /// Makes the transaction durable, then releases its locks and pins.
    /// An error before the commit record hits disk propagates with all
    /// resources still held.
    pub fn commit(&mut self) -> DbResult<()> {
        self.rm.commit()?;
        debug!("tx {} committed", self.txnum);
        self.cm.release();
        self.buffers.unpin_all();
        Ok(())
    }

    /// Restores every pre-image this transaction logged, then releases its
    /// locks and pins.
    pub fn rollback(&mut self) -> DbResult<()> {
        let rm = self.rm.clone();
        rm.rollback(self)?;
        debug!("tx {} rolled back", self.txnum);
        self.cm.release();
        self.buffers.unpin_all();
        Ok(())
    }

    /// Restart recovery. Run on a fresh transaction before any user work.
    pub fn recover(&mut self) -> DbResult<()> {
        self.bm.flush_all(self.txnum)?;
        let rm = self.rm.clone();
        rm.recover(self)
    }

    fn pinned(&self, blk: &BlockId) -> DbResult<Arc<Mutex<Buffer>>> {
        self.buffers
            .get(blk)
            .cloned()
            .ok_or_else(|| DbError::BufferMissing {
                blk: blk.to_string(),
            })
    }
}
