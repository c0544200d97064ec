use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, info};

use super::LogRecord;
use super::log_record::OP_START;
use crate::buffer::{Buffer, BufferManager};
use crate::common::{DbError, DbResult};
use crate::log::LogManager;
use crate::tx::Transaction;

/// Undo logging and the two recovery walks, bound to one transaction.
///
/// Creating the manager writes the transaction's START record; from then on
/// every logged mutation stores its pre-image, so rolling back is a reverse
/// walk of the log applying old values.
#[derive(Clone)]
pub struct RecoveryManager {
    lm: Arc<LogManager>,
    bm: Arc<BufferManager>,
    txnum: i32,
}

impl RecoveryManager {
    pub fn new(lm: Arc<LogManager>, bm: Arc<BufferManager>, txnum: i32) -> DbResult<Self> {
        LogRecord::write_start(&lm, txnum)?;
        Ok(RecoveryManager { lm, bm, txnum })
    }

    /// Flushes this transaction's buffers, then forces a COMMIT record to
    /// disk. Once this returns, the transaction is durable.
    pub fn commit(&self) -> DbResult<()> {
        self.bm.flush_all(self.txnum)?;
        let lsn = LogRecord::write_commit(&self.lm, self.txnum)?;
        self.lm.flush(lsn)?;
        debug!("tx {} commit record at lsn {}", self.txnum, lsn);
        Ok(())
    }

    /// Undoes every change this transaction made, newest first, then logs
    /// the ROLLBACK.
    pub fn rollback(&self, tx: &mut Transaction) -> DbResult<()> {
        self.do_rollback(tx)?;
        let lsn = LogRecord::write_rollback(&self.lm, self.txnum)?;
        self.lm.flush(lsn)?;
        debug!("tx {} rolled back", self.txnum);
        Ok(())
    }

    /// Restart recovery: undoes every change of any transaction that never
    /// reached COMMIT or ROLLBACK, then fences the log with a fresh
    /// checkpoint.
    pub fn recover(&self, tx: &mut Transaction) -> DbResult<()> {
        self.do_recover(tx)?;
        let lsn = LogRecord::write_checkpoint(&self.lm)?;
        self.lm.flush(lsn)?;
        info!("restart recovery complete");
        Ok(())
    }

    /// Logs the pre-image of the int at `offset` and returns the record's
    /// LSN. The new value is irrelevant to undo-only recovery.
    pub fn set_int(&self, buf: &Buffer, offset: usize, _newval: i32) -> DbResult<i32> {
        let oldval = buf.contents().int(offset)?;
        let blk = buf.block().ok_or_else(|| DbError::BufferMissing {
            blk: "<unassigned buffer>".to_string(),
        })?;
        LogRecord::write_set_int(&self.lm, self.txnum, blk, offset as i32, oldval)
    }

    /// String flavor of [`RecoveryManager::set_int`].
    pub fn set_string(&self, buf: &Buffer, offset: usize, _newval: &str) -> DbResult<i32> {
        let oldval = buf.contents().string(offset)?;
        let blk = buf.block().ok_or_else(|| DbError::BufferMissing {
            blk: "<unassigned buffer>".to_string(),
        })?;
        LogRecord::write_set_string(&self.lm, self.txnum, blk, offset as i32, &oldval)
    }

    fn do_rollback(&self, tx: &mut Transaction) -> DbResult<()> {
        for bytes in self.lm.iterator()? {
            let rec = LogRecord::from_bytes(bytes?)?;
            if rec.tx_number() == self.txnum {
                if rec.op() == OP_START {
                    return Ok(());
                }
                rec.undo(tx)?;
            }
        }
        Ok(())
    }

    fn do_recover(&self, tx: &mut Transaction) -> DbResult<()> {
        let mut finished: HashSet<i32> = HashSet::new();
        for bytes in self.lm.iterator()? {
            let rec = LogRecord::from_bytes(bytes?)?;
            match rec {
                // recovery is complete at the last quiescent point
                LogRecord::Checkpoint => return Ok(()),
                LogRecord::Commit { txnum } | LogRecord::Rollback { txnum } => {
                    finished.insert(txnum);
                }
                _ => {
                    if !finished.contains(&rec.tx_number()) {
                        rec.undo(tx)?;
                    }
                }
            }
        }
        Ok(())
    }
}
