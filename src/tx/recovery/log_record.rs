use std::fmt;

use crate::common::{DbError, DbResult};
use crate::file::{BlockId, INT_SIZE, Page};
use crate::log::LogManager;
use crate::tx::Transaction;

pub const OP_CHECKPOINT: i32 = 0;
pub const OP_START: i32 = 1;
pub const OP_COMMIT: i32 = 2;
pub const OP_ROLLBACK: i32 = 3;
pub const OP_SETINT: i32 = 4;
pub const OP_SETSTRING: i32 = 5;

/// Records written to the write-ahead log.
///
/// Every record starts with a 4-byte opcode; the payload uses the page codec.
/// SetInt/SetString carry the pre-image only: recovery is undo-only, so the
/// new value never needs to be replayed.
#[derive(Debug, Clone, PartialEq)]
pub enum LogRecord {
    Checkpoint,
    Start {
        txnum: i32,
    },
    Commit {
        txnum: i32,
    },
    Rollback {
        txnum: i32,
    },
    SetInt {
        txnum: i32,
        blk: BlockId,
        offset: i32,
        val: i32,
    },
    SetString {
        txnum: i32,
        blk: BlockId,
        offset: i32,
        val: String,
    },
}

impl LogRecord {
    pub fn from_bytes(bytes: Vec<u8>) -> DbResult<Self> {
        let p = Page::from_bytes(bytes)?;
        let op = p.int(0)?;
        match op {
            OP_CHECKPOINT => Ok(LogRecord::Checkpoint),
            OP_START => Ok(LogRecord::Start {
                txnum: p.int(INT_SIZE)?,
            }),
            OP_COMMIT => Ok(LogRecord::Commit {
                txnum: p.int(INT_SIZE)?,
            }),
            OP_ROLLBACK => Ok(LogRecord::Rollback {
                txnum: p.int(INT_SIZE)?,
            }),
            OP_SETINT => {
                let tpos = INT_SIZE;
                let txnum = p.int(tpos)?;
                let fpos = tpos + INT_SIZE;
                let filename = p.string(fpos)?;
                let bpos = fpos + Page::max_length(filename.len());
                let blknum = p.int(bpos)?;
                let opos = bpos + INT_SIZE;
                let offset = p.int(opos)?;
                let vpos = opos + INT_SIZE;
                let val = p.int(vpos)?;
                Ok(LogRecord::SetInt {
                    txnum,
                    blk: BlockId::new(filename, blknum as i64)?,
                    offset,
                    val,
                })
            }
            OP_SETSTRING => {
                let tpos = INT_SIZE;
                let txnum = p.int(tpos)?;
                let fpos = tpos + INT_SIZE;
                let filename = p.string(fpos)?;
                let bpos = fpos + Page::max_length(filename.len());
                let blknum = p.int(bpos)?;
                let opos = bpos + INT_SIZE;
                let offset = p.int(opos)?;
                let vpos = opos + INT_SIZE;
                let val = p.string(vpos)?;
                Ok(LogRecord::SetString {
                    txnum,
                    blk: BlockId::new(filename, blknum as i64)?,
                    offset,
                    val,
                })
            }
            other => Err(DbError::InvalidLogRecord(other)),
        }
    }

    pub fn op(&self) -> i32 {
        match self {
            LogRecord::Checkpoint => OP_CHECKPOINT,
            LogRecord::Start { .. } => OP_START,
            LogRecord::Commit { .. } => OP_COMMIT,
            LogRecord::Rollback { .. } => OP_ROLLBACK,
            LogRecord::SetInt { .. } => OP_SETINT,
            LogRecord::SetString { .. } => OP_SETSTRING,
        }
    }

    /// Transaction the record belongs to; -1 for checkpoints, which belong
    /// to none.
    pub fn tx_number(&self) -> i32 {
        match self {
            LogRecord::Checkpoint => -1,
            LogRecord::Start { txnum }
            | LogRecord::Commit { txnum }
            | LogRecord::Rollback { txnum } => *txnum,
            LogRecord::SetInt { txnum, .. } | LogRecord::SetString { txnum, .. } => *txnum,
        }
    }

    /// Reverts the change this record describes. Only the Set variants touch
    /// the database, and the undo write itself is never logged.
    pub fn undo(&self, tx: &mut Transaction) -> DbResult<()> {
        match self {
            LogRecord::SetInt { blk, offset, val, .. } => {
                tx.pin(blk)?;
                let res = tx.set_int(blk, *offset as usize, *val, false);
                tx.unpin(blk);
                res
            }
            LogRecord::SetString { blk, offset, val, .. } => {
                tx.pin(blk)?;
                let res = tx.set_string(blk, *offset as usize, val, false);
                tx.unpin(blk);
                res
            }
            _ => Ok(()),
        }
    }

    pub fn write_checkpoint(lm: &LogManager) -> DbResult<i32> {
        let mut p = Page::new(INT_SIZE)?;
        p.set_int(0, OP_CHECKPOINT)?;
        lm.append(p.contents())
    }

    pub fn write_start(lm: &LogManager, txnum: i32) -> DbResult<i32> {
        Self::write_tx_only(lm, OP_START, txnum)
    }

    pub fn write_commit(lm: &LogManager, txnum: i32) -> DbResult<i32> {
        Self::write_tx_only(lm, OP_COMMIT, txnum)
    }

    pub fn write_rollback(lm: &LogManager, txnum: i32) -> DbResult<i32> {
        Self::write_tx_only(lm, OP_ROLLBACK, txnum)
    }

    pub fn write_set_int(
        lm: &LogManager,
        txnum: i32,
        blk: &BlockId,
        offset: i32,
        val: i32,
    ) -> DbResult<i32> {
        let tpos = INT_SIZE;
        let fpos = tpos + INT_SIZE;
        let bpos = fpos + Page::max_length(blk.filename().len());
        let opos = bpos + INT_SIZE;
        let vpos = opos + INT_SIZE;

        let mut p = Page::new(vpos + INT_SIZE)?;
        p.set_int(0, OP_SETINT)?;
        p.set_int(tpos, txnum)?;
        p.set_string(fpos, blk.filename())?;
        p.set_int(bpos, blk.number() as i32)?;
        p.set_int(opos, offset)?;
        p.set_int(vpos, val)?;
        lm.append(p.contents())
    }

    pub fn write_set_string(
        lm: &LogManager,
        txnum: i32,
        blk: &BlockId,
        offset: i32,
        val: &str,
    ) -> DbResult<i32> {
        let tpos = INT_SIZE;
        let fpos = tpos + INT_SIZE;
        let bpos = fpos + Page::max_length(blk.filename().len());
        let opos = bpos + INT_SIZE;
        let vpos = opos + INT_SIZE;

        let mut p = Page::new(vpos + Page::max_length(val.len()))?;
        p.set_int(0, OP_SETSTRING)?;
        p.set_int(tpos, txnum)?;
        p.set_string(fpos, blk.filename())?;
        p.set_int(bpos, blk.number() as i32)?;
        p.set_int(opos, offset)?;
        p.set_string(vpos, val)?;
        lm.append(p.contents())
    }

    fn write_tx_only(lm: &LogManager, op: i32, txnum: i32) -> DbResult<i32> {
        let mut p = Page::new(2 * INT_SIZE)?;
        p.set_int(0, op)?;
        p.set_int(INT_SIZE, txnum)?;
        lm.append(p.contents())
    }
}

impl fmt::Display for LogRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogRecord::Checkpoint => write!(f, "<CHECKPOINT>"),
            LogRecord::Start { txnum } => write!(f, "<START {}>", txnum),
            LogRecord::Commit { txnum } => write!(f, "<COMMIT {}>", txnum),
            LogRecord::Rollback { txnum } => write!(f, "<ROLLBACK {}>", txnum),
            LogRecord::SetInt {
                txnum,
                blk,
                offset,
                val,
            } => write!(f, "<SETINT {} {} {} {}>", txnum, blk, offset, val),
            LogRecord::SetString {
                txnum,
                blk,
                offset,
                val,
            } => write!(f, "<SETSTRING {} {} {} {}>", txnum, blk, offset, val),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file::FileManager;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn setup() -> (TempDir, LogManager) {
        let dir = TempDir::new().expect("temp dir");
        let fm = Arc::new(FileManager::new(dir.path().join("records"), 400).expect("fm"));
        let lm = LogManager::new(fm, "test.log").expect("lm");
        (dir, lm)
    }

    #[test]
    fn test_set_string_record_roundtrip() {
        let (_dir, lm) = setup();
        let blk = BlockId::new("data.tbl", 6).unwrap();
        let lsn = LogRecord::write_set_string(&lm, 42, &blk, 80, "old value").expect("write");
        lm.flush(lsn).expect("flush");

        let bytes = lm.iterator().expect("iter").next().unwrap().unwrap();
        let rec = LogRecord::from_bytes(bytes).expect("decode");
        assert_eq!(
            rec,
            LogRecord::SetString {
                txnum: 42,
                blk,
                offset: 80,
                val: "old value".to_string(),
            }
        );
        assert_eq!(rec.tx_number(), 42);
        assert_eq!(rec.op(), OP_SETSTRING);
    }

    #[test]
    fn test_set_int_record_keeps_pre_image() {
        let (_dir, lm) = setup();
        let blk = BlockId::new("data.tbl", 0).unwrap();
        let lsn = LogRecord::write_set_int(&lm, 7, &blk, 12, -99).expect("write");
        lm.flush(lsn).expect("flush");

        let bytes = lm.iterator().expect("iter").next().unwrap().unwrap();
        match LogRecord::from_bytes(bytes).expect("decode") {
            LogRecord::SetInt { txnum, offset, val, .. } => {
                assert_eq!((txnum, offset, val), (7, 12, -99));
            }
            other => panic!("unexpected record {}", other),
        }
    }

    #[test]
    fn test_checkpoint_carries_no_txnum() {
        let mut p = Page::new(INT_SIZE).unwrap();
        p.set_int(0, OP_CHECKPOINT).unwrap();
        let rec = LogRecord::from_bytes(p.contents().to_vec()).expect("decode");
        assert_eq!(rec, LogRecord::Checkpoint);
        assert_eq!(rec.tx_number(), -1);
    }

    #[test]
    fn test_unknown_opcode_is_rejected() {
        let mut p = Page::new(2 * INT_SIZE).unwrap();
        p.set_int(0, 99).unwrap();
        assert!(matches!(
            LogRecord::from_bytes(p.contents().to_vec()),
            Err(DbError::InvalidLogRecord(99))
        ));
    }

    #[test]
    fn test_lifecycle_records_roundtrip() {
        let (_dir, lm) = setup();
        LogRecord::write_start(&lm, 3).unwrap();
        LogRecord::write_commit(&lm, 3).unwrap();
        let lsn = LogRecord::write_rollback(&lm, 4).unwrap();
        lm.flush(lsn).unwrap();

        let records: Vec<LogRecord> = lm
            .iterator()
            .unwrap()
            .map(|bytes| LogRecord::from_bytes(bytes.unwrap()).unwrap())
            .collect();
        assert_eq!(
            records,
            vec![
                LogRecord::Rollback { txnum: 4 },
                LogRecord::Commit { txnum: 3 },
                LogRecord::Start { txnum: 3 },
            ]
        );
    }
}
