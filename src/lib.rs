pub mod buffer;
pub mod common;
pub mod config;
pub mod file;
pub mod log;
pub mod record;
pub mod tx;

#[cfg(test)]
pub(crate) mod utils;

use std::fs;
use std::path::{self, Path};
use std::sync::Arc;
use std::time::Duration;

use tracing::info;
use tracing_subscriber::prelude::*;

use crate::buffer::BufferManager;
use crate::common::DbResult;
use crate::config::DbConfig;
use crate::file::FileManager;
use crate::log::LogManager;
use crate::tx::Transaction;
use crate::tx::concurrency::LockTable;

pub fn init_log() {
    let log_dir = path::Path::new(config::LOG_PATH).parent().unwrap();
    let log_filename = path::Path::new(config::LOG_PATH)
        .file_name()
        .unwrap()
        .to_str()
        .unwrap();
    fs::create_dir_all(log_dir).unwrap();

    let stdout_log = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stdout)
        .with_ansi(true)
        .with_thread_names(true)
        .with_level(true);

    let file_appender = tracing_appender::rolling::daily(log_dir, log_filename);
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    Box::leak(Box::new(_guard));

    let file_log = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_thread_names(true)
        .with_level(true);

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config::LOG_LEVEL))
        .with(stdout_log)
        .with(file_log)
        .init();
}

/// Umbrella resource holder, one per database directory.
///
/// Owns the shared managers, hands out transactions, and releases the file
/// handles through an explicit `close` rather than a finalizer. Opening an
/// existing directory runs restart recovery before any user work.
pub struct Database {
    fm: Arc<FileManager>,
    lm: Arc<LogManager>,
    bm: Arc<BufferManager>,
    lock_table: Arc<LockTable>,
}

impl Database {
    pub fn new(db_dir: impl AsRef<Path>) -> DbResult<Self> {
        Self::with_config(db_dir, DbConfig::default())
    }

    pub fn with_config(db_dir: impl AsRef<Path>, cfg: DbConfig) -> DbResult<Self> {
        let timeout = Duration::from_millis(cfg.lock_timeout_ms);
        let fm = Arc::new(FileManager::new(db_dir.as_ref(), cfg.block_size)?);
        let lm = Arc::new(LogManager::new(fm.clone(), cfg.log_filename)?);
        let bm = Arc::new(BufferManager::new(
            fm.clone(),
            lm.clone(),
            cfg.buffer_count,
            timeout,
        )?);
        let db = Database {
            fm,
            lm,
            bm,
            lock_table: Arc::new(LockTable::new(timeout)),
        };

        if db.fm.is_new() {
            info!("creating new database");
        } else {
            info!("recovering existing database");
            let mut tx = db.new_tx()?;
            tx.recover()?;
            tx.commit()?;
        }
        Ok(db)
    }

    pub fn new_tx(&self) -> DbResult<Transaction> {
        Transaction::new(
            self.fm.clone(),
            self.lm.clone(),
            self.bm.clone(),
            self.lock_table.clone(),
        )
    }

    pub fn file_manager(&self) -> &Arc<FileManager> {
        &self.fm
    }

    pub fn log_manager(&self) -> &Arc<LogManager> {
        &self.lm
    }

    pub fn buffer_manager(&self) -> &Arc<BufferManager> {
        &self.bm
    }

    pub fn block_size(&self) -> usize {
        self.fm.block_size()
    }

    /// Flushes the log tail and closes every file handle.
    pub fn close(&self) -> DbResult<()> {
        self.lm.flush(i32::MAX)?;
        self.fm.close()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn test_config() -> DbConfig {
        DbConfig::default()
            .with_block_size(400)
            .with_lock_timeout_ms(500)
    }

    #[test]
    #[serial]
    fn test_commit_survives_reopen() {
        let dir = utils::test_dir("db_reopen".to_string());
        let blk = {
            let db = Database::with_config(&dir, test_config()).expect("open");
            let mut tx = db.new_tx().expect("tx");
            let blk = tx.append("accounts.tbl").expect("append");
            tx.pin(&blk).expect("pin");
            tx.set_int(&blk, 0, 250, true).expect("write");
            tx.commit().expect("commit");
            db.close().expect("close");
            blk
        };

        let db = Database::with_config(&dir, test_config()).expect("reopen");
        let mut tx = db.new_tx().expect("tx");
        tx.pin(&blk).expect("pin");
        assert_eq!(tx.get_int(&blk, 0).unwrap(), 250);
        tx.commit().expect("commit");
        db.close().expect("close");
    }

    #[test]
    #[serial]
    fn test_reopen_rolls_back_unfinished_work() {
        let dir = utils::test_dir("db_crash".to_string());
        let blk = {
            let db = Database::with_config(&dir, test_config()).expect("open");
            let mut tx = db.new_tx().expect("tx");
            let blk = tx.append("accounts.tbl").expect("append");
            tx.pin(&blk).expect("pin");
            tx.set_string(&blk, 80, "old", true).expect("seed");
            tx.commit().expect("commit");

            // crash mid-transaction with the dirty page already on disk
            let mut doomed = db.new_tx().expect("tx");
            doomed.pin(&blk).expect("pin");
            doomed.set_string(&blk, 80, "new", true).expect("write");
            db.buffer_manager()
                .flush_all(doomed.tx_number())
                .expect("flush");
            blk
        };

        let db = Database::with_config(&dir, test_config()).expect("reopen runs recovery");
        let mut tx = db.new_tx().expect("tx");
        tx.pin(&blk).expect("pin");
        assert_eq!(tx.get_string(&blk, 80).unwrap(), "old");
        tx.commit().expect("commit");
        db.close().expect("close");
    }
}
