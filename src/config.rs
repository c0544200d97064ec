//! This file provides the engine tunables for stonedb.
//! Caution: if you change the block size below, make sure you have deleted
//! old database files before restarting, or page boundaries will no longer
//! line up with what is on disk.

pub const _NAME: &str = "stonedb";
pub const _VERSION: &str = "0.1.0";

pub const LOG_LEVEL: &str = "debug";
pub const LOG_PATH: &str = "./logs/stonedb.log";

pub const BLOCK_SIZE: usize = 4 * 1024; // 4 KB

pub const BUFFER_COUNT: usize = 8;

pub const LOCK_TIMEOUT_MS: u64 = 10_000; // applies to lock waits and buffer pins

pub const LOG_FILENAME: &str = "stonedb.log";

/// Runtime configuration handed to [`crate::Database`].
/// The defaults mirror the constants above.
#[derive(Debug, Clone)]
pub struct DbConfig {
    pub block_size: usize,
    pub buffer_count: usize,
    pub lock_timeout_ms: u64,
    pub log_filename: String,
}

impl Default for DbConfig {
    fn default() -> Self {
        DbConfig {
            block_size: BLOCK_SIZE,
            buffer_count: BUFFER_COUNT,
            lock_timeout_ms: LOCK_TIMEOUT_MS,
            log_filename: LOG_FILENAME.to_string(),
        }
    }
}

impl DbConfig {
    pub fn with_block_size(mut self, block_size: usize) -> Self {
        self.block_size = block_size;
        self
    }

    pub fn with_buffer_count(mut self, buffer_count: usize) -> Self {
        self.buffer_count = buffer_count;
        self
    }

    pub fn with_lock_timeout_ms(mut self, lock_timeout_ms: u64) -> Self {
        self.lock_timeout_ms = lock_timeout_ms;
        self
    }

    pub fn with_log_filename(mut self, log_filename: impl Into<String>) -> Self {
        self.log_filename = log_filename.into();
        self
    }
}
