use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("I/O Error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Timed out pinning block {blk}")]
    PinTimeout { blk: String },

    #[error("Timed out locking block {blk}")]
    LockAbort { blk: String },

    #[error("Block {blk} is not pinned by this transaction")]
    BufferMissing { blk: String },

    #[error("Unknown log record opcode: {0}")]
    InvalidLogRecord(i32),

    #[error("Page access out of range: offset={offset} len={len} blocksize={blocksize}")]
    CorruptPage {
        offset: usize,
        len: usize,
        blocksize: usize,
    },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}
