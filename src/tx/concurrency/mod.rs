pub mod lock_table;
pub use lock_table::LockTable;

pub mod concurrency_manager;
pub use concurrency_manager::{ConcurrencyManager, LockKind};
