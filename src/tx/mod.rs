pub mod concurrency;
pub mod recovery;

pub mod buffer_list;
pub use buffer_list::BufferList;

pub mod transaction;
pub use transaction::Transaction;
