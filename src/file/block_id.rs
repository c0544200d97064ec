use std::fmt;

use crate::common::{DbError, DbResult};

/// Identity of a disk block: a file name plus a block number within that
/// file. Cheap to clone, compared and hashed by value, so it can key the
/// buffer pool and lock table maps directly.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BlockId {
    filename: String,
    number: i64,
}

impl BlockId {
    pub fn new(filename: impl Into<String>, number: i64) -> DbResult<Self> {
        let filename = filename.into();
        if filename.is_empty() {
            return Err(DbError::InvalidArgument(
                "block filename is empty".to_string(),
            ));
        }
        if number < 0 {
            return Err(DbError::InvalidArgument(format!(
                "negative block number: {}",
                number
            )));
        }
        Ok(BlockId { filename, number })
    }

    /// Lock-only identity serializing appends against length queries on
    /// `filename`. It never reaches the file manager, so it is the one
    /// BlockId allowed to carry a negative block number.
    pub(crate) fn end_of_file(filename: impl Into<String>) -> Self {
        BlockId {
            filename: filename.into(),
            number: -1,
        }
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn number(&self) -> i64 {
        self.number
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[file {}, block {}]", self.filename, self.number)
    }
}
