use std::fmt;

/// Identifier of a record within a file: the block number and the slot of
/// the record within that block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rid {
    blknum: i64,
    slot: i32,
}

impl Rid {
    pub fn new(blknum: i64, slot: i32) -> Self {
        Rid { blknum, slot }
    }

    pub fn block_number(&self) -> i64 {
        self.blknum
    }

    pub fn slot(&self) -> i32 {
        self.slot
    }
}

impl fmt::Display for Rid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.blknum, self.slot)
    }
}
