use super::{Constant, Rid};
use crate::common::DbResult;

/// Read side of every scan: the closed capability set the query layer
/// depends on. Any correct implementation satisfies it.
pub trait Scan {
    /// Positions the scan before its first record, so the next `next` call
    /// lands on the first one.
    fn before_first(&mut self) -> DbResult<()>;

    /// Moves to the next record; false when there is none.
    fn next(&mut self) -> DbResult<bool>;

    fn get_int(&mut self, fldname: &str) -> DbResult<i32>;

    fn get_string(&mut self, fldname: &str) -> DbResult<String>;

    fn get_val(&mut self, fldname: &str) -> DbResult<Constant>;

    fn has_field(&self, fldname: &str) -> bool;

    /// Closes the scan and any subscans, releasing pinned blocks.
    fn close(&mut self);
}

/// Scans that can also modify their underlying table.
pub trait UpdateScan: Scan {
    fn set_int(&mut self, fldname: &str, val: i32) -> DbResult<()>;

    fn set_string(&mut self, fldname: &str, val: &str) -> DbResult<()>;

    fn set_val(&mut self, fldname: &str, val: &Constant) -> DbResult<()>;

    /// Positions the scan on a freshly claimed slot, appending a block when
    /// the file is full.
    fn insert(&mut self) -> DbResult<()>;

    fn delete(&mut self) -> DbResult<()>;

    fn get_rid(&self) -> Rid;

    fn move_to_rid(&mut self, rid: Rid) -> DbResult<()>;
}
