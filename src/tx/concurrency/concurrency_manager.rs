use std::collections::HashMap;
use std::sync::Arc;

use super::LockTable;
use crate::common::DbResult;
use crate::file::BlockId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockKind {
    Shared,
    Exclusive,
}

/// Per-transaction view of the shared lock table.
///
/// Remembers the strongest lock held on each block, so repeat requests are
/// no-ops and an exclusive request on a block we already read escalates
/// instead of re-acquiring. Strict two-phase: nothing is released before
/// `release`, which the transaction calls at commit or rollback.
pub struct ConcurrencyManager {
    lock_table: Arc<LockTable>,
    locks: HashMap<BlockId, LockKind>,
}

impl ConcurrencyManager {
    pub fn new(lock_table: Arc<LockTable>) -> Self {
        ConcurrencyManager {
            lock_table,
            locks: HashMap::new(),
        }
    }

    pub fn slock(&mut self, blk: &BlockId) -> DbResult<()> {
        if self.locks.contains_key(blk) {
            return Ok(());
        }
        self.lock_table.slock(blk)?;
        self.locks.insert(blk.clone(), LockKind::Shared);
        Ok(())
    }

    pub fn xlock(&mut self, blk: &BlockId) -> DbResult<()> {
        if self.locks.get(blk) == Some(&LockKind::Exclusive) {
            return Ok(());
        }
        // hold a shared lock first, then upgrade
        self.slock(blk)?;
        self.lock_table.xlock(blk)?;
        self.locks.insert(blk.clone(), LockKind::Exclusive);
        Ok(())
    }

    /// Releases every lock this transaction holds.
    pub fn release(&mut self) {
        for blk in self.locks.keys() {
            self.lock_table.unlock(blk);
        }
        self.locks.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn blk(n: i64) -> BlockId {
        BlockId::new("cm.tbl", n).unwrap()
    }

    #[test]
    fn test_repeat_slock_is_a_noop() {
        let lt = Arc::new(LockTable::new(Duration::from_millis(200)));
        let mut cm = ConcurrencyManager::new(lt.clone());
        let b = blk(0);
        cm.slock(&b).unwrap();
        cm.slock(&b).unwrap();
        cm.release();
        // a single release must fully free the block
        lt.xlock(&b).unwrap();
        lt.unlock(&b);
    }

    #[test]
    fn test_escalates_shared_to_exclusive() {
        let lt = Arc::new(LockTable::new(Duration::from_millis(200)));
        let mut cm = ConcurrencyManager::new(lt.clone());
        let b = blk(1);
        cm.slock(&b).unwrap();
        cm.xlock(&b).unwrap();
        cm.xlock(&b).unwrap(); // already exclusive, no-op
        cm.release();

        let mut other = ConcurrencyManager::new(lt);
        other.slock(&b).unwrap();
        other.release();
    }

    #[test]
    fn test_conflicting_exclusive_aborts() {
        let lt = Arc::new(LockTable::new(Duration::from_millis(200)));
        let mut holder = ConcurrencyManager::new(lt.clone());
        let b = blk(2);
        holder.xlock(&b).unwrap();

        let mut other = ConcurrencyManager::new(lt);
        assert!(other.slock(&b).is_err());
        holder.release();
        other.slock(&b).unwrap();
        other.release();
    }

    #[test]
    fn test_release_clears_remembered_locks() {
        let lt = Arc::new(LockTable::new(Duration::from_millis(200)));
        let mut cm = ConcurrencyManager::new(lt);
        let b = blk(3);
        cm.xlock(&b).unwrap();
        cm.release();
        // after release the manager forgets the block entirely
        cm.slock(&b).unwrap();
        cm.release();
    }
}
