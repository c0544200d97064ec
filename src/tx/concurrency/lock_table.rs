use std::collections::HashMap;
use std::sync::{Condvar, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use tracing::warn;

use crate::common::{DbError, DbResult};
use crate::file::BlockId;

type Locks = HashMap<BlockId, i32>;

/// Block-granularity lock counts shared by every transaction.
///
/// An entry of `n > 0` means `n` shared holders, `-1` means one exclusive
/// holder, and an absent entry means the block is free. All waiters share one
/// condvar: an unlock wakes everyone and each waiter re-checks its predicate
/// under the mutex. A wait that outlives the timeout aborts the caller
/// instead of risking an undetected deadlock.
pub struct LockTable {
    locks: Mutex<Locks>,
    cond: Condvar,
    max_wait: Duration,
}

impl LockTable {
    pub fn new(max_wait: Duration) -> Self {
        LockTable {
            locks: Mutex::new(HashMap::new()),
            cond: Condvar::new(),
            max_wait,
        }
    }

    /// Acquires a shared lock on `blk`, waiting out any exclusive holder.
    pub fn slock(&self, blk: &BlockId) -> DbResult<()> {
        let deadline = Instant::now() + self.max_wait;
        let mut locks = self.locks.lock().unwrap();
        while locks.get(blk).copied().unwrap_or(0) == -1 {
            locks = self.wait(locks, deadline, blk)?;
        }
        *locks.entry(blk.clone()).or_insert(0) += 1;
        Ok(())
    }

    /// Acquires an exclusive lock on `blk`. Callers escalate: they already
    /// hold their own shared lock, so a count of exactly one means no other
    /// holder remains and the upgrade proceeds.
    pub fn xlock(&self, blk: &BlockId) -> DbResult<()> {
        let deadline = Instant::now() + self.max_wait;
        let mut locks = self.locks.lock().unwrap();
        while locks.get(blk).copied().unwrap_or(0) > 1 {
            locks = self.wait(locks, deadline, blk)?;
        }
        locks.insert(blk.clone(), -1);
        Ok(())
    }

    /// Releases one hold on `blk` and wakes every waiter.
    pub fn unlock(&self, blk: &BlockId) {
        let mut locks = self.locks.lock().unwrap();
        match locks.get(blk).copied() {
            Some(val) if val > 1 => {
                locks.insert(blk.clone(), val - 1);
            }
            Some(_) => {
                locks.remove(blk);
            }
            None => {}
        }
        self.cond.notify_all();
    }

    fn wait<'a>(
        &'a self,
        locks: MutexGuard<'a, Locks>,
        deadline: Instant,
        blk: &BlockId,
    ) -> DbResult<MutexGuard<'a, Locks>> {
        let now = Instant::now();
        if now >= deadline {
            warn!("lock wait timed out on {}", blk);
            return Err(DbError::LockAbort {
                blk: blk.to_string(),
            });
        }
        let (guard, _) = self.cond.wait_timeout(locks, deadline - now).unwrap();
        Ok(guard)
    }
}
