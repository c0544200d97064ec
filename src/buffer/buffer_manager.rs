use std::sync::{Arc, Condvar, Mutex};
use std::time::{Duration, Instant};

use tracing::warn;

use super::Buffer;
use crate::common::{DbError, DbResult};
use crate::file::{BlockId, FileManager};
use crate::log::LogManager;

/// Fixed pool of buffers shared by every transaction.
///
/// One mutex guards the availability count and all replacement decisions.
/// Pinners that find no free buffer release it and wait on the condvar until
/// some unpin broadcasts; the predicate is re-checked under the mutex, so a
/// spurious wakeup only costs another scan. Replacement is the naive
/// strategy: the first unpinned buffer wins.
pub struct BufferManager {
    pool: Vec<Arc<Mutex<Buffer>>>,
    available: Mutex<usize>,
    cond: Condvar,
    max_wait: Duration,
}

impl BufferManager {
    pub fn new(
        fm: Arc<FileManager>,
        lm: Arc<LogManager>,
        numbuffs: usize,
        max_wait: Duration,
    ) -> DbResult<Self> {
        if numbuffs == 0 {
            return Err(DbError::InvalidArgument(
                "buffer pool needs at least one buffer".to_string(),
            ));
        }
        let mut pool = Vec::with_capacity(numbuffs);
        for _ in 0..numbuffs {
            pool.push(Arc::new(Mutex::new(Buffer::new(fm.clone(), lm.clone())?)));
        }
        Ok(BufferManager {
            pool,
            available: Mutex::new(numbuffs),
            cond: Condvar::new(),
            max_wait,
        })
    }

    /// Number of buffers not pinned by anyone.
    pub fn available(&self) -> usize {
        *self.available.lock().unwrap()
    }

    /// Pins `blk` into a buffer, waiting up to the configured timeout for
    /// one to free up.
    pub fn pin(&self, blk: &BlockId) -> DbResult<Arc<Mutex<Buffer>>> {
        let deadline = Instant::now() + self.max_wait;
        let mut available = self.available.lock().unwrap();
        loop {
            if let Some(buf) = self.try_pin(blk, &mut available)? {
                return Ok(buf);
            }
            let now = Instant::now();
            if now >= deadline {
                warn!("pin timed out on {}", blk);
                return Err(DbError::PinTimeout {
                    blk: blk.to_string(),
                });
            }
            let (guard, _) = self
                .cond
                .wait_timeout(available, deadline - now)
                .unwrap();
            available = guard;
        }
    }

    /// Returns a pin. When the count reaches zero the buffer becomes a
    /// replacement candidate and every waiter is woken to retry.
    pub fn unpin(&self, buf: &Arc<Mutex<Buffer>>) {
        let mut available = self.available.lock().unwrap();
        let mut b = buf.lock().unwrap();
        b.unpin();
        if !b.is_pinned() {
            *available += 1;
            self.cond.notify_all();
        }
    }

    /// Writes back every buffer dirtied by `txnum`.
    pub fn flush_all(&self, txnum: i32) -> DbResult<()> {
        let _available = self.available.lock().unwrap();
        for buf in &self.pool {
            let mut b = buf.lock().unwrap();
            if b.modifying_tx() == txnum {
                b.flush()?;
            }
        }
        Ok(())
    }

    fn try_pin(
        &self,
        blk: &BlockId,
        available: &mut usize,
    ) -> DbResult<Option<Arc<Mutex<Buffer>>>> {
        let mut chosen = self.find_existing(blk);
        if chosen.is_none() {
            chosen = self.choose_unpinned();
            if let Some(buf) = &chosen {
                buf.lock().unwrap().assign_to_block(blk.clone())?;
            }
        }
        let Some(buf) = chosen else {
            return Ok(None);
        };

        let mut b = buf.lock().unwrap();
        if !b.is_pinned() {
            // first pinner takes the buffer out of the available set
            *available -= 1;
        }
        b.pin();
        drop(b);
        Ok(Some(buf))
    }

    fn find_existing(&self, blk: &BlockId) -> Option<Arc<Mutex<Buffer>>> {
        self.pool
            .iter()
            .find(|buf| buf.lock().unwrap().block() == Some(blk))
            .cloned()
    }

    // The naive strategy: first unpinned buffer wins.
    fn choose_unpinned(&self) -> Option<Arc<Mutex<Buffer>>> {
        self.pool
            .iter()
            .find(|buf| !buf.lock().unwrap().is_pinned())
            .cloned()
    }
}
