use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::buffer::{Buffer, BufferManager};
use crate::common::DbResult;
use crate::file::BlockId;

/// The buffers one transaction currently has pinned.
///
/// Keeps a local pin count per block so a block pinned twice by the same
/// transaction stays available to it after a single unpin.
pub struct BufferList {
    bm: Arc<BufferManager>,
    buffers: HashMap<BlockId, (Arc<Mutex<Buffer>>, usize)>,
}

impl BufferList {
    pub fn new(bm: Arc<BufferManager>) -> Self {
        BufferList {
            bm,
            buffers: HashMap::new(),
        }
    }

    pub fn get(&self, blk: &BlockId) -> Option<&Arc<Mutex<Buffer>>> {
        self.buffers.get(blk).map(|(buf, _)| buf)
    }

    pub fn pin(&mut self, blk: &BlockId) -> DbResult<()> {
        let buf = self.bm.pin(blk)?;
        let entry = self.buffers.entry(blk.clone()).or_insert((buf, 0));
        entry.1 += 1;
        Ok(())
    }

    pub fn unpin(&mut self, blk: &BlockId) {
        if let Some((buf, count)) = self.buffers.get_mut(blk) {
            self.bm.unpin(buf);
            *count -= 1;
            if *count == 0 {
                self.buffers.remove(blk);
            }
        }
    }

    /// Returns every local pin to the pool. Called once at commit/rollback.
    pub fn unpin_all(&mut self) {
        for (buf, count) in self.buffers.values() {
            for _ in 0..*count {
                self.bm.unpin(buf);
            }
        }
        self.buffers.clear();
    }
}
