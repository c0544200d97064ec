use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, RwLock};

use tracing::{debug, info};

use super::{BlockId, Page};
use crate::common::{DbError, DbResult};

/// Block-addressed file access for one database directory.
///
/// Every file is a plain sequence of fixed-size blocks with no header; block
/// `k` lives at byte offset `k * blocksize`. A successful `write` or `append`
/// means the bytes are on stable storage; this is the durability primitive
/// the recovery algorithm is built on.
pub struct FileManager {
    db_dir: PathBuf,
    blocksize: usize,
    is_new: bool,
    files: RwLock<HashMap<String, Arc<Mutex<File>>>>,
}

impl FileManager {
    pub fn new(db_dir: impl Into<PathBuf>, blocksize: usize) -> DbResult<Self> {
        if blocksize == 0 {
            return Err(DbError::InvalidArgument(
                "block size must be positive".to_string(),
            ));
        }
        let db_dir = db_dir.into();
        let is_new = !db_dir.exists();
        if is_new {
            fs::create_dir_all(&db_dir)?;
        } else if !db_dir.is_dir() {
            return Err(DbError::InvalidArgument(format!(
                "{} exists and is not a directory",
                db_dir.display()
            )));
        }

        // sweep any leftover temporary tables
        for entry in fs::read_dir(&db_dir)? {
            let entry = entry?;
            if entry.file_name().to_string_lossy().starts_with("temp") {
                fs::remove_file(entry.path())?;
            }
        }

        info!("opened database directory {:?} (new: {})", db_dir, is_new);
        Ok(FileManager {
            db_dir,
            blocksize,
            is_new,
            files: RwLock::new(HashMap::new()),
        })
    }

    pub fn read(&self, blk: &BlockId, page: &mut Page) -> DbResult<()> {
        let file = self.open(blk.filename())?;
        let mut file = file.lock().unwrap();
        file.seek(SeekFrom::Start(self.offset(blk)))?;
        file.read_exact(page.contents_mut())?;
        Ok(())
    }

    pub fn write(&self, blk: &BlockId, page: &Page) -> DbResult<()> {
        let file = self.open(blk.filename())?;
        let mut file = file.lock().unwrap();
        file.seek(SeekFrom::Start(self.offset(blk)))?;
        file.write_all(page.contents())?;
        file.sync_data()?; // ensure data is on the disk before returning
        Ok(())
    }

    /// Extends `filename` by one zero-filled block and returns its id.
    pub fn append(&self, filename: &str) -> DbResult<BlockId> {
        let file = self.open(filename)?;
        let mut file = file.lock().unwrap();
        let blknum = (file.metadata()?.len() / self.blocksize as u64) as i64;
        let blk = BlockId::new(filename, blknum)?;

        let zeros = vec![0u8; self.blocksize];
        file.seek(SeekFrom::Start(self.offset(&blk)))?;
        file.write_all(&zeros)?;
        file.sync_data()?;
        Ok(blk)
    }

    /// Number of blocks currently in `filename`.
    pub fn length(&self, filename: &str) -> DbResult<i64> {
        let file = self.open(filename)?;
        let file = file.lock().unwrap();
        Ok((file.metadata()?.len() / self.blocksize as u64) as i64)
    }

    pub fn block_size(&self) -> usize {
        self.blocksize
    }

    /// True if the directory was created by this manager, i.e. there is no
    /// existing database to recover.
    pub fn is_new(&self) -> bool {
        self.is_new
    }

    /// Flushes and drops every open handle. Call once at shutdown.
    pub fn close(&self) -> DbResult<()> {
        let mut files = self.files.write().unwrap();
        for (_, file) in files.drain() {
            file.lock().unwrap().sync_all()?;
        }
        Ok(())
    }

    fn offset(&self, blk: &BlockId) -> u64 {
        blk.number() as u64 * self.blocksize as u64
    }

    fn open(&self, filename: &str) -> DbResult<Arc<Mutex<File>>> {
        {
            let files = self.files.read().unwrap();
            if let Some(file) = files.get(filename) {
                return Ok(file.clone());
            }
        }

        let mut files = self.files.write().unwrap();
        // another thread may have opened it while we waited for the write lock
        if let Some(file) = files.get(filename) {
            return Ok(file.clone());
        }
        let path = self.db_dir.join(filename);
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(&path)?;
        debug!("opened {:?}", path);
        let file = Arc::new(Mutex::new(file));
        files.insert(filename.to_string(), file.clone());
        Ok(file)
    }
}
