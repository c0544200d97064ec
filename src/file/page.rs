use crate::common::{DbError, DbResult};

/// Number of bytes used to store an integer on a page.
pub const INT_SIZE: usize = 4;

/// An in-memory copy of a disk block, with typed accessors.
/// All integers are 4-byte little-endian; byte strings are length-prefixed.
pub struct Page {
    buffer: Vec<u8>,
}

impl Page {
    pub fn new(blocksize: usize) -> DbResult<Self> {
        if blocksize == 0 {
            return Err(DbError::InvalidArgument(
                "page size must be positive".to_string(),
            ));
        }
        Ok(Page {
            buffer: vec![0u8; blocksize],
        })
    }

    /// Wraps an existing buffer, typically a log record being decoded.
    pub fn from_bytes(buffer: Vec<u8>) -> DbResult<Self> {
        if buffer.is_empty() {
            return Err(DbError::InvalidArgument(
                "page buffer must not be empty".to_string(),
            ));
        }
        Ok(Page { buffer })
    }

    pub fn int(&self, offset: usize) -> DbResult<i32> {
        self.check(offset, INT_SIZE)?;
        let bytes: [u8; INT_SIZE] = self.buffer[offset..offset + INT_SIZE].try_into().unwrap();
        Ok(i32::from_le_bytes(bytes))
    }

    pub fn set_int(&mut self, offset: usize, value: i32) -> DbResult<()> {
        self.check(offset, INT_SIZE)?;
        self.buffer[offset..offset + INT_SIZE].copy_from_slice(&value.to_le_bytes());
        Ok(())
    }

    pub fn bytes(&self, offset: usize) -> DbResult<Vec<u8>> {
        let length = self.int(offset)?;
        let length = usize::try_from(length).map_err(|_| DbError::CorruptPage {
            offset,
            len: 0,
            blocksize: self.buffer.len(),
        })?;
        self.check(offset + INT_SIZE, length)?;
        Ok(self.buffer[offset + INT_SIZE..offset + INT_SIZE + length].to_vec())
    }

    pub fn set_bytes(&mut self, offset: usize, value: &[u8]) -> DbResult<()> {
        self.check(offset, INT_SIZE + value.len())?;
        self.set_int(offset, value.len() as i32)?;
        self.buffer[offset + INT_SIZE..offset + INT_SIZE + value.len()].copy_from_slice(value);
        Ok(())
    }

    pub fn string(&self, offset: usize) -> DbResult<String> {
        let bytes = self.bytes(offset)?;
        let len = bytes.len();
        String::from_utf8(bytes).map_err(|_| DbError::CorruptPage {
            offset,
            len,
            blocksize: self.buffer.len(),
        })
    }

    pub fn set_string(&mut self, offset: usize, value: &str) -> DbResult<()> {
        self.set_bytes(offset, value.as_bytes())
    }

    /// Upper bound on the space a string of `length` code points can take:
    /// the length prefix plus the worst-case four UTF-8 bytes per code point.
    pub fn max_length(length: usize) -> usize {
        INT_SIZE + length * 4
    }

    pub fn contents(&self) -> &[u8] {
        &self.buffer
    }

    pub(crate) fn contents_mut(&mut self) -> &mut [u8] {
        &mut self.buffer
    }

    pub fn size(&self) -> usize {
        self.buffer.len()
    }

    fn check(&self, offset: usize, len: usize) -> DbResult<()> {
        if offset.checked_add(len).is_none_or(|end| end > self.buffer.len()) {
            return Err(DbError::CorruptPage {
                offset,
                len,
                blocksize: self.buffer.len(),
            });
        }
        Ok(())
    }
}
