use std::io::{Read, Seek, SeekFrom};
use std::sync::Mutex;

use super::{HashError, RangeReader};

/// One seekable stream shared by every worker.
///
/// The cursor lives behind a single mutex held across the whole seek+read
/// pair, so at most one worker touches the stream at any instant. Workers
/// only overlap while hashing the bytes they already hold.
pub struct SharedStream<S> {
    inner: Mutex<S>,
}

impl<S: Read + Seek + Send> SharedStream<S> {
    pub fn new(stream: S) -> Self {
        Self {
            inner: Mutex::new(stream),
        }
    }

    /// Give the underlying stream back to the caller.
    pub fn into_inner(self) -> S {
        match self.inner.into_inner() {
            Ok(s) => s,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl<S: Read + Seek + Send> RangeReader for SharedStream<S> {
    fn read_range(&self, offset: u64, buf: &mut [u8]) -> Result<(), HashError> {
        // Every read seeks first, so a poisoned cursor is still usable.
        let mut stream = match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        stream.seek(SeekFrom::Start(offset))?;
        stream
            .read_exact(buf)
            .map_err(|e| HashError::from_read(e, offset, buf.len() as u64))
    }
}
