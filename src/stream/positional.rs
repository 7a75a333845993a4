use std::fs::File;
use std::io;

use super::{HashError, RangeReader};

/// Positional reads against an open file.
///
/// Every read carries its own offset, so there is no shared cursor and no
/// lock: workers read in parallel. The file handle is only borrowed.
pub struct PositionalFile<'a> {
    file: &'a File,
}

impl<'a> PositionalFile<'a> {
    pub fn new(file: &'a File) -> Self {
        Self { file }
    }
}

#[cfg(unix)]
fn read_exact_at(file: &File, buf: &mut [u8], offset: u64) -> io::Result<()> {
    use std::os::unix::fs::FileExt;
    file.read_exact_at(buf, offset)
}

#[cfg(windows)]
fn read_exact_at(file: &File, mut buf: &mut [u8], mut offset: u64) -> io::Result<()> {
    use std::os::windows::fs::FileExt;
    while !buf.is_empty() {
        match file.seek_read(buf, offset) {
            Ok(0) => {
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "failed to fill whole buffer",
                ))
            }
            Ok(n) => {
                let rest = buf;
                buf = &mut rest[n..];
                offset += n as u64;
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(())
}

impl RangeReader for PositionalFile<'_> {
    fn read_range(&self, offset: u64, buf: &mut [u8]) -> Result<(), HashError> {
        read_exact_at(self.file, buf, offset)
            .map_err(|e| HashError::from_read(e, offset, buf.len() as u64))
    }
}
