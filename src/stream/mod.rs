pub mod positional;
pub mod shared;

use std::fmt;
use std::io;

/// Errors surfaced by planning and hashing.
///
/// Cancellation is not an error: a cancelled segment is reported as
/// [`crate::HashOutcome::Cancelled`].
#[derive(Debug)]
pub enum HashError {
    /// Segment count is zero or larger than the file size.
    InvalidSegmentation { file_size: u64, segments_count: u32 },
    /// A zero chunk limit was requested.
    InvalidChunkLimit,
    /// No stream was supplied to the concurrent engine.
    NullStream,
    /// The stream ended before `expected` bytes could be read at `offset`.
    TruncatedRead { offset: u64, expected: u64 },
    Io(io::Error),
    /// A worker thread panicked before reporting its segment.
    WorkerPanicked,
}

impl fmt::Display for HashError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HashError::InvalidSegmentation {
                file_size,
                segments_count,
            } => write!(
                f,
                "invalid segmentation: cannot split {} bytes into {} segments",
                file_size, segments_count
            ),
            HashError::InvalidChunkLimit => write!(f, "chunk limit must be at least one byte"),
            HashError::NullStream => write!(f, "no stream supplied"),
            HashError::TruncatedRead { offset, expected } => write!(
                f,
                "truncated read: expected {} bytes at offset {}",
                expected, offset
            ),
            HashError::Io(e) => write!(f, "io error: {}", e),
            HashError::WorkerPanicked => write!(f, "hashing worker panicked"),
        }
    }
}

impl std::error::Error for HashError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            HashError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for HashError {
    fn from(e: io::Error) -> Self {
        HashError::Io(e)
    }
}

impl HashError {
    /// Map a failed exact read of `expected` bytes at `offset`.
    pub(crate) fn from_read(e: io::Error, offset: u64, expected: u64) -> Self {
        if e.kind() == io::ErrorKind::UnexpectedEof {
            HashError::TruncatedRead { offset, expected }
        } else {
            HashError::Io(e)
        }
    }
}

/// Random-access byte source shared by concurrent hashing workers.
///
/// `read_range` fills `buf` completely with the bytes starting at `offset`,
/// or fails with [`HashError::TruncatedRead`] if the stream is shorter.
/// Implementations must be safe to call from many threads at once.
pub trait RangeReader: Send + Sync {
    fn read_range(&self, offset: u64, buf: &mut [u8]) -> Result<(), HashError>;

    /// Allocating variant of [`RangeReader::read_range`].
    fn read_range_vec(&self, offset: u64, length: u32) -> Result<Vec<u8>, HashError> {
        let mut buf = vec![0u8; length as usize];
        self.read_range(offset, &mut buf)?;
        Ok(buf)
    }
}

pub use positional::PositionalFile;
pub use shared::SharedStream;
