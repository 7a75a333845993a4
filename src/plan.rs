//! Segment and chunk arithmetic.
//!
//! A file of `file_size` bytes is split into `segments_count` segments of
//! `segment_size = file_size / segments_count` bytes each; the last segment
//! also absorbs the `file_size % segments_count` trailing bytes. Segments
//! are read in chunks of at most `chunk_size` bytes to bound memory.

use crate::stream::HashError;

/// Upper bound for a single read: 128 MiB.
pub const DEFAULT_CHUNK_SIZE: u32 = 8 * 1024 * 1024 * 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentationPlan {
    pub file_size: u64,
    pub segments_count: u32,
    pub segment_size: u64,
    pub chunk_size: u32,
}

/// A contiguous byte range that receives one digest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment {
    pub index: u32,
    pub start_offset: u64,
    pub length: u64,
}

impl Segment {
    pub fn end_offset(&self) -> u64 {
        self.start_offset + self.length
    }
}

/// Plan with the default chunk bound.
pub fn plan(file_size: u64, segments_count: u32) -> Result<SegmentationPlan, HashError> {
    plan_with_chunk_limit(file_size, segments_count, DEFAULT_CHUNK_SIZE)
}

/// Plan with an explicit per-read bound.
///
/// Fails with [`HashError::InvalidSegmentation`] when `segments_count` is zero
/// or exceeds `file_size` (every segment must get at least one byte).
pub fn plan_with_chunk_limit(
    file_size: u64,
    segments_count: u32,
    chunk_limit: u32,
) -> Result<SegmentationPlan, HashError> {
    if segments_count == 0 || file_size < u64::from(segments_count) {
        return Err(HashError::InvalidSegmentation {
            file_size,
            segments_count,
        });
    }
    if chunk_limit == 0 {
        return Err(HashError::InvalidChunkLimit);
    }

    let segment_size = file_size / u64::from(segments_count);
    // segment_size >= 1 here, and the min keeps chunk_size within u32.
    let chunk_size = segment_size.min(u64::from(chunk_limit)) as u32;

    Ok(SegmentationPlan {
        file_size,
        segments_count,
        segment_size,
        chunk_size,
    })
}

impl SegmentationPlan {
    /// Bytes left over by the floor division; belongs to the last segment.
    pub fn remainder(&self) -> u64 {
        self.file_size - self.segment_size * u64::from(self.segments_count)
    }

    /// The segment at `index`, or `None` past the end.
    pub fn segment(&self, index: u32) -> Option<Segment> {
        if index >= self.segments_count {
            return None;
        }
        let mut length = self.segment_size;
        if index == self.segments_count - 1 {
            length += self.remainder();
        }
        Some(Segment {
            index,
            start_offset: u64::from(index) * self.segment_size,
            length,
        })
    }

    pub fn segments(&self) -> impl Iterator<Item = Segment> + '_ {
        (0..self.segments_count).filter_map(move |i| self.segment(i))
    }
}
