//! Single-threaded reference engine.
//!
//! Walks the segments in order over one stream. After rewinding once the
//! cursor is always at the start of the next segment, so no further seeks are
//! issued. Cancellation is not observed here.

use crate::digest::{Digest, SegmentHasher};
use crate::plan::SegmentationPlan;
use crate::progress::ProgressReporter;
use crate::stream::HashError;
use log::{debug, info};
use std::io::{Read, Seek, SeekFrom};

/// Hash every segment of `plan` from the start of `stream`.
pub fn hash_all<R: Read + Seek>(
    plan: &SegmentationPlan,
    stream: &mut R,
    progress: &ProgressReporter,
) -> Result<Vec<Digest>, HashError> {
    info!(
        "Sequential hashing: {} bytes, {} segments of {} bytes, chunk {} bytes",
        plan.file_size, plan.segments_count, plan.segment_size, plan.chunk_size
    );
    stream.seek(SeekFrom::Start(0))?;

    let chunk = plan.chunk_size as usize;
    let mut buf = vec![0u8; chunk];
    let mut digests = Vec::with_capacity(plan.segments_count as usize);

    for segment in plan.segments() {
        let mut hasher = SegmentHasher::new();
        let mut offset = segment.start_offset;
        let end = segment.end_offset();

        while end - offset >= chunk as u64 {
            stream
                .read_exact(&mut buf)
                .map_err(|e| HashError::from_read(e, offset, chunk as u64))?;
            hasher.update(&buf);
            offset += chunk as u64;
        }

        // Tail is shorter than one chunk; on the last segment it includes
        // the file remainder.
        let tail = (end - offset) as usize;
        stream
            .read_exact(&mut buf[..tail])
            .map_err(|e| HashError::from_read(e, offset, tail as u64))?;
        let digest = hasher.finalize_with(&buf[..tail]);
        debug!("Segment {} -> {}", segment.index, digest);

        digests.push(digest);
        progress.complete();
    }

    Ok(digests)
}
