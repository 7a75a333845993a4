/// Project overview:
/// - Splits a file into N contiguous segments and computes a SHA-256 digest per segment
/// - Two engines over the same plan: sequential (reference) and concurrent (bounded worker pool)
/// - Segments are read in bounded chunks so memory stays flat for large files
/// - Concurrent workers share one stream behind a lock, or read positionally without one
///
/// Key behaviors:
/// - Plan: `segment_size = file_size / segments_count`; the last segment absorbs the remainder
/// - Output is ordered by segment index regardless of completion order
/// - Cancellation is cooperative, polled between chunks; cancelled segments never expose a partial digest
/// - Stream errors abort the whole call; no partial results are returned
pub mod cancel;
pub mod concurrent;
pub mod digest;
pub mod plan;
pub mod progress;
pub mod sequential;
pub mod stream;

pub use cancel::CancellationSignal;
pub use concurrent::{hash_all_concurrent, ConcurrentOptions};
pub use digest::{digest_to_hex, Digest, HashOutcome, SegmentHasher};
pub use plan::{plan, plan_with_chunk_limit, Segment, SegmentationPlan, DEFAULT_CHUNK_SIZE};
pub use progress::ProgressReporter;
pub use sequential::hash_all;
pub use stream::{HashError, PositionalFile, RangeReader, SharedStream};

/// True when every finished concurrent outcome equals the sequential digest
/// at the same index. Cancelled entries are skipped.
pub fn outcomes_agree(sequential: &[Digest], concurrent: &[HashOutcome]) -> bool {
    sequential.len() == concurrent.len()
        && sequential
            .iter()
            .zip(concurrent)
            .all(|(s, c)| c.digest().map_or(true, |d| d == s))
}
