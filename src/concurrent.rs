//! Parallel segment hashing.
//!
//! Every segment is an independent task. A bounded pool of scoped worker
//! threads claims tasks through an atomic index, hashes them through a
//! [`RangeReader`], and reports `(index, outcome)` over a channel; the calling
//! thread places each outcome at its segment index, so output order is fixed
//! even though completion order is not.
//!
//! Cancellation is polled before each full-chunk read. A worker that observes
//! it returns [`HashOutcome::Cancelled`] and never exposes a partial digest.
//! Once the chunk loop is done the tail read and finalization run without
//! another check, so the worst-case latency is one chunk read per worker.
//!
//! With [`crate::SharedStream`] all reads are serialized and only the hashing
//! overlaps; [`crate::PositionalFile`] removes that bottleneck.

use crate::cancel::CancellationSignal;
use crate::digest::{HashOutcome, SegmentHasher};
use crate::plan::{Segment, SegmentationPlan};
use crate::progress::ProgressReporter;
use crate::stream::{HashError, RangeReader};
use crossbeam_channel::unbounded;
use log::{debug, info, warn};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::thread;

/// Tuning for [`hash_all_concurrent`].
#[derive(Debug, Clone)]
pub struct ConcurrentOptions {
    /// Upper bound on worker threads; the pool never exceeds the segment count.
    pub max_workers: usize,
}

impl Default for ConcurrentOptions {
    fn default() -> Self {
        Self {
            max_workers: num_cpus::get().max(2),
        }
    }
}

impl ConcurrentOptions {
    fn worker_count(&self, segments_count: u32) -> usize {
        self.max_workers.max(1).min(segments_count as usize)
    }
}

/// Hash every segment of `plan` in parallel.
///
/// Returns after every worker has exited. Stream errors abort the whole call
/// and no partial results are returned.
pub fn hash_all_concurrent(
    plan: &SegmentationPlan,
    source: Option<&dyn RangeReader>,
    cancel: &CancellationSignal,
    progress: &ProgressReporter,
    options: &ConcurrentOptions,
) -> Result<Vec<HashOutcome>, HashError> {
    let source = source.ok_or(HashError::NullStream)?;
    let total = plan.segments_count as usize;
    let workers = options.worker_count(plan.segments_count);
    info!(
        "Concurrent hashing: {} bytes, {} segments of {} bytes, chunk {} bytes, {} workers",
        plan.file_size, plan.segments_count, plan.segment_size, plan.chunk_size, workers
    );

    let next = AtomicUsize::new(0);
    let abort = AtomicBool::new(false);
    let (tx, rx) = unbounded::<(u32, Result<HashOutcome, HashError>)>();
    let mut results: Vec<Option<HashOutcome>> = vec![None; total];
    let mut first_error: Option<HashError> = None;

    thread::scope(|s| {
        let mut handles = Vec::with_capacity(workers);
        for worker in 0..workers {
            let tx = tx.clone();
            let next = &next;
            let abort = &abort;
            handles.push(s.spawn(move || {
                debug!("Worker {} starting", worker);
                let mut buf = vec![0u8; plan.chunk_size as usize];
                loop {
                    let i = next.fetch_add(1, Ordering::Relaxed);
                    if i >= total {
                        break;
                    }
                    let Some(segment) = plan.segment(i as u32) else {
                        break;
                    };
                    let outcome = hash_segment(plan, &segment, source, cancel, abort, &mut buf);
                    match &outcome {
                        Ok(_) => progress.complete(),
                        Err(_) => abort.store(true, Ordering::Release),
                    }
                    if tx.send((segment.index, outcome)).is_err() {
                        break;
                    }
                }
                debug!("Worker {} exiting", worker);
            }));
        }
        drop(tx);

        for (index, outcome) in rx.iter() {
            match outcome {
                Ok(o) => results[index as usize] = Some(o),
                Err(e) => {
                    warn!("Segment {} failed: {}", index, e);
                    first_error.get_or_insert(e);
                }
            }
        }

        for (i, handle) in handles.into_iter().enumerate() {
            if handle.join().is_err() {
                first_error.get_or_insert(HashError::WorkerPanicked);
            }
            debug!("Joined worker thread {}", i);
        }
    });

    if let Some(e) = first_error {
        return Err(e);
    }
    results
        .into_iter()
        .map(|r| r.ok_or(HashError::WorkerPanicked))
        .collect()
}

fn hash_segment(
    plan: &SegmentationPlan,
    segment: &Segment,
    source: &dyn RangeReader,
    cancel: &CancellationSignal,
    abort: &AtomicBool,
    buf: &mut [u8],
) -> Result<HashOutcome, HashError> {
    let chunk = u64::from(plan.chunk_size);
    let end = segment.end_offset();
    let mut offset = segment.start_offset;
    let mut hasher = SegmentHasher::new();

    while end - offset >= chunk {
        if cancel.is_set() || abort.load(Ordering::Acquire) {
            debug!(
                "Segment {} cancelled after {} bytes",
                segment.index,
                hasher.consumed()
            );
            return Ok(HashOutcome::Cancelled);
        }
        source.read_range(offset, buf)?;
        hasher.update(buf);
        offset += chunk;
    }

    let tail = &mut buf[..(end - offset) as usize];
    source.read_range(offset, tail)?;
    let digest = hasher.finalize_with(tail);
    debug!("Segment {} -> {}", segment.index, digest);
    Ok(HashOutcome::Digest(digest))
}
