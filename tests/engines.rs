use seghash::{
    digest_to_hex, hash_all, hash_all_concurrent, plan, plan_with_chunk_limit, CancellationSignal,
    ConcurrentOptions, Digest, HashError, HashOutcome, PositionalFile, ProgressReporter,
    RangeReader, SegmentationPlan, SharedStream,
};
use sha2::{Digest as _, Sha256};
use std::fs::File;
use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use tempfile::NamedTempFile;

fn write_temp(data: &[u8]) -> NamedTempFile {
    let mut tmp = NamedTempFile::new().unwrap();
    tmp.write_all(data).unwrap();
    tmp.flush().unwrap();
    tmp
}

fn sample(len: usize) -> Vec<u8> {
    let mut state = 0x2545_f491u32;
    (0..len)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            state as u8
        })
        .collect()
}

/// Digest of each planned byte range, computed directly with sha2.
fn reference(data: &[u8], plan: &SegmentationPlan) -> Vec<String> {
    plan.segments()
        .map(|s| hex::encode(Sha256::digest(&data[s.start_offset as usize..s.end_offset() as usize])))
        .collect()
}

fn sequential(file: &File, plan: &SegmentationPlan) -> Vec<Digest> {
    let mut reader = file;
    hash_all(plan, &mut reader, &ProgressReporter::new(plan.segments_count)).unwrap()
}

fn concurrent_shared(file: &File, plan: &SegmentationPlan, cancel: &CancellationSignal) -> Vec<HashOutcome> {
    let stream = SharedStream::new(file);
    hash_all_concurrent(
        plan,
        Some(&stream),
        cancel,
        &ProgressReporter::new(plan.segments_count),
        &ConcurrentOptions::default(),
    )
    .unwrap()
}

fn hexes(outcomes: &[HashOutcome]) -> Vec<String> {
    outcomes
        .iter()
        .map(|o| digest_to_hex(o.digest().expect("segment was cancelled")))
        .collect()
}

#[test]
fn ten_byte_file_two_segments() {
    let data = b"ABCDEFGHIJ";
    let tmp = write_temp(data);
    let plan = plan(10, 2).unwrap();
    let expected = vec![
        hex::encode(Sha256::digest(b"ABCDE")),
        hex::encode(Sha256::digest(b"FGHIJ")),
    ];

    let seq: Vec<String> = sequential(tmp.as_file(), &plan).iter().map(digest_to_hex).collect();
    assert_eq!(seq, expected);
    let conc = concurrent_shared(tmp.as_file(), &plan, &CancellationSignal::new());
    assert_eq!(hexes(&conc), expected);
}

#[test]
fn eleven_byte_file_three_segments() {
    let data = b"hello world";
    let tmp = write_temp(data);
    let plan = plan(11, 3).unwrap();
    let conc = concurrent_shared(tmp.as_file(), &plan, &CancellationSignal::new());
    assert_eq!(
        hexes(&conc)[2],
        hex::encode(Sha256::digest(b"world"))
    );
    assert_eq!(hexes(&conc), reference(data, &plan));
    let seq: Vec<String> = sequential(tmp.as_file(), &plan).iter().map(digest_to_hex).collect();
    assert_eq!(seq, reference(data, &plan));
}

#[test]
fn engines_agree_across_plans() {
    let data = sample(10_007);
    let tmp = write_temp(&data);
    for segments in [1u32, 2, 3, 7, 64, 1000] {
        for chunk_limit in [1u32, 13, 4096, u32::MAX] {
            let plan = plan_with_chunk_limit(data.len() as u64, segments, chunk_limit).unwrap();
            let expected = reference(&data, &plan);
            let seq: Vec<String> = sequential(tmp.as_file(), &plan).iter().map(digest_to_hex).collect();
            assert_eq!(seq, expected, "sequential, {segments} segments, chunk {chunk_limit}");
            let conc = concurrent_shared(tmp.as_file(), &plan, &CancellationSignal::new());
            assert_eq!(hexes(&conc), expected, "shared, {segments} segments, chunk {chunk_limit}");
        }
    }
}

#[test]
fn positional_reads_match_shared_stream() {
    let data = sample(65_537);
    let tmp = write_temp(&data);
    let plan = plan_with_chunk_limit(data.len() as u64, 9, 1024).unwrap();
    let reader = PositionalFile::new(tmp.as_file());
    let out = hash_all_concurrent(
        &plan,
        Some(&reader),
        &CancellationSignal::new(),
        &ProgressReporter::new(9),
        &ConcurrentOptions { max_workers: 4 },
    )
    .unwrap();
    assert_eq!(hexes(&out), reference(&data, &plan));
}

#[test]
fn sequential_is_idempotent() {
    let data = sample(4_321);
    let tmp = write_temp(&data);
    let plan = plan(data.len() as u64, 5).unwrap();
    let first = sequential(tmp.as_file(), &plan);
    let second = sequential(tmp.as_file(), &plan);
    assert_eq!(first, second);
}

#[test]
fn cancel_before_start_cancels_everything() {
    let data = sample(2_048);
    let tmp = write_temp(&data);
    let plan = plan(2_048, 16).unwrap();
    let cancel = CancellationSignal::new();
    cancel.set();
    let progress = ProgressReporter::new(16);
    let stream = SharedStream::new(tmp.as_file());
    let out = hash_all_concurrent(
        &plan,
        Some(&stream),
        &cancel,
        &progress,
        &ConcurrentOptions::default(),
    )
    .unwrap();
    assert_eq!(out, vec![HashOutcome::Cancelled; 16]);
    assert_eq!(progress.percent(), 100);
}

#[test]
fn cancel_after_finish_changes_nothing() {
    let data = sample(3_000);
    let tmp = write_temp(&data);
    let plan = plan(3_000, 6).unwrap();
    let cancel = CancellationSignal::new();
    let out = concurrent_shared(tmp.as_file(), &plan, &cancel);
    cancel.set();
    assert_eq!(hexes(&out), reference(&data, &plan));
}

/// Sets `cancel` while serving the `trip_at`-th read.
struct CancelOnRead<'a> {
    inner: SharedStream<&'a File>,
    cancel: CancellationSignal,
    reads: AtomicUsize,
    trip_at: usize,
}

impl RangeReader for CancelOnRead<'_> {
    fn read_range(&self, offset: u64, buf: &mut [u8]) -> Result<(), HashError> {
        if self.reads.fetch_add(1, Ordering::SeqCst) + 1 == self.trip_at {
            self.cancel.set();
        }
        self.inner.read_range(offset, buf)
    }
}

#[test]
fn cancel_mid_run_keeps_finished_digests() {
    let data = sample(4_000);
    let tmp = write_temp(&data);
    // 4 segments of 1000 bytes, 10 chunk reads + 1 tail read each.
    let plan = plan_with_chunk_limit(4_000, 4, 100).unwrap();
    let expected = reference(&data, &plan);
    let cancel = CancellationSignal::new();
    let progress = ProgressReporter::new(4);
    let reader = CancelOnRead {
        inner: SharedStream::new(tmp.as_file()),
        cancel: cancel.clone(),
        reads: AtomicUsize::new(0),
        trip_at: 15,
    };

    let out = hash_all_concurrent(
        &plan,
        Some(&reader),
        &cancel,
        &progress,
        &ConcurrentOptions { max_workers: 1 },
    )
    .unwrap();

    assert_eq!(out.len(), 4);
    assert_eq!(digest_to_hex(out[0].digest().unwrap()), expected[0]);
    assert!(out[1..].iter().all(HashOutcome::is_cancelled));
    assert_eq!(progress.completed(), 4);
    assert_eq!(reader.reads.load(Ordering::SeqCst), 15);
}

#[test]
fn missing_stream_fails() {
    let plan = plan(10, 2).unwrap();
    let err = hash_all_concurrent(
        &plan,
        None,
        &CancellationSignal::new(),
        &ProgressReporter::new(2),
        &ConcurrentOptions::default(),
    )
    .unwrap_err();
    assert!(matches!(err, HashError::NullStream));
}

#[test]
fn file_shorter_than_plan_fails_both_engines() {
    let tmp = write_temp(&sample(100));
    let plan = plan(400, 4).unwrap();

    let mut reader = tmp.as_file();
    let err = hash_all(&plan, &mut reader, &ProgressReporter::new(4)).unwrap_err();
    assert!(matches!(err, HashError::TruncatedRead { .. }));

    let reader = PositionalFile::new(tmp.as_file());
    let err = hash_all_concurrent(
        &plan,
        Some(&reader),
        &CancellationSignal::new(),
        &ProgressReporter::new(4),
        &ConcurrentOptions::default(),
    )
    .unwrap_err();
    assert!(matches!(err, HashError::TruncatedRead { .. }));
}

#[test]
fn invalid_segment_counts_rejected() {
    assert!(matches!(plan(3, 5), Err(HashError::InvalidSegmentation { .. })));
    assert!(matches!(plan(3, 0), Err(HashError::InvalidSegmentation { .. })));
}
