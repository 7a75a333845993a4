use ascii_table::{Align, AsciiTable};
use clap::{Parser, ValueEnum};
use seghash::{
    hash_all, hash_all_concurrent, outcomes_agree, plan_with_chunk_limit, CancellationSignal,
    ConcurrentOptions, Digest, HashError, HashOutcome, PositionalFile, ProgressReporter,
    RangeReader, SegmentationPlan, SharedStream, DEFAULT_CHUNK_SIZE,
};
use std::fs::File;
use std::io::BufRead;
use std::path::PathBuf;
use std::time::Instant;

/// Command-line interface for seghash
#[derive(Parser, Debug)]
#[command(
    name = "seghash",
    version,
    about = "SHA-256 digests of file segments, sequential and parallel"
)]
struct Cli {
    /// File to hash
    file: PathBuf,

    /// Number of segments to split the file into
    #[arg(short, long, value_name = "SEGMENTS")]
    segments: u32,

    /// Maximum number of worker threads for the concurrent run
    #[arg(short, long, value_name = "THREADS", default_value_t = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1))]
    threads: usize,

    /// Upper bound in bytes for a single read
    #[arg(short, long, value_name = "BYTES", default_value_t = DEFAULT_CHUNK_SIZE)]
    chunk_size: u32,

    /// How concurrent workers read the file
    #[arg(long, value_enum, default_value_t = IoMode::Shared)]
    io: IoMode,

    /// Which engines to run
    #[arg(long, value_enum, default_value_t = RunMode::Both)]
    mode: RunMode,

    /// Disables the progress bar
    #[arg(long)]
    no_progress: bool,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum IoMode {
    /// One file cursor behind a lock
    Shared,
    /// Positional reads, no shared cursor
    Positional,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum RunMode {
    Both,
    Sequential,
    Concurrent,
}

fn reporter(cli: &Cli, total: u32, message: &'static str) -> ProgressReporter {
    if cli.no_progress {
        ProgressReporter::new(total)
    } else {
        ProgressReporter::with_bar(total, message)
    }
}

/// Sets `cancel` when the user enters `q` on standard input.
fn spawn_cancel_listener(cancel: CancellationSignal) {
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            match line {
                Ok(l) if l.trim() == "q" => {
                    cancel.set();
                    return;
                }
                Ok(_) => continue,
                Err(_) => return,
            }
        }
    });
}

fn run_concurrent(
    cli: &Cli,
    plan: &SegmentationPlan,
    file: &File,
) -> Result<Vec<HashOutcome>, HashError> {
    let cancel = CancellationSignal::new();
    spawn_cancel_listener(cancel.clone());
    println!("Enter 'q' to abort calculation...");

    let options = ConcurrentOptions {
        max_workers: cli.threads,
    };
    let progress = reporter(cli, plan.segments_count, "Hashing (concurrent)...");

    let shared;
    let positional;
    let source: &dyn RangeReader = match cli.io {
        IoMode::Shared => {
            shared = SharedStream::new(file);
            &shared
        }
        IoMode::Positional => {
            positional = PositionalFile::new(file);
            &positional
        }
    };

    let outcomes = hash_all_concurrent(plan, Some(source), &cancel, &progress, &options)?;
    progress.finish(if cancel.is_set() {
        "Cancelled"
    } else {
        "Done"
    });
    Ok(outcomes)
}

fn run_sequential(cli: &Cli, plan: &SegmentationPlan, file: &File) -> Result<Vec<Digest>, HashError> {
    let progress = reporter(cli, plan.segments_count, "Hashing (sequential)...");
    let mut reader = file;
    let digests = hash_all(plan, &mut reader, &progress)?;
    progress.finish("Done");
    Ok(digests)
}

fn print_results(concurrent: Option<&[HashOutcome]>, sequential: Option<&[Digest]>) {
    let mut table = AsciiTable::default();
    table.set_max_width(160);
    table.column(0).set_header("Segment").set_align(Align::Right);
    let mut col = 1;
    if concurrent.is_some() {
        table.column(col).set_header("Concurrent");
        col += 1;
    }
    if sequential.is_some() {
        table.column(col).set_header("Sequential");
    }

    let count = concurrent
        .map(|c| c.len())
        .or(sequential.map(|s| s.len()))
        .unwrap_or(0);
    let rows: Vec<Vec<String>> = (0..count)
        .map(|i| {
            let mut row = vec![(i + 1).to_string()];
            if let Some(c) = concurrent {
                row.push(match &c[i] {
                    HashOutcome::Digest(d) => d.to_hex(),
                    HashOutcome::Cancelled => "cancelled".to_string(),
                });
            }
            if let Some(s) = sequential {
                row.push(s[i].to_hex());
            }
            row
        })
        .collect();
    table.print(rows);
}

fn main() {
    // Initialize logging using env_logger and SEGHASH_LOG
    env_logger::Builder::from_env(env_logger::Env::new().filter("SEGHASH_LOG")).init();

    let cli = Cli::parse();

    let file = match File::open(&cli.file) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Cannot open {}: {}", cli.file.display(), e);
            return;
        }
    };
    let file_size = match file.metadata() {
        Ok(m) => m.len(),
        Err(e) => {
            eprintln!("Cannot stat {}: {}", cli.file.display(), e);
            return;
        }
    };
    let plan = match plan_with_chunk_limit(file_size, cli.segments, cli.chunk_size) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("{}", e);
            return;
        }
    };

    let mut concurrent = None;
    if cli.mode != RunMode::Sequential {
        let start = Instant::now();
        match run_concurrent(&cli, &plan, &file) {
            Ok(outcomes) => {
                println!("Concurrent time: {} ms", start.elapsed().as_millis());
                concurrent = Some(outcomes);
            }
            Err(e) => {
                eprintln!("Concurrent hashing failed: {}", e);
                return;
            }
        }
    }

    let mut sequential = None;
    if cli.mode != RunMode::Concurrent {
        let start = Instant::now();
        match run_sequential(&cli, &plan, &file) {
            Ok(digests) => {
                println!("Sequential time: {} ms", start.elapsed().as_millis());
                sequential = Some(digests);
            }
            Err(e) => {
                eprintln!("Sequential hashing failed: {}", e);
                return;
            }
        }
    }

    print_results(concurrent.as_deref(), sequential.as_deref());

    if let (Some(c), Some(s)) = (concurrent.as_deref(), sequential.as_deref()) {
        let cancelled = c.iter().filter(|o| o.is_cancelled()).count();
        if !outcomes_agree(s, c) {
            println!("Results differ.");
        } else if cancelled > 0 {
            println!(
                "Finished segments agree ({} of {} cancelled).",
                cancelled,
                c.len()
            );
        } else {
            println!("Results agree.");
        }
    }
}
