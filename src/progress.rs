use indicatif::{ProgressBar, ProgressStyle};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

/// Per-invocation count of finished segments.
///
/// Clones share the counter. Each segment calls [`ProgressReporter::complete`]
/// exactly once, whether it produced a digest or was cancelled.
#[derive(Clone)]
pub struct ProgressReporter {
    completed: Arc<AtomicU32>,
    total: u32,
    pb: Option<ProgressBar>,
}

impl ProgressReporter {
    /// Counter only, nothing drawn.
    pub fn new(total: u32) -> Self {
        Self {
            completed: Arc::new(AtomicU32::new(0)),
            total,
            pb: None,
        }
    }

    /// Counter plus a terminal progress bar.
    pub fn with_bar(total: u32, message: &'static str) -> Self {
        let pb = ProgressBar::new(u64::from(total));
        let style = ProgressStyle::with_template(
            "[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} segments ({percent}%) {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("##-");
        pb.set_style(style);
        pb.set_message(message);
        Self {
            pb: Some(pb),
            ..Self::new(total)
        }
    }

    pub fn complete(&self) {
        let done = self.completed.fetch_add(1, Ordering::AcqRel) + 1;
        log::trace!("Segment finished ({}/{})", done, self.total);
        if let Some(pb) = self.pb.as_ref() {
            pb.inc(1);
        }
    }

    pub fn completed(&self) -> u32 {
        self.completed.load(Ordering::Acquire)
    }

    /// Whole percent complete, rounded down.
    pub fn percent(&self) -> u32 {
        if self.total == 0 {
            return 100;
        }
        (u64::from(self.completed()) * 100 / u64::from(self.total)) as u32
    }

    pub fn finish(&self, message: &'static str) {
        if let Some(pb) = self.pb.as_ref() {
            pb.finish_with_message(message);
        }
    }
}
