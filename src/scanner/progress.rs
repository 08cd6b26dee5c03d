use indicatif::ProgressBar;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Progress tracker shared between the walker and whoever displays it.
#[derive(Default)]
pub struct WalkProgress {
    /// Number of files handed to a worker.
    files: AtomicU64,
    /// Optional bar ticked alongside the counter.
    bar: Option<ProgressBar>,
}

impl WalkProgress {
    /// Create a new progress tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a tracker that also advances `bar`.
    pub fn with_bar(bar: ProgressBar) -> Self {
        Self {
            files: AtomicU64::new(0),
            bar: Some(bar),
        }
    }

    /// Record one more processed file.
    pub fn increment(&self) {
        self.files.fetch_add(1, Ordering::Relaxed);
        if let Some(bar) = &self.bar {
            bar.inc(1);
        }
    }

    /// Get the number of processed files.
    pub fn files(&self) -> u64 {
        self.files.load(Ordering::Relaxed)
    }

    pub fn finish(&self) {
        if let Some(bar) = &self.bar {
            bar.finish_and_clear();
        }
    }
}

impl fmt::Debug for WalkProgress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WalkProgress")
            .field("files", &self.files())
            .field("has_bar", &self.bar.is_some())
            .finish()
    }
}
