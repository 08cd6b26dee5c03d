use std::sync::Arc;

use super::progress::WalkProgress;

/// Configuration options for the parallel file walker.
#[derive(Debug, Clone, Default)]
pub struct WalkOptions {
    /// Number of worker threads (0 = available parallelism)
    pub threads: usize,

    /// Bounded queue capacity between producer and workers (0 = 2 * threads)
    pub queue_capacity: usize,

    /// Follow symbolic links while descending
    pub follow_symlinks: bool,

    /// Incremented once per file handed to a worker
    pub progress: Option<Arc<WalkProgress>>,
}

impl WalkOptions {
    /// Create a new WalkOptions with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set number of worker threads
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    /// Set the queue capacity
    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    /// Set whether to follow symbolic links
    pub fn with_follow_symlinks(mut self, follow: bool) -> Self {
        self.follow_symlinks = follow;
        self
    }

    /// Attach a progress tracker
    pub fn with_progress(mut self, progress: Arc<WalkProgress>) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Worker count after resolving `0` to the machine's parallelism.
    pub fn worker_count(&self) -> usize {
        if self.threads > 0 {
            self.threads
        } else {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        }
    }

    /// Queue capacity after resolving `0` to twice the worker count.
    pub fn effective_queue_capacity(&self) -> usize {
        if self.queue_capacity > 0 {
            self.queue_capacity
        } else {
            2 * self.worker_count()
        }
    }
}
