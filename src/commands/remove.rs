//! Executor for removing classified paths.

use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::scanner::{path_depth, CancelToken};

/// How paths are disposed of.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemovalMode {
    /// Report only, touch nothing
    DryRun,
    /// Move to the platform trash
    Trash,
    /// Delete for good
    Permanent,
}

impl RemovalMode {
    pub fn from_flags(dry_run: bool, use_trash: bool) -> Self {
        match (dry_run, use_trash) {
            (true, _) => Self::DryRun,
            (false, true) => Self::Trash,
            (false, false) => Self::Permanent,
        }
    }

    /// Verb for messages: "delete", "move to trash".
    pub fn verb(&self) -> &'static str {
        match self {
            Self::Trash => "move to trash",
            Self::DryRun | Self::Permanent => "delete",
        }
    }

    pub fn past_tense(&self) -> &'static str {
        match self {
            Self::DryRun => "Would remove",
            Self::Trash => "Moved to trash",
            Self::Permanent => "Deleted",
        }
    }
}

/// Result of a single removal.
#[derive(Debug, Clone)]
pub enum RemovalResult {
    /// Removal succeeded (or would have, in a dry run).
    Removed { path: PathBuf, freed_bytes: u64 },
    /// Removal failed.
    Failed { path: PathBuf, error: String },
    /// Removal was not attempted.
    Skipped { path: PathBuf, reason: String },
}

/// Aggregate counts over a batch of removals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RemovalSummary {
    pub removed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub freed_bytes: u64,
}

impl RemovalSummary {
    pub fn from_results(results: &[RemovalResult]) -> Self {
        results.iter().fold(Self::default(), |mut s, r| {
            match r {
                RemovalResult::Removed { freed_bytes, .. } => {
                    s.removed += 1;
                    s.freed_bytes += freed_bytes;
                }
                RemovalResult::Failed { .. } => s.failed += 1,
                RemovalResult::Skipped { .. } => s.skipped += 1,
            }
            s
        })
    }
}

/// Removes files and empty directories according to a [`RemovalMode`].
pub struct RemovalExecutor {
    mode: RemovalMode,
}

impl RemovalExecutor {
    pub fn new(mode: RemovalMode) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> RemovalMode {
        self.mode
    }

    /// Remove regular files. `files` pairs each path with its size.
    pub fn remove_files(&self, files: &[(PathBuf, u64)], cancel: &CancelToken) -> Vec<RemovalResult> {
        let mut results = Vec::with_capacity(files.len());
        for (path, size) in files {
            if cancel.is_cancelled() {
                results.push(skipped(path, "cancelled"));
                continue;
            }
            results.push(self.remove_file(path, *size));
        }
        results
    }

    fn remove_file(&self, path: &Path, size: u64) -> RemovalResult {
        let outcome = match self.mode {
            RemovalMode::DryRun => Ok(()),
            RemovalMode::Trash => to_trash(path),
            RemovalMode::Permanent => fs::remove_file(path),
        };
        self.finish(path, size, outcome)
    }

    /// Remove directories previously classified as empty, deepest first.
    ///
    /// Permanent removal deletes only files named in `ignore_names` and
    /// then the directory itself, so anything written since the scan makes
    /// the removal fail rather than vanish. In trash mode only the topmost
    /// directories are moved, since they carry their empty descendants.
    pub fn remove_empty_dirs(
        &self,
        dirs: &[PathBuf],
        ignore_names: &HashSet<String>,
        cancel: &CancelToken,
    ) -> Vec<RemovalResult> {
        let targets = match self.mode {
            RemovalMode::Trash => topmost(dirs),
            RemovalMode::DryRun | RemovalMode::Permanent => {
                let mut ordered = dirs.to_vec();
                ordered.sort_by(|a, b| path_depth(b).cmp(&path_depth(a)).then_with(|| a.cmp(b)));
                ordered
            }
        };

        let mut results = Vec::with_capacity(targets.len());
        for dir in &targets {
            if cancel.is_cancelled() {
                results.push(skipped(dir, "cancelled"));
                continue;
            }
            let outcome = match self.mode {
                RemovalMode::DryRun => Ok(()),
                RemovalMode::Trash => to_trash(dir),
                RemovalMode::Permanent => remove_empty_dir(dir, ignore_names),
            };
            results.push(self.finish(dir, 0, outcome));
        }
        results
    }

    fn finish(&self, path: &Path, size: u64, outcome: io::Result<()>) -> RemovalResult {
        match outcome {
            Ok(()) => {
                tracing::info!(path = %path.display(), "{}", self.mode.past_tense());
                RemovalResult::Removed {
                    path: path.to_path_buf(),
                    freed_bytes: size,
                }
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "removal failed");
                RemovalResult::Failed {
                    path: path.to_path_buf(),
                    error: e.to_string(),
                }
            }
        }
    }
}

fn skipped(path: &Path, reason: &str) -> RemovalResult {
    RemovalResult::Skipped {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    }
}

fn to_trash(path: &Path) -> io::Result<()> {
    trash::delete(path).map_err(|e| io::Error::other(format!("trash failed: {}", e)))
}

fn remove_empty_dir(dir: &Path, ignore_names: &HashSet<String>) -> io::Result<()> {
    for child in fs::read_dir(dir)? {
        let child = child?;
        if child.file_type()?.is_dir() {
            continue;
        }
        if ignore_names.contains(&*child.file_name().to_string_lossy()) {
            fs::remove_file(child.path())?;
        }
    }
    fs::remove_dir(dir)
}

/// Drop every path that has an ancestor in the same set.
fn topmost(dirs: &[PathBuf]) -> Vec<PathBuf> {
    let mut sorted = dirs.to_vec();
    sorted.sort();
    let mut kept: Vec<PathBuf> = Vec::new();
    for dir in sorted {
        if kept.last().is_some_and(|top| dir.starts_with(top)) {
            continue;
        }
        kept.push(dir);
    }
    kept
}
