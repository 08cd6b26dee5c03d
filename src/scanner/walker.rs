use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, SendTimeoutError, Sender};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::thread;
use std::time::Duration;
use walkdir::WalkDir;

use crate::error::{EntryError, Result, SweepError};

use super::cancel::CancelToken;
use super::entry::Entry;
use super::exclude::ExclusionRules;
use super::options::WalkOptions;

/// Upper bound on any single blocking queue operation, so a cancellation
/// request is noticed even when the queue is full or empty.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Outcome of a completed walk.
#[derive(Debug, Default)]
pub struct WalkReport {
    /// Regular files handed to the processing closure
    pub files: u64,
    /// Per-entry failures; none of them stopped the walk
    pub errors: Vec<EntryError>,
}

/// Canonicalize `root` and make sure it is an existing directory.
pub fn resolve_root(root: &Path) -> Result<PathBuf> {
    let resolved = root.canonicalize().map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            SweepError::PathNotFound(root.to_path_buf())
        } else {
            SweepError::Io {
                path: root.to_path_buf(),
                source: e,
            }
        }
    })?;

    if !resolved.is_dir() {
        return Err(SweepError::NotADirectory(resolved));
    }
    Ok(resolved)
}

/// Walk every regular file under `root` and hand it to `process` on a pool
/// of worker threads.
///
/// A single producer walks the tree and feeds a bounded queue; excluded
/// directories are pruned rather than descended. Each worker stats the path
/// it receives and calls `process` with the resulting [`Entry`]. Errors from
/// stat, unreadable directories and `process` itself are collected into the
/// returned report. Cancellation makes the call return
/// [`SweepError::Cancelled`] and discards everything gathered so far.
pub fn walk_files<F>(
    root: &Path,
    options: &WalkOptions,
    rules: &ExclusionRules,
    cancel: &CancelToken,
    process: F,
) -> Result<WalkReport>
where
    F: Fn(&Entry) -> std::result::Result<(), EntryError> + Sync,
{
    let workers = options.worker_count();
    let (tx, rx) = bounded::<PathBuf>(options.effective_queue_capacity());
    let errors = Mutex::new(Vec::new());
    let processed = AtomicU64::new(0);

    tracing::debug!(root = %root.display(), workers, "walk started");

    let (produced, panicked) = thread::scope(|scope| {
        let handles: Vec<_> = (0..workers)
            .map(|_| {
                let rx = rx.clone();
                let ctx = WorkerContext {
                    options,
                    cancel,
                    errors: &errors,
                    processed: &processed,
                    process: &process,
                };
                scope.spawn(move || ctx.run(rx))
            })
            .collect();
        drop(rx);

        // Dropping the sender on return disconnects the queue so idle
        // workers stop once it drains.
        let produced = produce(root, options, rules, cancel, tx, &errors);

        let panicked = handles
            .into_iter()
            .map(|h| h.join())
            .filter(|r| r.is_err())
            .count();
        (produced, panicked)
    });

    if panicked > 0 {
        return Err(SweepError::WorkerPanic("file walk"));
    }
    cancel.check()?;
    produced?;

    let report = WalkReport {
        files: processed.load(Ordering::Relaxed),
        errors: errors.into_inner().unwrap_or_else(|e| e.into_inner()),
    };
    tracing::debug!(
        files = report.files,
        errors = report.errors.len(),
        "walk finished"
    );
    Ok(report)
}

fn produce(
    root: &Path,
    options: &WalkOptions,
    rules: &ExclusionRules,
    cancel: &CancelToken,
    tx: Sender<PathBuf>,
    errors: &Mutex<Vec<EntryError>>,
) -> Result<()> {
    let mut it = WalkDir::new(root)
        .follow_links(options.follow_symlinks)
        .into_iter();

    loop {
        cancel.check()?;

        let entry = match it.next() {
            None => break,
            Some(Ok(entry)) => entry,
            Some(Err(err)) => {
                record(errors, EntryError::from_walk(err, root));
                continue;
            }
        };

        if rules.should_exclude(entry.path()) {
            if entry.file_type().is_dir() {
                tracing::debug!(path = %entry.path().display(), "skipping excluded directory");
                it.skip_current_dir();
            }
            continue;
        }

        if entry.file_type().is_dir() {
            continue;
        }

        send_cancellable(&tx, entry.into_path(), cancel)?;
    }

    Ok(())
}

fn send_cancellable(tx: &Sender<PathBuf>, path: PathBuf, cancel: &CancelToken) -> Result<()> {
    let mut pending = path;
    loop {
        cancel.check()?;
        match tx.send_timeout(pending, POLL_INTERVAL) {
            Ok(()) => return Ok(()),
            Err(SendTimeoutError::Timeout(back)) => pending = back,
            // Every worker is gone; the join in `walk_files` reports why.
            Err(SendTimeoutError::Disconnected(_)) => return Ok(()),
        }
    }
}

struct WorkerContext<'a, F> {
    options: &'a WalkOptions,
    cancel: &'a CancelToken,
    errors: &'a Mutex<Vec<EntryError>>,
    processed: &'a AtomicU64,
    process: &'a F,
}

impl<F> WorkerContext<'_, F>
where
    F: Fn(&Entry) -> std::result::Result<(), EntryError> + Sync,
{
    fn run(self, rx: Receiver<PathBuf>) {
        loop {
            if self.cancel.is_cancelled() {
                return;
            }

            let path = match rx.recv_timeout(POLL_INTERVAL) {
                Ok(path) => path,
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => return,
            };

            if self.cancel.is_cancelled() {
                return;
            }
            if let Some(progress) = &self.options.progress {
                progress.increment();
            }

            let metadata = if self.options.follow_symlinks {
                fs::metadata(&path)
            } else {
                fs::symlink_metadata(&path)
            };

            match metadata {
                Ok(meta) if meta.file_type().is_file() => {
                    let entry = Entry::from_metadata(path, &meta);
                    self.processed.fetch_add(1, Ordering::Relaxed);
                    if let Err(err) = (self.process)(&entry) {
                        record(self.errors, err);
                    }
                }
                Ok(_) => {}
                Err(e) => record(self.errors, EntryError::new(path, "cannot stat", e)),
            }
        }
    }
}

/// Append a per-entry error to a shared list.
pub(crate) fn record(errors: &Mutex<Vec<EntryError>>, err: EntryError) {
    tracing::warn!("{}", err);
    errors
        .lock()
        .unwrap_or_else(|e| e.into_inner())
        .push(err);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{self, File};
    use std::io::Write;
    use std::sync::Arc;
    use tempfile::TempDir;

    use crate::scanner::WalkProgress;

    fn create_test_structure() -> TempDir {
        let dir = TempDir::new().unwrap();
        let root = dir.path();

        File::create(root.join("file1.txt"))
            .unwrap()
            .write_all(b"hello")
            .unwrap();
        File::create(root.join("file2.txt"))
            .unwrap()
            .write_all(b"world!")
            .unwrap();

        fs::create_dir(root.join("subdir")).unwrap();
        File::create(root.join("subdir/nested.txt"))
            .unwrap()
            .write_all(b"nested content")
            .unwrap();

        fs::create_dir_all(root.join("skipme/deeper")).unwrap();
        fs::write(root.join("skipme/deeper/hidden.txt"), b"x").unwrap();

        dir
    }

    fn collect(root: &Path, options: &WalkOptions, rules: &ExclusionRules) -> Vec<PathBuf> {
        let seen = Mutex::new(Vec::new());
        walk_files(root, options, rules, &CancelToken::new(), |entry| {
            seen.lock().unwrap().push(entry.path.clone());
            Ok(())
        })
        .unwrap();
        let mut seen = seen.into_inner().unwrap();
        seen.sort();
        seen
    }

    #[test]
    fn test_walk_visits_every_file() {
        let dir = create_test_structure();
        let root = resolve_root(dir.path()).unwrap();

        let files = collect(&root, &WalkOptions::default(), &ExclusionRules::none());

        assert_eq!(files.len(), 4);
        assert!(files.contains(&root.join("subdir/nested.txt")));
        assert!(files.iter().all(|p| p.is_file()));
    }

    #[test]
    fn test_walk_prunes_excluded_directories() {
        let dir = create_test_structure();
        let root = resolve_root(dir.path()).unwrap();
        let rules = ExclusionRules::builder()
            .exclude_names(["skipme"])
            .build()
            .unwrap();

        let files = collect(&root, &WalkOptions::default(), &rules);

        assert_eq!(files.len(), 3);
        assert!(!files.iter().any(|p| p.starts_with(root.join("skipme"))));
    }

    #[test]
    fn test_walk_skips_excluded_files() {
        let dir = create_test_structure();
        let root = resolve_root(dir.path()).unwrap();
        let rules = ExclusionRules::builder()
            .exclude_glob("file1.*")
            .build()
            .unwrap();

        let files = collect(&root, &WalkOptions::default(), &rules);

        assert_eq!(files.len(), 3);
        assert!(!files.contains(&root.join("file1.txt")));
    }

    #[test]
    fn test_walk_single_worker_tiny_queue() {
        let dir = TempDir::new().unwrap();
        for i in 0..50 {
            fs::write(dir.path().join(format!("f{}.txt", i)), b"data").unwrap();
        }
        let root = resolve_root(dir.path()).unwrap();
        let options = WalkOptions::new().with_threads(1).with_queue_capacity(1);

        let files = collect(&root, &options, &ExclusionRules::none());
        assert_eq!(files.len(), 50);
    }

    #[test]
    fn test_walk_reports_progress_and_count() {
        let dir = create_test_structure();
        let root = resolve_root(dir.path()).unwrap();
        let progress = Arc::new(WalkProgress::new());
        let options = WalkOptions::new().with_progress(Arc::clone(&progress));

        let report = walk_files(
            &root,
            &options,
            &ExclusionRules::none(),
            &CancelToken::new(),
            |_| Ok(()),
        )
        .unwrap();

        assert_eq!(report.files, 4);
        assert_eq!(progress.files(), 4);
        assert!(report.errors.is_empty());
    }

    #[test]
    fn test_walk_collects_process_errors() {
        let dir = create_test_structure();
        let root = resolve_root(dir.path()).unwrap();

        let report = walk_files(
            &root,
            &WalkOptions::default(),
            &ExclusionRules::none(),
            &CancelToken::new(),
            |entry| {
                if entry.name() == "file2.txt" {
                    Err(EntryError::new(
                        entry.path.clone(),
                        "cannot hash",
                        std::io::Error::other("boom"),
                    ))
                } else {
                    Ok(())
                }
            },
        )
        .unwrap();

        assert_eq!(report.files, 4);
        assert_eq!(report.errors.len(), 1);
        assert!(report.errors[0].path.ends_with("file2.txt"));
    }

    #[test]
    fn test_walk_cancelled_before_start() {
        let dir = create_test_structure();
        let cancel = CancelToken::new();
        cancel.cancel();

        let result = walk_files(
            dir.path(),
            &WalkOptions::default(),
            &ExclusionRules::none(),
            &cancel,
            |_| Ok(()),
        );

        assert!(matches!(result, Err(SweepError::Cancelled)));
    }

    #[test]
    fn test_walk_cancelled_midway_does_not_hang() {
        let dir = TempDir::new().unwrap();
        for i in 0..200 {
            fs::write(dir.path().join(format!("f{}.bin", i)), b"payload").unwrap();
        }
        let cancel = CancelToken::new();
        let options = WalkOptions::new().with_threads(2).with_queue_capacity(1);

        let result = walk_files(
            dir.path(),
            &options,
            &ExclusionRules::none(),
            &cancel,
            |_| {
                cancel.cancel();
                Ok(())
            },
        );

        assert!(matches!(result, Err(SweepError::Cancelled)));
    }

    #[test]
    fn test_resolve_root_errors() {
        assert!(matches!(
            resolve_root(Path::new("/nonexistent/path/12345")),
            Err(SweepError::PathNotFound(_))
        ));

        let dir = TempDir::new().unwrap();
        let file = dir.path().join("plain.txt");
        fs::write(&file, b"x").unwrap();
        assert!(matches!(
            resolve_root(&file),
            Err(SweepError::NotADirectory(_))
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_walk_skips_symlinks() {
        let dir = create_test_structure();
        let root = resolve_root(dir.path()).unwrap();
        std::os::unix::fs::symlink(root.join("file1.txt"), root.join("link.txt")).unwrap();

        let files = collect(&root, &WalkOptions::default(), &ExclusionRules::none());
        assert!(!files.contains(&root.join("link.txt")));
        assert_eq!(files.len(), 4);
    }
}
