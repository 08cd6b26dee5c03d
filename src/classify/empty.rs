//! Empty-directory classification.
//!
//! Deep mode evaluates every directory under the root deepest-first, so by
//! the time a directory is inspected all of its subdirectories already have
//! a verdict. A directory is empty when every child is either an ignored
//! file name or a subdirectory already found empty. Shallow mode looks at
//! the root's immediate subdirectories only and never cascades.

use rayon::prelude::*;
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{Duration, SystemTime};
use walkdir::WalkDir;

use crate::error::{EntryError, Result, SweepError};
use crate::scanner::{
    cutoff_from_age, path_order, record, resolve_root, CancelToken, ExclusionRules,
};

use super::Report;

/// Options for empty-directory classification.
#[derive(Debug, Clone, Default)]
pub struct EmptyOptions {
    /// Consider every directory in the tree, cascading to newly empty parents
    pub recursive: bool,

    /// File names that never keep a directory from being empty
    pub ignore_names: HashSet<String>,

    /// Only directories not modified within this long are eligible
    pub older_than: Option<Duration>,
}

impl EmptyOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    pub fn with_ignore_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ignore_names.extend(names.into_iter().map(Into::into));
        self
    }

    pub fn with_older_than(mut self, age: Duration) -> Self {
        self.older_than = Some(age);
        self
    }
}

/// Find directories under `root` that are empty (or, in recursive mode,
/// transitively empty). Paths come back sorted lexicographically.
pub fn classify_empty(
    root: &Path,
    options: &EmptyOptions,
    rules: &ExclusionRules,
    cancel: &CancelToken,
) -> Result<Report<Vec<PathBuf>>> {
    let root = resolve_root(root)?;
    let check = EmptinessCheck {
        ignore_names: &options.ignore_names,
        cutoff: options.older_than.map(cutoff_from_age),
    };

    let report = if options.recursive {
        classify_deep(&root, &check, rules, cancel)?
    } else {
        classify_shallow(&root, &check, rules, cancel)?
    };

    tracing::info!(
        root = %root.display(),
        recursive = options.recursive,
        empty = report.found.len(),
        errors = report.errors.len(),
        "empty directory scan finished"
    );
    Ok(report)
}

fn classify_deep(
    root: &Path,
    check: &EmptinessCheck<'_>,
    rules: &ExclusionRules,
    cancel: &CancelToken,
) -> Result<Report<Vec<PathBuf>>> {
    let errors = Mutex::new(Vec::new());

    tracing::debug!("collecting directories under {}", root.display());
    let levels = collect_directories(root, rules, cancel, &errors)?;

    let mut deletable: HashSet<PathBuf> = HashSet::new();
    for (depth, dirs) in levels.into_iter().rev() {
        tracing::debug!(depth, count = dirs.len(), "evaluating directory level");

        // Directories at one depth never contain each other.
        let verdicts = dirs
            .into_par_iter()
            .map(|dir| -> Result<(PathBuf, Verdict)> {
                cancel.check()?;
                let verdict = check.is_empty(&dir, Some(&deletable));
                Ok((dir, verdict))
            })
            .collect::<Result<Vec<_>>>()?;

        for (dir, verdict) in verdicts {
            match verdict {
                Ok(true) => {
                    tracing::debug!(path = %dir.display(), "marked empty");
                    deletable.insert(dir);
                }
                Ok(false) => {}
                Err(err) => record(&errors, err),
            }
        }
    }

    let mut found: Vec<PathBuf> = deletable.into_iter().collect();
    found.sort_by(|a, b| path_order(a, b));

    Ok(Report {
        found,
        errors: errors.into_inner().unwrap_or_else(|e| e.into_inner()),
    })
}

/// Every non-excluded directory strictly below `root`, keyed by depth.
///
/// Directories that walkdir could not descend into are dropped after their
/// error is recorded, which leaves them (and every ancestor) non-empty.
fn collect_directories(
    root: &Path,
    rules: &ExclusionRules,
    cancel: &CancelToken,
    errors: &Mutex<Vec<EntryError>>,
) -> Result<BTreeMap<usize, Vec<PathBuf>>> {
    let mut levels: BTreeMap<usize, Vec<PathBuf>> = BTreeMap::new();
    let mut unreadable: HashSet<PathBuf> = HashSet::new();
    let mut it = WalkDir::new(root).into_iter();

    loop {
        cancel.check()?;

        let entry = match it.next() {
            None => break,
            Some(Ok(entry)) => entry,
            Some(Err(err)) => {
                if let Some(path) = err.path() {
                    unreadable.insert(path.to_path_buf());
                }
                record(errors, EntryError::from_walk(err, root));
                continue;
            }
        };

        if !entry.file_type().is_dir() {
            continue;
        }
        if rules.should_exclude(entry.path()) {
            tracing::debug!(path = %entry.path().display(), "skipping excluded directory");
            it.skip_current_dir();
            continue;
        }
        if entry.depth() == 0 {
            continue;
        }

        levels
            .entry(entry.depth())
            .or_default()
            .push(entry.into_path());
    }

    if !unreadable.is_empty() {
        for dirs in levels.values_mut() {
            dirs.retain(|dir| !unreadable.contains(dir));
        }
    }
    Ok(levels)
}

fn classify_shallow(
    root: &Path,
    check: &EmptinessCheck<'_>,
    rules: &ExclusionRules,
    cancel: &CancelToken,
) -> Result<Report<Vec<PathBuf>>> {
    let read_dir = fs::read_dir(root).map_err(|e| SweepError::Io {
        path: root.to_path_buf(),
        source: e,
    })?;

    let errors = Mutex::new(Vec::new());
    let mut found = Vec::new();

    for child in read_dir {
        cancel.check()?;

        let child = match child {
            Ok(child) => child,
            Err(e) => {
                record(&errors, EntryError::new(root, "cannot read directory", e));
                continue;
            }
        };
        match child.file_type() {
            Ok(ft) if ft.is_dir() => {}
            Ok(_) => continue,
            Err(e) => {
                record(&errors, EntryError::new(child.path(), "cannot stat", e));
                continue;
            }
        }

        let path = child.path();
        if rules.should_exclude(&path) {
            continue;
        }

        tracing::debug!(path = %path.display(), "evaluating top-level directory");
        match check.is_empty(&path, None) {
            Ok(true) => found.push(path),
            Ok(false) => {}
            Err(err) => record(&errors, err),
        }
    }

    found.sort_by(|a, b| path_order(a, b));
    Ok(Report {
        found,
        errors: errors.into_inner().unwrap_or_else(|e| e.into_inner()),
    })
}

type Verdict = std::result::Result<bool, EntryError>;

/// Read-only inputs shared by every emptiness evaluation in one call.
struct EmptinessCheck<'a> {
    ignore_names: &'a HashSet<String>,
    cutoff: Option<SystemTime>,
}

impl EmptinessCheck<'_> {
    /// Decide whether `dir` has no disqualifying children.
    ///
    /// With `deletable == None` (shallow mode) any subdirectory disqualifies.
    /// A directory that cannot be listed or stat'ed is an error, never empty.
    fn is_empty(
        &self,
        dir: &Path,
        deletable: Option<&HashSet<PathBuf>>,
    ) -> Verdict {
        if let Some(cutoff) = self.cutoff {
            let modified = fs::metadata(dir)
                .and_then(|m| m.modified())
                .map_err(|e| EntryError::new(dir, "cannot stat", e))?;
            if modified > cutoff {
                tracing::debug!(path = %dir.display(), "too new, skipping");
                return Ok(false);
            }
        }

        let read_dir =
            fs::read_dir(dir).map_err(|e| EntryError::new(dir, "cannot read directory", e))?;

        for child in read_dir {
            let child = child.map_err(|e| EntryError::new(dir, "cannot read directory", e))?;
            let file_type = child
                .file_type()
                .map_err(|e| EntryError::new(child.path(), "cannot stat", e))?;

            if file_type.is_dir() {
                let child_path = child.path();
                if !deletable.is_some_and(|set| set.contains(&child_path)) {
                    tracing::trace!(path = %dir.display(), child = %child_path.display(), "has non-empty subdirectory");
                    return Ok(false);
                }
            } else if !self
                .ignore_names
                .contains(&*child.file_name().to_string_lossy())
            {
                tracing::trace!(path = %dir.display(), "contains a file");
                return Ok(false);
            }
        }

        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use filetime::{set_file_mtime, FileTime};
    use tempfile::TempDir;

    fn deep() -> EmptyOptions {
        EmptyOptions::new().with_recursive(true)
    }

    fn run(root: &Path, options: &EmptyOptions) -> Vec<PathBuf> {
        let report =
            classify_empty(root, options, &ExclusionRules::none(), &CancelToken::new()).unwrap();
        assert!(report.errors.is_empty(), "{:?}", report.errors);
        report.found
    }

    #[test]
    fn test_deep_keeps_parent_with_file() {
        let tmp = TempDir::new().unwrap();
        let root = resolve_root(tmp.path()).unwrap();
        fs::create_dir_all(root.join("a/b")).unwrap();
        fs::write(root.join("a/file.txt"), "keep").unwrap();

        assert_eq!(run(&root, &deep()), vec![root.join("a/b")]);
    }

    #[test]
    fn test_deep_cascades_to_parent() {
        let tmp = TempDir::new().unwrap();
        let root = resolve_root(tmp.path()).unwrap();
        fs::create_dir_all(root.join("x/y")).unwrap();

        assert_eq!(run(&root, &deep()), vec![root.join("x"), root.join("x/y")]);
    }

    #[test]
    fn test_root_is_never_reported() {
        let tmp = TempDir::new().unwrap();
        let root = resolve_root(tmp.path()).unwrap();

        assert!(run(&root, &deep()).is_empty());
        assert!(run(&root, &EmptyOptions::new()).is_empty());
    }

    #[test]
    fn test_ignored_files_are_transparent() {
        let tmp = TempDir::new().unwrap();
        let root = resolve_root(tmp.path()).unwrap();
        fs::create_dir_all(root.join("photos/2019")).unwrap();
        fs::write(root.join("photos/.DS_Store"), "").unwrap();
        fs::write(root.join("photos/2019/Thumbs.db"), "").unwrap();

        let options = deep().with_ignore_names([".DS_Store", "Thumbs.db"]);
        assert_eq!(
            run(&root, &options),
            vec![root.join("photos"), root.join("photos/2019")]
        );

        // Without the ignore list both directories hold a file.
        assert!(run(&root, &deep()).is_empty());
    }

    #[test]
    fn test_shallow_never_cascades() {
        let tmp = TempDir::new().unwrap();
        let root = resolve_root(tmp.path()).unwrap();
        fs::create_dir_all(root.join("nested/inner")).unwrap();
        fs::create_dir(root.join("bare")).unwrap();
        fs::create_dir(root.join("full")).unwrap();
        fs::write(root.join("full/data.csv"), "1,2").unwrap();

        assert_eq!(run(&root, &EmptyOptions::new()), vec![root.join("bare")]);
    }

    #[test]
    fn test_excluded_subtree_is_pruned_not_marked() {
        let tmp = TempDir::new().unwrap();
        let root = resolve_root(tmp.path()).unwrap();
        fs::create_dir_all(root.join("project/.git/refs")).unwrap();
        fs::create_dir_all(root.join("other")).unwrap();

        let rules = ExclusionRules::builder()
            .exclude_names([".git"])
            .build()
            .unwrap();
        let report = classify_empty(&root, &deep(), &rules, &CancelToken::new()).unwrap();

        // `project` holds an excluded directory, so it is not empty.
        assert_eq!(report.found, vec![root.join("other")]);
    }

    #[test]
    fn test_age_filter_skips_recent_directories() {
        let tmp = TempDir::new().unwrap();
        let root = resolve_root(tmp.path()).unwrap();
        fs::create_dir(root.join("stale")).unwrap();
        fs::create_dir(root.join("fresh")).unwrap();

        let long_ago = FileTime::from_unix_time(1_000_000_000, 0);
        set_file_mtime(root.join("stale"), long_ago).unwrap();

        let options = deep().with_older_than(Duration::from_secs(7 * 86400));
        assert_eq!(run(&root, &options), vec![root.join("stale")]);
    }

    #[test]
    fn test_shallow_age_filter_skips_recent_directories() {
        let tmp = TempDir::new().unwrap();
        let root = resolve_root(tmp.path()).unwrap();
        fs::create_dir(root.join("stale")).unwrap();
        fs::create_dir(root.join("fresh")).unwrap();

        let long_ago = FileTime::from_unix_time(1_000_000_000, 0);
        set_file_mtime(root.join("stale"), long_ago).unwrap();

        let options = EmptyOptions::new().with_older_than(Duration::from_secs(7 * 86400));
        assert_eq!(run(&root, &options), vec![root.join("stale")]);
    }

    #[test]
    fn test_recent_child_blocks_old_parent() {
        let tmp = TempDir::new().unwrap();
        let root = resolve_root(tmp.path()).unwrap();
        fs::create_dir_all(root.join("old/new")).unwrap();
        let long_ago = FileTime::from_unix_time(1_000_000_000, 0);
        set_file_mtime(root.join("old"), long_ago).unwrap();

        let options = deep().with_older_than(Duration::from_secs(86400));
        assert!(run(&root, &options).is_empty());
    }

    #[test]
    fn test_found_sorted_by_path_string() {
        let tmp = TempDir::new().unwrap();
        let root = resolve_root(tmp.path()).unwrap();
        fs::create_dir_all(root.join("a/b")).unwrap();
        fs::create_dir(root.join("a-b")).unwrap();

        assert_eq!(
            run(&root, &deep()),
            vec![root.join("a"), root.join("a-b"), root.join("a/b")]
        );
        assert_eq!(
            run(&root, &EmptyOptions::new()),
            vec![root.join("a-b")]
        );
    }

    #[test]
    fn test_deep_is_idempotent() {
        let tmp = TempDir::new().unwrap();
        let root = resolve_root(tmp.path()).unwrap();
        fs::create_dir_all(root.join("a/b/c")).unwrap();
        fs::create_dir_all(root.join("d/e")).unwrap();
        fs::write(root.join("d/note"), "n").unwrap();

        let first = run(&root, &deep());
        let second = run(&root, &deep());
        assert_eq!(first, second);
        assert_eq!(first.len(), 4);
    }

    #[test]
    fn test_cancelled_classification() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("a/b")).unwrap();
        let cancel = CancelToken::new();
        cancel.cancel();

        for options in [deep(), EmptyOptions::new()] {
            let result = classify_empty(tmp.path(), &options, &ExclusionRules::none(), &cancel);
            assert!(matches!(result, Err(SweepError::Cancelled)));
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_unreadable_directory_fails_closed() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = TempDir::new().unwrap();
        let root = resolve_root(tmp.path()).unwrap();
        let locked = root.join("parent/locked");
        fs::create_dir_all(&locked).unwrap();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

        // Privileged users can read anything; nothing to check then.
        if fs::read_dir(&locked).is_ok() {
            fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
            return;
        }

        let report =
            classify_empty(&root, &deep(), &ExclusionRules::none(), &CancelToken::new()).unwrap();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

        assert!(report.found.is_empty());
        assert_eq!(report.errors.len(), 1, "{:?}", report.errors);
        assert_eq!(report.errors[0].path, locked);
    }
}
