use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use crate::error::{ConfigError, Result};
use crate::scanner::{
    cutoff_from_age, path_order, resolve_root, walk_files, CancelToken, Entry, ExclusionRules,
    WalkOptions,
};

use super::Report;

/// Size and age thresholds for [`find_matching_files`]. A file matches if
/// it meets either threshold that is set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FileCriteria {
    /// Files at least this many bytes
    pub min_size: Option<u64>,
    /// Files not modified within this long
    pub older_than: Option<Duration>,
}

impl FileCriteria {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_min_size(mut self, bytes: u64) -> Self {
        self.min_size = Some(bytes).filter(|&b| b > 0);
        self
    }

    pub fn with_older_than(mut self, age: Duration) -> Self {
        self.older_than = Some(age);
        self
    }

    pub fn is_unrestricted(&self) -> bool {
        self.min_size.is_none() && self.older_than.is_none()
    }
}

/// Ordering for listed files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    /// Ascending path
    #[default]
    Path,
    /// Largest first
    Size,
    /// Oldest first
    Age,
}

impl SortKey {
    pub const ALL: [SortKey; 3] = [Self::Path, Self::Size, Self::Age];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Path => "path",
            Self::Size => "size",
            Self::Age => "age",
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortKey {
    type Err = ConfigError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|k| k.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                ConfigError::Invalid(format!(
                    "unknown sort key '{}' (expected path, size or age)",
                    s
                ))
            })
    }
}

/// List the regular files under `root` that satisfy `criteria`, sorted
/// by path.
pub fn find_matching_files(
    root: &Path,
    criteria: &FileCriteria,
    options: &WalkOptions,
    rules: &ExclusionRules,
    cancel: &CancelToken,
) -> Result<Report<Vec<Entry>>> {
    let root = resolve_root(root)?;
    let cutoff = criteria.older_than.map(cutoff_from_age);
    let matched = Mutex::new(Vec::new());

    let walk = walk_files(&root, options, rules, cancel, |entry| {
        let big = criteria.min_size.is_some_and(|min| entry.size >= min);
        let old = cutoff.is_some_and(|c| entry.modified_before(c));
        if criteria.is_unrestricted() || big || old {
            matched
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(entry.clone());
        }
        Ok(())
    })?;

    let mut found = matched.into_inner().unwrap_or_else(PoisonError::into_inner);
    sort_entries(&mut found, SortKey::Path);

    tracing::info!(
        root = %root.display(),
        scanned = walk.files,
        matched = found.len(),
        "file criteria scan finished"
    );
    Ok(Report::from_walk(found, walk))
}

/// Sort entries in place. Ties always fall back to path order.
pub fn sort_entries(entries: &mut [Entry], key: SortKey) {
    match key {
        SortKey::Path => entries.sort_by(|a, b| path_order(&a.path, &b.path)),
        SortKey::Size => {
            entries.sort_by(|a, b| {
                b.size
                    .cmp(&a.size)
                    .then_with(|| path_order(&a.path, &b.path))
            })
        }
        // Unknown mtimes sort last.
        SortKey::Age => entries.sort_by(|a, b| {
            let a_key = (a.mtime.is_none(), a.mtime);
            let b_key = (b.mtime.is_none(), b.mtime);
            a_key.cmp(&b_key).then_with(|| path_order(&a.path, &b.path))
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use filetime::{set_file_mtime, FileTime};
    use std::fs;
    use std::path::PathBuf;
    use std::time::SystemTime;
    use tempfile::TempDir;

    const DAY: u64 = 24 * 60 * 60;

    fn find(root: &Path, criteria: FileCriteria) -> Vec<PathBuf> {
        find_matching_files(
            root,
            &criteria,
            &WalkOptions::default(),
            &ExclusionRules::none(),
            &CancelToken::new(),
        )
        .unwrap()
        .found
        .into_iter()
        .map(|e| e.path)
        .collect()
    }

    fn backdate(path: &Path, days: u64) {
        let when = SystemTime::now() - Duration::from_secs(days * DAY);
        set_file_mtime(path, FileTime::from_system_time(when)).unwrap();
    }

    #[test]
    fn test_no_criteria_matches_everything() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("a"), "1").unwrap();
        fs::write(tmp.path().join("b"), "").unwrap();

        assert_eq!(find(tmp.path(), FileCriteria::new()).len(), 2);
    }

    #[test]
    fn test_size_or_age_matches() {
        let tmp = TempDir::new().unwrap();
        let big = tmp.path().join("big.bin");
        let old = tmp.path().join("old.txt");
        let neither = tmp.path().join("small.txt");
        fs::write(&big, vec![0u8; 2048]).unwrap();
        fs::write(&old, "x").unwrap();
        fs::write(&neither, "x").unwrap();
        backdate(&old, 40);

        let root = resolve_root(tmp.path()).unwrap();
        let criteria = FileCriteria::new()
            .with_min_size(1024)
            .with_older_than(Duration::from_secs(30 * DAY));

        assert_eq!(
            find(tmp.path(), criteria),
            vec![root.join("big.bin"), root.join("old.txt")]
        );
    }

    #[test]
    fn test_cancelled_search_returns_error() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("a"), "x").unwrap();
        let cancel = CancelToken::new();
        cancel.cancel();

        let result = find_matching_files(
            tmp.path(),
            &FileCriteria::new().with_min_size(1),
            &WalkOptions::default(),
            &ExclusionRules::none(),
            &cancel,
        );
        assert!(result.unwrap_err().is_cancelled());
    }

    #[test]
    fn test_zero_min_size_is_unset() {
        let criteria = FileCriteria::new().with_min_size(0);
        assert!(criteria.is_unrestricted());
    }

    #[test]
    fn test_sort_by_size_and_age() {
        let now = SystemTime::now();
        let entry = |path: &str, size, age_days: u64| Entry {
            path: PathBuf::from(path),
            is_dir: false,
            size,
            mtime: Some(now - Duration::from_secs(age_days * DAY)),
        };
        let mut entries = vec![entry("/b", 10, 1), entry("/a", 10, 5), entry("/c", 99, 3)];

        sort_entries(&mut entries, SortKey::Size);
        let order: Vec<_> = entries.iter().map(|e| e.path.to_str().unwrap()).collect();
        assert_eq!(order, vec!["/c", "/a", "/b"]);

        sort_entries(&mut entries, SortKey::Age);
        let order: Vec<_> = entries.iter().map(|e| e.path.to_str().unwrap()).collect();
        assert_eq!(order, vec!["/a", "/c", "/b"]);

        sort_entries(&mut entries, SortKey::Path);
        let order: Vec<_> = entries.iter().map(|e| e.path.to_str().unwrap()).collect();
        assert_eq!(order, vec!["/a", "/b", "/c"]);
    }

    #[test]
    fn test_parse_sort_key() {
        assert_eq!("Size".parse::<SortKey>().unwrap(), SortKey::Size);
        assert!("mtime".parse::<SortKey>().is_err());
    }
}
