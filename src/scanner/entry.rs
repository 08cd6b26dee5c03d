use serde::Serialize;
use std::cmp::Ordering;
use std::fs::Metadata;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

/// A filesystem node visited during a walk.
/// Created per walk and dropped once the caller is done with it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Entry {
    /// Full path to the file or directory
    pub path: PathBuf,

    /// True if this is a directory
    pub is_dir: bool,

    /// Apparent size in bytes
    pub size: u64,

    /// Last modification time
    pub mtime: Option<SystemTime>,
}

impl Entry {
    /// Build an entry from already fetched metadata.
    pub fn from_metadata(path: PathBuf, metadata: &Metadata) -> Self {
        Self {
            path,
            is_dir: metadata.is_dir(),
            size: metadata.len(),
            mtime: metadata.modified().ok(),
        }
    }

    /// Last path component, lossily converted.
    pub fn name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Time elapsed since the last modification, if known.
    pub fn age(&self) -> Option<Duration> {
        self.mtime
            .and_then(|t| SystemTime::now().duration_since(t).ok())
    }

    /// True if modified strictly before `cutoff`.
    pub fn modified_before(&self, cutoff: SystemTime) -> bool {
        self.mtime.is_some_and(|t| t < cutoff)
    }
}

/// Number of components in a path; used to order directories deepest first.
pub fn path_depth(path: &Path) -> usize {
    path.components().count()
}

/// Lexicographic order over the raw path bytes, so `a-b` sorts before
/// `a/x`. `Path`'s own `Ord` compares component by component instead.
pub fn path_order(a: &Path, b: &Path) -> Ordering {
    a.as_os_str().cmp(b.as_os_str())
}
