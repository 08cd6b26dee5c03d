use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use std::time::SystemTime;

use crate::error::{EntryError, Result};
use crate::scanner::{
    path_order, resolve_root, walk_files, CancelToken, Entry, ExclusionRules, WalkOptions,
};

use super::hasher::{hash_file, HashAlgorithm};
use super::Report;

/// A file that shares its content digest with at least one other file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateFile {
    pub path: PathBuf,
    pub size: u64,
    pub mtime: Option<SystemTime>,
}

impl From<&Entry> for DuplicateFile {
    fn from(entry: &Entry) -> Self {
        Self {
            path: entry.path.clone(),
            size: entry.size,
            mtime: entry.mtime,
        }
    }
}

/// Files with identical content. Always holds two or more members,
/// ordered by path.
#[derive(Debug, Clone, Serialize)]
pub struct DuplicateGroup {
    pub hash: String,
    pub size: u64,
    pub files: Vec<DuplicateFile>,
}

impl DuplicateGroup {
    /// Bytes freed if every copy but one were removed.
    pub fn wasted_bytes(&self) -> u64 {
        self.size * (self.files.len() as u64).saturating_sub(1)
    }
}

/// Group the non-empty regular files under `root` by content digest and
/// return the groups that have more than one member.
///
/// Zero-length files are skipped. Files that cannot be read are reported
/// in the returned errors and left out of every group. Groups come back
/// ordered by their first path.
pub fn find_duplicates(
    root: &Path,
    algorithm: HashAlgorithm,
    options: &WalkOptions,
    rules: &ExclusionRules,
    cancel: &CancelToken,
) -> Result<Report<Vec<DuplicateGroup>>> {
    let root = resolve_root(root)?;
    let by_hash: Mutex<HashMap<String, Vec<DuplicateFile>>> = Mutex::new(HashMap::new());

    let walk = walk_files(&root, options, rules, cancel, |entry| {
        if entry.size == 0 {
            return Ok(());
        }
        let hash = hash_file(&entry.path, algorithm)
            .map_err(|e| EntryError::new(&entry.path, "cannot hash", e))?;
        tracing::trace!(path = %entry.path.display(), %hash, "hashed");

        by_hash
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(hash)
            .or_default()
            .push(DuplicateFile::from(entry));
        Ok(())
    })?;

    let by_hash = by_hash.into_inner().unwrap_or_else(PoisonError::into_inner);
    let mut groups: Vec<DuplicateGroup> = by_hash
        .into_iter()
        .filter(|(_, files)| files.len() > 1)
        .map(|(hash, mut files)| {
            files.sort_by(|a, b| path_order(&a.path, &b.path));
            DuplicateGroup {
                size: files[0].size,
                hash,
                files,
            }
        })
        .collect();
    groups.sort_by(|a, b| path_order(&a.files[0].path, &b.files[0].path));

    tracing::info!(
        root = %root.display(),
        %algorithm,
        files = walk.files,
        groups = groups.len(),
        errors = walk.errors.len(),
        "duplicate scan finished"
    );
    Ok(Report::from_walk(groups, walk))
}
