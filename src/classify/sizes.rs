use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use crate::error::Result;
use crate::scanner::{
    path_order, resolve_root, walk_files, CancelToken, ExclusionRules, WalkOptions,
};

use super::Report;

/// Cumulative size of every directory under `root`.
///
/// Each regular file's size is added to its parent and every further
/// ancestor up to and including the root. The root is always present in
/// the map, even when it holds no files.
pub fn aggregate_sizes(
    root: &Path,
    options: &WalkOptions,
    rules: &ExclusionRules,
    cancel: &CancelToken,
) -> Result<Report<HashMap<PathBuf, u64>>> {
    let root = resolve_root(root)?;
    let sizes = Mutex::new(HashMap::from([(root.clone(), 0u64)]));

    let walk = walk_files(&root, options, rules, cancel, |entry| {
        let mut sizes = sizes.lock().unwrap_or_else(PoisonError::into_inner);
        for dir in entry.path.ancestors().skip(1) {
            if !dir.starts_with(&root) {
                break;
            }
            *sizes.entry(dir.to_path_buf()).or_insert(0) += entry.size;
        }
        Ok(())
    })?;

    let sizes = sizes.into_inner().unwrap_or_else(PoisonError::into_inner);
    tracing::info!(
        root = %root.display(),
        directories = sizes.len(),
        total = sizes.get(&root).copied().unwrap_or(0),
        errors = walk.errors.len(),
        "size aggregation finished"
    );
    Ok(Report::from_walk(sizes, walk))
}

/// The `n` largest directories, biggest first; equal sizes are ordered
/// by path.
pub fn largest(sizes: &HashMap<PathBuf, u64>, n: usize) -> Vec<(PathBuf, u64)> {
    let mut all: Vec<(PathBuf, u64)> = sizes.iter().map(|(p, s)| (p.clone(), *s)).collect();
    all.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| path_order(&a.0, &b.0)));
    all.truncate(n);
    all
}
