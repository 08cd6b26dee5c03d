//! Classifiers built on top of the scanner: empty directories, duplicate
//! files, per-directory sizes and files matching size/age criteria.

mod criteria;
mod duplicates;
mod empty;
mod hasher;
mod resolver;
mod sizes;

pub use criteria::{find_matching_files, sort_entries, FileCriteria, SortKey};
pub use duplicates::{find_duplicates, DuplicateFile, DuplicateGroup};
pub use empty::{classify_empty, EmptyOptions};
pub use hasher::{hash_file, HashAlgorithm};
pub use resolver::{resolve, Choice, DuplicateChooser, KeepPolicy, Resolution};
pub use sizes::{aggregate_sizes, largest};

use crate::error::EntryError;
use crate::scanner::WalkReport;

/// Result of a classification pass: what was found, plus the per-entry
/// failures that were skipped along the way.
#[derive(Debug)]
pub struct Report<T> {
    pub found: T,
    pub errors: Vec<EntryError>,
}

impl<T> Report<T> {
    pub(crate) fn from_walk(found: T, walk: WalkReport) -> Self {
        Self {
            found,
            errors: walk.errors,
        }
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}
