//! Picking which member of a duplicate group survives.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::ConfigError;
use crate::scanner::path_order;

use super::duplicates::DuplicateFile;

/// How to pick the copy to keep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeepPolicy {
    /// Latest modification time
    Newest,
    /// Earliest modification time
    Oldest,
    /// Lexicographically smallest path
    First,
    /// Ask a [`DuplicateChooser`]
    #[default]
    Prompt,
}

impl KeepPolicy {
    pub const ALL: [KeepPolicy; 4] = [Self::Newest, Self::Oldest, Self::First, Self::Prompt];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Newest => "newest",
            Self::Oldest => "oldest",
            Self::First => "first",
            Self::Prompt => "prompt",
        }
    }
}

impl fmt::Display for KeepPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for KeepPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                ConfigError::Invalid(format!(
                    "unknown keep policy '{}' (expected newest, oldest, first or prompt)",
                    s
                ))
            })
    }
}

/// Answer from an interactive chooser.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Choice {
    /// Keep the file at this 0-based index of the group
    Keep(usize),
    /// Leave the whole group untouched
    Skip,
}

/// Decides which file of a duplicate group to keep under
/// [`KeepPolicy::Prompt`].
pub trait DuplicateChooser {
    fn choose(&mut self, files: &[DuplicateFile]) -> Choice;
}

impl<F> DuplicateChooser for F
where
    F: FnMut(&[DuplicateFile]) -> Choice,
{
    fn choose(&mut self, files: &[DuplicateFile]) -> Choice {
        self(files)
    }
}

/// Outcome for one duplicate group. Either `keep` is set and `remove`
/// holds every other member, or both are empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolution {
    pub keep: Option<PathBuf>,
    pub remove: Vec<PathBuf>,
}

impl Resolution {
    pub fn is_skip(&self) -> bool {
        self.keep.is_none()
    }
}

/// Resolve one duplicate group under `policy`.
///
/// Groups with fewer than two files resolve to nothing. Newest and oldest
/// ties go to the earlier file in `files`. Under [`KeepPolicy::Prompt`]
/// without a chooser the first path is kept; a chooser answering
/// [`Choice::Skip`] or an out-of-range index leaves the group alone.
pub fn resolve(
    files: &[DuplicateFile],
    policy: KeepPolicy,
    chooser: Option<&mut dyn DuplicateChooser>,
) -> Resolution {
    if files.len() < 2 {
        return Resolution::default();
    }

    let keep = match policy {
        KeepPolicy::Newest => pick_by(files, |candidate, best| candidate.mtime > best.mtime),
        KeepPolicy::Oldest => pick_by(files, |candidate, best| candidate.mtime < best.mtime),
        KeepPolicy::First => pick_by(files, smaller_path),
        KeepPolicy::Prompt => match chooser {
            None => pick_by(files, smaller_path),
            Some(chooser) => match chooser.choose(files) {
                Choice::Keep(index) if index < files.len() => index,
                Choice::Keep(index) => {
                    tracing::warn!(index, size = files.len(), "choice out of range, skipping group");
                    return Resolution::default();
                }
                Choice::Skip => return Resolution::default(),
            },
        },
    };

    Resolution {
        keep: Some(files[keep].path.clone()),
        remove: files
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != keep)
            .map(|(_, f)| f.path.clone())
            .collect(),
    }
}

/// Index of the winning file; a candidate replaces the current best only
/// when `beats` holds strictly.
fn smaller_path(candidate: &DuplicateFile, best: &DuplicateFile) -> bool {
    path_order(&candidate.path, &best.path) == Ordering::Less
}

fn pick_by<F>(files: &[DuplicateFile], beats: F) -> usize
where
    F: Fn(&DuplicateFile, &DuplicateFile) -> bool,
{
    let mut best = 0;
    for (i, candidate) in files.iter().enumerate().skip(1) {
        if beats(candidate, &files[best]) {
            best = i;
        }
    }
    best
}
