mod cancel;
mod entry;
mod exclude;
mod options;
mod progress;
mod size;
mod walker;

pub use cancel::CancelToken;
pub use entry::{path_depth, path_order, Entry};
pub use exclude::{ExclusionRules, ExclusionRulesBuilder};
pub use options::WalkOptions;
pub use progress::WalkProgress;
pub use size::{cutoff_from_age, parse_duration, parse_size};
pub(crate) use walker::record;
pub use walker::{resolve_root, walk_files, WalkReport};
