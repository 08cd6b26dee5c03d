//! Subcommand implementations.

pub mod config;
pub mod empty;
pub mod find;
pub mod large;
pub mod output;
pub mod remove;

use anyhow::Result;
use humansize::{format_size, BINARY};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, BufRead, Write};
use std::sync::Arc;
use std::time::Duration;

use crate::cli::{GlobalArgs, RemovalArgs};
use crate::config::{Config, OutputFormat};
use crate::scanner::{CancelToken, ExclusionRules, WalkOptions, WalkProgress};

use remove::{RemovalExecutor, RemovalMode, RemovalResult, RemovalSummary};

/// How a command finished when it did not return an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    /// Some removals failed; the rest went through
    PartialFailure,
}

impl Outcome {
    pub fn exit_code(self) -> i32 {
        match self {
            Outcome::Success => 0,
            Outcome::PartialFailure => 5,
        }
    }
}

/// Everything a subcommand needs besides its own arguments.
pub struct Session {
    pub config: Config,
    pub cancel: CancelToken,
    pub quiet: bool,
}

impl Session {
    /// Layer global flags over the loaded config and validate the result.
    pub fn new(mut config: Config, global: &GlobalArgs, cancel: CancelToken) -> Result<Self> {
        apply_global_args(&mut config, global);
        config.validate()?;
        Ok(Self {
            config,
            cancel,
            quiet: global.quiet,
        })
    }

    pub fn format(&self) -> OutputFormat {
        self.config.output.format
    }

    pub fn rules(&self) -> Result<ExclusionRules> {
        Ok(self.config.exclusion_rules()?)
    }

    /// Walk options with a spinner attached when output is interactive text.
    pub fn walk_options(&self) -> (WalkOptions, Arc<WalkProgress>) {
        let progress = Arc::new(if self.show_progress() {
            WalkProgress::with_bar(spinner())
        } else {
            WalkProgress::new()
        });
        let options = self.config.walk_options().with_progress(Arc::clone(&progress));
        (options, progress)
    }

    fn show_progress(&self) -> bool {
        !self.quiet && self.format() == OutputFormat::Text
    }

    /// Print an informational line to stderr unless quiet.
    pub fn note(&self, msg: impl AsRef<str>) {
        if !self.quiet {
            eprintln!("{}", msg.as_ref());
        }
    }
}

pub(crate) fn apply_global_args(config: &mut Config, global: &GlobalArgs) {
    if let Some(dirs) = &global.exclude_dirs {
        config.filter.exclude_dirs = dirs.clone();
    }
    if let Some(pattern) = &global.exclude_pattern {
        config.filter.exclude_pattern = Some(pattern.clone());
    }
    if let Some(glob) = &global.exclude_glob {
        config.filter.exclude_glob = Some(glob.clone());
    }
    if let Some(glob) = &global.exclude_glob_path {
        config.filter.exclude_glob_path = Some(glob.clone());
    }
    if let Some(jobs) = global.jobs {
        config.scanner.threads = jobs;
    }
    if let Some(format) = global.output {
        config.output.format = format;
    }
    if let Some(log_file) = &global.log_file {
        config.output.log_file = Some(log_file.clone());
    }
}

fn spinner() -> ProgressBar {
    let bar = ProgressBar::new_spinner();
    bar.set_style(
        ProgressStyle::with_template("{spinner:.green} [{elapsed_precise}] {pos} files scanned")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    bar.enable_steady_tick(Duration::from_millis(120));
    bar
}

/// Ask a yes/no question on stderr; only "y" or "yes" confirm.
pub(crate) fn confirm(question: &str) -> Result<bool> {
    eprint!("{} [y/N] ", question);
    io::stderr().flush()?;

    let mut input = String::new();
    io::stdin().lock().read_line(&mut input)?;
    Ok(is_yes(&input))
}

/// Pick the removal mode and get the user's go-ahead.
/// Returns `None` when the user declined.
pub(crate) fn prepare_removal(
    session: &Session,
    removal: &RemovalArgs,
    count: usize,
    what: &str,
    bytes: Option<u64>,
) -> Result<Option<RemovalExecutor>> {
    let mode = RemovalMode::from_flags(
        removal.dry_run,
        removal.trash || session.config.output.use_trash,
    );
    let executor = RemovalExecutor::new(mode);
    if mode == RemovalMode::DryRun || removal.force {
        return Ok(Some(executor));
    }

    let size = bytes
        .map(|b| format!(" ({})", format_size(b, BINARY)))
        .unwrap_or_default();
    eprintln!("\nAbout to {} {} {}{}.", mode.verb(), count, what, size);
    if mode == RemovalMode::Permanent {
        eprintln!("This action is permanent and cannot be undone.");
    }
    if confirm("Proceed?")? {
        session.cancel.check()?;
        Ok(Some(executor))
    } else {
        session.note("Aborted. No changes were made.");
        Ok(None)
    }
}

/// Print a removal summary and turn failures into an [`Outcome`].
pub(crate) fn finish_removal(
    session: &Session,
    mode: RemovalMode,
    what: &str,
    results: &[RemovalResult],
) -> Result<Outcome> {
    let summary = RemovalSummary::from_results(results);
    session.note(format!(
        "\n{} {} {}{}.",
        mode.past_tense(),
        summary.removed,
        what,
        if summary.freed_bytes > 0 {
            format!(", {} freed", format_size(summary.freed_bytes, BINARY))
        } else {
            String::new()
        }
    ));
    if mode == RemovalMode::DryRun {
        session.note("No changes were made.");
    }

    for result in results {
        if let RemovalResult::Failed { path, error } = result {
            eprintln!("  Error removing {}: {}", path.display(), error);
        }
    }

    session.cancel.check()?;
    if summary.failed > 0 {
        Ok(Outcome::PartialFailure)
    } else {
        Ok(Outcome::Success)
    }
}

fn is_yes(answer: &str) -> bool {
    let answer = answer.trim();
    answer.eq_ignore_ascii_case("y") || answer.eq_ignore_ascii_case("yes")
}
