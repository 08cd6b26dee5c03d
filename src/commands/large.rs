//! Large command implementation.

use anyhow::Result;
use std::io;

use crate::classify::{aggregate_sizes, largest};
use crate::cli::LargeArgs;

use super::output::{print_entry_errors, write_sizes};
use super::{Outcome, Session};

/// Run the large command.
pub fn run(args: LargeArgs, session: &Session) -> Result<Outcome> {
    let top = args.top.unwrap_or(session.config.large.top_n);
    let rules = session.rules()?;
    let (options, progress) = session.walk_options();

    session.note(format!(
        "Scanning {}... this may take a while. Press Ctrl+C to cancel.",
        args.path.display()
    ));
    let report = aggregate_sizes(&args.path, &options, &rules, &session.cancel);
    progress.finish();
    let report = report?;
    print_entry_errors(&report.errors);

    let biggest = largest(&report.found, top);
    session.note(format!("\nTop {} largest folders:", biggest.len()));
    write_sizes(&mut io::stdout().lock(), session.format(), &biggest)?;

    Ok(Outcome::Success)
}
