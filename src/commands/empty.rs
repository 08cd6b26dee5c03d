//! Empty command implementation.

use anyhow::Result;
use std::io;

use crate::classify::classify_empty;
use crate::cli::EmptyArgs;

use super::output::{print_entry_errors, write_paths};
use super::{finish_removal, prepare_removal, Outcome, Session};

/// Run the empty command.
pub fn run(args: EmptyArgs, session: &Session) -> Result<Outcome> {
    let mut config = session.config.clone();
    if args.recursive {
        config.empty.recursive = true;
    }
    if let Some(names) = args.ignore_files {
        config.empty.ignore_files = names;
    }
    if let Some(age) = args.older_than {
        config.empty.older_than = Some(age);
    }
    let options = config.empty_options()?;
    let rules = session.rules()?;

    session.note(format!(
        "Scanning {} for empty directories{}...",
        args.path.display(),
        if options.recursive { " (recursive)" } else { "" }
    ));

    let report = classify_empty(&args.path, &options, &rules, &session.cancel)?;
    print_entry_errors(&report.errors);

    if report.found.is_empty() {
        session.note("No empty directories found.");
        return Ok(Outcome::Success);
    }

    write_paths(&mut io::stdout().lock(), session.format(), &report.found)?;
    session.note(format!(
        "\nFound {} empty director{}.",
        report.found.len(),
        if report.found.len() == 1 { "y" } else { "ies" }
    ));

    let Some(executor) = prepare_removal(
        session,
        &args.removal,
        report.found.len(),
        "directories",
        None,
    )?
    else {
        return Ok(Outcome::Success);
    };

    let results = executor.remove_empty_dirs(&report.found, &options.ignore_names, &session.cancel);
    finish_removal(session, executor.mode(), "directories", &results)
}
