//! Find command implementation: duplicates, or files by size and age.

use anyhow::Result;
use humansize::{format_size, BINARY};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::time::SystemTime;

use crate::classify::{
    find_duplicates, find_matching_files, resolve, sort_entries, Choice, DuplicateChooser,
    DuplicateFile, KeepPolicy,
};
use crate::cli::FindArgs;
use crate::config::Config;

use super::output::{format_age, print_entry_errors, write_duplicates, write_files};
use super::{finish_removal, prepare_removal, Outcome, Session};

/// Run the find command.
pub fn run(args: FindArgs, session: &Session) -> Result<Outcome> {
    let mut config = session.config.clone();
    if let Some(keep) = args.keep {
        config.find.keep = keep;
    }
    if let Some(algo) = args.hash_algo {
        config.find.hash_algo = algo;
    }
    if let Some(sort) = args.sort {
        config.find.sort = sort;
    }
    if let Some(size) = args.files_over.clone() {
        config.find.files_over = Some(size);
    }
    if let Some(age) = args.older_than.clone() {
        config.find.older_than = Some(age);
    }
    config.validate()?;

    if args.duplicates {
        run_duplicates(&args, &config, session)
    } else {
        run_listing(&args, &config, session)
    }
}

fn run_duplicates(args: &FindArgs, config: &Config, session: &Session) -> Result<Outcome> {
    let rules = session.rules()?;
    let (options, progress) = session.walk_options();

    session.note(format!(
        "Scanning {} for duplicate files ({})...",
        args.path.display(),
        config.find.hash_algo
    ));
    let report = find_duplicates(
        &args.path,
        config.find.hash_algo,
        &options,
        &rules,
        &session.cancel,
    );
    progress.finish();
    let report = report?;
    print_entry_errors(&report.errors);

    if report.found.is_empty() {
        session.note("No duplicate files found.");
        return Ok(Outcome::Success);
    }

    write_duplicates(&mut io::stdout().lock(), session.format(), &report.found)?;
    let wasted: u64 = report.found.iter().map(|g| g.wasted_bytes()).sum();
    session.note(format!(
        "\nFound {} duplicate set{}, {} reclaimable.",
        report.found.len(),
        if report.found.len() == 1 { "" } else { "s" },
        format_size(wasted, BINARY)
    ));

    let policy = match config.find.keep {
        KeepPolicy::Prompt if args.removal.force || args.removal.dry_run => KeepPolicy::First,
        policy => policy,
    };

    let mut chooser = PromptChooser {
        input: io::stdin().lock(),
    };
    let mut doomed: Vec<(PathBuf, u64)> = Vec::new();
    for group in &report.found {
        session.cancel.check()?;
        let resolution = if policy == KeepPolicy::Prompt {
            resolve(&group.files, policy, Some(&mut chooser))
        } else {
            resolve(&group.files, policy, None)
        };
        if let Some(keep) = &resolution.keep {
            tracing::debug!(keep = %keep.display(), remove = resolution.remove.len(), "resolved group");
        }
        doomed.extend(resolution.remove.into_iter().map(|p| (p, group.size)));
    }
    // The confirmation prompt reads stdin too.
    drop(chooser);

    if doomed.is_empty() {
        session.note("Nothing selected for removal.");
        return Ok(Outcome::Success);
    }

    let bytes: u64 = doomed.iter().map(|(_, size)| size).sum();
    let Some(executor) =
        prepare_removal(session, &args.removal, doomed.len(), "duplicate files", Some(bytes))?
    else {
        return Ok(Outcome::Success);
    };
    let results = executor.remove_files(&doomed, &session.cancel);
    finish_removal(session, executor.mode(), "files", &results)
}

fn run_listing(args: &FindArgs, config: &Config, session: &Session) -> Result<Outcome> {
    let rules = session.rules()?;
    let criteria = config.file_criteria()?;
    let (options, progress) = session.walk_options();

    session.note(format!("Scanning {} for matching files...", args.path.display()));
    let report = find_matching_files(&args.path, &criteria, &options, &rules, &session.cancel);
    progress.finish();
    let mut report = report?;
    print_entry_errors(&report.errors);

    if report.found.is_empty() {
        session.note("No files matched.");
        return Ok(Outcome::Success);
    }

    sort_entries(&mut report.found, config.find.sort);
    write_files(&mut io::stdout().lock(), session.format(), &report.found)?;

    let files: Vec<(PathBuf, u64)> = report
        .found
        .iter()
        .map(|e| (e.path.clone(), e.size))
        .collect();
    let bytes: u64 = files.iter().map(|(_, size)| size).sum();
    session.note(format!(
        "\nFound {} matching file{} ({}).",
        files.len(),
        if files.len() == 1 { "" } else { "s" },
        format_size(bytes, BINARY)
    ));

    let Some(executor) =
        prepare_removal(session, &args.removal, files.len(), "matching files", Some(bytes))?
    else {
        return Ok(Outcome::Success);
    };
    let results = executor.remove_files(&files, &session.cancel);
    finish_removal(session, executor.mode(), "files", &results)
}

/// Asks which copy of each duplicate set to keep. The listing goes to
/// stderr and answers are read from `input`.
struct PromptChooser<R> {
    input: R,
}

impl<R: BufRead> DuplicateChooser for PromptChooser<R> {
    fn choose(&mut self, files: &[DuplicateFile]) -> Choice {
        eprintln!("\nDuplicate set of {} files:", files.len());
        for (i, file) in files.iter().enumerate() {
            let age = file
                .mtime
                .and_then(|t| SystemTime::now().duration_since(t).ok())
                .map(format_age)
                .unwrap_or_else(|| "?".into());
            eprintln!(
                "  [{}] {} ({}, {} old)",
                i + 1,
                file.path.display(),
                format_size(file.size, BINARY),
                age
            );
        }

        loop {
            eprint!("Keep which file? [1-{}, s to skip] ", files.len());
            if io::stderr().flush().is_err() {
                return Choice::Skip;
            }

            let mut answer = String::new();
            match self.input.read_line(&mut answer) {
                Ok(0) | Err(_) => return Choice::Skip,
                Ok(_) => {}
            }
            match parse_choice(&answer, files.len()) {
                Some(choice) => return choice,
                None => eprintln!("Invalid choice '{}'.", answer.trim()),
            }
        }
    }
}

/// Map a 1-based answer to a 0-based [`Choice`]. `None` means the answer
/// is neither a listed number nor `s`.
fn parse_choice(answer: &str, count: usize) -> Option<Choice> {
    let answer = answer.trim();
    if answer.eq_ignore_ascii_case("s") {
        return Some(Choice::Skip);
    }
    match answer.parse::<usize>() {
        Ok(n) if (1..=count).contains(&n) => Some(Choice::Keep(n - 1)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn group() -> Vec<DuplicateFile> {
        ["/d/a", "/d/b", "/d/c"]
            .into_iter()
            .map(|p| DuplicateFile {
                path: PathBuf::from(p),
                size: 4,
                mtime: None,
            })
            .collect()
    }

    fn answer(input: &str) -> Choice {
        PromptChooser {
            input: Cursor::new(input.as_bytes()),
        }
        .choose(&group())
    }

    #[test]
    fn test_parse_choice() {
        assert_eq!(parse_choice("1\n", 3), Some(Choice::Keep(0)));
        assert_eq!(parse_choice(" 3 ", 3), Some(Choice::Keep(2)));
        assert_eq!(parse_choice("S\n", 3), Some(Choice::Skip));
        assert_eq!(parse_choice("0", 3), None);
        assert_eq!(parse_choice("4", 3), None);
        assert_eq!(parse_choice("2x", 3), None);
        assert_eq!(parse_choice("", 3), None);
    }

    #[test]
    fn test_chooser_reprompts_until_valid() {
        assert_eq!(answer("2x\n9\n\n2\n"), Choice::Keep(1));
        assert_eq!(answer("nope\ns\n"), Choice::Skip);
    }

    #[test]
    fn test_chooser_skips_on_end_of_input() {
        assert_eq!(answer(""), Choice::Skip);
        assert_eq!(answer("7\n"), Choice::Skip);
    }
}
