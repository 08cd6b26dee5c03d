//! Rendering of results as text, JSON or CSV.

use anyhow::Result;
use humansize::{format_size, BINARY};
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use crate::classify::DuplicateGroup;
use crate::config::OutputFormat;
use crate::error::EntryError;
use crate::scanner::Entry;

#[derive(Serialize)]
struct PathRow<'a> {
    path: &'a Path,
}

#[derive(Serialize)]
struct FileRow<'a> {
    path: &'a Path,
    size: u64,
    modified: Option<u64>,
}

#[derive(Serialize)]
struct DuplicateRow<'a> {
    group: usize,
    hash: &'a str,
    size: u64,
    path: &'a Path,
    modified: Option<u64>,
}

#[derive(Serialize)]
struct SizeRow<'a> {
    path: &'a Path,
    size: u64,
}

fn unix_secs(t: Option<SystemTime>) -> Option<u64> {
    t.and_then(|t| t.duration_since(SystemTime::UNIX_EPOCH).ok())
        .map(|d| d.as_secs())
}

/// Empty directories, one per line.
pub fn write_paths<W: Write>(out: &mut W, format: OutputFormat, paths: &[PathBuf]) -> Result<()> {
    let rows: Vec<PathRow> = paths.iter().map(|p| PathRow { path: p }).collect();
    match format {
        OutputFormat::Text => {
            for path in paths {
                writeln!(out, "{}", path.display())?;
            }
        }
        OutputFormat::Json => write_json(out, &rows)?,
        OutputFormat::Csv => write_csv(out, &rows)?,
    }
    Ok(())
}

/// Files with size and age.
pub fn write_files<W: Write>(out: &mut W, format: OutputFormat, files: &[Entry]) -> Result<()> {
    let rows: Vec<FileRow> = files
        .iter()
        .map(|e| FileRow {
            path: &e.path,
            size: e.size,
            modified: unix_secs(e.mtime),
        })
        .collect();
    match format {
        OutputFormat::Text => {
            for entry in files {
                writeln!(
                    out,
                    "{:>10}  {:>6}  {}",
                    format_size(entry.size, BINARY),
                    entry.age().map(format_age).unwrap_or_else(|| "?".into()),
                    entry.path.display()
                )?;
            }
        }
        OutputFormat::Json => write_json(out, &rows)?,
        OutputFormat::Csv => write_csv(out, &rows)?,
    }
    Ok(())
}

/// Duplicate groups; text marks each group with its shared size.
pub fn write_duplicates<W: Write>(
    out: &mut W,
    format: OutputFormat,
    groups: &[DuplicateGroup],
) -> Result<()> {
    match format {
        OutputFormat::Text => {
            for (i, group) in groups.iter().enumerate() {
                writeln!(
                    out,
                    "Group {} ({} each, {} copies):",
                    i + 1,
                    format_size(group.size, BINARY),
                    group.files.len()
                )?;
                for file in &group.files {
                    writeln!(out, "  {}", file.path.display())?;
                }
            }
        }
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut *out, groups)?;
            writeln!(out)?;
        }
        OutputFormat::Csv => {
            let rows: Vec<DuplicateRow> = groups
                .iter()
                .enumerate()
                .flat_map(|(i, g)| {
                    g.files.iter().map(move |f| DuplicateRow {
                        group: i + 1,
                        hash: &g.hash,
                        size: g.size,
                        path: &f.path,
                        modified: unix_secs(f.mtime),
                    })
                })
                .collect();
            write_csv(out, &rows)?;
        }
    }
    Ok(())
}

/// Directory sizes, biggest first as given.
pub fn write_sizes<W: Write>(
    out: &mut W,
    format: OutputFormat,
    sizes: &[(PathBuf, u64)],
) -> Result<()> {
    let rows: Vec<SizeRow> = sizes
        .iter()
        .map(|(path, size)| SizeRow { path, size: *size })
        .collect();
    match format {
        OutputFormat::Text => {
            for (path, size) in sizes {
                writeln!(out, "{:>10}  {}", format_size(*size, BINARY), path.display())?;
            }
        }
        OutputFormat::Json => write_json(out, &rows)?,
        OutputFormat::Csv => write_csv(out, &rows)?,
    }
    Ok(())
}

/// Collected per-entry errors go to stderr regardless of format.
pub fn print_entry_errors(errors: &[EntryError]) {
    if errors.is_empty() {
        return;
    }
    eprintln!(
        "\n{} path{} could not be processed:",
        errors.len(),
        if errors.len() == 1 { "" } else { "s" }
    );
    for err in errors {
        eprintln!("  {}", err);
    }
}

/// Compact age: "3d", "5h", "12m", "40s".
pub fn format_age(age: Duration) -> String {
    let secs = age.as_secs();
    match secs {
        s if s >= 86_400 => format!("{}d", s / 86_400),
        s if s >= 3_600 => format!("{}h", s / 3_600),
        s if s >= 60 => format!("{}m", s / 60),
        s => format!("{}s", s),
    }
}

fn write_json<W: Write, T: Serialize>(out: &mut W, rows: &[T]) -> Result<()> {
    serde_json::to_writer_pretty(&mut *out, rows)?;
    writeln!(out)?;
    Ok(())
}

fn write_csv<W: Write, T: Serialize>(out: &mut W, rows: &[T]) -> Result<()> {
    let mut writer = csv::Writer::from_writer(out);
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}
