use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

use crate::classify::{HashAlgorithm, KeepPolicy, SortKey};
use crate::config::OutputFormat;

/// Rusty Tidy - find and remove empty directories and duplicate files
#[derive(Parser, Debug)]
#[command(name = "rusty-tidy")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Command,
}

/// Options shared by every subcommand.
#[derive(Args, Debug, Default)]
pub struct GlobalArgs {
    /// Path to configuration file
    #[arg(short, long, global = true, value_name = "PATH", env = "RUSTY_TIDY_CONFIG")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Also write logs to this file
    #[arg(long, global = true, value_name = "PATH", env = "RUSTY_TIDY_LOG_FILE")]
    pub log_file: Option<PathBuf>,

    /// Output format
    #[arg(short, long, global = true, value_enum, env = "RUSTY_TIDY_OUTPUT")]
    pub output: Option<OutputFormat>,

    /// Directory names to exclude (comma-separated)
    #[arg(
        short = 'x',
        long,
        global = true,
        value_delimiter = ',',
        value_name = "NAMES",
        env = "RUSTY_TIDY_EXCLUDE_DIRS"
    )]
    pub exclude_dirs: Option<Vec<String>>,

    /// Regex excluding matching paths
    #[arg(short = 'p', long, global = true, value_name = "REGEX", env = "RUSTY_TIDY_EXCLUDE_PATTERN")]
    pub exclude_pattern: Option<String>,

    /// Glob excluding matching base names
    #[arg(short = 'g', long, global = true, value_name = "GLOB", env = "RUSTY_TIDY_EXCLUDE_GLOB")]
    pub exclude_glob: Option<String>,

    /// Glob excluding matching full paths
    #[arg(long, global = true, value_name = "GLOB", env = "RUSTY_TIDY_EXCLUDE_GLOB_PATH")]
    pub exclude_glob_path: Option<String>,

    /// Worker threads (0 = auto)
    #[arg(short = 'j', long, global = true, value_name = "N", env = "RUSTY_TIDY_JOBS")]
    pub jobs: Option<usize>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Find and remove empty directories
    Empty(EmptyArgs),

    /// Find and remove duplicate files, or list files by size and age
    Find(FindArgs),

    /// Show the largest directories
    Large(LargeArgs),

    /// Manage the configuration file
    #[command(subcommand)]
    Config(ConfigCommand),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Args, Debug)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Write a starter configuration file
    Init(ConfigInitArgs),
}

#[derive(Args, Debug)]
pub struct ConfigInitArgs {
    /// Write to $HOME instead of the current directory
    #[arg(long)]
    pub global: bool,
}

/// Flags common to subcommands that can remove paths.
#[derive(Args, Debug, Default)]
pub struct RemovalArgs {
    /// Show what would be removed without doing it
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Skip confirmation prompts
    #[arg(short, long)]
    pub force: bool,

    /// Move to the trash instead of deleting
    #[arg(short, long, env = "RUSTY_TIDY_TRASH")]
    pub trash: bool,
}

#[derive(Args, Debug)]
pub struct EmptyArgs {
    /// Root directory to scan
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Also remove directories that only contain empty directories
    #[arg(short, long)]
    pub recursive: bool,

    /// File names that don't count as content (comma-separated)
    #[arg(short, long, value_delimiter = ',', value_name = "NAMES", env = "RUSTY_TIDY_IGNORE_FILES")]
    pub ignore_files: Option<Vec<String>>,

    /// Only directories not modified within AGE (e.g. 30d, 4w)
    #[arg(short = 'O', long, value_name = "AGE")]
    pub older_than: Option<String>,

    #[command(flatten)]
    pub removal: RemovalArgs,
}

#[derive(Args, Debug)]
pub struct FindArgs {
    /// Root directory to scan
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Find duplicate files instead of listing by size and age
    #[arg(short = 'D', long)]
    pub duplicates: bool,

    /// Which duplicate to keep: prompt, newest, oldest, first
    #[arg(long, value_name = "POLICY", env = "RUSTY_TIDY_KEEP")]
    pub keep: Option<KeepPolicy>,

    /// Hash algorithm: md5, sha1, sha256
    #[arg(long, value_name = "ALGO", env = "RUSTY_TIDY_HASH_ALGO")]
    pub hash_algo: Option<HashAlgorithm>,

    /// Only files of at least SIZE (e.g. 100MB)
    #[arg(short = 'S', long, value_name = "SIZE")]
    pub files_over: Option<String>,

    /// Only files not modified within AGE (e.g. 30d)
    #[arg(short = 'O', long, value_name = "AGE")]
    pub older_than: Option<String>,

    /// Sort listed files by: path, size, age
    #[arg(long, value_name = "KEY")]
    pub sort: Option<SortKey>,

    #[command(flatten)]
    pub removal: RemovalArgs,
}

#[derive(Args, Debug)]
pub struct LargeArgs {
    /// Root directory to analyze
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Number of directories to show
    #[arg(long, value_name = "N")]
    pub top: Option<usize>,
}
