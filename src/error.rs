use std::path::{Path, PathBuf};
use thiserror::Error;

/// Core library errors
#[derive(Error, Debug)]
pub enum SweepError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error at path '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Worker thread panicked during {0}")]
    WorkerPanic(&'static str),
}

impl SweepError {
    /// True when the operation was interrupted rather than failed.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, SweepError::Cancelled)
    }
}

/// Configuration-specific errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write config file '{path}': {source}")]
    WriteError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Config file already exists: {0}")]
    AlreadyExists(PathBuf),

    #[error("Failed to parse config file '{path}': {source}")]
    ParseError {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid exclude pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("Invalid glob '{pattern}': {source}")]
    InvalidGlob {
        pattern: String,
        #[source]
        source: globset::Error,
    },

    #[error("Invalid duration '{0}': use formats like '30d', '4w', '12h'")]
    InvalidDuration(String),

    #[error("Invalid size '{0}': use formats like '100MB', '2GB'")]
    InvalidSize(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// A non-fatal failure tied to one filesystem entry.
///
/// These are collected during a walk and handed back next to the results;
/// they never abort classification of the rest of the tree.
#[derive(Error, Debug)]
#[error("{context} '{path}': {source}")]
pub struct EntryError {
    pub path: PathBuf,
    pub context: &'static str,
    #[source]
    pub source: std::io::Error,
}

impl EntryError {
    pub fn new(path: impl Into<PathBuf>, context: &'static str, source: std::io::Error) -> Self {
        Self {
            path: path.into(),
            context,
            source,
        }
    }

    /// Build from a walkdir failure, keeping whichever path it reports.
    pub fn from_walk(err: walkdir::Error, fallback: &Path) -> Self {
        let path = err
            .path()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| fallback.to_path_buf());
        let source = err
            .into_io_error()
            .unwrap_or_else(|| std::io::Error::other("filesystem loop detected"));
        Self::new(path, "cannot access", source)
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, SweepError>;
