use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use crate::classify::{EmptyOptions, FileCriteria, HashAlgorithm, KeepPolicy, SortKey};
use crate::error::ConfigError;
use crate::scanner::{parse_duration, parse_size, ExclusionRules, WalkOptions};

/// File name looked up in the working directory, then in `$HOME`.
pub const CONFIG_FILE_NAME: &str = ".rusty-tidy.toml";

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub filter: FilterConfig,
    pub empty: EmptyConfig,
    pub find: FindConfig,
    pub large: LargeConfig,
    pub scanner: ScannerConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Directory names pruned wherever they appear in a path
    pub exclude_dirs: Vec<String>,
    /// Regex matched against the full path
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclude_pattern: Option<String>,
    /// Glob matched against the base name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclude_glob: Option<String>,
    /// Glob matched against the full path
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclude_glob_path: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmptyConfig {
    /// Cascade to directories that only hold empty directories
    pub recursive: bool,
    /// File names that do not count as content
    pub ignore_files: Vec<String>,
    /// Minimum age, e.g. "30d"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub older_than: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FindConfig {
    /// Survivor policy: prompt, newest, oldest, first
    pub keep: KeepPolicy,
    /// Digest: md5, sha1, sha256
    pub hash_algo: HashAlgorithm,
    /// Listing order: path, size, age
    pub sort: SortKey,
    /// Minimum size, e.g. "100MB"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub files_over: Option<String>,
    /// Minimum age, e.g. "4w"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub older_than: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LargeConfig {
    /// Directories listed by `large`
    pub top_n: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScannerConfig {
    /// Worker threads (0 = auto)
    pub threads: usize,
    /// Work queue capacity (0 = twice the worker count)
    pub queue_capacity: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub format: OutputFormat,
    /// Move removed paths to the trash instead of deleting them
    pub use_trash: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_file: Option<PathBuf>,
}

/// How results are rendered on stdout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    Csv,
}

impl Default for LargeConfig {
    fn default() -> Self {
        Self { top_n: 10 }
    }
}

impl Config {
    /// Load configuration.
    ///
    /// An explicit `path` must exist. Without one, `./.rusty-tidy.toml` and
    /// then `$HOME/.rusty-tidy.toml` are tried; when neither exists the
    /// built-in defaults are used.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => match Self::discover() {
                Some(path) => path,
                None => {
                    tracing::debug!("no config file found, using defaults");
                    return Ok(Self::default());
                }
            },
        };

        let config = Self::from_file(&path)?;
        tracing::debug!(path = %path.display(), "loaded config file");
        Ok(config)
    }

    /// Parse and validate a single TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;
        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })?;
        config.validate()?;
        Ok(config)
    }

    fn discover() -> Option<PathBuf> {
        let local = PathBuf::from(CONFIG_FILE_NAME);
        if local.is_file() {
            return Some(local);
        }
        dirs::home_dir()
            .map(|home| home.join(CONFIG_FILE_NAME))
            .filter(|p| p.is_file())
    }

    /// Where `config init` writes: the working directory, or `$HOME` when
    /// `global` is set.
    pub fn default_path(global: bool) -> Result<PathBuf, ConfigError> {
        if global {
            dirs::home_dir()
                .map(|home| home.join(CONFIG_FILE_NAME))
                .ok_or_else(|| ConfigError::Invalid("cannot determine home directory".into()))
        } else {
            Ok(PathBuf::from(CONFIG_FILE_NAME))
        }
    }

    /// Configuration written by `config init`: the common VCS, dependency
    /// and scratch directories excluded, OS metadata files ignored.
    pub fn starter() -> Self {
        Self {
            filter: FilterConfig {
                exclude_dirs: [".git", "node_modules", "vendor", "tmp"]
                    .map(String::from)
                    .to_vec(),
                ..FilterConfig::default()
            },
            empty: EmptyConfig {
                ignore_files: [".DS_Store", "Thumbs.db"].map(String::from).to_vec(),
                ..EmptyConfig::default()
            },
            ..Self::default()
        }
    }

    /// Write the starter configuration to `path`. Never overwrites.
    pub fn write_starter(path: &Path) -> Result<(), ConfigError> {
        let body = toml::to_string_pretty(&Self::starter())
            .map_err(|e| ConfigError::Invalid(format!("cannot serialize config: {}", e)))?;

        let write_err = |e: std::io::Error| ConfigError::WriteError {
            path: path.to_path_buf(),
            source: e,
        };
        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
            .map_err(|e| {
                if e.kind() == ErrorKind::AlreadyExists {
                    ConfigError::AlreadyExists(path.to_path_buf())
                } else {
                    write_err(e)
                }
            })?;
        file.write_all(b"# rusty-tidy configuration\n\n")
            .and_then(|_| file.write_all(body.as_bytes()))
            .map_err(write_err)?;
        Ok(())
    }

    /// Reject values that would only fail later, mid-run.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.exclusion_rules()?;
        self.empty_options()?;
        self.file_criteria()?;
        if self.large.top_n == 0 {
            return Err(ConfigError::Invalid("large.top_n must be at least 1".into()));
        }
        Ok(())
    }

    /// Compile the `[filter]` section.
    pub fn exclusion_rules(&self) -> Result<ExclusionRules, ConfigError> {
        let f = &self.filter;
        let mut builder = ExclusionRules::builder().exclude_names(f.exclude_dirs.iter().cloned());
        if let Some(pattern) = &f.exclude_pattern {
            builder = builder.exclude_pattern(pattern.clone());
        }
        if let Some(glob) = &f.exclude_glob {
            builder = builder.exclude_glob(glob.clone());
        }
        if let Some(glob) = &f.exclude_glob_path {
            builder = builder.exclude_glob_path(glob.clone());
        }
        builder.build()
    }

    pub fn empty_options(&self) -> Result<EmptyOptions, ConfigError> {
        let mut options = EmptyOptions::new()
            .with_recursive(self.empty.recursive)
            .with_ignore_names(self.empty.ignore_files.iter().cloned());
        if let Some(age) = &self.empty.older_than {
            options = options.with_older_than(parse_duration(age)?);
        }
        Ok(options)
    }

    pub fn file_criteria(&self) -> Result<FileCriteria, ConfigError> {
        let mut criteria = FileCriteria::new();
        if let Some(size) = &self.find.files_over {
            criteria = criteria.with_min_size(parse_size(size)?);
        }
        if let Some(age) = &self.find.older_than {
            criteria = criteria.with_older_than(parse_duration(age)?);
        }
        Ok(criteria)
    }

    pub fn walk_options(&self) -> WalkOptions {
        WalkOptions::new()
            .with_threads(self.scanner.threads)
            .with_queue_capacity(self.scanner.queue_capacity)
    }
}
