//! Exclusion rules shared by every walk.
//!
//! Rules are compiled once, before any traversal starts. A malformed regex
//! or glob is a [`ConfigError`]; matching itself can never fail.

use globset::{GlobBuilder, GlobMatcher};
use regex::Regex;
use std::collections::HashSet;
use std::path::Path;

use crate::error::ConfigError;

/// Immutable name/regex/glob filters applied to every visited path.
#[derive(Debug, Clone, Default)]
pub struct ExclusionRules {
    names: HashSet<String>,
    pattern: Option<Regex>,
    name_glob: Option<GlobMatcher>,
    path_glob: Option<GlobMatcher>,
}

impl ExclusionRules {
    /// Rules that exclude nothing.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn builder() -> ExclusionRulesBuilder {
        ExclusionRulesBuilder::default()
    }

    /// Decide whether `path` is excluded. Checks short-circuit in order:
    /// path component in the name set, regex on the full path, glob on the
    /// base name, glob on the full path.
    pub fn should_exclude(&self, path: &Path) -> bool {
        let normalized = slash_normalized(path);

        if !self.names.is_empty() {
            if let Some(part) = normalized.split('/').find(|p| self.names.contains(*p)) {
                tracing::trace!(path = %path.display(), component = part, "excluded by name");
                return true;
            }
        }

        if let Some(re) = &self.pattern {
            if re.is_match(&normalized) {
                tracing::trace!(path = %path.display(), "excluded by pattern");
                return true;
            }
        }

        if let Some(glob) = &self.name_glob {
            let base = path
                .file_name()
                .map(|n| n.to_string_lossy())
                .unwrap_or_default();
            if glob.is_match(&*base) {
                tracing::trace!(path = %path.display(), "excluded by name glob");
                return true;
            }
        }

        if let Some(glob) = &self.path_glob {
            if glob.is_match(&normalized) {
                tracing::trace!(path = %path.display(), "excluded by path glob");
                return true;
            }
        }

        false
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
            && self.pattern.is_none()
            && self.name_glob.is_none()
            && self.path_glob.is_none()
    }
}

/// Builder collecting raw rule strings; `build` compiles and validates them.
#[derive(Debug, Clone, Default)]
pub struct ExclusionRulesBuilder {
    names: Vec<String>,
    pattern: Option<String>,
    name_glob: Option<String>,
    path_glob: Option<String>,
}

impl ExclusionRulesBuilder {
    /// Exclude any path with a component equal to one of `names`.
    pub fn exclude_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.names.extend(names.into_iter().map(Into::into));
        self
    }

    /// Regex matched against the slash-normalized full path.
    pub fn exclude_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = non_blank(pattern.into());
        self
    }

    /// Glob matched against the base name.
    pub fn exclude_glob(mut self, glob: impl Into<String>) -> Self {
        self.name_glob = non_blank(glob.into());
        self
    }

    /// Glob matched against the slash-normalized full path.
    pub fn exclude_glob_path(mut self, glob: impl Into<String>) -> Self {
        self.path_glob = non_blank(glob.into());
        self
    }

    pub fn build(self) -> Result<ExclusionRules, ConfigError> {
        let names = self
            .names
            .into_iter()
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .collect();

        let pattern = self
            .pattern
            .map(|p| {
                Regex::new(&p).map_err(|source| ConfigError::InvalidPattern { pattern: p, source })
            })
            .transpose()?;

        Ok(ExclusionRules {
            names,
            pattern,
            name_glob: self.name_glob.map(compile_glob).transpose()?,
            path_glob: self.path_glob.map(compile_glob).transpose()?,
        })
    }
}

// `*` and `?` stop at '/', matching shell-style name globs.
fn compile_glob(pattern: String) -> Result<GlobMatcher, ConfigError> {
    GlobBuilder::new(&pattern)
        .literal_separator(true)
        .build()
        .map(|g| g.compile_matcher())
        .map_err(|source| ConfigError::InvalidGlob { pattern, source })
}

fn non_blank(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}

fn slash_normalized(path: &Path) -> String {
    let s = path.to_string_lossy();
    if std::path::MAIN_SEPARATOR == '/' {
        s.into_owned()
    } else {
        s.replace(std::path::MAIN_SEPARATOR, "/")
    }
}
