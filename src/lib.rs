//! Rusty Tidy - A filesystem cleanup utility
//!
//! This crate provides functionality for:
//! - Finding empty directories, optionally cascading to emptied parents
//! - Grouping duplicate files by content hash and picking survivors
//! - Aggregating directory sizes and listing files by size or age

pub mod classify;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod scanner;
pub mod signals;

// Re-export commonly used types
pub use classify::Report;
pub use config::Config;
pub use error::{ConfigError, EntryError, Result, SweepError};
pub use scanner::{CancelToken, ExclusionRules, WalkOptions};
