//! Config command implementation.

use anyhow::Result;

use crate::cli::{ConfigCommand, ConfigInitArgs};
use crate::config::Config;

use super::Outcome;

/// Run a config subcommand.
pub fn run(command: ConfigCommand, quiet: bool) -> Result<Outcome> {
    match command {
        ConfigCommand::Init(args) => init(args, quiet),
    }
}

fn init(args: ConfigInitArgs, quiet: bool) -> Result<Outcome> {
    let path = Config::default_path(args.global)?;
    Config::write_starter(&path)?;
    tracing::info!(path = %path.display(), "wrote starter config");
    if !quiet {
        println!("Created config file at {}", path.display());
    }
    Ok(Outcome::Success)
}
