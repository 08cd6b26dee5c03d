use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use std::fs::OpenOptions;
use std::io;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Mutex;

use rusty_tidy::cli::{Cli, Command};
use rusty_tidy::commands::{self, Outcome, Session};
use rusty_tidy::config::Config;
use rusty_tidy::{signals, CancelToken, SweepError};

const EXIT_CANCELLED: u8 = 130;

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(outcome) => ExitCode::from(outcome.exit_code() as u8),
        Err(err) if is_cancelled(&err) => {
            eprintln!("\nOperation cancelled.");
            ExitCode::from(EXIT_CANCELLED)
        }
        Err(err) => {
            eprintln!("Error: {:#}", err);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<Outcome> {
    let Cli { global, command } = cli;

    // Load configuration
    let config = Config::load(global.config.as_deref())?;

    let log_file = global
        .log_file
        .clone()
        .or_else(|| config.output.log_file.clone());
    init_logging(global.verbose, global.quiet, log_file.as_deref())?;

    tracing::debug!(?config, "Loaded configuration");

    let cancel = CancelToken::new();
    if let Err(e) = signals::install_cancel_handlers(&cancel) {
        tracing::warn!("cannot install signal handlers: {}", e);
    }
    let session = Session::new(config, &global, cancel)?;

    // Dispatch to subcommand
    match command {
        Command::Empty(args) => {
            tracing::info!(?args, "Starting empty");
            commands::empty::run(args, &session)
        }
        Command::Find(args) => {
            tracing::info!(?args, "Starting find");
            commands::find::run(args, &session)
        }
        Command::Large(args) => {
            tracing::info!(?args, "Starting large");
            commands::large::run(args, &session)
        }
        Command::Config(cmd) => commands::config::run(cmd, session.quiet),
        Command::Completions(args) => {
            clap_complete::generate(args.shell, &mut Cli::command(), "rusty-tidy", &mut io::stdout());
            Ok(Outcome::Success)
        }
    }
}

fn is_cancelled(err: &anyhow::Error) -> bool {
    err.downcast_ref::<SweepError>()
        .is_some_and(SweepError::is_cancelled)
}

fn init_logging(verbosity: u8, quiet: bool, log_file: Option<&Path>) -> Result<()> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let level = if quiet {
        "error"
    } else {
        match verbosity {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("rusty_tidy={}", level)));

    let file_layer = match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("cannot open log file {}", path.display()))?;
            Some(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(io::stderr))
        .with(file_layer)
        .with(filter)
        .init();
    Ok(())
}
