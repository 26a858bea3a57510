//! `attendance` command-line entry point.
//!
//! # Responsibility
//! - Parse arguments, start logging, open the store and dispatch commands.
//! - Map any unrecoverable error to a non-zero exit status.

mod commands;

use anyhow::{Context, Result};
use attendance_core::{init_logging, LogFacade, LoggingConfig, RowErrorPolicy, SqliteStore};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

const DEFAULT_CLI_LOG_LEVEL: &str = "warn";

/// Event attendance import and listing.
#[derive(Debug, Parser)]
#[command(name = "attendance")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// SQLite database file.
    #[arg(long, env = "ATTENDANCE_DB", default_value = "attendance.sqlite3", global = true)]
    db: PathBuf,

    /// Log level (trace|debug|info|warn|error).
    #[arg(long, default_value = DEFAULT_CLI_LOG_LEVEL, global = true)]
    log_level: String,

    /// Absolute directory for rolling log files; logs go to stderr otherwise.
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    fn logging_config(&self) -> LoggingConfig {
        LoggingConfig {
            level: self.log_level.clone(),
            log_dir: self.log_dir.clone(),
        }
    }
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Import attendance information from a tab-separated export.
    Import(ImportArgs),
    /// List information from storage.
    #[command(subcommand)]
    List(ListCommand),
    /// Dump all stored events as JSON.
    Export,
}

#[derive(Debug, Subcommand)]
enum ListCommand {
    /// Show stored attendees.
    Attendees,
    /// Show stored events.
    Events,
}

#[derive(Debug, Args)]
struct ImportArgs {
    /// Name of the event.
    #[arg(long)]
    event_name: String,

    /// Event time, RFC 3339 or `May 4, 2021 6:30 PM` (UTC).
    #[arg(long)]
    event_time: String,

    /// Export file to read.
    #[arg(long)]
    file: PathBuf,

    /// What to do with rows that fail to parse (abort-batch|skip-row).
    #[arg(long, default_value = "abort-batch")]
    on_row_error: RowErrorPolicy,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let _logging = match init_logging(&cli.logging_config()) {
        Ok(guard) => Some(guard),
        Err(err) => {
            eprintln!("warning: logging disabled: {err}");
            None
        }
    };

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("event=command module=cli status=error error={err:#}");
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let store = SqliteStore::open(&cli.db, Arc::new(LogFacade))
        .with_context(|| format!("error opening DB file {:?}", cli.db.display().to_string()))?;

    match &cli.command {
        Commands::Import(args) => commands::import(&store, args)?,
        Commands::List(ListCommand::Attendees) => commands::list_attendees(&store)?,
        Commands::List(ListCommand::Events) => commands::list_events(&store)?,
        Commands::Export => commands::export(&store)?,
    }

    store.close().context("error closing DB file")
}
