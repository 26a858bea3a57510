//! Command implementations over an open store.

use anyhow::{Context, Result};
use attendance_core::{
    parse_event_time, AttendeeStore, EventStore, ImportConfig, ImportError, ImportRequest,
    ImportService, LogFacade, SqliteStore,
};

use crate::ImportArgs;

const JOINED_DATE_DISPLAY_FORMAT: &str = "%Y-%m-%d";
const EVENT_TIME_DISPLAY_FORMAT: &str = "%Y-%m-%d %I:%M %p UTC";

/// Reads the export in `args` and upserts its event and attendees.
pub fn import(store: &SqliteStore, args: &ImportArgs) -> Result<()> {
    let event_time = parse_event_time(&args.event_time)
        .with_context(|| format!("unable to parse event time {:?}", args.event_time))?;

    let config = ImportConfig {
        on_row_error: args.on_row_error,
        ..ImportConfig::default()
    };
    let service = ImportService::new(store, config, &LogFacade);
    let request = ImportRequest {
        event_name: args.event_name.clone(),
        event_time,
        source: args.file.clone(),
    };

    let report = match service.import_file(&request) {
        Ok(report) => report,
        Err(ImportError::RowErrors(errors)) => {
            for err in &errors {
                eprintln!("{err}");
            }
            anyhow::bail!(
                "error reading from file: {} row error(s); rerun with --on-row-error skip-row to import the remaining rows",
                errors.len()
            );
        }
        Err(err) => return Err(err).context("error importing attendance"),
    };

    for err in &report.skipped_rows {
        eprintln!("skipped: {err}");
    }
    println!("event {} ({})", report.event.name(), report.event.id());
    println!("processed {} attendees", report.processed());
    Ok(())
}

pub fn list_attendees(store: &SqliteStore) -> Result<()> {
    let attendees = store
        .list_attendees()
        .context("error getting attendees from storage")?;

    println!("Preferred Name\tLegal Name\tJoined Date\tHost?");
    for attendee in &attendees {
        let joined = attendee
            .joined_date()
            .map(|date| date.format(JOINED_DATE_DISPLAY_FORMAT).to_string())
            .unwrap_or_default();
        let host = if attendee.is_host() { "Host" } else { "" };
        println!(
            "{}\t{}\t{}\t{}",
            attendee.preferred_name(),
            attendee.legal_name(),
            joined,
            host
        );
    }
    Ok(())
}

pub fn list_events(store: &SqliteStore) -> Result<()> {
    let events = store
        .list_events()
        .context("error getting events from storage")?;

    println!("Event\tTime\tID");
    for event in &events {
        println!(
            "{}\t{}\t{}",
            event.name(),
            event.time().format(EVENT_TIME_DISPLAY_FORMAT),
            event.id()
        );
    }
    Ok(())
}

/// Writes every stored event to stdout as pretty JSON.
pub fn export(store: &SqliteStore) -> Result<()> {
    let events = store
        .list_events()
        .context("error fetching events from storage")?;
    let json = serde_json::to_string_pretty(&events).context("error encoding events")?;
    println!("{json}");
    Ok(())
}
