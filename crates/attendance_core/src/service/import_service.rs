//! Import use-case service.
//!
//! # Responsibility
//! - Run one file import end to end: schema, parse, row policy, upserts.
//! - Expose read-side listing for callers that share the same store.
//!
//! # Invariants
//! - Nothing is written when the file fails to read, or when row errors
//!   exist under `RowErrorPolicy::AbortBatch`.
//! - Upserts run sequentially in file order; a failure stops the import and
//!   leaves earlier upserts committed.

use crate::config::{ImportConfig, RowErrorPolicy};
use crate::logging::Diagnostics;
use crate::model::attendee::Attendee;
use crate::model::event::Event;
use crate::reader::{parse_attendance_file, ReadError, RowFieldError};
use crate::service::upsert::{upsert_attendee, upsert_event, UpsertError, UpsertOutcome};
use crate::store::{AttendanceStore, StoreError, StoreResult};
use chrono::{DateTime, Utc};
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::sync::Arc;

/// One import invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportRequest {
    pub event_name: String,
    pub event_time: DateTime<Utc>,
    /// Tab-separated export to read.
    pub source: PathBuf,
}

/// Result of a successful import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportReport {
    /// The event as stored, carrying its identity.
    pub event: Event,
    pub inserted: usize,
    pub updated: usize,
    /// Row errors of rows left out under `RowErrorPolicy::SkipRow`.
    pub skipped_rows: Vec<RowFieldError>,
}

impl ImportReport {
    /// Number of attendees written.
    pub fn processed(&self) -> usize {
        self.inserted + self.updated
    }
}

#[derive(Debug)]
pub enum ImportError {
    Store(StoreError),
    Read(ReadError),
    /// Row errors found while the policy is `AbortBatch`.
    RowErrors(Vec<RowFieldError>),
    Upsert(UpsertError),
}

impl Display for ImportError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Store(err) => write!(f, "error preparing storage: {err}"),
            Self::Read(err) => write!(f, "{err}"),
            Self::RowErrors(errors) => match errors.first() {
                Some(first) => write!(
                    f,
                    "error reading from file: {} row error(s), first: {first}",
                    errors.len()
                ),
                None => write!(f, "error reading from file"),
            },
            Self::Upsert(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ImportError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Store(err) => Some(err),
            Self::Read(err) => Some(err),
            Self::RowErrors(errors) => errors.first().map(|err| err as &(dyn Error + 'static)),
            Self::Upsert(err) => Some(err),
        }
    }
}

impl From<StoreError> for ImportError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

impl From<ReadError> for ImportError {
    fn from(value: ReadError) -> Self {
        Self::Read(value)
    }
}

impl From<UpsertError> for ImportError {
    fn from(value: UpsertError) -> Self {
        Self::Upsert(value)
    }
}

/// Use-case service wrapping one store for import and listing.
pub struct ImportService<'a, S: AttendanceStore + ?Sized> {
    store: &'a S,
    config: ImportConfig,
    diagnostics: &'a dyn Diagnostics,
}

impl<'a, S: AttendanceStore + ?Sized> ImportService<'a, S> {
    pub fn new(store: &'a S, config: ImportConfig, diagnostics: &'a dyn Diagnostics) -> Self {
        Self {
            store,
            config,
            diagnostics,
        }
    }

    pub fn config(&self) -> &ImportConfig {
        &self.config
    }

    /// Imports the export described by `request`.
    ///
    /// # Errors
    /// - `ImportError::Store` when tables cannot be created.
    /// - `ImportError::Read` on file-level read failures.
    /// - `ImportError::RowErrors` when rows fail under `AbortBatch`.
    /// - `ImportError::Upsert` when the event or an attendee cannot be
    ///   stored; attendees stored before the failure stay stored.
    pub fn import_file(&self, request: &ImportRequest) -> Result<ImportReport, ImportError> {
        self.store.ensure_event_schema()?;
        self.store.ensure_attendee_schema()?;

        let event = Arc::new(Event::unsaved(
            request.event_name.as_str(),
            request.event_time,
        ));
        let parsed = parse_attendance_file(
            &request.source,
            &event,
            &self.config.layout,
            self.diagnostics,
        )?;

        let skip_rows: BTreeSet<usize> = match self.config.on_row_error {
            RowErrorPolicy::AbortBatch if parsed.has_row_errors() => {
                self.diagnostics.error(&format!(
                    "event=import module=service status=error error_code=row_errors policy={} row_errors={}",
                    self.config.on_row_error,
                    parsed.row_errors.len()
                ));
                return Err(ImportError::RowErrors(parsed.row_errors));
            }
            RowErrorPolicy::AbortBatch => BTreeSet::new(),
            RowErrorPolicy::SkipRow => parsed.rows_with_errors(),
        };

        let stored_event = upsert_event(self.store, &event, self.diagnostics)?;

        let mut inserted = 0;
        let mut updated = 0;
        for (row, attendance) in parsed.attendances.iter().enumerate() {
            if skip_rows.contains(&row) {
                continue;
            }
            match upsert_attendee(self.store, attendance.attendee(), self.diagnostics) {
                Ok(UpsertOutcome::Inserted) => inserted += 1,
                Ok(UpsertOutcome::Updated) => updated += 1,
                Err(err) => {
                    self.diagnostics.error(&format!(
                        "event=import module=service status=error error_code=upsert_failed row={row} user_id={:?} error={}",
                        attendance.attendee().user_id(),
                        err.store_error()
                    ));
                    return Err(err.into());
                }
            }
        }

        self.diagnostics.info(&format!(
            "event=import module=service status=ok event_id={} inserted={inserted} updated={updated} skipped_rows={}",
            stored_event.id(),
            skip_rows.len()
        ));

        Ok(ImportReport {
            event: stored_event,
            inserted,
            updated,
            skipped_rows: if skip_rows.is_empty() {
                Vec::new()
            } else {
                parsed.row_errors
            },
        })
    }

    /// All stored attendees; ordering is not guaranteed.
    pub fn list_attendees(&self) -> StoreResult<Vec<Attendee>> {
        self.store.list_attendees()
    }

    /// All stored events; ordering is not guaranteed.
    pub fn list_events(&self) -> StoreResult<Vec<Event>> {
        self.store.list_events()
    }
}
