//! Core import pipeline for event attendance exports.
//! Parses tab-separated attendee exports and upserts attendees and events
//! into a SQLite store.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod reader;
pub mod service;
pub mod store;

pub use config::{ImportConfig, LoggingConfig, RowErrorPolicy};
pub use logging::{default_log_level, init_logging, Diagnostics, LogFacade, LoggingGuard};
pub use model::attendance::Attendance;
pub use model::attendee::Attendee;
pub use model::event::{Event, EventId};
pub use reader::layout::{ColumnLayout, ColumnSpec, Field};
pub use reader::quoting::{QuoteError, QuoteErrorKind};
pub use reader::{
    parse_attendance_file, parse_attendance_reader, parse_event_time, FieldErrorKind, ParsedFile,
    ReadError, RowFieldError, StructuralError,
};
pub use service::import_service::{ImportError, ImportReport, ImportRequest, ImportService};
pub use service::upsert::{upsert_attendee, upsert_event, UpsertError, UpsertOutcome};
pub use store::{
    AttendanceStore, AttendeeStore, Entity, EventStore, SqliteStore, StoreError, StoreResult,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
