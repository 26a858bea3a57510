//! Connection bootstrap utilities for SQLite.
//!
//! # Responsibility
//! - Open file or in-memory SQLite connections.
//! - Configure connection settings required by the store.
//!
//! # Invariants
//! - Returned connections carry a 5 second busy timeout.

use super::DbResult;
use crate::logging::Diagnostics;
use rusqlite::Connection;
use std::path::Path;
use std::time::{Duration, Instant};

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Opens (or creates) a SQLite database file.
///
/// # Side effects
/// - Emits `db_open` diagnostics with duration and status.
pub fn open_db(path: impl AsRef<Path>, diagnostics: &dyn Diagnostics) -> DbResult<Connection> {
    open_with(|| Connection::open(path), "file", diagnostics)
}

/// Opens a private in-memory SQLite database.
pub fn open_db_in_memory(diagnostics: &dyn Diagnostics) -> DbResult<Connection> {
    open_with(Connection::open_in_memory, "memory", diagnostics)
}

fn open_with<F>(open: F, mode: &str, diagnostics: &dyn Diagnostics) -> DbResult<Connection>
where
    F: FnOnce() -> rusqlite::Result<Connection>,
{
    let started_at = Instant::now();
    diagnostics.info(&format!("event=db_open module=db status=start mode={mode}"));

    let conn = match open() {
        Ok(conn) => conn,
        Err(err) => {
            diagnostics.error(&format!(
                "event=db_open module=db status=error mode={mode} duration_ms={} error_code=db_open_failed error={err}",
                started_at.elapsed().as_millis()
            ));
            return Err(err.into());
        }
    };

    match conn.busy_timeout(BUSY_TIMEOUT) {
        Ok(()) => {
            diagnostics.info(&format!(
                "event=db_open module=db status=ok mode={mode} duration_ms={}",
                started_at.elapsed().as_millis()
            ));
            Ok(conn)
        }
        Err(err) => {
            diagnostics.error(&format!(
                "event=db_open module=db status=error mode={mode} duration_ms={} error_code=db_bootstrap_failed error={err}",
                started_at.elapsed().as_millis()
            ));
            Err(err.into())
        }
    }
}
