//! SQLite implementation of the attendee and event stores.
//!
//! # Invariants
//! - Both tables exist once a `SqliteStore` has been constructed.
//! - Timestamps are stored as `YYYY-MM-DDThh:mm:ssZ` (UTC, seconds).
//! - Read paths reject malformed persisted values instead of masking them.

use super::{AttendeeStore, Entity, EventStore, StoreError, StoreResult};
use crate::db::schema::{
    ATTENDEES_TABLE, CREATE_ATTENDEES_TABLE, CREATE_EVENTS_TABLE, EVENTS_TABLE,
};
use crate::db::{open_db, open_db_in_memory, DbError};
use crate::logging::Diagnostics;
use crate::model::attendee::Attendee;
use crate::model::event::{Event, EventId};
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use rusqlite::{ffi, params, Connection, Row};
use std::path::Path;
use std::sync::Arc;
use url::Url;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

const ATTENDEE_SELECT_SQL: &str = "SELECT
    preferred_name,
    legal_name,
    user_id,
    profile_url,
    is_host,
    joined_date
FROM attendees";

const EVENT_SELECT_SQL: &str = "SELECT id, name, time FROM events";

/// SQLite-backed store owning its connection.
///
/// Dropping the store releases the connection; `close` does the same but
/// reports failures.
pub struct SqliteStore {
    conn: Connection,
    diagnostics: Arc<dyn Diagnostics>,
}

impl SqliteStore {
    /// Opens the database file at `path` and creates missing tables.
    pub fn open(path: impl AsRef<Path>, diagnostics: Arc<dyn Diagnostics>) -> StoreResult<Self> {
        let conn = open_db(path, diagnostics.as_ref())?;
        Self::from_connection(conn, diagnostics)
    }

    /// Opens a private in-memory database and creates the tables.
    pub fn open_in_memory(diagnostics: Arc<dyn Diagnostics>) -> StoreResult<Self> {
        let conn = open_db_in_memory(diagnostics.as_ref())?;
        Self::from_connection(conn, diagnostics)
    }

    /// Wraps an open connection and creates missing tables.
    pub fn from_connection(conn: Connection, diagnostics: Arc<dyn Diagnostics>) -> StoreResult<Self> {
        let store = Self { conn, diagnostics };
        store.ensure_attendee_schema()?;
        store.ensure_event_schema()?;
        Ok(store)
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Closes the connection, surfacing any error from SQLite.
    pub fn close(self) -> StoreResult<()> {
        let diagnostics = self.diagnostics;
        match self.conn.close() {
            Ok(()) => {
                diagnostics.debug("event=db_close module=store status=ok");
                Ok(())
            }
            Err((_conn, err)) => {
                diagnostics.error(&format!(
                    "event=db_close module=store status=error error={err}"
                ));
                Err(err.into())
            }
        }
    }

    fn ensure_table(&self, table: &'static str, ddl: &str) -> StoreResult<()> {
        self.conn.execute_batch(ddl).map_err(|err| {
            self.diagnostics.error(&format!(
                "event=schema_ensure module=store status=error table={table} error={err}"
            ));
            StoreError::Schema {
                table,
                source: DbError::Sqlite(err),
            }
        })?;
        self.diagnostics.debug(&format!(
            "event=schema_ensure module=store status=ok table={table}"
        ));
        Ok(())
    }

    fn count_rows(&self, sql: &str) -> StoreResult<u64> {
        let count: i64 = self.conn.query_row(sql, [], |row| row.get(0))?;
        u64::try_from(count)
            .map_err(|_| StoreError::InvalidData(format!("negative row count `{count}`")))
    }
}

impl AttendeeStore for SqliteStore {
    fn ensure_attendee_schema(&self) -> StoreResult<()> {
        self.ensure_table(ATTENDEES_TABLE, CREATE_ATTENDEES_TABLE)
    }

    fn insert_attendee(&self, attendee: &Attendee) -> StoreResult<()> {
        self.conn
            .execute(
                "INSERT INTO attendees (
                    preferred_name,
                    legal_name,
                    user_id,
                    profile_url,
                    is_host,
                    joined_date
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
                params![
                    attendee.preferred_name(),
                    attendee.legal_name(),
                    attendee.user_id(),
                    attendee.profile_url().map(Url::as_str),
                    bool_to_int(attendee.is_host()),
                    attendee.joined_date().map(format_timestamp),
                ],
            )
            .map_err(|err| conflict_or_db(err, Entity::Attendee, attendee.user_id()))?;
        Ok(())
    }

    fn update_attendee(&self, attendee: &Attendee) -> StoreResult<()> {
        let changed = self.conn.execute(
            "UPDATE attendees
             SET
                preferred_name = ?1,
                legal_name = ?2,
                profile_url = ?3,
                is_host = ?4,
                joined_date = ?5
             WHERE user_id = ?6;",
            params![
                attendee.preferred_name(),
                attendee.legal_name(),
                attendee.profile_url().map(Url::as_str),
                bool_to_int(attendee.is_host()),
                attendee.joined_date().map(format_timestamp),
                attendee.user_id(),
            ],
        )?;

        if changed == 0 {
            return Err(not_found(Entity::Attendee, attendee.user_id()));
        }
        Ok(())
    }

    fn fetch_attendee(&self, user_id: &str) -> StoreResult<Attendee> {
        let mut stmt = self
            .conn
            .prepare(&format!("{ATTENDEE_SELECT_SQL} WHERE user_id = ?1;"))?;
        let mut rows = stmt.query([user_id])?;
        if let Some(row) = rows.next()? {
            return parse_attendee_row(row);
        }
        Err(not_found(Entity::Attendee, user_id))
    }

    fn list_attendees(&self) -> StoreResult<Vec<Attendee>> {
        let mut stmt = self.conn.prepare(&format!("{ATTENDEE_SELECT_SQL};"))?;
        let mut rows = stmt.query([])?;
        let mut attendees = Vec::new();
        while let Some(row) = rows.next()? {
            attendees.push(parse_attendee_row(row)?);
        }
        Ok(attendees)
    }

    fn count_attendees(&self) -> StoreResult<u64> {
        self.count_rows("SELECT COUNT(*) FROM attendees;")
    }

    fn delete_attendee(&self, user_id: &str) -> StoreResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM attendees WHERE user_id = ?1;", [user_id])?;
        if changed == 0 {
            return Err(not_found(Entity::Attendee, user_id));
        }
        Ok(())
    }
}

impl EventStore for SqliteStore {
    fn ensure_event_schema(&self) -> StoreResult<()> {
        self.ensure_table(EVENTS_TABLE, CREATE_EVENTS_TABLE)
    }

    fn insert_event(&self, event: &Event) -> StoreResult<()> {
        if event.is_unsaved() {
            return Err(StoreError::InvalidData(
                "cannot insert an event without an id".to_string(),
            ));
        }

        self.conn
            .execute(
                "INSERT INTO events (id, name, time) VALUES (?1, ?2, ?3);",
                params![
                    event.id().as_str(),
                    event.name(),
                    format_timestamp(event.time()),
                ],
            )
            .map_err(|err| conflict_or_db(err, Entity::Event, event.id().as_str()))?;
        Ok(())
    }

    fn update_event(&self, event: &Event) -> StoreResult<()> {
        let changed = self.conn.execute(
            "UPDATE events SET name = ?1, time = ?2 WHERE id = ?3;",
            params![
                event.name(),
                format_timestamp(event.time()),
                event.id().as_str(),
            ],
        )?;

        if changed == 0 {
            return Err(not_found(Entity::Event, event.id().as_str()));
        }
        Ok(())
    }

    fn fetch_event(&self, id: &EventId) -> StoreResult<Event> {
        let mut stmt = self
            .conn
            .prepare(&format!("{EVENT_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id.as_str()])?;
        if let Some(row) = rows.next()? {
            return parse_event_row(row);
        }
        Err(not_found(Entity::Event, id.as_str()))
    }

    fn list_events(&self) -> StoreResult<Vec<Event>> {
        let mut stmt = self.conn.prepare(&format!("{EVENT_SELECT_SQL};"))?;
        let mut rows = stmt.query([])?;
        let mut events = Vec::new();
        while let Some(row) = rows.next()? {
            events.push(parse_event_row(row)?);
        }
        Ok(events)
    }

    fn count_events(&self) -> StoreResult<u64> {
        self.count_rows("SELECT COUNT(*) FROM events;")
    }

    fn delete_event(&self, id: &EventId) -> StoreResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM events WHERE id = ?1;", [id.as_str()])?;
        if changed == 0 {
            return Err(not_found(Entity::Event, id.as_str()));
        }
        Ok(())
    }
}

fn parse_attendee_row(row: &Row<'_>) -> StoreResult<Attendee> {
    let profile_url = match row.get::<_, Option<String>>("profile_url")? {
        Some(text) => Some(Url::parse(&text).map_err(|_| {
            StoreError::InvalidData(format!("invalid url `{text}` in attendees.profile_url"))
        })?),
        None => None,
    };

    let is_host = match row.get::<_, i64>("is_host")? {
        0 => false,
        1 => true,
        other => {
            return Err(StoreError::InvalidData(format!(
                "invalid is_host value `{other}` in attendees.is_host"
            )));
        }
    };

    let joined_date = match row.get::<_, Option<String>>("joined_date")? {
        Some(text) => Some(parse_timestamp(&text, "attendees.joined_date")?),
        None => None,
    };

    let attendee = Attendee::new(
        row.get::<_, String>("user_id")?,
        row.get::<_, String>("preferred_name")?,
        row.get::<_, String>("legal_name")?,
    )
    .with_profile_url(profile_url)
    .with_host(is_host)
    .with_joined_date(joined_date);
    Ok(attendee)
}

fn parse_event_row(row: &Row<'_>) -> StoreResult<Event> {
    let time_text: String = row.get("time")?;
    let time = parse_timestamp(&time_text, "events.time")?;
    Ok(Event::with_id(
        row.get::<_, String>("id")?,
        row.get::<_, String>("name")?,
        time,
    ))
}

fn format_timestamp(value: DateTime<Utc>) -> String {
    value.format(TIMESTAMP_FORMAT).to_string()
}

fn parse_timestamp(text: &str, column: &str) -> StoreResult<DateTime<Utc>> {
    let naive = NaiveDateTime::parse_from_str(text, TIMESTAMP_FORMAT).map_err(|_| {
        StoreError::InvalidData(format!("invalid timestamp `{text}` in {column}"))
    })?;
    Ok(Utc.from_utc_datetime(&naive))
}

fn conflict_or_db(err: rusqlite::Error, entity: Entity, key: &str) -> StoreError {
    if is_unique_violation(&err) {
        return StoreError::IdentityConflict {
            entity,
            key: key.to_string(),
        };
    }
    err.into()
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(failure, _)
            if failure.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE
                || failure.extended_code == ffi::SQLITE_CONSTRAINT_PRIMARYKEY
    )
}

fn not_found(entity: Entity, key: &str) -> StoreError {
    StoreError::NotFound {
        entity,
        key: key.to_string(),
    }
}

fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}
