//! Storage port for attendees and events.
//!
//! # Responsibility
//! - Define the persistence contracts the upsert protocol depends on.
//! - Report identity conflicts and missing rows as distinct errors.
//!
//! # Invariants
//! - `insert_*` fails with `IdentityConflict` when the identity key exists.
//! - `update_*`, `fetch_*` and `delete_*` fail with `NotFound` when no row
//!   matches; they never return a zero-valued success.
//! - `ensure_*_schema` is idempotent.

pub mod sqlite;

use crate::db::DbError;
use crate::model::attendee::Attendee;
use crate::model::event::{Event, EventId};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub use sqlite::SqliteStore;

pub type StoreResult<T> = Result<T, StoreError>;

/// Kind of stored record, used in error context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    Attendee,
    Event,
}

impl Display for Entity {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Attendee => f.write_str("attendee"),
            Self::Event => f.write_str("event"),
        }
    }
}

#[derive(Debug)]
pub enum StoreError {
    Db(DbError),
    Schema { table: &'static str, source: DbError },
    IdentityConflict { entity: Entity, key: String },
    NotFound { entity: Entity, key: String },
    InvalidData(String),
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    pub fn is_identity_conflict(&self) -> bool {
        matches!(self, Self::IdentityConflict { .. })
    }
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Schema { table, .. } => write!(f, "error creating {table} table"),
            Self::IdentityConflict { entity, key } => {
                write!(f, "{entity} with identity {key:?} already exists")
            }
            Self::NotFound { entity, key } => {
                write!(f, "no {entity} exists with identity {key:?}")
            }
            Self::InvalidData(message) => write!(f, "invalid stored data: {message}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Schema { source, .. } => Some(source),
            Self::IdentityConflict { .. } | Self::NotFound { .. } | Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Persistence contract for attendees, keyed by `user_id`.
pub trait AttendeeStore {
    fn ensure_attendee_schema(&self) -> StoreResult<()>;
    fn insert_attendee(&self, attendee: &Attendee) -> StoreResult<()>;
    fn update_attendee(&self, attendee: &Attendee) -> StoreResult<()>;
    fn fetch_attendee(&self, user_id: &str) -> StoreResult<Attendee>;
    /// All attendees; ordering is not guaranteed.
    fn list_attendees(&self) -> StoreResult<Vec<Attendee>>;
    fn count_attendees(&self) -> StoreResult<u64>;
    fn delete_attendee(&self, user_id: &str) -> StoreResult<()>;
}

/// Persistence contract for events, keyed by `id`.
pub trait EventStore {
    fn ensure_event_schema(&self) -> StoreResult<()>;
    /// Rejects events whose id is still empty.
    fn insert_event(&self, event: &Event) -> StoreResult<()>;
    fn update_event(&self, event: &Event) -> StoreResult<()>;
    fn fetch_event(&self, id: &EventId) -> StoreResult<Event>;
    /// All events; ordering is not guaranteed.
    fn list_events(&self) -> StoreResult<Vec<Event>>;
    fn count_events(&self) -> StoreResult<u64>;
    fn delete_event(&self, id: &EventId) -> StoreResult<()>;
}

/// Everything an import needs from one backend.
pub trait AttendanceStore: AttendeeStore + EventStore {}

impl<T: AttendeeStore + EventStore + ?Sized> AttendanceStore for T {}
