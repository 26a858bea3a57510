//! Event domain model and identity token.
//!
//! # Invariants
//! - Event ids are caller-minted UUID v4 strings; storage never assigns them.
//! - An empty id marks an event that has not been stored yet.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Identity token of a stored event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(String);

impl EventId {
    /// Mints a fresh random identity token.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for EventId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for EventId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for EventId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// A dated gathering that attendees RSVP to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    name: String,
    id: EventId,
    time: DateTime<Utc>,
}

impl Event {
    /// Creates an event that has not been stored yet (empty id).
    pub fn unsaved(name: impl Into<String>, time: DateTime<Utc>) -> Self {
        Self::with_id(EventId::default(), name, time)
    }

    /// Creates an event with a known identity.
    pub fn with_id(id: impl Into<EventId>, name: impl Into<String>, time: DateTime<Utc>) -> Self {
        Self {
            name: name.into(),
            id: id.into(),
            time,
        }
    }

    /// Returns a copy of this event carrying `id`.
    pub fn with_assigned_id(&self, id: EventId) -> Self {
        Self {
            name: self.name.clone(),
            id,
            time: self.time,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn id(&self) -> &EventId {
        &self.id
    }

    pub fn time(&self) -> DateTime<Utc> {
        self.time
    }

    /// Returns whether the event still needs an insert.
    pub fn is_unsaved(&self) -> bool {
        self.id.is_empty()
    }
}
