//! Create-or-update protocol over the storage port.
//!
//! # Invariants
//! - Attendees: insert first; only an identity conflict falls back to update.
//! - Events with an empty id get a freshly minted id, are inserted, then
//!   updated. Events with an id are only ever updated.
//! - Failures are wrapped as upsert failures; the failing sub-step is only
//!   visible through `source()`.

use crate::logging::Diagnostics;
use crate::model::attendee::Attendee;
use crate::model::event::{Event, EventId};
use crate::store::{AttendeeStore, Entity, EventStore, StoreError};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Which branch an attendee upsert took.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    Updated,
}

#[derive(Debug)]
pub struct UpsertError {
    entity: Entity,
    key: String,
    source: StoreError,
}

impl UpsertError {
    fn new(entity: Entity, key: impl Into<String>, source: StoreError) -> Self {
        Self {
            entity,
            key: key.into(),
            source,
        }
    }

    pub fn entity(&self) -> Entity {
        self.entity
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Underlying store failure of whichever sub-step failed.
    pub fn store_error(&self) -> &StoreError {
        &self.source
    }
}

impl Display for UpsertError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "error upserting {} {:?}", self.entity, self.key)
    }
}

impl Error for UpsertError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&self.source)
    }
}

/// Inserts `attendee`, or updates the stored row with the same `user_id`.
pub fn upsert_attendee<S>(
    store: &S,
    attendee: &Attendee,
    diagnostics: &dyn Diagnostics,
) -> Result<UpsertOutcome, UpsertError>
where
    S: AttendeeStore + ?Sized,
{
    match store.insert_attendee(attendee) {
        Ok(()) => {
            diagnostics.debug("event=upsert module=upsert status=ok entity=attendee action=insert");
            Ok(UpsertOutcome::Inserted)
        }
        Err(StoreError::IdentityConflict { .. }) => {
            store
                .update_attendee(attendee)
                .map_err(|err| UpsertError::new(Entity::Attendee, attendee.user_id(), err))?;
            diagnostics.debug("event=upsert module=upsert status=ok entity=attendee action=update");
            Ok(UpsertOutcome::Updated)
        }
        Err(err) => Err(UpsertError::new(Entity::Attendee, attendee.user_id(), err)),
    }
}

/// Stores `event` and returns it carrying the identity it was stored under.
///
/// An unsaved event (empty id) is inserted under a newly minted id before
/// the authoritative update. An event that already has an id is updated
/// only; a missing row surfaces as a wrapped `NotFound`.
pub fn upsert_event<S>(
    store: &S,
    event: &Event,
    diagnostics: &dyn Diagnostics,
) -> Result<Event, UpsertError>
where
    S: EventStore + ?Sized,
{
    let stored = if event.is_unsaved() {
        let assigned = event.with_assigned_id(EventId::generate());
        store
            .insert_event(&assigned)
            .map_err(|err| UpsertError::new(Entity::Event, assigned.id().as_str(), err))?;
        diagnostics.debug(&format!(
            "event=upsert module=upsert status=ok entity=event action=insert id={}",
            assigned.id()
        ));
        assigned
    } else {
        event.clone()
    };

    store
        .update_event(&stored)
        .map_err(|err| UpsertError::new(Entity::Event, stored.id().as_str(), err))?;
    diagnostics.debug(&format!(
        "event=upsert module=upsert status=ok entity=event action=update id={}",
        stored.id()
    ));
    Ok(stored)
}
