//! Attendance: the transient unit produced by the tabular reader.

use crate::model::attendee::Attendee;
use crate::model::event::Event;
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Associates one attendee with one event plus RSVP metadata.
///
/// Not persisted on its own; import extracts the attendee for storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attendance {
    attendee: Attendee,
    event: Arc<Event>,
    rsvp: bool,
    rsvp_time: Option<DateTime<Utc>>,
}

impl Attendance {
    pub fn new(
        attendee: Attendee,
        event: Arc<Event>,
        rsvp: bool,
        rsvp_time: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            attendee,
            event,
            rsvp,
            rsvp_time,
        }
    }

    pub fn attendee(&self) -> &Attendee {
        &self.attendee
    }

    pub fn event(&self) -> &Event {
        &self.event
    }

    pub fn rsvp(&self) -> bool {
        self.rsvp
    }

    /// `None` when the export cell was blank or unparseable.
    pub fn rsvp_time(&self) -> Option<DateTime<Utc>> {
        self.rsvp_time
    }
}
