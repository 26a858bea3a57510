//! Attendee domain model.
//!
//! # Invariants
//! - Two attendees with the same `user_id` are the same person.
//! - `profile_url` and `joined_date` are `None` when the export cell was
//!   blank or could not be parsed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

/// One person appearing in an attendance export.
///
/// Built once through the consuming `with_*` helpers and read-only after.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attendee {
    preferred_name: String,
    legal_name: String,
    user_id: String,
    profile_url: Option<Url>,
    is_host: bool,
    joined_date: Option<DateTime<Utc>>,
}

impl Attendee {
    /// Creates an attendee with identity and names; other fields start empty.
    pub fn new(
        user_id: impl Into<String>,
        preferred_name: impl Into<String>,
        legal_name: impl Into<String>,
    ) -> Self {
        Self {
            preferred_name: preferred_name.into(),
            legal_name: legal_name.into(),
            user_id: user_id.into(),
            profile_url: None,
            is_host: false,
            joined_date: None,
        }
    }

    pub fn with_profile_url(mut self, profile_url: Option<Url>) -> Self {
        self.profile_url = profile_url;
        self
    }

    pub fn with_host(mut self, is_host: bool) -> Self {
        self.is_host = is_host;
        self
    }

    pub fn with_joined_date(mut self, joined_date: Option<DateTime<Utc>>) -> Self {
        self.joined_date = joined_date;
        self
    }

    pub fn preferred_name(&self) -> &str {
        &self.preferred_name
    }

    pub fn legal_name(&self) -> &str {
        &self.legal_name
    }

    /// Stable external identity from the export.
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn profile_url(&self) -> Option<&Url> {
        self.profile_url.as_ref()
    }

    pub fn is_host(&self) -> bool {
        self.is_host
    }

    pub fn joined_date(&self) -> Option<DateTime<Utc>> {
        self.joined_date
    }
}
