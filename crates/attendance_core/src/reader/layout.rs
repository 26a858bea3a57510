//! Declarative column layouts for attendance exports.
//!
//! A layout maps cell positions to attendee/RSVP fields. Each field kind
//! has one parsing rule in `reader::fields`; another export format is
//! another layout table.

use serde::{Deserialize, Serialize};

/// Attribute a cell is parsed into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    PreferredName,
    UserId,
    IsHost,
    Rsvp,
    RsvpTime,
    JoinedDate,
    ProfileUrl,
    LegalName,
}

impl Field {
    /// Human-readable name used in row error messages.
    pub fn label(self) -> &'static str {
        match self {
            Self::PreferredName => "preferred name",
            Self::UserId => "user ID",
            Self::IsHost => "host flag",
            Self::Rsvp => "RSVP flag",
            Self::RsvpTime => "RSVP time",
            Self::JoinedDate => "joined date",
            Self::ProfileUrl => "profile URL",
            Self::LegalName => "legal name",
        }
    }
}

/// One `position -> field` entry of a layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub index: usize,
    pub field: Field,
}

impl ColumnSpec {
    pub const fn new(index: usize, field: Field) -> Self {
        Self { index, field }
    }
}

/// Meetup "attendees" export. Columns 2 (title) and 5 (guests) are unused.
const MEETUP_EXPORT_COLUMNS: &[ColumnSpec] = &[
    ColumnSpec::new(0, Field::PreferredName),
    ColumnSpec::new(1, Field::UserId),
    ColumnSpec::new(3, Field::IsHost),
    ColumnSpec::new(4, Field::Rsvp),
    ColumnSpec::new(6, Field::RsvpTime),
    ColumnSpec::new(7, Field::JoinedDate),
    ColumnSpec::new(8, Field::ProfileUrl),
    ColumnSpec::new(9, Field::LegalName),
];

/// Ordered set of column specs for one export format.
///
/// # Invariants
/// - Columns are kept in ascending `index` order so that names in earlier
///   cells are known when later cells fail to parse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnLayout {
    columns: Vec<ColumnSpec>,
}

impl ColumnLayout {
    pub fn new(mut columns: Vec<ColumnSpec>) -> Self {
        columns.sort_by_key(|column| column.index);
        Self { columns }
    }

    /// Layout of the Meetup attendee export.
    pub fn meetup_export() -> Self {
        Self::new(MEETUP_EXPORT_COLUMNS.to_vec())
    }

    pub fn columns(&self) -> &[ColumnSpec] {
        &self.columns
    }

    /// Position of `field`, if the layout maps it.
    pub fn index_of(&self, field: Field) -> Option<usize> {
        self.columns
            .iter()
            .find(|column| column.field == field)
            .map(|column| column.index)
    }
}

impl Default for ColumnLayout {
    fn default() -> Self {
        Self::meetup_export()
    }
}
