//! Cell parsers and the per-row field mapper.
//!
//! # Invariants
//! - A failing timestamp or URL cell leaves that field `None` and yields one
//!   `RowFieldError`; the rest of the row is still built.
//! - Missing trailing cells and blank cells are empty, never errors.

use super::layout::{ColumnLayout, Field};
use super::{FieldErrorKind, RowFieldError};
use crate::model::attendance::Attendance;
use crate::model::attendee::Attendee;
use crate::model::event::Event;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use std::sync::Arc;
use url::Url;

/// `Month day, YYYY h:mm AM/PM`; `%B` also accepts three-letter months.
pub const RSVP_TIME_FORMAT: &str = "%B %d, %Y %I:%M %p";
/// `Month day, YYYY`.
pub const JOINED_DATE_FORMAT: &str = "%B %d, %Y";

const YES: &str = "Yes";

/// Field accumulator for one row; everything starts at its zero value.
#[derive(Debug, Default)]
struct RowFields {
    preferred_name: String,
    user_id: String,
    legal_name: String,
    profile_url: Option<Url>,
    is_host: bool,
    rsvp: bool,
    rsvp_time: Option<DateTime<Utc>>,
    joined_date: Option<DateTime<Utc>>,
}

impl RowFields {
    /// Parses `cell` as `field` and stores it. On error the slot keeps its
    /// zero value.
    fn assign(&mut self, field: Field, cell: &str) -> Result<(), FieldErrorKind> {
        match field {
            Field::PreferredName => self.preferred_name = cell.to_string(),
            Field::UserId => self.user_id = cell.to_string(),
            Field::LegalName => self.legal_name = cell.to_string(),
            Field::IsHost => self.is_host = is_yes(cell),
            Field::Rsvp => self.rsvp = is_yes(cell),
            Field::RsvpTime => self.rsvp_time = optional_timestamp(cell, parse_rsvp_time)?,
            Field::JoinedDate => self.joined_date = optional_timestamp(cell, parse_joined_date)?,
            Field::ProfileUrl => self.profile_url = optional_url(cell)?,
        }
        Ok(())
    }

    fn into_attendance(self, event: &Arc<Event>) -> Attendance {
        let attendee = Attendee::new(self.user_id, self.preferred_name, self.legal_name)
            .with_profile_url(self.profile_url)
            .with_host(self.is_host)
            .with_joined_date(self.joined_date);
        Attendance::new(attendee, Arc::clone(event), self.rsvp, self.rsvp_time)
    }
}

/// Builds one attendance from the cells of row `row_index`.
///
/// Returns the attendance together with every field error found in the row.
pub fn parse_row(
    row_index: usize,
    cells: &[&str],
    layout: &ColumnLayout,
    event: &Arc<Event>,
) -> (Attendance, Vec<RowFieldError>) {
    let mut fields = RowFields::default();
    let mut errors = Vec::new();

    for column in layout.columns() {
        let cell = cells.get(column.index).copied().unwrap_or_default();
        if let Err(kind) = fields.assign(column.field, cell) {
            errors.push(RowFieldError {
                row: row_index,
                preferred_name: fields.preferred_name.clone(),
                field: column.field,
                value: cell.to_string(),
                kind,
            });
        }
    }

    (fields.into_attendance(event), errors)
}

/// Parses an event time given on the command line.
///
/// Accepts RFC 3339 (`2021-05-04T18:30:00-07:00`) or the export layout
/// `May 4, 2021 6:30 PM`, the latter read as UTC.
pub fn parse_event_time(text: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    let trimmed = text.trim();
    if let Ok(time) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(time.with_timezone(&Utc));
    }
    parse_rsvp_time(trimmed)
}

/// Parses `Month day, YYYY h:mm AM/PM` as a UTC timestamp.
pub fn parse_rsvp_time(text: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    let naive = NaiveDateTime::parse_from_str(text.trim(), RSVP_TIME_FORMAT)?;
    Ok(Utc.from_utc_datetime(&naive))
}

/// Parses `Month day, YYYY` as midnight UTC.
pub fn parse_joined_date(text: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    let date = NaiveDate::parse_from_str(text.trim(), JOINED_DATE_FORMAT)?;
    Ok(Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN)))
}

fn is_yes(cell: &str) -> bool {
    cell == YES
}

fn optional_timestamp(
    cell: &str,
    parse: fn(&str) -> Result<DateTime<Utc>, chrono::ParseError>,
) -> Result<Option<DateTime<Utc>>, FieldErrorKind> {
    if cell.trim().is_empty() {
        return Ok(None);
    }
    parse(cell).map(Some).map_err(FieldErrorKind::Timestamp)
}

fn optional_url(cell: &str) -> Result<Option<Url>, FieldErrorKind> {
    let trimmed = cell.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    Url::parse(trimmed).map(Some).map_err(FieldErrorKind::Url)
}

#[cfg(test)]
mod tests {
    use super::{parse_event_time, parse_joined_date, parse_row, parse_rsvp_time};
    use crate::model::event::Event;
    use crate::reader::layout::{ColumnLayout, ColumnSpec, Field};
    use crate::reader::FieldErrorKind;
    use chrono::{TimeZone, Utc};
    use std::sync::Arc;

    fn event() -> Arc<Event> {
        Arc::new(Event::unsaved(
            "Hack Night",
            Utc.with_ymd_and_hms(2021, 1, 20, 18, 0, 0).unwrap(),
        ))
    }

    #[test]
    fn rsvp_time_accepts_full_and_short_month_names() {
        let expected = Utc.with_ymd_and_hms(2021, 1, 5, 15, 0, 0).unwrap();
        assert_eq!(parse_rsvp_time("Jan 5, 2021 3:00 PM").unwrap(), expected);
        assert_eq!(parse_rsvp_time("January 5, 2021 3:00 PM").unwrap(), expected);
        assert_eq!(parse_rsvp_time("January 05, 2021 03:00 PM").unwrap(), expected);
    }

    #[test]
    fn joined_date_is_midnight_utc() {
        assert_eq!(
            parse_joined_date("Jan 1, 2020").unwrap(),
            Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap()
        );
        assert!(parse_joined_date("2020-01-01").is_err());
    }

    #[test]
    fn event_time_accepts_rfc3339_and_export_layout() {
        assert_eq!(
            parse_event_time("2021-05-04T18:30:00-07:00").unwrap(),
            Utc.with_ymd_and_hms(2021, 5, 5, 1, 30, 0).unwrap()
        );
        assert_eq!(
            parse_event_time("May 4, 2021 6:30 PM").unwrap(),
            Utc.with_ymd_and_hms(2021, 5, 4, 18, 30, 0).unwrap()
        );
        assert!(parse_event_time("next tuesday").is_err());
    }

    #[test]
    fn short_row_leaves_trailing_fields_empty_without_errors() {
        let (attendance, errors) =
            parse_row(0, &["Sam", "u9"], &ColumnLayout::meetup_export(), &event());

        assert!(errors.is_empty());
        assert_eq!(attendance.attendee().preferred_name(), "Sam");
        assert_eq!(attendance.attendee().user_id(), "u9");
        assert_eq!(attendance.attendee().legal_name(), "");
        assert!(attendance.attendee().profile_url().is_none());
        assert!(attendance.rsvp_time().is_none());
    }

    #[test]
    fn flags_require_exact_yes() {
        let cells = ["Sam", "u9", "", "yes", "Yes"];
        let (attendance, errors) = parse_row(0, &cells, &ColumnLayout::meetup_export(), &event());

        assert!(errors.is_empty());
        assert!(!attendance.attendee().is_host());
        assert!(attendance.rsvp());
    }

    #[test]
    fn every_bad_cell_in_a_row_is_reported() {
        let cells = [
            "Sam", "u9", "", "No", "Yes", "0", "soon", "long ago", "not a url", "Samuel",
        ];
        let (attendance, errors) = parse_row(7, &cells, &ColumnLayout::meetup_export(), &event());

        let fields: Vec<Field> = errors.iter().map(|err| err.field).collect();
        assert_eq!(
            fields,
            vec![Field::RsvpTime, Field::JoinedDate, Field::ProfileUrl]
        );
        assert!(errors.iter().all(|err| err.row == 7 && err.preferred_name == "Sam"));
        assert!(matches!(errors[2].kind, FieldErrorKind::Url(_)));
        assert_eq!(attendance.attendee().legal_name(), "Samuel");
        assert!(attendance.attendee().joined_date().is_none());
    }

    #[test]
    fn every_field_lands_in_its_own_slot() {
        // Reversed positions so no field can be filled by column order alone.
        let layout = ColumnLayout::new(vec![
            ColumnSpec::new(7, Field::PreferredName),
            ColumnSpec::new(6, Field::UserId),
            ColumnSpec::new(5, Field::IsHost),
            ColumnSpec::new(4, Field::Rsvp),
            ColumnSpec::new(3, Field::RsvpTime),
            ColumnSpec::new(2, Field::JoinedDate),
            ColumnSpec::new(1, Field::ProfileUrl),
            ColumnSpec::new(0, Field::LegalName),
        ]);
        let cells = [
            "Samuel Lee",
            "https://example.com/u9",
            "Jan 1, 2020",
            "Jan 5, 2021 3:00 PM",
            "Yes",
            "Yes",
            "u9",
            "Sam",
        ];

        let (attendance, errors) = parse_row(0, &cells, &layout, &event());

        assert!(errors.is_empty());
        let attendee = attendance.attendee();
        assert_eq!(attendee.preferred_name(), "Sam");
        assert_eq!(attendee.user_id(), "u9");
        assert_eq!(attendee.legal_name(), "Samuel Lee");
        assert!(attendee.is_host());
        assert!(attendance.rsvp());
        assert_eq!(
            attendance.rsvp_time(),
            Some(Utc.with_ymd_and_hms(2021, 1, 5, 15, 0, 0).unwrap())
        );
        assert_eq!(
            attendee.joined_date(),
            Some(Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap())
        );
        assert_eq!(
            attendee.profile_url().map(|url| url.as_str()),
            Some("https://example.com/u9")
        );
    }
}
