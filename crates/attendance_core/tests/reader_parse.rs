use attendance_core::{
    parse_attendance_file, parse_attendance_reader, ColumnLayout, Diagnostics, Event,
    FieldErrorKind, Field, LogFacade, QuoteErrorKind, ReadError, StructuralError,
};
use chrono::{TimeZone, Utc};
use log::Level;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn hack_night() -> Arc<Event> {
    Arc::new(Event::with_id(
        "1234",
        "Test Event",
        Utc.with_ymd_and_hms(2021, 1, 20, 18, 0, 0).unwrap(),
    ))
}

const JANE_ROW: &str = "Jane Doe\tu123\tMember\tNo\tNo\t0\tJan 5, 2021 3:00 PM\tJan 1, 2020\thttps://example.com/u123\tJane A. Doe\n";

#[derive(Default)]
struct Recorder {
    lines: Mutex<Vec<(Level, String)>>,
}

impl Diagnostics for Recorder {
    fn emit(&self, level: Level, message: &str) {
        self.lines
            .lock()
            .unwrap()
            .push((level, message.to_string()));
    }
}

#[test]
fn parses_valid_fixture_without_errors() {
    let parsed = parse_attendance_file(
        fixture("validexample.tsv"),
        &hack_night(),
        &ColumnLayout::meetup_export(),
        &LogFacade,
    )
    .unwrap();

    assert_eq!(parsed.attendances.len(), 4);
    assert!(parsed.row_errors.is_empty());

    let ids: Vec<&str> = parsed
        .attendances
        .iter()
        .map(|attendance| attendance.attendee().user_id())
        .collect();
    assert_eq!(ids, vec!["u123", "u456", "u789", "u101"]);
    assert!(parsed.attendances[1].attendee().is_host());
    assert_eq!(parsed.attendances[0].event().id().as_str(), "1234");
}

#[test]
fn parsing_is_deterministic() {
    let layout = ColumnLayout::meetup_export();
    let event = hack_night();

    let first = parse_attendance_file(fixture("validexample.tsv"), &event, &layout, &LogFacade)
        .unwrap();
    let second = parse_attendance_file(fixture("validexample.tsv"), &event, &layout, &LogFacade)
        .unwrap();

    assert_eq!(first, second);
}

#[test]
fn scenario_row_maps_every_column() {
    let parsed = parse_attendance_reader(
        JANE_ROW.as_bytes(),
        &hack_night(),
        &ColumnLayout::meetup_export(),
        &LogFacade,
    )
    .unwrap();

    assert!(parsed.row_errors.is_empty());
    let attendance = &parsed.attendances[0];
    let attendee = attendance.attendee();
    assert_eq!(attendee.preferred_name(), "Jane Doe");
    assert_eq!(attendee.user_id(), "u123");
    assert_eq!(attendee.legal_name(), "Jane A. Doe");
    assert!(!attendee.is_host());
    assert_eq!(
        attendee.joined_date(),
        Some(Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap())
    );
    assert_eq!(
        attendee.profile_url().map(|url| url.as_str()),
        Some("https://example.com/u123")
    );
    assert!(!attendance.rsvp());
    assert_eq!(
        attendance.rsvp_time(),
        Some(Utc.with_ymd_and_hms(2021, 1, 5, 15, 0, 0).unwrap())
    );
}

#[test]
fn bad_rsvp_time_keeps_the_row_and_reports_one_error() {
    let input = format!(
        "{JANE_ROW}Sam Lee\tu456\tMember\tYes\tYes\t0\tsometime\tMarch 3, 2019\thttps://example.com/u456\tSamuel Lee\n"
    );
    let parsed = parse_attendance_reader(
        input.as_bytes(),
        &hack_night(),
        &ColumnLayout::meetup_export(),
        &LogFacade,
    )
    .unwrap();

    assert_eq!(parsed.attendances.len(), 2);
    assert_eq!(parsed.row_errors.len(), 1);

    let error = &parsed.row_errors[0];
    assert_eq!(error.row, 1);
    assert_eq!(error.field, Field::RsvpTime);
    assert_eq!(error.preferred_name, "Sam Lee");
    assert_eq!(error.value, "sometime");
    assert!(matches!(error.kind, FieldErrorKind::Timestamp(_)));
    assert!(error.to_string().contains("row 1"));

    let sam = &parsed.attendances[1];
    assert!(sam.rsvp_time().is_none());
    assert!(sam.rsvp());
    assert!(sam.attendee().is_host());
    assert_eq!(sam.attendee().legal_name(), "Samuel Lee");
    assert_eq!(
        sam.attendee().joined_date(),
        Some(Utc.with_ymd_and_hms(2019, 3, 3, 0, 0, 0).unwrap())
    );
}

#[test]
fn bad_profile_url_keeps_the_row_and_reports_one_error() {
    let input =
        "Priya\tu789\t\tNo\tYes\t0\tJan 7, 2021 12:00 PM\tDec 24, 2018\tnot a url\tPriya Raman\n";
    let parsed = parse_attendance_reader(
        input.as_bytes(),
        &hack_night(),
        &ColumnLayout::meetup_export(),
        &LogFacade,
    )
    .unwrap();

    assert_eq!(parsed.attendances.len(), 1);
    assert_eq!(parsed.row_errors.len(), 1);
    assert_eq!(parsed.row_errors[0].row, 0);
    assert_eq!(parsed.row_errors[0].field, Field::ProfileUrl);
    assert_eq!(parsed.rows_with_errors().into_iter().collect::<Vec<_>>(), vec![0]);

    let attendee = parsed.attendances[0].attendee();
    assert!(attendee.profile_url().is_none());
    assert_eq!(attendee.user_id(), "u789");
    assert_eq!(attendee.legal_name(), "Priya Raman");
}

#[test]
fn missing_file_is_a_file_access_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = parse_attendance_file(
        dir.path().join("missing.tsv"),
        &hack_night(),
        &ColumnLayout::meetup_export(),
        &LogFacade,
    )
    .unwrap_err();

    assert!(matches!(err, ReadError::FileAccess { .. }));
}

#[test]
fn invalid_utf8_is_a_structural_error() {
    let mut input = JANE_ROW.as_bytes().to_vec();
    input.extend_from_slice(&[0xff, 0xfe, b'\t', b'u', b'9', b'\n']);

    let err = parse_attendance_reader(
        input.as_slice(),
        &hack_night(),
        &ColumnLayout::meetup_export(),
        &LogFacade,
    )
    .unwrap_err();

    assert!(matches!(
        err,
        ReadError::Structural {
            source: StructuralError::Csv(_),
            ..
        }
    ));
}

#[test]
fn truncated_quoting_fails_the_whole_file() {
    let input = "Jane Doe\t\"u123\tMember\tNo\tNo\t0\tJan 5, 2021 3:00 PM\tJan 1, 2020\thttps://example.com/u123\tJane A. Doe\n\
                 Sam\tu456\tMember\tNo\tNo\n";
    let recorder = Recorder::default();

    let err = parse_attendance_reader(
        input.as_bytes(),
        &hack_night(),
        &ColumnLayout::meetup_export(),
        &recorder,
    )
    .unwrap_err();

    match err {
        ReadError::Structural {
            source: StructuralError::Quote(quote),
            ..
        } => {
            assert_eq!(quote.kind, QuoteErrorKind::Unterminated);
            assert_eq!((quote.line, quote.column), (1, 10));
        }
        other => panic!("expected a quoting failure, got {other:?}"),
    }
    let lines = recorder.lines.lock().unwrap();
    assert!(lines
        .iter()
        .any(|(level, line)| *level == Level::Error && line.contains("structural_scan_failed")));
}

#[test]
fn stray_quote_inside_a_name_fails_the_whole_file() {
    let mut input = JANE_ROW.to_string();
    input.push_str("Jim \"JJ\" Smith\tu555\tMember\tNo\tNo\n");

    let err = parse_attendance_reader(
        input.as_bytes(),
        &hack_night(),
        &ColumnLayout::meetup_export(),
        &LogFacade,
    )
    .unwrap_err();

    assert!(matches!(
        err,
        ReadError::Structural {
            source: StructuralError::Quote(_),
            ..
        }
    ));
}

#[test]
fn well_quoted_cells_keep_their_tabs() {
    let input = "\"Doe\tJane\"\tu123\tMember\tNo\tNo\n";

    let parsed = parse_attendance_reader(
        input.as_bytes(),
        &hack_night(),
        &ColumnLayout::meetup_export(),
        &LogFacade,
    )
    .unwrap();

    assert_eq!(parsed.attendances.len(), 1);
    assert!(parsed.row_errors.is_empty());
    let attendee = parsed.attendances[0].attendee();
    assert_eq!(attendee.preferred_name(), "Doe\tJane");
    assert_eq!(attendee.user_id(), "u123");
}

#[test]
fn diagnostics_are_sent_to_the_injected_sink() {
    let recorder = Recorder::default();
    let input = "Sam\tu9\t\tNo\tNo\t0\tlater\n";

    parse_attendance_reader(
        input.as_bytes(),
        &hack_night(),
        &ColumnLayout::meetup_export(),
        &recorder,
    )
    .unwrap();

    let lines = recorder.lines.lock().unwrap();
    assert!(lines
        .iter()
        .any(|(level, line)| *level == Level::Debug && line.contains("event=import_row")));
    assert!(!lines
        .iter()
        .any(|(level, line)| *level <= Level::Warn && line.contains("event=import_row")));
    assert!(lines
        .iter()
        .any(|(level, line)| *level == Level::Info && line.contains("rows=1 row_errors=1")));
}
