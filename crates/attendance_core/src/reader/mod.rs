//! Tabular reader for tab-separated attendance exports.
//!
//! # Responsibility
//! - Read an export file as variable-width tab-separated records.
//! - Drive the field mapper over every row and collect row-level errors.
//!
//! # Invariants
//! - File-level failures (open, structural scan) return no rows at all.
//! - Every data row yields exactly one `Attendance`; `attendances[i]` comes
//!   from row `i`.
//! - There is no header handling: every record is treated as data.

pub mod fields;
pub mod layout;
pub mod quoting;

use crate::logging::Diagnostics;
use crate::model::attendance::Attendance;
use crate::model::event::Event;
use csv::{ReaderBuilder, StringRecord};
use self::layout::{ColumnLayout, Field};
use self::quoting::{validate_quoting, QuoteError};
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub use self::fields::{parse_event_time, parse_row};

const DELIMITER: u8 = b'\t';

pub type ReadResult<T> = Result<T, ReadError>;

/// Fatal, file-level reader failure.
#[derive(Debug)]
pub enum ReadError {
    FileAccess {
        path: PathBuf,
        source: std::io::Error,
    },
    Structural {
        origin: String,
        source: StructuralError,
    },
}

/// Cause of a failed structural scan.
#[derive(Debug)]
pub enum StructuralError {
    /// Reading the input failed part way.
    Io(std::io::Error),
    /// Malformed quoting.
    Quote(QuoteError),
    /// Record scan failure, e.g. invalid UTF-8.
    Csv(csv::Error),
}

impl Display for StructuralError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "read failed: {err}"),
            Self::Quote(err) => write!(f, "malformed quoting at {err}"),
            Self::Csv(err) => write!(f, "{err}"),
        }
    }
}

impl Error for StructuralError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Quote(err) => Some(err),
            Self::Csv(err) => Some(err),
        }
    }
}

impl Display for ReadError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::FileAccess { path, .. } => {
                write!(f, "error opening file for read: {:?}", path.display().to_string())
            }
            Self::Structural { origin, .. } => {
                write!(f, "error reading tab separated data from {origin:?}")
            }
        }
    }
}

impl Error for ReadError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::FileAccess { source, .. } => Some(source),
            Self::Structural { source, .. } => Some(source),
        }
    }
}

/// Why a single cell could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldErrorKind {
    Timestamp(chrono::ParseError),
    Url(url::ParseError),
}

impl Display for FieldErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Timestamp(err) => write!(f, "{err}"),
            Self::Url(err) => write!(f, "{err}"),
        }
    }
}

impl Error for FieldErrorKind {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Timestamp(err) => Some(err),
            Self::Url(err) => Some(err),
        }
    }
}

/// Non-fatal failure to parse one cell of one row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowFieldError {
    /// Zero-based record index in the file.
    pub row: usize,
    /// Preferred name parsed before the failing cell, for diagnostics.
    pub preferred_name: String,
    pub field: Field,
    /// Raw cell text.
    pub value: String,
    pub kind: FieldErrorKind,
}

impl Display for RowFieldError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "error parsing {} for row {} ({:?}): value {:?}: {}",
            self.field.label(),
            self.row,
            self.preferred_name,
            self.value,
            self.kind
        )
    }
}

impl Error for RowFieldError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&self.kind)
    }
}

/// Output of a structurally successful read.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedFile {
    pub attendances: Vec<Attendance>,
    pub row_errors: Vec<RowFieldError>,
}

impl ParsedFile {
    pub fn has_row_errors(&self) -> bool {
        !self.row_errors.is_empty()
    }

    /// Row indices that produced at least one field error.
    pub fn rows_with_errors(&self) -> BTreeSet<usize> {
        self.row_errors.iter().map(|err| err.row).collect()
    }
}

/// Reads the export at `path` and maps every row with `layout`.
///
/// # Errors
/// - `ReadError::FileAccess` when the file cannot be opened.
/// - `ReadError::Structural` when the tab-separated scan fails, including
///   malformed or truncated quoting.
///
/// Row-level problems never fail the call; they are returned in
/// `ParsedFile::row_errors`.
pub fn parse_attendance_file(
    path: impl AsRef<Path>,
    event: &Arc<Event>,
    layout: &ColumnLayout,
    diagnostics: &dyn Diagnostics,
) -> ReadResult<ParsedFile> {
    let path = path.as_ref();
    let file = match File::open(path) {
        Ok(file) => file,
        Err(source) => {
            diagnostics.error(&format!(
                "event=import_parse module=reader status=error error_code=file_open_failed error={source}"
            ));
            return Err(ReadError::FileAccess {
                path: path.to_path_buf(),
                source,
            });
        }
    };

    parse_records(file, &path.display().to_string(), event, layout, diagnostics)
}

/// Same as [`parse_attendance_file`] over any reader.
pub fn parse_attendance_reader<R: Read>(
    reader: R,
    event: &Arc<Event>,
    layout: &ColumnLayout,
    diagnostics: &dyn Diagnostics,
) -> ReadResult<ParsedFile> {
    parse_records(reader, "<reader>", event, layout, diagnostics)
}

fn parse_records<R: Read>(
    reader: R,
    origin: &str,
    event: &Arc<Event>,
    layout: &ColumnLayout,
    diagnostics: &dyn Diagnostics,
) -> ReadResult<ParsedFile> {
    // Scan everything first so a structural failure yields no partial rows.
    let records = match scan_records(reader) {
        Ok(records) => records,
        Err(source) => {
            diagnostics.error(&format!(
                "event=import_parse module=reader status=error error_code=structural_scan_failed error={source}"
            ));
            return Err(ReadError::Structural {
                origin: origin.to_string(),
                source,
            });
        }
    };

    let mut parsed = ParsedFile {
        attendances: Vec::with_capacity(records.len()),
        row_errors: Vec::new(),
    };
    for (row_index, record) in records.iter().enumerate() {
        let cells: Vec<&str> = record.iter().collect();
        let (attendance, errors) = parse_row(row_index, &cells, layout, event);
        for err in &errors {
            diagnostics.debug(&format!(
                "event=import_row module=reader status=error row={} field={:?}",
                err.row, err.field
            ));
        }
        parsed.attendances.push(attendance);
        parsed.row_errors.extend(errors);
    }

    diagnostics.info(&format!(
        "event=import_parse module=reader status=ok rows={} row_errors={}",
        parsed.attendances.len(),
        parsed.row_errors.len()
    ));
    Ok(parsed)
}

fn scan_records<R: Read>(mut reader: R) -> Result<Vec<StringRecord>, StructuralError> {
    let mut input = Vec::new();
    reader.read_to_end(&mut input).map_err(StructuralError::Io)?;
    validate_quoting(&input, DELIMITER).map_err(StructuralError::Quote)?;

    let mut csv_reader = ReaderBuilder::new()
        .delimiter(DELIMITER)
        .has_headers(false)
        .flexible(true)
        .from_reader(input.as_slice());
    let records = csv_reader
        .records()
        .collect::<Result<Vec<StringRecord>, csv::Error>>();
    records.map_err(StructuralError::Csv)
}
