//! Strict quote validation for tab-separated input.
//!
//! The `csv` reader accepts any quoting it is given: a quoted field that is
//! never closed silently swallows the rest of the input. Exports are checked
//! here first so malformed quoting fails the whole file.
//!
//! Rules:
//! - a quote may only open a field at its first byte;
//! - inside a quoted field, `""` is an escaped quote;
//! - a closing quote must be followed by a delimiter, a line break or EOF;
//! - a quoted field must be closed before EOF.

use std::error::Error;
use std::fmt::{Display, Formatter};

const QUOTE: u8 = b'"';

/// What went wrong with a quote.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuoteErrorKind {
    /// `"` inside a field that did not start with a quote.
    BareQuote,
    /// Closing `"` followed by something other than a field end.
    ExtraneousQuote,
    /// Quoted field still open at end of input.
    Unterminated,
}

/// Malformed quoting at a 1-based line and byte column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuoteError {
    pub line: u64,
    pub column: u64,
    pub kind: QuoteErrorKind,
}

impl Display for QuoteError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let what = match self.kind {
            QuoteErrorKind::BareQuote => "bare \" in non-quoted field",
            QuoteErrorKind::ExtraneousQuote => "extraneous or missing \" in quoted field",
            QuoteErrorKind::Unterminated => "quoted field not terminated before end of input",
        };
        write!(f, "line {}, column {}: {what}", self.line, self.column)
    }
}

impl Error for QuoteError {}

#[derive(Clone, Copy)]
enum State {
    FieldStart,
    Unquoted,
    Quoted,
    /// Just read a `"` inside a quoted field.
    QuoteSeen,
    /// Read `"\r` inside a quoted field; only `\n` may follow.
    QuoteSeenCr,
}

/// Checks `input` against the quoting rules for `delimiter`-separated data.
pub fn validate_quoting(input: &[u8], delimiter: u8) -> Result<(), QuoteError> {
    let mut state = State::FieldStart;
    let mut line = 1u64;
    let mut column = 0u64;
    // Position of the quote that opened the current quoted field.
    let mut opened_at = (1u64, 1u64);

    for &byte in input {
        column += 1;
        let at = |kind| QuoteError { line, column, kind };
        state = match (state, byte) {
            (State::FieldStart, QUOTE) => {
                opened_at = (line, column);
                State::Quoted
            }
            (State::Unquoted, QUOTE) => return Err(at(QuoteErrorKind::BareQuote)),
            (State::FieldStart | State::Unquoted | State::QuoteSeen, b'\n') => State::FieldStart,
            (State::FieldStart | State::Unquoted | State::QuoteSeen, b) if b == delimiter => {
                State::FieldStart
            }
            (State::FieldStart | State::Unquoted, _) => State::Unquoted,
            (State::Quoted, QUOTE) => State::QuoteSeen,
            (State::Quoted, _) => State::Quoted,
            (State::QuoteSeen, QUOTE) => State::Quoted,
            (State::QuoteSeen, b'\r') => State::QuoteSeenCr,
            (State::QuoteSeenCr, b'\n') => State::FieldStart,
            (State::QuoteSeen | State::QuoteSeenCr, _) => {
                return Err(at(QuoteErrorKind::ExtraneousQuote))
            }
        };
        if byte == b'\n' {
            line += 1;
            column = 0;
        }
    }

    match state {
        State::Quoted => Err(QuoteError {
            line: opened_at.0,
            column: opened_at.1,
            kind: QuoteErrorKind::Unterminated,
        }),
        State::QuoteSeenCr => Err(QuoteError {
            line,
            column,
            kind: QuoteErrorKind::ExtraneousQuote,
        }),
        _ => Ok(()),
    }
}
