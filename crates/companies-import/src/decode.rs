//! Company data CSV decoding
//!
//! Turns the archive entry into a lazy, single-pass sequence of
//! [`CompanyRecord`]s. The header row is checked for length and then
//! dropped; each data row is coerced field by field according to
//! [`COMPANY_COLUMNS`].
//!
//! # Coercion
//!
//! | Kind      | Accepted input              | Otherwise |
//! |-----------|-----------------------------|-----------|
//! | `Date`    | `DD/MM/YYYY`, valid date    | null      |
//! | `Integer` | base-10 `i32`, optional sign| null      |
//! | `Text`    | anything, empty included    | -         |
//!
//! # Quoting
//!
//! The published file is not strict CSV: quoted fields sometimes carry bare
//! `"` characters that are not doubled. Those are kept as literal quotes,
//! and a quote only closes a quoted field when it is followed by a comma,
//! a line break or the end of input.

use std::io::{self, Read};

use chrono::NaiveDate;
use csv::{ByteRecord, Reader, ReaderBuilder};
use tracing::trace;

use crate::error::{ImportError, Result};
use crate::schema::{Column, ColumnKind, COMPANY_COLUMNS};

/// One field after type resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoercedField {
    Text(String),
    Date(Option<NaiveDate>),
    Integer(Option<i32>),
}

impl CoercedField {
    pub fn is_null(&self) -> bool {
        matches!(self, CoercedField::Date(None) | CoercedField::Integer(None))
    }
}

/// One data row of the source file, coerced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompanyRecord {
    /// Line in the source file where the row starts (header is line 1)
    pub line: u64,
    pub fields: Vec<CoercedField>,
}

impl CompanyRecord {
    /// Company number, used to identify rows in logs
    pub fn company_number(&self) -> Option<&str> {
        match self.fields.get(1) {
            Some(CoercedField::Text(number)) => Some(number),
            _ => None,
        }
    }
}

/// Parse a `DD/MM/YYYY` date
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let bytes = raw.as_bytes();
    let shape_ok = bytes.len() == 10
        && bytes[2] == b'/'
        && bytes[5] == b'/'
        && bytes
            .iter()
            .enumerate()
            .all(|(i, b)| i == 2 || i == 5 || b.is_ascii_digit());

    if !shape_ok {
        return None;
    }

    NaiveDate::parse_from_str(raw, "%d/%m/%Y").ok()
}

/// Parse a base-10 signed 32-bit integer
pub fn parse_integer(raw: &str) -> Option<i32> {
    raw.parse().ok()
}

/// Resolve a raw field to its column's type
pub fn coerce(kind: ColumnKind, raw: &str) -> CoercedField {
    match kind {
        ColumnKind::Text => CoercedField::Text(raw.to_string()),
        ColumnKind::Date => CoercedField::Date(parse_date(raw)),
        ColumnKind::Integer => CoercedField::Integer(parse_integer(raw)),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum QuoteState {
    FieldStart,
    Unquoted,
    Quoted,
    /// Inside a quoted field, just after a `"` whose meaning is not known yet
    QuotedQuote,
}

/// Byte stream that escapes bare quotes inside quoted fields
///
/// A `"` inside a quoted field that is neither doubled nor followed by a
/// field or record terminator is rewritten to `""`, so the CSV reader
/// keeps it as a literal quote. Line breaks are never added or removed.
pub(crate) struct LazyQuotes<R> {
    inner: R,
    state: QuoteState,
    out: Vec<u8>,
    pos: usize,
    eof: bool,
}

impl<R: Read> LazyQuotes<R> {
    pub(crate) fn new(inner: R) -> Self {
        Self {
            inner,
            state: QuoteState::FieldStart,
            out: Vec::new(),
            pos: 0,
            eof: false,
        }
    }

    fn push(&mut self, byte: u8) {
        use QuoteState::*;

        self.state = match (self.state, byte) {
            (FieldStart, b'"') => {
                self.out.push(byte);
                Quoted
            },
            (FieldStart | Unquoted, b',' | b'\n' | b'\r') => {
                self.out.push(byte);
                FieldStart
            },
            (FieldStart | Unquoted, _) => {
                self.out.push(byte);
                Unquoted
            },
            (Quoted, b'"') => QuotedQuote,
            (Quoted, _) => {
                self.out.push(byte);
                Quoted
            },
            (QuotedQuote, b'"') => {
                self.out.extend_from_slice(b"\"\"");
                Quoted
            },
            (QuotedQuote, b',' | b'\n' | b'\r') => {
                self.out.extend_from_slice(&[b'"', byte]);
                FieldStart
            },
            (QuotedQuote, _) => {
                self.out.extend_from_slice(&[b'"', b'"', byte]);
                Quoted
            },
        };
    }

    fn refill(&mut self) -> io::Result<()> {
        self.out.clear();
        self.pos = 0;

        let mut chunk = [0u8; 8 * 1024];
        let n = self.inner.read(&mut chunk)?;
        if n == 0 {
            self.eof = true;
            if self.state == QuoteState::QuotedQuote {
                self.out.push(b'"');
                self.state = QuoteState::FieldStart;
            }
            return Ok(());
        }

        for &byte in &chunk[..n] {
            self.push(byte);
        }
        Ok(())
    }
}

impl<R: Read> Read for LazyQuotes<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        while self.pos == self.out.len() {
            if self.eof {
                return Ok(0);
            }
            self.refill()?;
        }

        let n = buf.len().min(self.out.len() - self.pos);
        buf[..n].copy_from_slice(&self.out[self.pos..self.pos + n]);
        self.pos += n;
        Ok(n)
    }
}

/// Streaming decoder over the company data CSV
pub struct RecordDecoder<R> {
    reader: Reader<LazyQuotes<R>>,
    columns: &'static [Column],
    record: ByteRecord,
    rows_read: u64,
    finished: bool,
}

impl<R: Read> RecordDecoder<R> {
    /// Start decoding `source` against the company column layout
    pub fn new(source: R) -> Result<Self> {
        Self::with_columns(source, COMPANY_COLUMNS)
    }

    /// Start decoding `source` against an explicit column layout
    ///
    /// Reads the header row and fails if it does not have one field per
    /// column.
    pub fn with_columns(source: R, columns: &'static [Column]) -> Result<Self> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(false)
            .from_reader(LazyQuotes::new(source));

        let found = reader.byte_headers()?.len();
        if found != columns.len() {
            return Err(ImportError::HeaderMismatch {
                expected: columns.len(),
                found,
            });
        }

        Ok(Self {
            reader,
            columns,
            record: ByteRecord::new(),
            rows_read: 0,
            finished: false,
        })
    }

    /// Data rows read so far, header excluded
    pub fn rows_read(&self) -> u64 {
        self.rows_read
    }

    fn coerce_current(&self) -> CompanyRecord {
        let line = self
            .record
            .position()
            .map(|p| p.line())
            .unwrap_or(self.rows_read + 1);

        let fields = self
            .columns
            .iter()
            .zip(self.record.iter())
            .map(|(column, raw)| {
                let raw = String::from_utf8_lossy(raw);
                let field = coerce(column.kind, &raw);
                if field.is_null() && !raw.is_empty() {
                    trace!(line, column = column.name, value = %raw, "Value coerced to null");
                }
                field
            })
            .collect();

        CompanyRecord { line, fields }
    }
}

impl<R: Read> Iterator for RecordDecoder<R> {
    type Item = Result<CompanyRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        match self.reader.read_byte_record(&mut self.record) {
            Ok(true) => {
                self.rows_read += 1;
                Some(Ok(self.coerce_current()))
            },
            Ok(false) => {
                self.finished = true;
                None
            },
            Err(e) => {
                self.finished = true;
                Some(Err(e.into()))
            },
        }
    }
}
