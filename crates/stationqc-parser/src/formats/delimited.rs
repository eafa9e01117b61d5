use std::borrow::Cow;
use std::collections::HashSet;

use csv::{ReaderBuilder, Trim};

use crate::errors::ParserError;
use crate::model::{ParseOptions, ParsedTable, RawTable, RawValue};
use crate::registry::TableParser;

use super::{collapse_whitespace, detect_delimiter, first_content_line};

/// Parses delimited text with a single header line, optionally preceded by preamble lines.
pub struct DelimitedParser {
    options: ParseOptions,
}

impl Default for DelimitedParser {
    fn default() -> Self {
        Self::new(ParseOptions::default())
    }
}

impl DelimitedParser {
    pub const NAME: &'static str = "DELIMITED";

    pub fn new(options: ParseOptions) -> Self {
        Self { options }
    }

    fn header_columns(record: &csv::StringRecord) -> Result<Vec<String>, ParserError> {
        let mut seen = HashSet::new();
        let mut columns = Vec::with_capacity(record.len());
        for (column_index, name) in record.iter().enumerate() {
            let name = match name.trim() {
                "" => format!("unnamed_{column_index}"),
                other => other.to_string(),
            };
            if !seen.insert(name.clone()) {
                return Err(ParserError::DuplicateColumn {
                    parser: Self::NAME,
                    column_index,
                    name,
                });
            }
            columns.push(name);
        }
        Ok(columns)
    }

    fn unreadable(err: csv::Error, header_row: usize, estimate: usize) -> ParserError {
        let line_index = err
            .position()
            .map_or(estimate, |pos| header_row + pos.line() as usize);
        ParserError::UnreadableRecord {
            parser: Self::NAME,
            line_index,
            source: err,
        }
    }
}

impl TableParser for DelimitedParser {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn parse(&self, content: &str) -> Result<ParsedTable, ParserError> {
        let normalized: Cow<'_, str> = if self.options.whitespace_aligned {
            Cow::Owned(collapse_whitespace(content))
        } else {
            Cow::Borrowed(content)
        };

        let header_row = self.options.header_row;
        let pieces: Vec<&str> = normalized.splitn(header_row + 1, '\n').collect();
        if pieces.len() <= header_row {
            return Err(ParserError::FormatMismatch {
                parser: Self::NAME,
                reason: format!("expected a header on line {}", header_row + 1),
            });
        }
        let body = pieces[header_row];

        let header_line = first_content_line(body).ok_or_else(|| ParserError::FormatMismatch {
            parser: Self::NAME,
            reason: "file missing header line".to_string(),
        })?;
        if header_line.starts_with('{') {
            return Err(ParserError::FormatMismatch {
                parser: Self::NAME,
                reason: "header line is a JSON object".to_string(),
            });
        }

        let delimiter = match (self.options.delimiter, self.options.whitespace_aligned) {
            (Some(delimiter), _) => delimiter,
            (None, true) => b'\t',
            (None, false) => detect_delimiter(header_line),
        };

        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .trim(Trim::All)
            .delimiter(delimiter)
            .from_reader(body.as_bytes());
        let mut records = reader.records();

        let header = loop {
            let record = records
                .next()
                .ok_or_else(|| ParserError::FormatMismatch {
                    parser: Self::NAME,
                    reason: "file missing header line".to_string(),
                })?
                .map_err(|err| Self::unreadable(err, header_row, header_row + 1))?;
            if record.iter().any(|field| !field.trim().is_empty()) {
                break record;
            }
        };

        let columns = Self::header_columns(&header)?;
        let width = columns.len();
        let mut table = RawTable::new(columns);
        let mut skipped = 0usize;

        for (row_idx, record) in records.enumerate() {
            // preamble and header lines come first (1-indexed)
            let estimate = header_row + row_idx + 2;
            let record = record.map_err(|err| Self::unreadable(err, header_row, estimate))?;
            let line_index = record
                .position()
                .map_or(estimate, |pos| header_row + pos.line() as usize);

            if record.iter().all(|field| field.trim().is_empty()) {
                skipped += 1;
                continue;
            }

            if record.len() > width {
                return Err(ParserError::ExtraFields {
                    parser: Self::NAME,
                    line_index,
                    expected: width,
                    found: record.len(),
                });
            }

            let mut row: Vec<RawValue> = record.iter().map(RawValue::from_cell).collect();
            row.resize(width, RawValue::Null);
            table.push_row(row)?;
        }

        Ok(ParsedTable::new(content, Self::NAME, table, skipped))
    }
}
