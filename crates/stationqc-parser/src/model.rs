use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::ParserError;

/// Tokens treated as an empty cell regardless of case.
pub const NULL_TOKENS: [&str; 6] = ["", "nan", "null", "na", "n/a", "none"];

/// A single untyped cell as handed over by a source collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RawValue {
    Null,
    Number(f64),
    Text(String),
}

impl RawValue {
    /// Classifies a text cell: null tokens become `Null`, numeric text becomes `Number`.
    pub fn from_cell(cell: &str) -> Self {
        let trimmed = cell.trim();
        if NULL_TOKENS
            .iter()
            .any(|token| trimmed.eq_ignore_ascii_case(token))
        {
            return RawValue::Null;
        }
        match trimmed.parse::<f64>() {
            Ok(value) if value.is_finite() => RawValue::Number(value),
            _ => RawValue::Text(trimmed.to_string()),
        }
    }
}

impl fmt::Display for RawValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawValue::Null => Ok(()),
            RawValue::Number(value) => write!(f, "{value}"),
            RawValue::Text(text) => f.write_str(text),
        }
    }
}

impl From<f64> for RawValue {
    fn from(value: f64) -> Self {
        RawValue::Number(value)
    }
}

impl From<Option<f64>> for RawValue {
    fn from(value: Option<f64>) -> Self {
        value.map_or(RawValue::Null, RawValue::Number)
    }
}

impl From<&str> for RawValue {
    fn from(value: &str) -> Self {
        RawValue::Text(value.to_string())
    }
}

impl From<String> for RawValue {
    fn from(value: String) -> Self {
        RawValue::Text(value)
    }
}

/// Rows of named fields in source order. Every row has exactly one value per column.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    columns: Vec<String>,
    rows: Vec<Vec<RawValue>>,
}

impl RawTable {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn with_rows(columns: Vec<String>, rows: Vec<Vec<RawValue>>) -> Result<Self, ParserError> {
        let mut table = Self::new(columns);
        for row in rows {
            table.push_row(row)?;
        }
        Ok(table)
    }

    pub fn push_row(&mut self, row: Vec<RawValue>) -> Result<(), ParserError> {
        if row.len() != self.columns.len() {
            return Err(ParserError::RowWidth {
                expected: self.columns.len(),
                found: row.len(),
            });
        }
        self.rows.push(row);
        Ok(())
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<RawValue>] {
        &self.rows
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column == name)
    }

    /// Renames `from` to `to` unless `to` already exists. Returns whether a rename happened.
    pub fn rename_column(&mut self, from: &str, to: &str) -> bool {
        if self.column_index(to).is_some() {
            return false;
        }
        match self.column_index(from) {
            Some(idx) => {
                self.columns[idx] = to.to_string();
                true
            }
            None => false,
        }
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Options shared by every parser in the registry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParseOptions {
    /// Number of lines preceding the header line of a delimited file.
    pub header_row: usize,
    /// Explicit field delimiter; detected from the header line when absent.
    pub delimiter: Option<u8>,
    /// Treat runs of spaces and tabs as a single delimiter.
    pub whitespace_aligned: bool,
    /// `(from, to)` column renames applied after parsing.
    pub rename_columns: Vec<(String, String)>,
}

#[derive(Debug, Clone)]
pub struct ParsedTable {
    pub source_hash: String,
    pub format: &'static str,
    pub table: RawTable,
    /// Lines the parser could not interpret and dropped.
    pub skipped_lines: usize,
}

impl ParsedTable {
    pub fn new(content: &str, format: &'static str, table: RawTable, skipped_lines: usize) -> Self {
        Self {
            source_hash: blake3::hash(content.as_bytes()).to_hex().to_string(),
            format,
            table,
            skipped_lines,
        }
    }
}
