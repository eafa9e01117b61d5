use std::fmt;

use thiserror::Error;

/// Why one parser declined a file.
#[derive(Debug, Clone)]
pub struct ParserAttempt {
    pub parser: &'static str,
    pub reason: String,
}

impl ParserAttempt {
    pub fn new(parser: &'static str, reason: impl Into<String>) -> Self {
        Self {
            parser,
            reason: reason.into(),
        }
    }
}

impl fmt::Display for ParserAttempt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.parser, self.reason)
    }
}

fn describe_attempts(attempts: &[ParserAttempt]) -> String {
    attempts
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[derive(Debug, Error)]
pub enum ParserError {
    /// The content is not in this parser's format; the registry moves on to the next one.
    #[error("{parser} format mismatch: {reason}")]
    FormatMismatch {
        parser: &'static str,
        reason: String,
    },

    #[error("{parser} header repeats column '{name}' at position {column_index}")]
    DuplicateColumn {
        parser: &'static str,
        column_index: usize,
        name: String,
    },

    #[error("{parser} could not read the record on line {line_index}")]
    UnreadableRecord {
        parser: &'static str,
        line_index: usize,
        #[source]
        source: csv::Error,
    },

    /// Line numbers are 1-based and count preamble and header lines.
    #[error("{parser} line {line_index} has {found} fields but the header names {expected}")]
    ExtraFields {
        parser: &'static str,
        line_index: usize,
        expected: usize,
        found: usize,
    },

    #[error("row has {found} values but the table declares {expected} columns")]
    RowWidth { expected: usize, found: usize },

    #[error("{parser} found no JSON object on any line ({skipped_lines} lines skipped)")]
    NoObjects {
        parser: &'static str,
        skipped_lines: usize,
    },

    #[error("no parser recognized this file ({})", describe_attempts(.attempts))]
    NoMatchingParser { attempts: Vec<ParserAttempt> },
}
