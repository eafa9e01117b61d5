use chrono::NaiveDateTime;
use serde::Serialize;
use thiserror::Error;

/// Non-fatal conditions found while regularizing a series. They are returned next to the
/// output and never stop processing.
#[derive(Debug, Clone, PartialEq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum QualityWarning {
    #[error("{count} rows had an unparseable timestamp and were excluded")]
    InvalidTimestamps { count: usize },

    #[error("field '{field}' is null in every row")]
    EmptyColumn { field: String },

    #[error("gap {start} to {end} needs {missing_ticks} rows, over the cap of {cap}; not filled")]
    UnboundedGap {
        start: NaiveDateTime,
        end: NaiveDateTime,
        missing_ticks: u64,
        cap: usize,
    },

    #[error("gap {start} to {end} needs {missing_ticks} rows; {remaining} remain for the series")]
    SyntheticBudgetExhausted {
        start: NaiveDateTime,
        end: NaiveDateTime,
        missing_ticks: u64,
        remaining: usize,
    },

    #[error("field '{field}' had {count} non-numeric values treated as null")]
    NonNumericValues { field: String, count: usize },
}

impl QualityWarning {
    pub fn kind(&self) -> &'static str {
        match self {
            QualityWarning::InvalidTimestamps { .. } => "invalid_timestamps",
            QualityWarning::EmptyColumn { .. } => "empty_column",
            QualityWarning::UnboundedGap { .. } => "unbounded_gap",
            QualityWarning::SyntheticBudgetExhausted { .. } => "synthetic_budget_exhausted",
            QualityWarning::NonNumericValues { .. } => "non_numeric_values",
        }
    }
}
