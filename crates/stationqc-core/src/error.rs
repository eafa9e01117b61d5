// crates/stationqc-core/src/error.rs

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("series '{series}' has no timestamp column '{column}' (columns: {available:?})")]
    MissingTimestampColumn {
        series: String,
        column: String,
        available: Vec<String>,
    },

    #[error("series '{series}' timestamp column '{column}' has unsupported type {dtype}")]
    UnsupportedTimestampType {
        series: String,
        column: String,
        dtype: String,
    },

    #[error("series '{series}' row {row} has {found} values but the series has {expected} fields")]
    RowWidth {
        series: String,
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Polars operation failed: {0}")]
    Polars(#[from] polars::error::PolarsError),

    #[error("worker for series '{series}' did not complete: {message}")]
    Worker { series: String, message: String },
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("timestamp column name must not be empty")]
    EmptyTimestampColumn,

    #[error("sampling interval must be positive, got {0} minutes")]
    NonPositiveInterval(i64),

    #[error("sampling interval must be a whole number of minutes, got {0} seconds")]
    SubMinuteInterval(i64),

    #[error("sampling interval of {0} minutes is out of range")]
    IntervalOutOfRange(i64),

    #[error("max_gap_fill_rows must be at least 1")]
    ZeroGapCap,

    #[error("max_synthetic_rows must be at least 1")]
    ZeroSyntheticBudget,

    #[error("summary_precision must be at most {max}, got {value}")]
    Precision { value: u32, max: u32 },

    #[error("TOML configuration error: {0}")]
    Toml(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, EngineError>;
