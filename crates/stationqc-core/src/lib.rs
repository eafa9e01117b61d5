pub mod audit;
pub mod config;
pub mod dedup;
pub mod error;
pub mod gap_fill;
pub mod model;
pub mod ordering;
pub mod pipeline;
pub mod summary;
pub mod tabular;
pub mod timestamp;
pub mod warnings;

pub use audit::{AuditRecord, AuditReport, RemovalReason};
pub use config::EngineConfig;
pub use error::{ConfigError, EngineError, Result};
pub use gap_fill::{GridFiller, SamplingInterval};
pub use model::{Observation, ObservedTime, Provenance, TimeSeries};
pub use ordering::OutOfOrderPolicy;
pub use pipeline::{BatchOutcome, Engine, SeriesFailure, SeriesInput, SeriesOutput};
pub use summary::{Completeness, FieldSummary, Statistic, Summary};
pub use warnings::QualityWarning;
