use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::gap_fill::SamplingInterval;
use crate::ordering::OutOfOrderPolicy;

/// One year of one-minute ticks.
pub const DEFAULT_MAX_GAP_FILL_ROWS: usize = 525_600;
/// Ten years of one-minute ticks, summed over every gap of one series.
pub const DEFAULT_MAX_SYNTHETIC_ROWS: usize = 5_256_000;
pub const DEFAULT_SUMMARY_PRECISION: u32 = 2;
pub const MAX_SUMMARY_PRECISION: u32 = 12;

fn default_max_gap_fill_rows() -> usize {
    DEFAULT_MAX_GAP_FILL_ROWS
}

fn default_max_synthetic_rows() -> usize {
    DEFAULT_MAX_SYNTHETIC_ROWS
}

fn default_summary_precision() -> u32 {
    DEFAULT_SUMMARY_PRECISION
}

/// Everything the engine needs to regularize a series. `timestamp_column` and
/// `sampling_interval_minutes` are required; the rest have defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EngineConfig {
    pub timestamp_column: String,
    pub sampling_interval_minutes: i64,
    #[serde(default = "default_max_gap_fill_rows")]
    pub max_gap_fill_rows: usize,
    #[serde(default = "default_max_synthetic_rows")]
    pub max_synthetic_rows: usize,
    #[serde(default)]
    pub out_of_order_policy: OutOfOrderPolicy,
    #[serde(default = "default_summary_precision")]
    pub summary_precision: u32,
    #[serde(default)]
    pub exclude_fields: Vec<String>,
}

impl EngineConfig {
    pub fn new(timestamp_column: impl Into<String>, sampling_interval_minutes: i64) -> Self {
        Self {
            timestamp_column: timestamp_column.into(),
            sampling_interval_minutes,
            max_gap_fill_rows: DEFAULT_MAX_GAP_FILL_ROWS,
            max_synthetic_rows: DEFAULT_MAX_SYNTHETIC_ROWS,
            out_of_order_policy: OutOfOrderPolicy::default(),
            summary_precision: DEFAULT_SUMMARY_PRECISION,
            exclude_fields: Vec::new(),
        }
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.timestamp_column.trim().is_empty() {
            return Err(ConfigError::EmptyTimestampColumn);
        }
        if self.max_gap_fill_rows == 0 {
            return Err(ConfigError::ZeroGapCap);
        }
        if self.max_synthetic_rows == 0 {
            return Err(ConfigError::ZeroSyntheticBudget);
        }
        if self.summary_precision > MAX_SUMMARY_PRECISION {
            return Err(ConfigError::Precision {
                value: self.summary_precision,
                max: MAX_SUMMARY_PRECISION,
            });
        }
        self.sampling_interval().map(|_| ())
    }

    pub fn sampling_interval(&self) -> Result<SamplingInterval, ConfigError> {
        SamplingInterval::from_minutes(self.sampling_interval_minutes)
    }
}
