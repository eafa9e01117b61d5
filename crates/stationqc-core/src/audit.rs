use std::fmt;

use serde::{Deserialize, Serialize};

use crate::model::{Observation, TimeSeries};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemovalReason {
    DuplicateTimestamp,
    OutOfOrderTimestamp,
    InvalidTimestamp,
}

impl RemovalReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            RemovalReason::DuplicateTimestamp => "Duplicate Timestamp",
            RemovalReason::OutOfOrderTimestamp => "Out Of Order Timestamp",
            RemovalReason::InvalidTimestamp => "Invalid Timestamp",
        }
    }
}

impl fmt::Display for RemovalReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A row taken out of (or flagged in) a series, with the reason it was excluded.
#[derive(Debug, Clone, PartialEq)]
pub struct AuditRecord {
    pub observation: Observation,
    pub removal_reason: RemovalReason,
}

impl AuditRecord {
    pub fn new(observation: Observation, removal_reason: RemovalReason) -> Self {
        Self {
            observation,
            removal_reason,
        }
    }
}

/// Lineage report for one series: every duplicate, out-of-order and invalid-timestamp row.
#[derive(Debug, Clone, PartialEq)]
pub struct AuditReport {
    timestamp_column: String,
    fields: Vec<String>,
    records: Vec<AuditRecord>,
}

impl AuditReport {
    pub fn timestamp_column(&self) -> &str {
        &self.timestamp_column
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn records(&self) -> &[AuditRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn count(&self, reason: RemovalReason) -> usize {
        self.records
            .iter()
            .filter(|record| record.removal_reason == reason)
            .count()
    }
}

/// Concatenates duplicates, out-of-order and invalid-timestamp records in that order.
pub fn aggregate(
    series: &TimeSeries,
    duplicates: Vec<AuditRecord>,
    out_of_order: Vec<AuditRecord>,
    invalid: Vec<AuditRecord>,
) -> AuditReport {
    let mut records = Vec::with_capacity(duplicates.len() + out_of_order.len() + invalid.len());
    records.extend(duplicates);
    records.extend(out_of_order);
    records.extend(invalid);

    AuditReport {
        timestamp_column: series.timestamp_column().to_string(),
        fields: series.fields().to_vec(),
        records,
    }
}
