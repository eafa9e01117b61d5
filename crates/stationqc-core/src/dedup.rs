use std::collections::HashSet;

use chrono::NaiveDateTime;
use tracing::debug;

use crate::audit::{AuditRecord, RemovalReason};
use crate::model::TimeSeries;

#[derive(Debug, Clone)]
pub struct Deduplicated {
    pub clean: TimeSeries,
    pub duplicates: Vec<AuditRecord>,
}

/// Keeps the first row seen for every timestamp and moves later rows to the audit trail.
/// Input order is preserved. Rows with invalid timestamps are never treated as duplicates.
pub fn deduplicate(series: TimeSeries) -> Deduplicated {
    let template = series.with_observations(Vec::new());
    let mut seen: HashSet<NaiveDateTime> = HashSet::with_capacity(series.len());
    let mut kept = Vec::with_capacity(series.len());
    let mut duplicates = Vec::new();

    for observation in series.into_observations() {
        match observation.time() {
            Some(ts) if !seen.insert(ts) => {
                duplicates.push(AuditRecord::new(
                    observation,
                    RemovalReason::DuplicateTimestamp,
                ));
            }
            _ => kept.push(observation),
        }
    }

    debug!(
        series = template.name(),
        kept = kept.len(),
        duplicates = duplicates.len(),
        "deduplicated timestamps"
    );

    Deduplicated {
        clean: template.with_observations(kept),
        duplicates,
    }
}
