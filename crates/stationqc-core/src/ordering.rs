use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::audit::{AuditRecord, RemovalReason};
use crate::model::TimeSeries;

/// What happens to a row whose timestamp is earlier than the row before it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutOfOrderPolicy {
    /// Remove the row from the series. It only survives in the audit trail.
    #[default]
    Drop,
    /// Keep the row at its sorted position. It is still reported in the audit trail.
    Reinsert,
}

#[derive(Debug, Clone)]
pub struct Ordered {
    pub sorted: TimeSeries,
    pub out_of_order: Vec<AuditRecord>,
}

/// Flags every row whose timestamp is strictly less than the immediately preceding row's,
/// then sorts what remains ascending. Invalid timestamps compare as unordered: they are never
/// flagged, the row after one is never flagged, and they sort to the end.
pub fn correct_order(series: TimeSeries, policy: OutOfOrderPolicy) -> Ordered {
    let template = series.with_observations(Vec::new());
    let mut kept = Vec::with_capacity(series.len());
    let mut out_of_order = Vec::new();
    let mut previous: Option<NaiveDateTime> = None;

    for observation in series.into_observations() {
        let current = observation.time();
        let flagged = matches!((previous, current), (Some(prev), Some(ts)) if ts < prev);
        previous = current;

        if !flagged {
            kept.push(observation);
            continue;
        }

        if policy == OutOfOrderPolicy::Reinsert {
            kept.push(observation.clone());
        }
        out_of_order.push(AuditRecord::new(
            observation,
            RemovalReason::OutOfOrderTimestamp,
        ));
    }

    kept.sort_by_key(|observation| {
        let ts = observation.time();
        (ts.is_none(), ts)
    });

    debug!(
        series = template.name(),
        kept = kept.len(),
        out_of_order = out_of_order.len(),
        ?policy,
        "corrected timestamp order"
    );

    Ordered {
        sorted: template.with_observations(kept),
        out_of_order,
    }
}
