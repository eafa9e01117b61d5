use std::borrow::Cow;

use chrono::{NaiveDateTime, TimeDelta};
use tracing::debug;

use crate::audit::{AuditRecord, RemovalReason};
use crate::error::ConfigError;
use crate::model::{Observation, Provenance, TimeSeries};
use crate::timestamp::truncate_to_minute;
use crate::warnings::QualityWarning;

/// Expected spacing between consecutive observations. Always a positive whole number of
/// minutes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SamplingInterval(TimeDelta);

impl SamplingInterval {
    pub fn from_minutes(minutes: i64) -> Result<Self, ConfigError> {
        if minutes <= 0 {
            return Err(ConfigError::NonPositiveInterval(minutes));
        }
        TimeDelta::try_minutes(minutes)
            .map(Self)
            .ok_or(ConfigError::IntervalOutOfRange(minutes))
    }

    pub fn new(duration: TimeDelta) -> Result<Self, ConfigError> {
        if duration <= TimeDelta::zero() {
            return Err(ConfigError::NonPositiveInterval(duration.num_minutes()));
        }
        if duration.subsec_nanos() != 0 || duration.num_seconds() % 60 != 0 {
            return Err(ConfigError::SubMinuteInterval(duration.num_seconds()));
        }
        Ok(Self(duration))
    }

    pub fn duration(&self) -> TimeDelta {
        self.0
    }

    pub fn minutes(&self) -> i64 {
        self.0.num_minutes()
    }
}

/// Number of synthetic rows needed strictly between `start` and `end`.
pub fn missing_ticks(start: NaiveDateTime, end: NaiveDateTime, interval: SamplingInterval) -> u64 {
    let diff = end - start;
    if diff <= interval.0 {
        return 0;
    }
    let diff_s = diff.num_seconds();
    let step_s = interval.0.num_seconds();
    ((diff_s + step_s - 1) / step_s - 1) as u64
}

/// A position in the filled grid: either the index of a real row or a missing tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridSlot {
    Observed(usize),
    Synthetic(NaiveDateTime),
}

/// Lazily walks sorted timestamps, yielding every real row and every missing tick between
/// them. A gap needing more than `cap` ticks, or more than what is left of the series
/// `budget`, is skipped and recorded instead. Gaps draw on the budget in time order.
#[derive(Debug, Clone)]
pub struct GridSlots {
    times: Vec<NaiveDateTime>,
    interval: SamplingInterval,
    cap: usize,
    budget: usize,
    position: usize,
    cursor: Option<(NaiveDateTime, NaiveDateTime)>,
    unfilled: Vec<QualityWarning>,
}

impl GridSlots {
    pub fn new(times: Vec<NaiveDateTime>, interval: SamplingInterval, cap: usize) -> Self {
        Self {
            times,
            interval,
            cap,
            budget: usize::MAX,
            position: 0,
            cursor: None,
            unfilled: Vec::new(),
        }
    }

    /// Limits the synthetic rows generated over the whole walk.
    pub fn with_budget(mut self, budget: usize) -> Self {
        self.budget = budget;
        self
    }

    /// Synthetic rows still allowed.
    pub fn remaining_budget(&self) -> usize {
        self.budget
    }

    /// Gaps left unfilled so far because they exceeded the cap or the budget.
    pub fn unfilled(&self) -> &[QualityWarning] {
        &self.unfilled
    }

    pub fn into_unfilled(self) -> Vec<QualityWarning> {
        self.unfilled
    }

    fn next_tick(&mut self) -> Option<NaiveDateTime> {
        let (current, target) = self.cursor?;
        if target - current > self.interval.0 {
            if let Some(advanced) = current.checked_add_signed(self.interval.0) {
                let tick = truncate_to_minute(advanced);
                self.cursor = Some((tick, target));
                return Some(tick);
            }
        }
        self.cursor = None;
        None
    }
}

impl Iterator for GridSlots {
    type Item = GridSlot;

    fn next(&mut self) -> Option<GridSlot> {
        if let Some(tick) = self.next_tick() {
            return Some(GridSlot::Synthetic(tick));
        }

        let idx = self.position;
        let current = *self.times.get(idx)?;
        self.position += 1;

        if let Some(&next) = self.times.get(self.position) {
            let missing = missing_ticks(current, next, self.interval);
            if missing > self.cap as u64 {
                self.unfilled.push(QualityWarning::UnboundedGap {
                    start: current,
                    end: next,
                    missing_ticks: missing,
                    cap: self.cap,
                });
            } else if missing > self.budget as u64 {
                self.unfilled.push(QualityWarning::SyntheticBudgetExhausted {
                    start: current,
                    end: next,
                    missing_ticks: missing,
                    remaining: self.budget,
                });
            } else if missing > 0 {
                // missing <= budget, which is a usize
                self.budget -= missing as usize;
                self.cursor = Some((current, next));
            }
        }

        Some(GridSlot::Observed(idx))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.times.len() - self.position, None)
    }
}

/// Streams a filled view of a borrowed series without materializing synthetic rows up front.
pub struct GridFill<'a> {
    observations: Vec<&'a Observation>,
    slots: GridSlots,
    width: usize,
}

impl<'a> GridFill<'a> {
    pub fn unfilled(&self) -> &[QualityWarning] {
        self.slots.unfilled()
    }
}

impl<'a> Iterator for GridFill<'a> {
    type Item = Cow<'a, Observation>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.slots.next()? {
            GridSlot::Observed(idx) => Some(Cow::Borrowed(self.observations[idx])),
            GridSlot::Synthetic(ts) => Some(Cow::Owned(Observation::synthetic(ts, self.width))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct GapFilled {
    pub series: TimeSeries,
    pub invalid: Vec<AuditRecord>,
    pub synthetic_rows: usize,
    pub warnings: Vec<QualityWarning>,
}

#[derive(Debug, Clone, Copy)]
pub struct GridFiller {
    interval: SamplingInterval,
    max_gap_fill_rows: usize,
    max_synthetic_rows: usize,
}

impl GridFiller {
    /// `max_gap_fill_rows` bounds a single gap. The per-series total is unbounded until
    /// [`GridFiller::with_max_synthetic_rows`] sets it.
    pub fn new(interval: SamplingInterval, max_gap_fill_rows: usize) -> Self {
        Self {
            interval,
            max_gap_fill_rows,
            max_synthetic_rows: usize::MAX,
        }
    }

    pub fn with_max_synthetic_rows(mut self, max_synthetic_rows: usize) -> Self {
        self.max_synthetic_rows = max_synthetic_rows;
        self
    }

    fn slots(&self, times: Vec<NaiveDateTime>) -> GridSlots {
        GridSlots::new(times, self.interval, self.max_gap_fill_rows)
            .with_budget(self.max_synthetic_rows)
    }

    pub fn interval(&self) -> SamplingInterval {
        self.interval
    }

    /// Excludes invalid timestamps, then inserts an all-null row at every missing tick.
    pub fn fill(&self, series: TimeSeries) -> GapFilled {
        let template = series.with_observations(Vec::new());
        let width = template.fields().len();

        let (mut valid, invalid): (Vec<Observation>, Vec<Observation>) = series
            .into_observations()
            .into_iter()
            .partition(|observation| observation.timestamp.is_valid());
        valid.sort_by_key(Observation::time);

        let times: Vec<NaiveDateTime> = valid.iter().filter_map(Observation::time).collect();
        let mut slots = self.slots(times);
        let mut real = valid.into_iter();
        let mut filled = Vec::new();
        let mut synthetic_rows = 0usize;

        for slot in slots.by_ref() {
            match slot {
                GridSlot::Observed(_) => filled.extend(real.next()),
                GridSlot::Synthetic(ts) => {
                    filled.push(Observation::synthetic(ts, width));
                    synthetic_rows += 1;
                }
            }
        }

        let mut warnings = Vec::new();
        if !invalid.is_empty() {
            warnings.push(QualityWarning::InvalidTimestamps {
                count: invalid.len(),
            });
        }
        warnings.extend(slots.into_unfilled());

        let series = template.with_observations(filled);
        warnings.extend(empty_column_warnings(&series));

        debug!(
            series = series.name(),
            rows = series.len(),
            synthetic_rows,
            invalid = invalid.len(),
            interval_minutes = self.interval.minutes(),
            "filled cadence gaps"
        );

        GapFilled {
            series,
            invalid: invalid
                .into_iter()
                .map(|observation| AuditRecord::new(observation, RemovalReason::InvalidTimestamp))
                .collect(),
            synthetic_rows,
            warnings,
        }
    }

    /// Lazily yields the filled series. Rows with invalid timestamps are skipped.
    pub fn stream<'a>(&self, series: &'a TimeSeries) -> GridFill<'a> {
        let mut observations: Vec<&'a Observation> = series
            .observations()
            .iter()
            .filter(|observation| observation.timestamp.is_valid())
            .collect();
        observations.sort_by_key(|observation| observation.time());
        let times = observations.iter().filter_map(|o| o.time()).collect();

        GridFill {
            observations,
            slots: self.slots(times),
            width: series.fields().len(),
        }
    }
}

/// Fields that are null in every real row. Silent for a series without real rows.
pub fn empty_column_warnings(series: &TimeSeries) -> Vec<QualityWarning> {
    let observed: Vec<&Observation> = series
        .observations()
        .iter()
        .filter(|o| matches!(o.provenance, Provenance::Observed { .. }))
        .collect();
    if observed.is_empty() {
        return Vec::new();
    }

    series
        .fields()
        .iter()
        .enumerate()
        .filter(|(idx, _)| observed.iter().all(|o| o.values[*idx].is_none()))
        .map(|(_, field)| QualityWarning::EmptyColumn {
            field: field.clone(),
        })
        .collect()
}
