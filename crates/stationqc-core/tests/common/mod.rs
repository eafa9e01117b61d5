#![allow(dead_code)]

use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
use stationqc_core::model::{Observation, ObservedTime, TimeSeries};

pub fn base() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 12, 6)
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .expect("base timestamp")
}

/// `base()` shifted by `minutes`.
pub fn at(minutes: i64) -> NaiveDateTime {
    base() + TimeDelta::minutes(minutes)
}

/// A single-field series named "station" whose rows are `(minute offset, value)` pairs.
pub fn series(rows: &[(i64, f64)]) -> TimeSeries {
    let observations = rows
        .iter()
        .enumerate()
        .map(|(idx, (minute, value))| Observation::observed(at(*minute), vec![Some(*value)], idx))
        .collect();
    TimeSeries::new("station", "time", vec!["temp".to_string()], observations).expect("series")
}

/// Like `series` but lets individual rows carry an unparseable timestamp.
pub fn series_with_invalid(rows: &[(Option<i64>, f64)]) -> TimeSeries {
    let observations = rows
        .iter()
        .enumerate()
        .map(|(idx, (minute, value))| {
            let timestamp = match minute {
                Some(minute) => ObservedTime::Valid(at(*minute)),
                None => ObservedTime::Invalid(format!("bad-{idx}")),
            };
            Observation::observed(timestamp, vec![Some(*value)], idx)
        })
        .collect();
    TimeSeries::new("station", "time", vec!["temp".to_string()], observations).expect("series")
}

pub fn minutes_of(series: &TimeSeries) -> Vec<Option<i64>> {
    series
        .timestamps()
        .map(|ts| ts.map(|ts| (ts - base()).num_minutes()))
        .collect()
}

pub fn values_of(series: &TimeSeries) -> Vec<Option<f64>> {
    series.column("temp").expect("temp column")
}
