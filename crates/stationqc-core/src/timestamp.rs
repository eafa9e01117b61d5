use chrono::{DateTime, NaiveDate, NaiveDateTime, Timelike, Utc};
use stationqc_parser::RawValue;

static NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

static OFFSET_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%z", "%Y-%m-%d %H:%M:%S%.f%z"];

/// Parses a raw cell into a minute-truncated point in time. Offsets are normalized to UTC and
/// numbers are read as Unix epoch seconds. Returns `None` for anything unparseable.
pub fn parse_timestamp(value: &RawValue) -> Option<NaiveDateTime> {
    let parsed = match value {
        RawValue::Null => None,
        RawValue::Number(seconds) => from_epoch_seconds(*seconds),
        RawValue::Text(text) => parse_text(text),
    }?;
    Some(truncate_to_minute(parsed))
}

pub fn parse_text(value: &str) -> Option<NaiveDateTime> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }

    for fmt in NAIVE_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, fmt) {
            return Some(dt);
        }
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.with_timezone(&Utc).naive_utc());
    }

    for fmt in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(trimmed, fmt) {
            return Some(dt.with_timezone(&Utc).naive_utc());
        }
    }

    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
}

fn from_epoch_seconds(value: f64) -> Option<NaiveDateTime> {
    if !value.is_finite() {
        return None;
    }
    let micros = (value * 1_000_000.0).round();
    if micros.abs() > i64::MAX as f64 {
        return None;
    }
    DateTime::<Utc>::from_timestamp_micros(micros as i64).map(|dt| dt.naive_utc())
}

/// Drops seconds and sub-second components.
pub fn truncate_to_minute(value: NaiveDateTime) -> NaiveDateTime {
    value
        .with_second(0)
        .and_then(|dt| dt.with_nanosecond(0))
        .unwrap_or(value)
}

pub fn naive_to_micros(value: NaiveDateTime) -> i64 {
    value.and_utc().timestamp_micros()
}

pub fn naive_from_micros(value: i64) -> Option<NaiveDateTime> {
    DateTime::<Utc>::from_timestamp_micros(value).map(|dt| dt.naive_utc())
}

pub fn format_timestamp(value: NaiveDateTime) -> String {
    value.format("%Y-%m-%d %H:%M:%S").to_string()
}
