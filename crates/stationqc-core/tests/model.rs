use chrono::NaiveDateTime;
use stationqc_core::model::{Observation, ObservedTime, Provenance, TimeSeries};
use stationqc_core::timestamp::{parse_text, parse_timestamp};
use stationqc_core::{EngineError, QualityWarning};
use stationqc_parser::{RawTable, RawValue};

fn parse_naive(ts: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(ts, "%Y-%m-%d %H:%M:%S").expect("parse timestamp")
}

fn table(columns: &[&str], rows: Vec<Vec<RawValue>>) -> RawTable {
    RawTable::with_rows(columns.iter().map(|c| c.to_string()).collect(), rows).expect("table")
}

#[test]
fn missing_timestamp_column_is_a_schema_error() {
    let raw = table(&["date", "bt1"], vec![vec!["2024-01-01 00:00:00".into(), 1.0.into()]]);

    let err = TimeSeries::from_table("ajax", &raw, "time", &[]).expect_err("schema error");
    match err {
        EngineError::MissingTimestampColumn {
            series,
            column,
            available,
        } => {
            assert_eq!(series, "ajax");
            assert_eq!(column, "time");
            assert_eq!(available, ["date", "bt1"]);
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn rows_must_match_the_field_schema() {
    let t0 = parse_naive("2024-01-01 00:00:00");
    let t1 = parse_naive("2024-01-01 00:01:00");
    let fields = vec!["temp".to_string(), "rain".to_string()];

    let err = TimeSeries::new(
        "ajax",
        "time",
        fields.clone(),
        vec![
            Observation::observed(t0, vec![Some(1.0), None], 0),
            Observation::observed(t1, vec![Some(2.0)], 1),
        ],
    )
    .expect_err("short row");
    assert!(matches!(
        err,
        EngineError::RowWidth { row: 1, expected: 2, found: 1, .. }
    ));

    let err = TimeSeries::new(
        "ajax",
        "time",
        fields.clone(),
        vec![Observation::observed(t0, vec![Some(1.0), None, Some(3.0)], 0)],
    )
    .expect_err("long row");
    assert!(matches!(err, EngineError::RowWidth { row: 0, found: 3, .. }));

    let series = TimeSeries::new(
        "ajax",
        "time",
        fields,
        vec![Observation::synthetic(t0, 2)],
    )
    .expect("matching widths");
    assert_eq!(series.column("rain"), Some(vec![None]));
}

#[test]
fn unparseable_timestamps_are_kept_as_invalid() {
    let raw = table(
        &["time", "bt1"],
        vec![
            vec!["2024-01-01 00:00:00".into(), 1.0.into()],
            vec!["garbage".into(), 2.0.into()],
            vec![RawValue::Null, 3.0.into()],
        ],
    );

    let (series, warnings) = TimeSeries::from_table("s", &raw, "time", &[]).expect("series");
    assert!(warnings.is_empty());
    assert_eq!(series.len(), 3);

    let obs = series.observations();
    assert_eq!(obs[0].timestamp, ObservedTime::Valid(parse_naive("2024-01-01 00:00:00")));
    assert_eq!(obs[1].timestamp, ObservedTime::Invalid("garbage".into()));
    assert_eq!(obs[2].timestamp, ObservedTime::Invalid(String::new()));
    assert_eq!(obs[1].provenance, Provenance::Observed { source_row: 1 });
}

#[test]
fn sub_minute_components_are_truncated() {
    let raw = table(
        &["time", "v"],
        vec![
            vec!["2024-01-01 00:00:59.900".into(), 1.0.into()],
            vec!["2024-01-01T00:01:30".into(), 2.0.into()],
        ],
    );

    let (series, _) = TimeSeries::from_table("s", &raw, "time", &[]).expect("series");
    let times: Vec<_> = series.timestamps().collect();
    assert_eq!(
        times,
        [
            Some(parse_naive("2024-01-01 00:00:00")),
            Some(parse_naive("2024-01-01 00:01:00")),
        ]
    );
}

#[test]
fn field_order_is_preserved_without_timestamp_and_exclusions() {
    let raw = table(
        &["bcs", "time", "bt1", "hth", "bp1"],
        vec![vec![
            1.0.into(),
            "2024-01-01 00:00".into(),
            2.0.into(),
            3.0.into(),
            4.0.into(),
        ]],
    );

    let exclude = vec!["bcs".to_string(), "hth".to_string()];
    let (series, _) = TimeSeries::from_table("s", &raw, "time", &exclude).expect("series");
    assert_eq!(series.fields(), ["bt1", "bp1"]);
    assert_eq!(series.value(0, "bp1"), Some(4.0));
    assert_eq!(series.value(0, "bcs"), None);
}

#[test]
fn non_numeric_measurements_become_null_with_a_warning() {
    let raw = table(
        &["time", "wd", "ws"],
        vec![
            vec!["2024-01-01 00:00".into(), "NNE".into(), "3.5".into()],
            vec!["2024-01-01 00:01".into(), "N".into(), "nan".into()],
        ],
    );

    let (series, warnings) = TimeSeries::from_table("s", &raw, "time", &[]).expect("series");
    assert_eq!(series.column("wd"), Some(vec![None, None]));
    assert_eq!(series.column("ws"), Some(vec![Some(3.5), None]));
    assert_eq!(
        warnings,
        [QualityWarning::NonNumericValues {
            field: "wd".into(),
            count: 2,
        }]
    );
}

#[test]
fn timestamp_parsing_accepts_common_station_formats() {
    let expected = parse_naive("2024-12-06 13:45:00");
    for text in [
        "2024-12-06 13:45:00",
        "2024-12-06T13:45:00",
        "2024-12-06 13:45",
        "2024/12/06 13:45:00",
        "12/06/2024 13:45",
        "2024-12-06T13:45:00Z",
        "2024-12-06T15:45:00+02:00",
    ] {
        assert_eq!(parse_text(text), Some(expected), "format {text}");
    }

    assert_eq!(
        parse_timestamp(&RawValue::Number(1_733_492_700.0)),
        Some(expected)
    );
    assert_eq!(parse_timestamp(&RawValue::Number(f64::NAN)), None);
    assert_eq!(parse_text("13:45 yesterday"), None);
}
