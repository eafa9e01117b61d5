mod common;

use common::{at, series};
use polars::df;
use polars::prelude::*;
use stationqc_core::audit::{aggregate, AuditRecord};
use stationqc_core::model::{Observation, ObservedTime};
use stationqc_core::summary::summarize;
use stationqc_core::tabular::{
    audit_to_dataframe, encode_csv, encode_parquet, series_from_dataframe, series_to_dataframe,
    summary_to_dataframe, REMOVAL_REASON_COLUMN, SOURCE_ROW_COLUMN, STATISTIC_COLUMN,
};
use stationqc_core::{EngineError, GridFiller, RemovalReason, SamplingInterval, TimeSeries};

fn column_names(df: &DataFrame) -> Vec<String> {
    df.get_column_names()
        .iter()
        .map(|name| name.to_string())
        .collect()
}

fn filled() -> TimeSeries {
    let filler = GridFiller::new(SamplingInterval::from_minutes(1).expect("interval"), 100);
    filler.fill(series(&[(0, 1.5), (2, 2.5)])).series
}

#[test]
fn series_frame_puts_timestamp_first() {
    let df = series_to_dataframe(&filled()).expect("frame");

    assert_eq!(column_names(&df), ["time", "temp"]);
    assert_eq!(df.height(), 3);
    assert!(matches!(
        df.column("time").expect("time").dtype(),
        DataType::Datetime(TimeUnit::Microseconds, None)
    ));
    let temp = df
        .column("temp")
        .expect("temp")
        .as_materialized_series()
        .f64()
        .expect("f64");
    assert_eq!(temp.get(0), Some(1.5));
    assert_eq!(temp.get(1), None);
}

#[test]
fn audit_frame_carries_reason_and_source_row() {
    let template = series(&[]);
    let report = aggregate(
        &template,
        vec![AuditRecord::new(
            Observation::observed(at(0), vec![Some(9.0)], 4),
            RemovalReason::DuplicateTimestamp,
        )],
        Vec::new(),
        vec![AuditRecord::new(
            Observation::observed(ObservedTime::Invalid("garbage".into()), vec![None], 7),
            RemovalReason::InvalidTimestamp,
        )],
    );

    let df = audit_to_dataframe(&report).expect("frame");

    assert_eq!(
        column_names(&df),
        ["time", "temp", SOURCE_ROW_COLUMN, REMOVAL_REASON_COLUMN]
    );
    let times = df
        .column("time")
        .expect("time")
        .as_materialized_series()
        .str()
        .expect("str");
    assert_eq!(times.get(0), Some("2024-12-06 00:00:00"));
    assert_eq!(times.get(1), Some("garbage"));
    let reasons = df
        .column(REMOVAL_REASON_COLUMN)
        .expect("reason")
        .as_materialized_series()
        .str()
        .expect("str");
    assert_eq!(reasons.get(0), Some("Duplicate Timestamp"));
    assert_eq!(reasons.get(1), Some("Invalid Timestamp"));
    let rows = df
        .column(SOURCE_ROW_COLUMN)
        .expect("row")
        .as_materialized_series()
        .i64()
        .expect("i64");
    assert_eq!(rows.get(1), Some(7));
}

#[test]
fn summary_frame_has_one_row_per_statistic() {
    let df = summary_to_dataframe(&summarize(&filled(), 2)).expect("frame");

    assert_eq!(column_names(&df), [STATISTIC_COLUMN, "temp"]);
    assert_eq!(df.height(), 9);
    let temp = df
        .column("temp")
        .expect("temp")
        .as_materialized_series()
        .f64()
        .expect("f64");
    assert_eq!(temp.get(0), Some(2.0));
    assert_eq!(temp.get(1), Some(1.0));
    assert_eq!(temp.get(2), Some(2.0));
}

#[test]
fn series_reads_back_from_a_string_frame() {
    let df = df!(
        "time" => ["2024-12-06 00:00:00", "2024-12-06 00:01:30", "bogus"],
        "temp" => [Some(1.0), None, Some(3.0)],
        "rh" => [10i64, 20, 30],
    )
    .expect("frame");

    let series = series_from_dataframe("ajax", &df, "time").expect("series");

    assert_eq!(series.fields(), ["temp", "rh"]);
    assert_eq!(
        series.timestamps().collect::<Vec<_>>(),
        [Some(at(0)), Some(at(1)), None]
    );
    assert_eq!(series.value(2, "rh"), Some(30.0));
    assert_eq!(series.value(1, "temp"), None);
}

#[test]
fn series_reads_back_from_its_own_frame() {
    let original = filled();
    let df = series_to_dataframe(&original).expect("frame");

    let restored = series_from_dataframe("station", &df, "time").expect("series");

    assert_eq!(
        restored.timestamps().collect::<Vec<_>>(),
        original.timestamps().collect::<Vec<_>>()
    );
    assert_eq!(restored.column("temp"), original.column("temp"));
}

#[test]
fn unsupported_timestamp_dtype_is_an_error() {
    let df = df!("time" => [true, false], "temp" => [1.0, 2.0]).expect("frame");

    let err = series_from_dataframe("ajax", &df, "time").expect_err("bool timestamps");
    assert!(matches!(err, EngineError::UnsupportedTimestampType { .. }));

    let err = series_from_dataframe("ajax", &df, "date").expect_err("missing column");
    assert!(matches!(err, EngineError::MissingTimestampColumn { .. }));
}

#[test]
fn csv_output_formats_timestamps() {
    let df = series_to_dataframe(&filled()).expect("frame");

    let bytes = encode_csv(&df).expect("csv");
    let text = String::from_utf8(bytes).expect("utf8");
    let mut lines = text.lines();

    assert_eq!(lines.next(), Some("time,temp"));
    assert_eq!(lines.next(), Some("2024-12-06 00:00:00,1.5"));
    assert_eq!(lines.next(), Some("2024-12-06 00:01:00,"));
}

#[test]
fn parquet_output_is_readable() {
    let df = series_to_dataframe(&filled()).expect("frame");

    let bytes = encode_parquet(&df).expect("parquet");
    assert_eq!(&bytes[..4], b"PAR1");

    let restored = ParquetReader::new(std::io::Cursor::new(bytes))
        .finish()
        .expect("read parquet");
    assert_eq!(restored.shape(), (3, 2));
}
