//! Conversions between regularized results and polars `DataFrame`s, plus byte encoders for the
//! tabular outputs. Nothing here touches the filesystem.

use std::io::Cursor;

use polars::io::parquet::write::{ParquetCompression, ParquetWriter, StatisticsOptions};
use polars::prelude::*;

use crate::audit::AuditReport;
use crate::error::{EngineError, Result};
use crate::model::{Observation, ObservedTime, TimeSeries};
use crate::summary::{Statistic, Summary};
use crate::timestamp::{naive_from_micros, naive_to_micros, parse_text, truncate_to_minute};

pub const REMOVAL_REASON_COLUMN: &str = "removal_reason";
pub const SOURCE_ROW_COLUMN: &str = "source_row";
pub const STATISTIC_COLUMN: &str = "statistic";
pub const CSV_DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Timestamp column first as a naive microsecond datetime, then one `f64` column per field.
pub fn series_to_dataframe(series: &TimeSeries) -> PolarsResult<DataFrame> {
    let micros: Vec<Option<i64>> = series
        .timestamps()
        .map(|ts| ts.map(naive_to_micros))
        .collect();
    let ts_series = Series::new(series.timestamp_column().into(), micros)
        .cast(&DataType::Datetime(TimeUnit::Microseconds, None))?;

    let mut columns: Vec<Column> = Vec::with_capacity(series.fields().len() + 1);
    columns.push(ts_series.into());
    columns.extend(field_columns(series.fields(), series.observations()));

    DataFrame::new(columns)
}

/// The audit trail with the original timestamp text, field values, input row and reason.
pub fn audit_to_dataframe(report: &AuditReport) -> PolarsResult<DataFrame> {
    let observations: Vec<Observation> = report
        .records()
        .iter()
        .map(|record| record.observation.clone())
        .collect();

    let timestamps: Vec<String> = observations
        .iter()
        .map(|o| o.timestamp.to_string())
        .collect();
    let source_rows: Vec<Option<i64>> = observations
        .iter()
        .map(|o| o.source_row().map(|row| row as i64))
        .collect();
    let reasons: Vec<&str> = report
        .records()
        .iter()
        .map(|record| record.removal_reason.as_str())
        .collect();

    let mut columns: Vec<Column> = Vec::with_capacity(report.fields().len() + 3);
    columns.push(Series::new(report.timestamp_column().into(), timestamps).into());
    columns.extend(field_columns(report.fields(), &observations));
    columns.push(Series::new(SOURCE_ROW_COLUMN.into(), source_rows).into());
    columns.push(Series::new(REMOVAL_REASON_COLUMN.into(), reasons).into());

    DataFrame::new(columns)
}

/// One row per statistic, one column per field.
pub fn summary_to_dataframe(summary: &Summary) -> PolarsResult<DataFrame> {
    let labels: Vec<&str> = Statistic::ALL.iter().map(|stat| stat.label()).collect();

    let mut columns: Vec<Column> = Vec::with_capacity(summary.fields.len() + 1);
    columns.push(Series::new(STATISTIC_COLUMN.into(), labels).into());
    for field in &summary.fields {
        let values: Vec<Option<f64>> = Statistic::ALL.iter().map(|stat| field.get(*stat)).collect();
        columns.push(Series::new(field.field.as_str().into(), values).into());
    }

    DataFrame::new(columns)
}

fn field_columns(fields: &[String], observations: &[Observation]) -> Vec<Column> {
    fields
        .iter()
        .enumerate()
        .map(|(idx, field)| {
            let values: Vec<Option<f64>> = observations.iter().map(|o| o.values[idx]).collect();
            Series::new(field.as_str().into(), values).into()
        })
        .collect()
}

/// Reads a series back from a frame. Accepts datetime or string timestamp columns; every other
/// column is cast to `f64`, with unparseable values becoming null.
pub fn series_from_dataframe(
    name: &str,
    df: &DataFrame,
    timestamp_column: &str,
) -> Result<TimeSeries> {
    let ts_column = df
        .column(timestamp_column)
        .map_err(|_| EngineError::MissingTimestampColumn {
            series: name.to_string(),
            column: timestamp_column.to_string(),
            available: df
                .get_column_names()
                .iter()
                .map(|column| column.to_string())
                .collect(),
        })?;

    let height = df.height();
    let timestamps: Vec<ObservedTime> = match ts_column.dtype() {
        DataType::Datetime(unit, _) => {
            let physical = ts_column.cast(&DataType::Int64)?;
            let values = physical.as_materialized_series().i64()?;
            (0..height)
                .map(|idx| {
                    values
                        .get(idx)
                        .and_then(|raw| naive_from_micros(to_micros(raw, *unit)))
                        .map(|dt| ObservedTime::Valid(truncate_to_minute(dt)))
                        .unwrap_or_else(|| ObservedTime::Invalid(String::new()))
                })
                .collect()
        }
        DataType::String => {
            let values = ts_column.as_materialized_series().str()?;
            (0..height)
                .map(|idx| match values.get(idx) {
                    Some(text) => parse_text(text)
                        .map(|dt| ObservedTime::Valid(truncate_to_minute(dt)))
                        .unwrap_or_else(|| ObservedTime::Invalid(text.to_string())),
                    None => ObservedTime::Invalid(String::new()),
                })
                .collect()
        }
        other => {
            return Err(EngineError::UnsupportedTimestampType {
                series: name.to_string(),
                column: timestamp_column.to_string(),
                dtype: other.to_string(),
            })
        }
    };

    let mut fields = Vec::new();
    let mut field_values: Vec<Vec<Option<f64>>> = Vec::new();
    for column in df.get_columns() {
        if column.name().as_str() == timestamp_column {
            continue;
        }
        let cast = column.cast(&DataType::Float64)?;
        let values = cast.as_materialized_series().f64()?;
        fields.push(column.name().to_string());
        field_values.push((0..height).map(|idx| values.get(idx)).collect());
    }

    let observations = timestamps
        .into_iter()
        .enumerate()
        .map(|(row, timestamp)| {
            let values = field_values.iter().map(|column| column[row]).collect();
            Observation::observed(timestamp, values, row)
        })
        .collect();

    TimeSeries::new(name, timestamp_column, fields, observations)
}

fn to_micros(value: i64, unit: TimeUnit) -> i64 {
    match unit {
        TimeUnit::Nanoseconds => value.div_euclid(1_000),
        TimeUnit::Microseconds => value,
        TimeUnit::Milliseconds => value.saturating_mul(1_000),
    }
}

pub fn encode_csv(df: &DataFrame) -> PolarsResult<Vec<u8>> {
    let mut buffer = Vec::new();
    let mut clone = df.clone();
    CsvWriter::new(&mut buffer)
        .include_header(true)
        .with_datetime_format(Some(CSV_DATETIME_FORMAT.to_string()))
        .finish(&mut clone)?;
    Ok(buffer)
}

pub fn encode_parquet(df: &DataFrame) -> PolarsResult<Vec<u8>> {
    let mut buffer = Vec::new();
    {
        let mut cursor = Cursor::new(&mut buffer);
        let mut clone = df.clone();
        ParquetWriter::new(&mut cursor)
            .with_compression(ParquetCompression::Zstd(None))
            .with_statistics(StatisticsOptions::default())
            .finish(&mut clone)?;
    }
    Ok(buffer)
}
