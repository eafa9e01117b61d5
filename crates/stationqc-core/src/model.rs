use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use chrono::NaiveDateTime;
use stationqc_parser::{RawTable, RawValue};
use tracing::debug;

use crate::error::{EngineError, Result};
use crate::timestamp::{format_timestamp, parse_timestamp};
use crate::warnings::QualityWarning;

/// The timestamp of one row: either a parsed, minute-truncated instant or the raw text that
/// failed to parse.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ObservedTime {
    Valid(NaiveDateTime),
    Invalid(String),
}

impl ObservedTime {
    pub fn valid(&self) -> Option<NaiveDateTime> {
        match self {
            ObservedTime::Valid(value) => Some(*value),
            ObservedTime::Invalid(_) => None,
        }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, ObservedTime::Valid(_))
    }
}

impl fmt::Display for ObservedTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObservedTime::Valid(value) => f.write_str(&format_timestamp(*value)),
            ObservedTime::Invalid(raw) => f.write_str(raw),
        }
    }
}

impl From<NaiveDateTime> for ObservedTime {
    fn from(value: NaiveDateTime) -> Self {
        ObservedTime::Valid(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Provenance {
    /// Read from the input; `source_row` is the zero-based position in the input table.
    Observed { source_row: usize },
    /// Inserted by the grid filler to cover a missing tick.
    Synthetic,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub timestamp: ObservedTime,
    /// One value per series field, in field order. `None` means no data.
    pub values: Vec<Option<f64>>,
    pub provenance: Provenance,
}

impl Observation {
    pub fn observed(
        timestamp: impl Into<ObservedTime>,
        values: Vec<Option<f64>>,
        source_row: usize,
    ) -> Self {
        Self {
            timestamp: timestamp.into(),
            values,
            provenance: Provenance::Observed { source_row },
        }
    }

    pub fn synthetic(timestamp: NaiveDateTime, width: usize) -> Self {
        Self {
            timestamp: ObservedTime::Valid(timestamp),
            values: vec![None; width],
            provenance: Provenance::Synthetic,
        }
    }

    pub fn time(&self) -> Option<NaiveDateTime> {
        self.timestamp.valid()
    }

    pub fn is_synthetic(&self) -> bool {
        matches!(self.provenance, Provenance::Synthetic)
    }

    pub fn source_row(&self) -> Option<usize> {
        match self.provenance {
            Provenance::Observed { source_row } => Some(source_row),
            Provenance::Synthetic => None,
        }
    }
}

/// An ordered sequence of observations for one station. All observations share the same
/// field schema.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeries {
    name: String,
    timestamp_column: String,
    fields: Arc<[String]>,
    observations: Vec<Observation>,
}

impl TimeSeries {
    /// Builds a series directly. Fails with [`EngineError::RowWidth`] unless every observation
    /// carries exactly one value per field.
    pub fn new(
        name: impl Into<String>,
        timestamp_column: impl Into<String>,
        fields: Vec<String>,
        observations: Vec<Observation>,
    ) -> Result<Self> {
        let name = name.into();
        if let Some((row, observation)) = observations
            .iter()
            .enumerate()
            .find(|(_, observation)| observation.values.len() != fields.len())
        {
            return Err(EngineError::RowWidth {
                series: name,
                row,
                expected: fields.len(),
                found: observation.values.len(),
            });
        }

        Ok(Self {
            name,
            timestamp_column: timestamp_column.into(),
            fields: fields.into(),
            observations,
        })
    }

    /// Builds a series from plain rows. The declared timestamp column must exist; cells that do
    /// not parse as a timestamp become [`ObservedTime::Invalid`] rather than failing.
    pub fn from_table(
        name: &str,
        table: &RawTable,
        timestamp_column: &str,
        exclude_fields: &[String],
    ) -> Result<(Self, Vec<QualityWarning>)> {
        let ts_idx = table.column_index(timestamp_column).ok_or_else(|| {
            EngineError::MissingTimestampColumn {
                series: name.to_string(),
                column: timestamp_column.to_string(),
                available: table.columns().to_vec(),
            }
        })?;

        let excluded: HashSet<&str> = exclude_fields.iter().map(String::as_str).collect();
        let field_indices: Vec<usize> = table
            .columns()
            .iter()
            .enumerate()
            .filter(|(idx, column)| *idx != ts_idx && !excluded.contains(column.as_str()))
            .map(|(idx, _)| idx)
            .collect();
        let fields: Vec<String> = field_indices
            .iter()
            .map(|idx| table.columns()[*idx].clone())
            .collect();

        let mut non_numeric = vec![0usize; fields.len()];
        let mut observations = Vec::with_capacity(table.height());

        for (row_idx, row) in table.rows().iter().enumerate() {
            let raw_ts = &row[ts_idx];
            let timestamp = match parse_timestamp(raw_ts) {
                Some(parsed) => ObservedTime::Valid(parsed),
                None => ObservedTime::Invalid(raw_ts.to_string()),
            };

            let values = field_indices
                .iter()
                .enumerate()
                .map(|(pos, idx)| match measurement_value(&row[*idx]) {
                    Ok(value) => value,
                    Err(()) => {
                        non_numeric[pos] += 1;
                        None
                    }
                })
                .collect();

            observations.push(Observation::observed(timestamp, values, row_idx));
        }

        let warnings: Vec<QualityWarning> = fields
            .iter()
            .zip(&non_numeric)
            .filter(|(_, count)| **count > 0)
            .map(|(field, count)| QualityWarning::NonNumericValues {
                field: field.clone(),
                count: *count,
            })
            .collect();

        debug!(
            series = name,
            rows = observations.len(),
            fields = fields.len(),
            "built series from table"
        );

        Ok((
            Self::new(name, timestamp_column, fields, observations)?,
            warnings,
        ))
    }

    /// Same name and schema holding `observations`. Stages only hand back rows taken from this
    /// series or built at its width.
    pub(crate) fn with_observations(&self, observations: Vec<Observation>) -> Self {
        Self {
            name: self.name.clone(),
            timestamp_column: self.timestamp_column.clone(),
            fields: Arc::clone(&self.fields),
            observations,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn timestamp_column(&self) -> &str {
        &self.timestamp_column
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn field_index(&self, field: &str) -> Option<usize> {
        self.fields.iter().position(|name| name == field)
    }

    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    pub fn into_observations(self) -> Vec<Observation> {
        self.observations
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    /// Value of `field` in row `row`; `None` for a null cell, an unknown field or row.
    pub fn value(&self, row: usize, field: &str) -> Option<f64> {
        let idx = self.field_index(field)?;
        self.observations.get(row)?.values.get(idx).copied().flatten()
    }

    pub fn timestamps(&self) -> impl Iterator<Item = Option<NaiveDateTime>> + '_ {
        self.observations.iter().map(Observation::time)
    }

    pub fn synthetic_count(&self) -> usize {
        self.observations.iter().filter(|o| o.is_synthetic()).count()
    }

    /// Projects the values of one field, in row order.
    pub fn column(&self, field: &str) -> Option<Vec<Option<f64>>> {
        let idx = self.field_index(field)?;
        Some(self.observations.iter().map(|o| o.values[idx]).collect())
    }
}

fn measurement_value(raw: &RawValue) -> std::result::Result<Option<f64>, ()> {
    match raw {
        RawValue::Null => Ok(None),
        RawValue::Number(value) if value.is_finite() => Ok(Some(*value)),
        RawValue::Number(_) => Ok(None),
        RawValue::Text(text) => match RawValue::from_cell(text) {
            RawValue::Null => Ok(None),
            RawValue::Number(value) => Ok(Some(value)),
            RawValue::Text(_) => Err(()),
        },
    }
}
