use serde::Serialize;

use crate::model::TimeSeries;

/// Rows of the summary table, in output order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Statistic {
    Count,
    NullCount,
    Mean,
    Std,
    Min,
    P25,
    Median,
    P75,
    Max,
}

impl Statistic {
    pub const ALL: [Statistic; 9] = [
        Statistic::Count,
        Statistic::NullCount,
        Statistic::Mean,
        Statistic::Std,
        Statistic::Min,
        Statistic::P25,
        Statistic::Median,
        Statistic::P75,
        Statistic::Max,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Statistic::Count => "count",
            Statistic::NullCount => "null_count",
            Statistic::Mean => "mean",
            Statistic::Std => "std",
            Statistic::Min => "min",
            Statistic::P25 => "25%",
            Statistic::Median => "50%",
            Statistic::P75 => "75%",
            Statistic::Max => "max",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldSummary {
    pub field: String,
    pub count: usize,
    pub null_count: usize,
    pub mean: Option<f64>,
    pub std: Option<f64>,
    pub min: Option<f64>,
    pub p25: Option<f64>,
    pub median: Option<f64>,
    pub p75: Option<f64>,
    pub max: Option<f64>,
}

impl FieldSummary {
    pub fn get(&self, statistic: Statistic) -> Option<f64> {
        match statistic {
            Statistic::Count => Some(self.count as f64),
            Statistic::NullCount => Some(self.null_count as f64),
            Statistic::Mean => self.mean,
            Statistic::Std => self.std,
            Statistic::Min => self.min,
            Statistic::P25 => self.p25,
            Statistic::Median => self.median,
            Statistic::P75 => self.p75,
            Statistic::Max => self.max,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub precision: u32,
    pub fields: Vec<FieldSummary>,
}

impl Summary {
    pub fn field(&self, name: &str) -> Option<&FieldSummary> {
        self.fields.iter().find(|summary| summary.field == name)
    }
}

/// Descriptive statistics for every field of `series`, rounded to `precision` decimals.
pub fn summarize(series: &TimeSeries, precision: u32) -> Summary {
    let fields = series
        .fields()
        .iter()
        .enumerate()
        .map(|(idx, field)| {
            let mut values: Vec<f64> = series
                .observations()
                .iter()
                .filter_map(|o| o.values[idx])
                .collect();
            values.sort_by(f64::total_cmp);
            summarize_values(field, &values, series.len() - values.len(), precision)
        })
        .collect();

    Summary { precision, fields }
}

fn summarize_values(
    field: &str,
    sorted: &[f64],
    null_count: usize,
    precision: u32,
) -> FieldSummary {
    let count = sorted.len();
    let mean = (count > 0).then(|| sorted.iter().sum::<f64>() / count as f64);
    let std = match (mean, count) {
        (Some(mean), n) if n > 1 => {
            let sum_sq: f64 = sorted.iter().map(|v| (v - mean).powi(2)).sum();
            Some((sum_sq / (n - 1) as f64).sqrt())
        }
        _ => None,
    };
    let round = |value: Option<f64>| value.map(|v| round_to(v, precision));

    FieldSummary {
        field: field.to_string(),
        count,
        null_count,
        mean: round(mean),
        std: round(std),
        min: round(sorted.first().copied()),
        p25: round(quantile(sorted, 0.25)),
        median: round(quantile(sorted, 0.5)),
        p75: round(quantile(sorted, 0.75)),
        max: round(sorted.last().copied()),
    }
}

/// Linear-interpolated quantile of already sorted values.
pub fn quantile(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let position = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let weight = position - lower as f64;
    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * weight)
}

pub fn round_to(value: f64, precision: u32) -> f64 {
    let factor = 10f64.powi(precision as i32);
    (value * factor).round() / factor
}

/// Row accounting for one regularized series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Completeness {
    pub input_rows: usize,
    pub duplicates: usize,
    pub out_of_order: usize,
    pub invalid: usize,
    pub synthetic: usize,
    pub output_rows: usize,
    /// Share of output rows backed by a real observation; `None` for an empty output.
    pub uptime: Option<f64>,
}

impl Completeness {
    pub fn new(
        input_rows: usize,
        duplicates: usize,
        out_of_order: usize,
        invalid: usize,
        series: &TimeSeries,
    ) -> Self {
        let output_rows = series.len();
        let synthetic = series.synthetic_count();
        let uptime =
            (output_rows > 0).then(|| (output_rows - synthetic) as f64 / output_rows as f64);

        Self {
            input_rows,
            duplicates,
            out_of_order,
            invalid,
            synthetic,
            output_rows,
            uptime,
        }
    }
}
