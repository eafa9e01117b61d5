use std::any::Any;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};

#[cfg(feature = "runtime")]
use std::sync::Arc;

use stationqc_parser::RawTable;
use tracing::{info, warn};

use crate::audit::{self, AuditReport};
use crate::config::EngineConfig;
use crate::dedup::deduplicate;
use crate::error::{ConfigError, EngineError, Result};
use crate::gap_fill::GridFiller;
use crate::model::TimeSeries;
use crate::ordering::correct_order;
use crate::summary::{summarize, Completeness, Summary};
use crate::warnings::QualityWarning;

/// Plain rows for one station, as handed over by whatever read them.
#[derive(Debug, Clone)]
pub struct SeriesInput {
    pub name: String,
    pub table: RawTable,
}

impl SeriesInput {
    pub fn new(name: impl Into<String>, table: RawTable) -> Self {
        Self {
            name: name.into(),
            table,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SeriesOutput {
    pub name: String,
    pub series: TimeSeries,
    pub audit: AuditReport,
    pub summary: Summary,
    pub completeness: Completeness,
    pub warnings: Vec<QualityWarning>,
}

#[derive(Debug)]
pub struct SeriesFailure {
    pub series: String,
    pub error: EngineError,
}

impl fmt::Display for SeriesFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.series, self.error)
    }
}

#[derive(Debug, Default)]
pub struct BatchOutcome {
    pub outputs: Vec<SeriesOutput>,
    pub failures: Vec<SeriesFailure>,
}

impl BatchOutcome {
    fn from_indexed(
        mut results: Vec<(usize, std::result::Result<SeriesOutput, SeriesFailure>)>,
    ) -> Self {
        results.sort_by_key(|(idx, _)| *idx);
        let mut outcome = BatchOutcome::default();
        for (_, result) in results {
            match result {
                Ok(output) => outcome.outputs.push(output),
                Err(failure) => outcome.failures.push(failure),
            }
        }
        outcome
    }
}

/// Runs dedup, order correction, gap filling, audit and summary for each series.
#[derive(Debug, Clone)]
pub struct Engine {
    config: EngineConfig,
    filler: GridFiller,
}

impl Engine {
    pub fn new(config: EngineConfig) -> std::result::Result<Self, ConfigError> {
        config.validate()?;
        let filler = GridFiller::new(config.sampling_interval()?, config.max_gap_fill_rows)
            .with_max_synthetic_rows(config.max_synthetic_rows);
        Ok(Self { config, filler })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Regularizes one input table. Fails only when the timestamp column is missing.
    pub fn process(&self, input: &SeriesInput) -> Result<SeriesOutput> {
        let (series, mut warnings) = TimeSeries::from_table(
            &input.name,
            &input.table,
            &self.config.timestamp_column,
            &self.config.exclude_fields,
        )?;

        let mut output = self.regularize(series);
        warnings.append(&mut output.warnings);
        output.warnings = warnings;

        for warning in &output.warnings {
            warn!(series = %output.name, kind = warning.kind(), "{warning}");
        }

        Ok(output)
    }

    /// Runs every stage on an already built series.
    pub fn regularize(&self, series: TimeSeries) -> SeriesOutput {
        let name = series.name().to_string();
        let input_rows = series.len();

        let deduplicated = deduplicate(series);
        let ordered = correct_order(deduplicated.clean, self.config.out_of_order_policy);
        let filled = self.filler.fill(ordered.sorted);

        let completeness = Completeness::new(
            input_rows,
            deduplicated.duplicates.len(),
            ordered.out_of_order.len(),
            filled.invalid.len(),
            &filled.series,
        );
        let audit = audit::aggregate(
            &filled.series,
            deduplicated.duplicates,
            ordered.out_of_order,
            filled.invalid,
        );
        let summary = summarize(&filled.series, self.config.summary_precision);

        info!(
            series = %name,
            input_rows,
            duplicates = completeness.duplicates,
            out_of_order = completeness.out_of_order,
            invalid = completeness.invalid,
            synthetic = completeness.synthetic,
            output_rows = completeness.output_rows,
            uptime = completeness.uptime.unwrap_or(0.0),
            "series regularized"
        );

        SeriesOutput {
            name,
            series: filled.series,
            audit,
            summary,
            completeness,
            warnings: filled.warnings,
        }
    }

    /// Processes each input in turn on the calling thread.
    pub fn process_all(&self, inputs: Vec<SeriesInput>) -> BatchOutcome {
        let results = inputs
            .into_iter()
            .enumerate()
            .map(|(idx, input)| (idx, self.process_isolated(input)))
            .collect();
        BatchOutcome::from_indexed(results)
    }

    /// Fans out one blocking task per input and collects the results in input order.
    /// A failing or panicking series never affects the others.
    #[cfg(feature = "runtime")]
    pub async fn process_batch(self: Arc<Self>, inputs: Vec<SeriesInput>) -> BatchOutcome {
        let mut names: Vec<Option<String>> = Vec::with_capacity(inputs.len());
        let mut set = tokio::task::JoinSet::new();

        for (idx, input) in inputs.into_iter().enumerate() {
            names.push(Some(input.name.clone()));
            let engine = Arc::clone(&self);
            set.spawn_blocking(move || (idx, engine.process_isolated(input)));
        }

        let mut results = Vec::with_capacity(names.len());
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok((idx, result)) => {
                    names[idx] = None;
                    results.push((idx, result));
                }
                Err(err) => warn!(error = %err, "series worker did not complete"),
            }
        }

        for (idx, name) in names.into_iter().enumerate() {
            if let Some(series) = name {
                results.push((
                    idx,
                    Err(SeriesFailure {
                        error: EngineError::Worker {
                            series: series.clone(),
                            message: "task was cancelled".to_string(),
                        },
                        series,
                    }),
                ));
            }
        }

        BatchOutcome::from_indexed(results)
    }

    fn process_isolated(
        &self,
        input: SeriesInput,
    ) -> std::result::Result<SeriesOutput, SeriesFailure> {
        let outcome = catch_unwind(AssertUnwindSafe(|| self.process(&input)))
            .unwrap_or_else(|payload| {
                Err(EngineError::Worker {
                    series: input.name.clone(),
                    message: panic_message(payload.as_ref()),
                })
            });

        outcome.map_err(|error| {
            warn!(series = %input.name, %error, "skipping series");
            SeriesFailure {
                series: input.name.clone(),
                error,
            }
        })
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|message| message.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "worker panicked".to_string())
}
