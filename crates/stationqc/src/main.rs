// crates/stationqc/src/main.rs

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use comfy_table::{presets::UTF8_FULL, Table};
use stationqc_core::{Engine, OutOfOrderPolicy, TimeSeries};
use stationqc_parser::available_parsers;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod inputs;
mod report;
mod settings;

use inputs::SourceInfo;
use report::{FailureEntry, Manifest, OutputFormat, SeriesEntry};
use settings::Overrides;

/// Regularizes environmental station time series onto a fixed cadence.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Deduplicate, reorder and gap-fill every matched file, then write the report
    Process(ProcessArgs),
    /// Parse one file and show what the engine would see
    Inspect(InspectArgs),
    /// List the input formats the parser recognizes
    Formats,
}

#[derive(Args, Debug)]
struct ParseArgs {
    /// Settings file (TOML). Falls back to $STATIONQC_CONFIG
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Lines to skip before the header of a delimited file
    #[arg(long)]
    header_row: Option<usize>,
    /// Field delimiter; detected from the header when omitted
    #[arg(long)]
    delimiter: Option<char>,
    /// Treat runs of whitespace as one delimiter
    #[arg(long)]
    whitespace_aligned: bool,
    /// Rename a column after parsing, as FROM=TO
    #[arg(long = "rename", value_parser = settings::parse_rename)]
    rename_columns: Vec<(String, String)>,
}

#[derive(Args, Debug)]
struct ProcessArgs {
    /// Input files or glob patterns
    #[arg(required = true)]
    inputs: Vec<String>,
    /// Report directory
    #[arg(short, long, default_value = "report")]
    output: PathBuf,
    #[arg(long, value_enum, default_value_t = OutputFormat::Csv)]
    format: OutputFormat,
    #[arg(long)]
    timestamp_column: Option<String>,
    /// Sampling interval in minutes
    #[arg(long)]
    interval: Option<i64>,
    /// Largest number of rows a single gap may be filled with
    #[arg(long)]
    max_gap_fill_rows: Option<usize>,
    /// Largest number of synthetic rows one series may gain across all its gaps
    #[arg(long)]
    max_synthetic_rows: Option<usize>,
    #[arg(long, value_enum)]
    out_of_order: Option<PolicyArg>,
    /// Decimal places in the summary
    #[arg(long)]
    precision: Option<u32>,
    /// Columns to leave out of the series
    #[arg(long = "exclude")]
    exclude_fields: Vec<String>,
    #[command(flatten)]
    parse: ParseArgs,
}

#[derive(Args, Debug)]
struct InspectArgs {
    file: PathBuf,
    /// Rows to preview
    #[arg(long, default_value_t = 5)]
    rows: usize,
    #[arg(long)]
    timestamp_column: Option<String>,
    #[command(flatten)]
    parse: ParseArgs,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum PolicyArg {
    Drop,
    Reinsert,
}

impl From<PolicyArg> for OutOfOrderPolicy {
    fn from(value: PolicyArg) -> Self {
        match value {
            PolicyArg::Drop => OutOfOrderPolicy::Drop,
            PolicyArg::Reinsert => OutOfOrderPolicy::Reinsert,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Process(args) => process(args).await,
        Command::Inspect(args) => inspect(args),
        Command::Formats => {
            let mut table = Table::new();
            table.load_preset(UTF8_FULL).set_header(vec!["Code", "Description"]);
            for parser in available_parsers() {
                table.add_row(vec![parser.code, parser.description]);
            }
            println!("{table}");
            Ok(())
        }
    }
}

async fn process(args: ProcessArgs) -> Result<()> {
    let overrides = Overrides {
        timestamp_column: args.timestamp_column,
        sampling_interval_minutes: args.interval,
        max_gap_fill_rows: args.max_gap_fill_rows,
        max_synthetic_rows: args.max_synthetic_rows,
        out_of_order_policy: args.out_of_order.map(Into::into),
        summary_precision: args.precision,
        exclude_fields: args.exclude_fields,
        header_row: args.parse.header_row,
        delimiter: args.parse.delimiter,
        whitespace_aligned: args.parse.whitespace_aligned,
        rename_columns: args.parse.rename_columns,
    };
    let settings = settings::load(args.parse.config.as_deref(), overrides)?;
    if let Some(source) = &settings.source {
        info!(path = %source.display(), "loaded settings");
    }

    let engine = Arc::new(Engine::new(settings.engine.clone())?);
    let paths = inputs::collect_paths(&args.inputs)?;
    info!(files = paths.len(), output = %args.output.display(), "starting run");

    let (loaded, load_failures) = inputs::load_all(&paths, &settings.parse);
    let mut manifest = Manifest::new(engine.config(), &settings.parse, args.format);
    manifest
        .failures
        .extend(load_failures.into_iter().map(|failure| FailureEntry {
            series: None,
            source: Some(failure.path),
            error: format!("{:#}", failure.error),
        }));

    let mut sources: HashMap<String, SourceInfo> = HashMap::new();
    let mut series_inputs = Vec::with_capacity(loaded.len());
    for item in loaded {
        sources.insert(item.input.name.clone(), item.source);
        series_inputs.push(item.input);
    }

    let outcome = Arc::clone(&engine).process_batch(series_inputs).await;

    for output in &outcome.outputs {
        let source = sources.get(&output.name);
        match report::write_series(&args.output, output, args.format) {
            Ok(files) => manifest.series.push(SeriesEntry::new(output, source, files)),
            Err(err) => {
                let error = format!("{err:#}");
                warn!(series = %output.name, error = %error, "failed to write outputs");
                manifest.failures.push(FailureEntry {
                    series: Some(output.name.clone()),
                    source: source.map(|s| s.path.clone()),
                    error,
                });
            }
        }
    }
    for failure in &outcome.failures {
        manifest.failures.push(FailureEntry {
            series: Some(failure.series.clone()),
            source: sources.get(&failure.series).map(|s| s.path.clone()),
            error: failure.error.to_string(),
        });
    }

    let manifest_path = manifest.write(&args.output)?;
    println!("{}", report::completeness_table(&manifest.series));
    for failure in &manifest.failures {
        eprintln!(
            "skipped {}: {}",
            failure
                .series
                .clone()
                .or_else(|| failure.source.as_ref().map(|p| p.display().to_string()))
                .unwrap_or_default(),
            failure.error
        );
    }

    info!(
        run_id = %manifest.run_id,
        series = manifest.series.len(),
        failures = manifest.failures.len(),
        manifest = %manifest_path.display(),
        "run finished"
    );

    if manifest.series.is_empty() {
        bail!("no series were processed successfully");
    }
    Ok(())
}

fn inspect(args: InspectArgs) -> Result<()> {
    let overrides = Overrides {
        header_row: args.parse.header_row,
        delimiter: args.parse.delimiter,
        whitespace_aligned: args.parse.whitespace_aligned,
        rename_columns: args.parse.rename_columns,
        ..Overrides::default()
    };
    let file = settings::read(args.parse.config.as_deref())?;
    let parse = settings::apply_parse_overrides(file.parse, &overrides)?;

    let loaded = inputs::load(&args.file, &parse)?;
    let table = &loaded.input.table;

    println!("file:          {}", args.file.display());
    println!("format:        {}", loaded.source.format);
    println!("blake3:        {}", loaded.source.source_hash);
    println!("rows:          {}", table.height());
    println!("skipped lines: {}", loaded.source.skipped_lines);

    let mut preview = Table::new();
    preview.load_preset(UTF8_FULL).set_header(table.columns().to_vec());
    for row in table.rows().iter().take(args.rows) {
        preview.add_row(row.iter().map(|value| value.to_string()).collect::<Vec<_>>());
    }
    println!("{preview}");

    let timestamp_column = args
        .timestamp_column
        .or(file.engine.map(|config| config.timestamp_column));
    if let Some(column) = timestamp_column {
        let (series, warnings) =
            TimeSeries::from_table(&loaded.input.name, table, &column, &[])
                .with_context(|| format!("cannot build a series from {}", args.file.display()))?;
        let invalid = series.timestamps().filter(Option::is_none).count();
        println!("fields:        {}", series.fields().join(", "));
        println!("invalid times: {invalid}");
        for warning in warnings {
            println!("warning:       {warning}");
        }
    }

    Ok(())
}
