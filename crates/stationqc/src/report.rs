// crates/stationqc/src/report.rs

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, Cell, CellAlignment, ContentArrangement, Table};
use serde::Serialize;
use stationqc_core::tabular::{
    audit_to_dataframe, encode_csv, encode_parquet, series_to_dataframe, summary_to_dataframe,
};
use stationqc_core::{Completeness, EngineConfig, QualityWarning, SeriesOutput};
use stationqc_parser::ParseOptions;
use tracing::info;
use uuid::Uuid;

use crate::inputs::SourceInfo;

pub const MANIFEST_FILE: &str = "manifest.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Csv,
    Parquet,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Csv => "csv",
            OutputFormat::Parquet => "parquet",
        }
    }
}

#[derive(Debug, Serialize)]
pub struct WrittenFiles {
    pub cleaned: PathBuf,
    pub outliers: PathBuf,
    pub stats: PathBuf,
}

/// Writes `<out>/<name>/<name>_{cleaned,outliers,stats}.<ext>` for one series. The files are
/// staged in a sibling directory and moved into place together, so a failed write leaves no
/// partial bundle behind. A bundle from an earlier run is replaced.
pub fn write_series(
    out_dir: &Path,
    output: &SeriesOutput,
    format: OutputFormat,
) -> Result<WrittenFiles> {
    let dir = out_dir.join(&output.name);
    let staging = out_dir.join(format!(".{}.{}.partial", output.name, Uuid::new_v4()));

    let staged = stage_series(&staging, output, format).and_then(|()| {
        if dir.exists() {
            std::fs::remove_dir_all(&dir)
                .with_context(|| format!("failed to replace {}", dir.display()))?;
        }
        std::fs::rename(&staging, &dir)
            .with_context(|| format!("failed to move outputs into {}", dir.display()))
    });
    if let Err(err) = staged {
        std::fs::remove_dir_all(&staging).ok();
        return Err(err);
    }

    info!(series = %output.name, dir = %dir.display(), "wrote series outputs");
    Ok(WrittenFiles {
        cleaned: dir.join(file_name(output, "cleaned", format)),
        outliers: dir.join(file_name(output, "outliers", format)),
        stats: dir.join(file_name(output, "stats", format)),
    })
}

fn file_name(output: &SeriesOutput, suffix: &str, format: OutputFormat) -> String {
    format!("{}_{suffix}.{}", output.name, format.extension())
}

fn stage_series(staging: &Path, output: &SeriesOutput, format: OutputFormat) -> Result<()> {
    std::fs::create_dir_all(staging)
        .with_context(|| format!("failed to create {}", staging.display()))?;

    let frames = [
        ("cleaned", series_to_dataframe(&output.series)?),
        ("outliers", audit_to_dataframe(&output.audit)?),
        ("stats", summary_to_dataframe(&output.summary)?),
    ];
    for (suffix, df) in frames {
        let bytes = match format {
            OutputFormat::Csv => encode_csv(&df)?,
            OutputFormat::Parquet => encode_parquet(&df)?,
        };
        let path = staging.join(file_name(output, suffix, format));
        std::fs::write(&path, bytes)
            .with_context(|| format!("failed to write {}", path.display()))?;
    }
    Ok(())
}

#[derive(Debug, Serialize)]
pub struct SeriesEntry {
    pub name: String,
    pub source: Option<PathBuf>,
    pub source_hash: Option<String>,
    pub format: Option<&'static str>,
    pub skipped_lines: usize,
    pub completeness: Completeness,
    pub warnings: Vec<QualityWarning>,
    pub files: WrittenFiles,
}

impl SeriesEntry {
    pub fn new(output: &SeriesOutput, source: Option<&SourceInfo>, files: WrittenFiles) -> Self {
        Self {
            name: output.name.clone(),
            source: source.map(|s| s.path.clone()),
            source_hash: source.map(|s| s.source_hash.clone()),
            format: source.map(|s| s.format),
            skipped_lines: source.map_or(0, |s| s.skipped_lines),
            completeness: output.completeness,
            warnings: output.warnings.clone(),
            files,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct FailureEntry {
    pub series: Option<String>,
    pub source: Option<PathBuf>,
    pub error: String,
}

/// Record of one run, written next to the outputs.
#[derive(Debug, Serialize)]
pub struct Manifest<'a> {
    pub run_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub output_format: OutputFormat,
    pub config: &'a EngineConfig,
    pub parse: &'a ParseOptions,
    pub series: Vec<SeriesEntry>,
    pub failures: Vec<FailureEntry>,
}

impl<'a> Manifest<'a> {
    pub fn new(
        config: &'a EngineConfig,
        parse: &'a ParseOptions,
        output_format: OutputFormat,
    ) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            generated_at: Utc::now(),
            output_format,
            config,
            parse,
            series: Vec::new(),
            failures: Vec::new(),
        }
    }

    pub fn write(&self, out_dir: &Path) -> Result<PathBuf> {
        std::fs::create_dir_all(out_dir)
            .with_context(|| format!("failed to create {}", out_dir.display()))?;
        let path = out_dir.join(MANIFEST_FILE);
        let json = serde_json::to_vec_pretty(self)?;
        std::fs::write(&path, json)
            .with_context(|| format!("failed to write {}", path.display()))?;
        Ok(path)
    }
}

/// Per-series row accounting for the console.
pub fn completeness_table(entries: &[SeriesEntry]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            "Series",
            "Input",
            "Duplicates",
            "Out of order",
            "Invalid",
            "Synthetic",
            "Output",
            "Uptime",
            "Warnings",
        ]);

    for entry in entries {
        let c = &entry.completeness;
        let uptime = c
            .uptime
            .map(|value| format!("{:.2}%", value * 100.0))
            .unwrap_or_else(|| "-".to_string());
        table.add_row(vec![
            Cell::new(&entry.name),
            count_cell(c.input_rows),
            count_cell(c.duplicates),
            count_cell(c.out_of_order),
            count_cell(c.invalid),
            count_cell(c.synthetic),
            count_cell(c.output_rows),
            Cell::new(uptime).set_alignment(CellAlignment::Right),
            count_cell(entry.warnings.len()),
        ]);
    }

    table
}

fn count_cell(value: usize) -> Cell {
    Cell::new(value).set_alignment(CellAlignment::Right)
}
