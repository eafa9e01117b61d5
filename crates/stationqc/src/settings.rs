// crates/stationqc/src/settings.rs

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use stationqc_core::{EngineConfig, OutOfOrderPolicy};
use stationqc_parser::ParseOptions;

pub const CONFIG_ENV: &str = "STATIONQC_CONFIG";

/// Layout of a settings file:
///
/// ```toml
/// [engine]
/// timestamp_column = "time"
/// sampling_interval_minutes = 1
///
/// [parse]
/// header_row = 2
/// rename_columns = { at = "time" }
/// ```
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SettingsFile {
    engine: EngineConfig,
    #[serde(default)]
    parse: ParseSection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ParseSection {
    header_row: usize,
    delimiter: Option<char>,
    whitespace_aligned: bool,
    rename_columns: BTreeMap<String, String>,
}

/// Values given on the command line. Each one wins over the settings file.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub timestamp_column: Option<String>,
    pub sampling_interval_minutes: Option<i64>,
    pub max_gap_fill_rows: Option<usize>,
    pub max_synthetic_rows: Option<usize>,
    pub out_of_order_policy: Option<OutOfOrderPolicy>,
    pub summary_precision: Option<u32>,
    pub exclude_fields: Vec<String>,
    pub header_row: Option<usize>,
    pub delimiter: Option<char>,
    pub whitespace_aligned: bool,
    pub rename_columns: Vec<(String, String)>,
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub engine: EngineConfig,
    pub parse: ParseOptions,
    pub source: Option<PathBuf>,
}

/// Contents of the settings file, before any command-line overrides.
#[derive(Debug, Clone, Default)]
pub struct FileSettings {
    pub engine: Option<EngineConfig>,
    pub parse: ParseOptions,
    pub source: Option<PathBuf>,
}

/// Reads the settings file named by `--config` or `STATIONQC_CONFIG`. Having neither is fine.
pub fn read(config_path: Option<&Path>) -> Result<FileSettings> {
    let source = config_path
        .map(Path::to_path_buf)
        .or_else(|| std::env::var_os(CONFIG_ENV).map(PathBuf::from));
    let Some(path) = source else {
        return Ok(FileSettings::default());
    };

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read settings file {}", path.display()))?;
    let (engine, parse) = from_toml_str(&content)
        .with_context(|| format!("invalid settings file {}", path.display()))?;
    Ok(FileSettings {
        engine: Some(engine),
        parse,
        source: Some(path),
    })
}

/// Settings file plus command line, validated.
pub fn load(config_path: Option<&Path>, overrides: Overrides) -> Result<Settings> {
    let file = read(config_path)?;
    let mut settings = merge(file.engine, file.parse, overrides)?;
    settings.engine.validate()?;
    settings.source = file.source;
    Ok(settings)
}

fn from_toml_str(content: &str) -> Result<(EngineConfig, ParseOptions)> {
    let file: SettingsFile = toml::from_str(content)?;
    let parse = ParseOptions {
        header_row: file.parse.header_row,
        delimiter: file.parse.delimiter.map(delimiter_byte).transpose()?,
        whitespace_aligned: file.parse.whitespace_aligned,
        rename_columns: file.parse.rename_columns.into_iter().collect(),
    };
    Ok((file.engine, parse))
}

fn merge(
    engine: Option<EngineConfig>,
    parse: ParseOptions,
    overrides: Overrides,
) -> Result<Settings> {
    let parse = apply_parse_overrides(parse, &overrides)?;

    let mut engine = match (
        engine,
        &overrides.timestamp_column,
        overrides.sampling_interval_minutes,
    ) {
        (Some(engine), _, _) => engine,
        (None, Some(column), Some(minutes)) => EngineConfig::new(column.as_str(), minutes),
        (None, _, _) => bail!(
            "no settings file given; pass --config, set {CONFIG_ENV}, or give both \
             --timestamp-column and --interval"
        ),
    };

    if let Some(column) = overrides.timestamp_column {
        engine.timestamp_column = column;
    }
    if let Some(minutes) = overrides.sampling_interval_minutes {
        engine.sampling_interval_minutes = minutes;
    }
    if let Some(cap) = overrides.max_gap_fill_rows {
        engine.max_gap_fill_rows = cap;
    }
    if let Some(budget) = overrides.max_synthetic_rows {
        engine.max_synthetic_rows = budget;
    }
    if let Some(policy) = overrides.out_of_order_policy {
        engine.out_of_order_policy = policy;
    }
    if let Some(precision) = overrides.summary_precision {
        engine.summary_precision = precision;
    }
    engine.exclude_fields.extend(overrides.exclude_fields);

    Ok(Settings {
        engine,
        parse,
        source: None,
    })
}

pub fn apply_parse_overrides(
    mut parse: ParseOptions,
    overrides: &Overrides,
) -> Result<ParseOptions> {
    if let Some(row) = overrides.header_row {
        parse.header_row = row;
    }
    if let Some(delimiter) = overrides.delimiter {
        parse.delimiter = Some(delimiter_byte(delimiter)?);
    }
    parse.whitespace_aligned |= overrides.whitespace_aligned;
    parse
        .rename_columns
        .extend(overrides.rename_columns.iter().cloned());
    Ok(parse)
}

fn delimiter_byte(delimiter: char) -> Result<u8> {
    if !delimiter.is_ascii() {
        bail!("delimiter must be a single ASCII character, got {delimiter:?}");
    }
    Ok(delimiter as u8)
}

/// Parses a `FROM=TO` rename given on the command line.
pub fn parse_rename(value: &str) -> Result<(String, String), String> {
    match value.split_once('=') {
        Some((from, to)) if !from.trim().is_empty() && !to.trim().is_empty() => {
            Ok((from.trim().to_string(), to.trim().to_string()))
        }
        _ => Err(format!("expected FROM=TO, got '{value}'")),
    }
}
