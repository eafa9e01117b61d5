// crates/stationqc/src/inputs.rs

use std::collections::{BTreeSet, HashSet};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use stationqc_core::SeriesInput;
use stationqc_parser::{parse_table, ParseOptions};
use tracing::{debug, warn};

/// Where a series came from, kept for the run manifest.
#[derive(Debug, Clone)]
pub struct SourceInfo {
    pub path: PathBuf,
    pub source_hash: String,
    pub format: &'static str,
    pub skipped_lines: usize,
}

#[derive(Debug)]
pub struct LoadedInput {
    pub input: SeriesInput,
    pub source: SourceInfo,
}

#[derive(Debug)]
pub struct LoadFailure {
    pub path: PathBuf,
    pub error: anyhow::Error,
}

/// Expands glob patterns into a sorted, de-duplicated list of files.
pub fn collect_paths(patterns: &[String]) -> Result<Vec<PathBuf>> {
    let mut paths = BTreeSet::new();
    for pattern in patterns {
        let mut matched = false;
        let entries =
            glob::glob(pattern).with_context(|| format!("invalid pattern '{pattern}'"))?;
        for entry in entries {
            match entry {
                Ok(path) if path.is_file() => {
                    matched = true;
                    paths.insert(path);
                }
                Ok(_) => {}
                Err(err) => warn!(pattern = %pattern, error = %err, "could not read matched path"),
            }
        }
        if !matched {
            warn!(pattern = %pattern, "pattern matched no files");
        }
    }

    if paths.is_empty() {
        bail!("no input files matched {patterns:?}");
    }
    Ok(paths.into_iter().collect())
}

/// Reads and parses one file. The series is named after the file stem.
pub fn load(path: &Path, options: &ParseOptions) -> Result<LoadedInput> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let parsed = parse_table(&content, options)
        .with_context(|| format!("failed to parse {}", path.display()))?;

    let name = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    debug!(
        path = %path.display(),
        format = parsed.format,
        rows = parsed.table.height(),
        skipped_lines = parsed.skipped_lines,
        "parsed input"
    );

    Ok(LoadedInput {
        input: SeriesInput::new(name, parsed.table),
        source: SourceInfo {
            path: path.to_path_buf(),
            source_hash: parsed.source_hash,
            format: parsed.format,
            skipped_lines: parsed.skipped_lines,
        },
    })
}

/// Loads every path, keeping going past files that cannot be read or parsed. Series names are
/// made unique so that outputs never overwrite each other.
pub fn load_all(
    paths: &[PathBuf],
    options: &ParseOptions,
) -> (Vec<LoadedInput>, Vec<LoadFailure>) {
    let mut loaded = Vec::with_capacity(paths.len());
    let mut failures = Vec::new();
    let mut taken: HashSet<String> = HashSet::new();

    for path in paths {
        match load(path, options) {
            Ok(mut input) => {
                input.input.name = unique_name(&input.input.name, &taken);
                taken.insert(input.input.name.clone());
                loaded.push(input);
            }
            Err(error) => {
                warn!(path = %path.display(), error = %format!("{error:#}"), "skipping input");
                failures.push(LoadFailure {
                    path: path.clone(),
                    error,
                });
            }
        }
    }

    (loaded, failures)
}

/// `stem`, or the first free `stem-N` counting from 2.
fn unique_name(stem: &str, taken: &HashSet<String>) -> String {
    if !taken.contains(stem) {
        return stem.to_string();
    }
    (2usize..)
        .map(|n| format!("{stem}-{n}"))
        .find(|candidate| !taken.contains(candidate))
        .unwrap_or_else(|| stem.to_string())
}
