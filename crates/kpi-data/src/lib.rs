#![deny(warnings)]

//! Read-only loaders for projection inputs: assumptions (YAML or JSON),
//! internal sample-game history and the market benchmark table.

pub mod backtest;

use anyhow::{bail, Context, Result};
use kpi_core::{MarketBenchmarks, ProjectionAssumptions, SampleLibrary};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::info;

/// Serialization format of an input file.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Format {
    Yaml,
    Json,
}

impl Format {
    /// Format from the file extension (`yaml`, `yml`, `json`).
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("yaml") | Some("yml") => Ok(Format::Yaml),
            Some("json") => Ok(Format::Json),
            _ => bail!("unsupported assumptions file extension: {}", path.display()),
        }
    }
}

pub fn parse_assumptions(text: &str, format: Format) -> Result<ProjectionAssumptions> {
    let a = match format {
        Format::Yaml => serde_yaml::from_str(text).context("parsing YAML assumptions")?,
        Format::Json => serde_json::from_str(text).context("parsing JSON assumptions")?,
    };
    Ok(a)
}

pub fn load_assumptions<P: AsRef<Path>>(path: P) -> Result<ProjectionAssumptions> {
    let path = path.as_ref();
    let format = Format::from_path(path)?;
    let text = fs::read_to_string(path)
        .with_context(|| format!("reading assumptions {}", path.display()))?;
    let a = parse_assumptions(&text, format)
        .with_context(|| format!("loading assumptions {}", path.display()))?;
    info!(path = %path.display(), launch = %a.launch_date, "assumptions loaded");
    Ok(a)
}

/// Sample files come either wrapped as `{"games": {...}}` or bare.
#[derive(Deserialize)]
#[serde(untagged)]
enum SampleFile {
    Wrapped { games: SampleLibrary },
    Bare(SampleLibrary),
}

pub fn parse_samples(text: &str) -> Result<SampleLibrary> {
    let file: SampleFile = serde_json::from_str(text).context("parsing sample data")?;
    Ok(match file {
        SampleFile::Wrapped { games } => games,
        SampleFile::Bare(lib) => lib,
    })
}

pub fn load_samples<P: AsRef<Path>>(path: P) -> Result<SampleLibrary> {
    let path = path.as_ref();
    let text = fs::read_to_string(path)
        .with_context(|| format!("reading samples {}", path.display()))?;
    let lib = parse_samples(&text).with_context(|| format!("loading samples {}", path.display()))?;
    info!(
        path = %path.display(),
        retention_games = lib.retention.len(),
        "sample library loaded"
    );
    Ok(lib)
}

pub fn load_benchmarks<P: AsRef<Path>>(path: P) -> Result<MarketBenchmarks> {
    let path = path.as_ref();
    let text = fs::read_to_string(path)
        .with_context(|| format!("reading benchmarks {}", path.display()))?;
    let table: MarketBenchmarks = serde_json::from_str(&text)
        .with_context(|| format!("parsing benchmarks {}", path.display()))?;
    info!(path = %path.display(), entries = table.entries.len(), "benchmarks loaded");
    Ok(table)
}
