#![deny(warnings)]

//! Headless CLI: project a launch from an assumptions file, or backtest the
//! retention model against the sample library.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use kpi_core::{MarketBenchmarks, ModelConstants, SampleLibrary};
use kpi_runtime::report;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "kpi")]
#[command(about = "Game KPI projection over Best/Normal/Worst scenarios")]
#[command(version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("GIT_SHA"), " ", env!("BUILD_DATE"), ")"))]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Project NRU, DAU, revenue and profit for every scenario
    Project {
        /// Assumptions file (.yaml, .yml or .json)
        #[arg(short, long)]
        assumptions: PathBuf,

        /// Internal sample-game data (JSON); omit for a benchmark-only run
        #[arg(short, long)]
        samples: Option<PathBuf>,

        /// Market benchmark table (JSON)
        #[arg(short, long)]
        benchmarks: Option<PathBuf>,

        /// Print the full projection as JSON instead of the summary table
        #[arg(long)]
        json: bool,
    },

    /// Fit D+1..D+30 and score D+31..D+60 for every sample game
    Backtest {
        /// Internal sample-game data (JSON)
        #[arg(short, long)]
        samples: PathBuf,

        /// Take model constants from this assumptions file
        #[arg(short, long)]
        assumptions: Option<PathBuf>,

        #[arg(long)]
        json: bool,
    },
}

fn samples_or_empty(path: Option<&Path>) -> Result<SampleLibrary> {
    match path {
        Some(p) => kpi_data::load_samples(p),
        None => Ok(SampleLibrary::default()),
    }
}

fn benchmarks_or_empty(path: Option<&Path>) -> Result<MarketBenchmarks> {
    match path {
        Some(p) => kpi_data::load_benchmarks(p),
        None => Ok(MarketBenchmarks::default()),
    }
}

fn project(
    assumptions: &Path,
    samples: Option<&Path>,
    benchmarks: Option<&Path>,
    json: bool,
) -> Result<()> {
    let a = kpi_data::load_assumptions(assumptions)?;
    let samples = samples_or_empty(samples)?;
    let market = benchmarks_or_empty(benchmarks)?;
    let out = kpi_runtime::run_projection(&a, &samples, &market).context("projection failed")?;
    if json {
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        let rows = report::executive_summary(&out);
        println!(
            "Launch {} | horizon {} days | BM {:?} | CPA eff {:.0}",
            out.launch_date, out.horizon_days, out.applied.blend.bm_type, out.applied.acquisition.effective_cpa
        );
        print!("{}", report::render_table(&rows));
    }
    Ok(())
}

fn backtest(samples: &Path, assumptions: Option<&Path>, json: bool) -> Result<()> {
    let constants = match assumptions {
        Some(p) => kpi_data::load_assumptions(p)?.constants,
        None => ModelConstants::default(),
    };
    let lib = kpi_data::load_samples(samples)?;
    let report = kpi_data::backtest::run_backtest(&lib, &constants);
    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", report.render());
    }
    Ok(())
}

fn main() -> Result<()> {
    // Logs go to stderr so JSON output stays parseable
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    info!(sha = env!("GIT_SHA"), "starting kpi");
    match cli.command {
        Commands::Project {
            assumptions,
            samples,
            benchmarks,
            json,
        } => project(&assumptions, samples.as_deref(), benchmarks.as_deref(), json),
        Commands::Backtest {
            samples,
            assumptions,
            json,
        } => backtest(&samples, assumptions.as_deref(), json),
    }
}
