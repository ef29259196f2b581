//! Blind retention backtest over the sample library.
//!
//! Each game with at least 60 observed days is fitted on D+1..D+30 and the
//! fitted curve is scored against the observed D+31..D+60.

use kpi_core::{ModelConstants, SampleLibrary};
use kpi_econ::retention::{fit_retention, RetentionFit};
use kpi_econ::EconError;
use serde::Serialize;
use std::fmt::{self, Write};
use tracing::{info, warn};

const FIT_DAYS: usize = 30;
const TEST_DAYS: usize = 60;

/// Model confidence bucketed by mean MAPE.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Confidence {
    High,
    Moderate,
    LowModerate,
    Low,
}

impl Confidence {
    /// `mape` in percent.
    pub fn from_mape(mape: f64) -> Self {
        if mape < 15.0 {
            Confidence::High
        } else if mape < 25.0 {
            Confidence::Moderate
        } else if mape < 35.0 {
            Confidence::LowModerate
        } else {
            Confidence::Low
        }
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Confidence::High => "HIGH",
            Confidence::Moderate => "MODERATE",
            Confidence::LowModerate => "LOW_MODERATE",
            Confidence::Low => "LOW",
        })
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct GameBacktest {
    pub name: String,
    pub b: f64,
    /// The D+1..D+30 fit was degenerate and the default exponent was used.
    pub fallback: bool,
    pub d1_actual: f64,
    pub d30_actual: f64,
    pub d30_predicted: f64,
    pub d60_actual: f64,
    pub d60_predicted: f64,
    /// Mean absolute percentage error over D+31..D+60, in percent.
    pub mape: f64,
    pub max_error: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    TooShort,
    InvalidDay1,
    NoPositiveActuals,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SkippedGame {
    pub name: String,
    pub days: usize,
    pub reason: SkipReason,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BacktestSummary {
    pub games_tested: usize,
    pub mean_mape: f64,
    pub median_mape: f64,
    pub min_mape: f64,
    pub max_mape: f64,
    pub confidence: Confidence,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BacktestReport {
    /// Tested games ordered by ascending MAPE.
    pub games: Vec<GameBacktest>,
    pub skipped: Vec<SkippedGame>,
    /// `None` when no game could be tested.
    pub summary: Option<BacktestSummary>,
}

fn fit_window(d1: f64, window: &[f64], k: &ModelConstants) -> Result<(RetentionFit, bool), EconError> {
    match fit_retention(d1, Some(window), k) {
        Ok(fit) => Ok((fit, false)),
        Err(EconError::DegenerateFit { b, .. }) => {
            warn!(b, "degenerate backtest fit, using default exponent");
            fit_retention(d1, None, k).map(|fit| (fit, true))
        }
        Err(e) => Err(e),
    }
}

fn test_game(name: &str, actual: &[f64], k: &ModelConstants) -> Result<GameBacktest, SkipReason> {
    if actual.len() < TEST_DAYS {
        return Err(SkipReason::TooShort);
    }
    let d1 = actual[0];
    let (fit, fallback) = fit_window(d1, &actual[..FIT_DAYS], k).map_err(|_| SkipReason::InvalidDay1)?;
    let errors: Vec<f64> = (FIT_DAYS..TEST_DAYS)
        .filter(|i| actual[*i] > 0.0)
        .map(|i| (fit.at(i as u32 + 1) - actual[i]).abs() / actual[i])
        .collect();
    if errors.is_empty() {
        return Err(SkipReason::NoPositiveActuals);
    }
    let mape = errors.iter().sum::<f64>() / errors.len() as f64 * 100.0;
    let max_error = errors.iter().copied().fold(0.0, f64::max) * 100.0;
    Ok(GameBacktest {
        name: name.to_string(),
        b: fit.b,
        fallback,
        d1_actual: d1,
        d30_actual: actual[FIT_DAYS - 1],
        d30_predicted: fit.at(FIT_DAYS as u32),
        d60_actual: actual[TEST_DAYS - 1],
        d60_predicted: fit.at(TEST_DAYS as u32),
        mape,
        max_error,
    })
}

fn median(sorted: &[f64]) -> f64 {
    let n = sorted.len();
    if n % 2 == 1 {
        sorted[n / 2]
    } else {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    }
}

fn summarize(games: &[GameBacktest]) -> Option<BacktestSummary> {
    if games.is_empty() {
        return None;
    }
    let mapes: Vec<f64> = games.iter().map(|g| g.mape).collect();
    let mean = mapes.iter().sum::<f64>() / mapes.len() as f64;
    Some(BacktestSummary {
        games_tested: games.len(),
        mean_mape: mean,
        median_mape: median(&mapes),
        min_mape: mapes[0],
        max_mape: mapes[mapes.len() - 1],
        confidence: Confidence::from_mape(mean),
    })
}

/// Backtest every retention series in the library.
pub fn run_backtest(samples: &SampleLibrary, k: &ModelConstants) -> BacktestReport {
    let mut games = Vec::new();
    let mut skipped = Vec::new();
    for (name, actual) in &samples.retention {
        match test_game(name, actual, k) {
            Ok(g) => games.push(g),
            Err(reason) => {
                warn!(game = %name, days = actual.len(), ?reason, "backtest skipped");
                skipped.push(SkippedGame {
                    name: name.clone(),
                    days: actual.len(),
                    reason,
                });
            }
        }
    }
    games.sort_by(|a, b| a.mape.total_cmp(&b.mape));
    let summary = summarize(&games);
    if let Some(s) = &summary {
        info!(games = s.games_tested, mean_mape = s.mean_mape, confidence = %s.confidence, "backtest done");
    }
    BacktestReport {
        games,
        skipped,
        summary,
    }
}

impl BacktestReport {
    /// Plain-text report.
    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "{:<24} {:>8} {:>8} {:>9} {:>8} {:>9} {:>8}",
            "Game", "D1 Act", "D30 Act", "D30 Pred", "D60 Act", "D60 Pred", "MAPE"
        );
        for g in &self.games {
            let _ = writeln!(
                out,
                "{:<24} {:>8.3} {:>8.3} {:>9.3} {:>8.3} {:>9.3} {:>7.1}%{}",
                g.name,
                g.d1_actual,
                g.d30_actual,
                g.d30_predicted,
                g.d60_actual,
                g.d60_predicted,
                g.mape,
                if g.fallback { " (default b)" } else { "" }
            );
        }
        for s in &self.skipped {
            let _ = writeln!(out, "{:<24} skipped: {:?} ({} days)", s.name, s.reason, s.days);
        }
        match &self.summary {
            Some(s) => {
                let _ = writeln!(
                    out,
                    "\ntested {}  mean {:.2}%  median {:.2}%  best {:.2}%  worst {:.2}%  confidence {}",
                    s.games_tested, s.mean_mape, s.median_mape, s.min_mape, s.max_mape, s.confidence
                );
            }
            None => {
                let _ = writeln!(out, "\nno games with {TEST_DAYS}+ days of retention data");
            }
        }
        out
    }
}
