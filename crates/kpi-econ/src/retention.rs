//! Power-law retention fit anchored to a day-1 target.
//!
//! `retention(day) = a * day^b` with `a = r1`, so day 1 reproduces the
//! target exactly. The decay exponent comes from a log-log least-squares
//! regression over a retention history when one is available, otherwise from
//! the default pair (a = 1.336, b = -0.818). With r1 = 0.40 the default curve
//! gives D+7 ≈ 0.0814 and D+30 ≈ 0.0248.

use crate::EconError;
use kpi_core::ModelConstants;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Where the decay exponent came from.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum FitSource {
    Default,
    Regression { points: usize },
}

/// Anchored retention coefficients.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RetentionFit {
    /// Anchored scale, equal to the day-1 target.
    pub a: f64,
    /// Decay exponent.
    pub b: f64,
    /// Unanchored intercept of the fit (or the default pair's `a`).
    pub raw_a: f64,
    pub source: FitSource,
}

impl RetentionFit {
    /// Retention on 1-based `day`.
    pub fn at(&self, day: u32) -> f64 {
        self.a * (day as f64).powf(self.b)
    }

    /// Retention for days 1..=horizon.
    pub fn curve(&self, horizon: usize) -> Vec<f64> {
        (1..=horizon as u32).map(|d| self.at(d)).collect()
    }
}

/// Least squares on `ln r = ln a + b ln d` over positive points.
///
/// Returns `(a, b)`, or `None` with fewer than two usable points.
pub fn log_log_regression(history: &[f64]) -> Option<(f64, f64)> {
    let pts: Vec<(f64, f64)> = history
        .iter()
        .enumerate()
        .filter(|(_, r)| r.is_finite() && **r > 0.0)
        .map(|(i, r)| (((i + 1) as f64).ln(), r.ln()))
        .collect();
    if pts.len() < 2 {
        return None;
    }
    let n = pts.len() as f64;
    let mean_x = pts.iter().map(|p| p.0).sum::<f64>() / n;
    let mean_y = pts.iter().map(|p| p.1).sum::<f64>() / n;
    let sxx: f64 = pts.iter().map(|p| (p.0 - mean_x).powi(2)).sum();
    if sxx <= 0.0 {
        return None;
    }
    let sxy: f64 = pts.iter().map(|p| (p.0 - mean_x) * (p.1 - mean_y)).sum();
    let b = sxy / sxx;
    let a = (mean_y - b * mean_x).exp();
    Some((a, b))
}

/// Fit the retention curve for target `r1`.
///
/// A history with fewer than two positive points is treated as absent and
/// yields the default pair. An exponent outside
/// `[retention_b_min, retention_b_max]` is a `DegenerateFit`.
pub fn fit_retention(
    r1: f64,
    history: Option<&[f64]>,
    k: &ModelConstants,
) -> Result<RetentionFit, EconError> {
    if !r1.is_finite() || r1 <= 0.0 || r1 > 1.0 {
        return Err(EconError::InvalidRetention(r1));
    }
    let (raw_a, b, source) = match history.and_then(log_log_regression) {
        Some((raw_a, b)) => {
            let points = history.map(|h| h.iter().filter(|r| **r > 0.0).count());
            (
                raw_a,
                b,
                FitSource::Regression {
                    points: points.unwrap_or(0),
                },
            )
        }
        None => (k.default_retention_a, k.default_retention_b, FitSource::Default),
    };
    if !b.is_finite() || b < k.retention_b_min || b > k.retention_b_max {
        return Err(EconError::DegenerateFit { a: raw_a, b });
    }
    debug!(r1, b, ?source, "retention fitted");
    Ok(RetentionFit {
        a: r1,
        b,
        raw_a,
        source,
    })
}
