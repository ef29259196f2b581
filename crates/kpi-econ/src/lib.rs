#![deny(warnings)]

//! Numeric components of the projection pipeline.
//!
//! Each module is a set of pure functions over immutable inputs:
//! - `retention`: anchored power-law retention fit
//! - `acquisition`: budget to daily new-user series
//! - `cohort`: cohort summation of NRU and retention into DAU
//! - `blend`: internal/benchmark blending of retention, pay rate and ARPPU
//! - `revenue`: gross/net revenue, cost schedule and scenario summary

pub mod acquisition;
pub mod blend;
pub mod cohort;
pub mod retention;
pub mod revenue;

use thiserror::Error;

/// Errors produced by the numeric components.
#[derive(Debug, Error, PartialEq)]
pub enum EconError {
    /// Decay exponent outside the sane band; carries the fitted coefficients.
    #[error("degenerate retention fit: a = {a}, b = {b}")]
    DegenerateFit { a: f64, b: f64 },
    #[error("day-1 retention must be within (0, 1], got {0}")]
    InvalidRetention(f64),
    #[error("target CPA must be > 0, got {0}")]
    InvalidCpa(f64),
    #[error("{0} budget must be >= 0")]
    NegativeBudget(&'static str),
    #[error("blend weight {0} outside [0, 1]")]
    InvalidWeight(f64),
    #[error("model constant {0} is out of range")]
    InvalidConstant(&'static str),
    #[error("series length mismatch: expected {expected}, got {got}")]
    LengthMismatch { expected: usize, got: usize },
}

/// `num / den`, or zero when the denominator is not positive.
pub(crate) fn ratio_or_zero(num: f64, den: f64) -> f64 {
    if den > 0.0 {
        num / den
    } else {
        0.0
    }
}

/// Value at `i`, holding the last element past the end; zero when empty.
pub(crate) fn hold_last(series: &[f64], i: usize) -> f64 {
    series
        .get(i)
        .or_else(|| series.last())
        .copied()
        .unwrap_or(0.0)
}
