//! Benchmark blending of internal sample values with market references.
//!
//! `blended = internal * w + benchmark * q * (1 - w)` where `q` is the
//! quality multiplier (benchmark side only). With time-decay on, `w` falls
//! linearly from the configured weight on day 1 to its floor on
//! `blend_decay_days` and stays there.

use crate::{hold_last, EconError};
use kpi_core::tables::{bm_reference, quality_multiplier, BmReference};
use kpi_core::{
    BlendParams, BmType, MarketBenchmarks, Metric, ModelConstants, ProjectionAssumptions,
    QualityScore, SampleLibrary,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Internal weight per day.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BlendSchedule {
    weight: f64,
    floor: f64,
    decay_days: u32,
    time_decay: bool,
}

impl BlendSchedule {
    /// Schedule from the blending inputs. The floor never exceeds the
    /// configured weight; out-of-range constants are errors, not clamped.
    pub fn new(params: &BlendParams, k: &ModelConstants) -> Result<Self, EconError> {
        let w = params.internal_weight;
        if !w.is_finite() || !(0.0..=1.0).contains(&w) {
            return Err(EconError::InvalidWeight(w));
        }
        let floor = k.internal_weight_floor;
        if !floor.is_finite() || !(0.0..=1.0).contains(&floor) {
            return Err(EconError::InvalidWeight(floor));
        }
        if k.blend_decay_days < 2 {
            return Err(EconError::InvalidConstant("blend_decay_days"));
        }
        Ok(Self {
            weight: w,
            floor: floor.min(w),
            decay_days: k.blend_decay_days,
            time_decay: params.time_decay,
        })
    }

    /// Internal weight on 1-based `day`.
    pub fn weight_at(&self, day: u32) -> f64 {
        if !self.time_decay {
            return self.weight;
        }
        let progress = (day.saturating_sub(1) as f64) / (self.decay_days - 1) as f64;
        let remaining = (1.0 - progress).max(0.0);
        self.floor + (self.weight - self.floor) * remaining
    }
}

/// Weighted blend of one value pair.
pub fn blend_value(internal: f64, benchmark: f64, weight: f64, quality: f64) -> f64 {
    internal * weight + benchmark * quality * (1.0 - weight)
}

/// Day-wise blend over `len` days; inputs hold their last value.
pub fn blend_series(
    internal: &[f64],
    benchmark: &[f64],
    len: usize,
    schedule: &BlendSchedule,
    quality: f64,
) -> Vec<f64> {
    (0..len)
        .map(|i| {
            blend_value(
                hold_last(internal, i),
                hold_last(benchmark, i),
                schedule.weight_at(i as u32 + 1),
                quality,
            )
        })
        .collect()
}

/// Origin of the retention benchmark.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BenchmarkSource {
    MarketTable,
    BmReference,
}

/// Blending configuration actually applied, for audit.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AppliedBlend {
    pub internal_weight: f64,
    pub time_decay: bool,
    pub quality_score: Option<QualityScore>,
    pub quality_multiplier: f64,
    pub bm_type: BmType,
    pub bm_reference: BmReference,
    pub retention_benchmark: BenchmarkSource,
    /// Metrics for which sample history was found.
    pub internal_metrics: Vec<Metric>,
}

/// Normal-scenario blended values.
#[derive(Clone, Debug, PartialEq)]
pub struct BlendedMetrics {
    /// Blended retention history for the regression; `None` without samples.
    pub retention_history: Option<Vec<f64>>,
    pub pay_rate: Vec<f64>,
    pub arppu: Vec<f64>,
    pub applied: AppliedBlend,
}

/// Benchmark retention for days 1..=horizon.
fn benchmark_retention(
    a: &ProjectionAssumptions,
    market: &MarketBenchmarks,
    bm: &BmReference,
) -> (Vec<f64>, BenchmarkSource) {
    let b = &a.blending;
    match market.lookup(b.genre, &b.platforms, Metric::Retention) {
        Some(series) => (series, BenchmarkSource::MarketTable),
        None => {
            let curve = (1..=a.horizon())
                .map(|d| bm.d1_retention * (d as f64).powf(a.constants.default_retention_b))
                .collect();
            (curve, BenchmarkSource::BmReference)
        }
    }
}

/// Blend retention, pay rate and ARPPU for a run.
pub fn blend_metrics(
    a: &ProjectionAssumptions,
    samples: &SampleLibrary,
    market: &MarketBenchmarks,
) -> Result<BlendedMetrics, EconError> {
    let horizon = a.horizon();
    let schedule = BlendSchedule::new(&a.blending, &a.constants)?;
    let bm = bm_reference(a.blending.bm_type);
    let q = a.blending.quality_score.map(quality_multiplier).unwrap_or(1.0);
    let mut internal_metrics = Vec::new();

    let (ret_bench, retention_source) = benchmark_retention(a, market, &bm);
    let retention_history = samples
        .mean_series(Metric::Retention, &a.sample_games)
        .map(|hist| {
            internal_metrics.push(Metric::Retention);
            let len = hist.len().min(horizon);
            blend_series(&hist, &ret_bench, len, &schedule, q)
        });

    let mut blend_flat = |metric: Metric, reference: f64| {
        let bench = [reference];
        match samples.mean_series(metric, &a.sample_games) {
            Some(internal) => {
                internal_metrics.push(metric);
                blend_series(&internal, &bench, horizon, &schedule, q)
            }
            None => blend_series(&bench, &bench, horizon, &schedule, q),
        }
    };
    let pay_rate = blend_flat(Metric::PayRate, bm.pay_rate);
    let arppu = blend_flat(Metric::Arppu, bm.arppu);

    debug!(
        weight = a.blending.internal_weight,
        quality = q,
        ?retention_source,
        "metrics blended"
    );
    Ok(BlendedMetrics {
        retention_history,
        pay_rate,
        arppu,
        applied: AppliedBlend {
            internal_weight: a.blending.internal_weight,
            time_decay: a.blending.time_decay,
            quality_score: a.blending.quality_score,
            quality_multiplier: q,
            bm_type: a.blending.bm_type,
            bm_reference: bm,
            retention_benchmark: retention_source,
            internal_metrics,
        },
    })
}
