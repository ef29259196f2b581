//! Acquisition (NRU) model: marketing budget to a daily new-user series.
//!
//! The series is assembled from a steady-state base followed by independent
//! transforms (reservoir burst, brand time-lag, live events, scenario
//! scaling). Each transform takes a series by value and returns a new one, so
//! toggles never fork the rest of the pipeline.

use crate::EconError;
use kpi_core::{LiveEvent, MarketingParams, ModelConstants};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// CPA inflation factor for a combined budget.
///
/// 1.0 up to `saturation_threshold`, then `1 + ln(scale) * coefficient`.
pub fn saturation(ua_budget: f64, brand_budget: f64, k: &ModelConstants) -> f64 {
    let scale = (ua_budget + brand_budget) / k.saturation_threshold;
    if scale > 1.0 {
        1.0 + scale.ln() * k.saturation_log_coefficient
    } else {
        1.0
    }
}

/// Organic multiplier from brand spend: `1 + ln(1 + B / max(1, U)) * k`.
pub fn organic_boost(ua_budget: f64, brand_budget: f64, k: &ModelConstants) -> f64 {
    1.0 + (1.0 + brand_budget / ua_budget.max(1.0)).ln() * k.organic_boost_k
}

/// Budget-level acquisition totals, shared by every scenario.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AcquisitionPlan {
    pub saturation: f64,
    pub effective_cpa: f64,
    pub organic_boost: f64,
    pub organic_ratio: f64,
    /// `floor(U / cpa_eff)`.
    pub paid_total: f64,
    /// `floor(paid * organic_ratio)`.
    pub organic_total: f64,
    pub total: f64,
    /// Paid users bought pre-launch and converted from wishlists.
    pub reservoir_users: f64,
    /// Accumulated wishlists before launch.
    pub wishlist_pool: f64,
    /// Organic users attributable to brand spend.
    pub brand_organic: f64,
    pub base_organic: f64,
}

impl AcquisitionPlan {
    /// Paid users acquired after launch.
    pub fn launch_paid(&self) -> f64 {
        self.paid_total - self.reservoir_users
    }
}

/// Compute budget-level totals.
pub fn plan_acquisition(
    m: &MarketingParams,
    k: &ModelConstants,
) -> Result<AcquisitionPlan, EconError> {
    if !(m.target_cpa > 0.0) {
        return Err(EconError::InvalidCpa(m.target_cpa));
    }
    if m.ua_budget < 0.0 {
        return Err(EconError::NegativeBudget("ua"));
    }
    if m.brand_budget < 0.0 {
        return Err(EconError::NegativeBudget("brand"));
    }
    let (ua, brand) = (m.ua_budget, m.brand_budget);
    let sat = if m.saturation {
        saturation(ua, brand, k)
    } else {
        1.0
    };
    let effective_cpa = m.target_cpa * sat;
    let boost = organic_boost(ua, brand, k);
    let organic_ratio = m.base_organic_ratio * boost;

    let paid_total = (ua / effective_cpa).floor();
    let organic_total = (paid_total * organic_ratio).floor();
    let base_organic = (paid_total * m.base_organic_ratio).floor().min(organic_total);
    let reservoir_users = (m.pre_marketing_share * ua / effective_cpa)
        .floor()
        .min(paid_total);
    let wishlist_pool = reservoir_users / m.wishlist_conversion_rate;

    let plan = AcquisitionPlan {
        saturation: sat,
        effective_cpa,
        organic_boost: boost,
        organic_ratio,
        paid_total,
        organic_total,
        total: paid_total + organic_total,
        reservoir_users,
        wishlist_pool,
        brand_organic: organic_total - base_organic,
        base_organic,
    };
    debug!(
        effective_cpa,
        paid = plan.paid_total,
        organic = plan.organic_total,
        "acquisition planned"
    );
    Ok(plan)
}

/// Daily NRU split by acquisition channel.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NruSeries {
    pub paid: Vec<f64>,
    pub organic: Vec<f64>,
}

impl NruSeries {
    pub fn zeros(horizon: usize) -> Self {
        Self {
            paid: vec![0.0; horizon],
            organic: vec![0.0; horizon],
        }
    }

    pub fn len(&self) -> usize {
        self.paid.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paid.is_empty()
    }

    /// Paid plus organic per day.
    pub fn total(&self) -> Vec<f64> {
        self.paid
            .iter()
            .zip(&self.organic)
            .map(|(p, o)| p + o)
            .collect()
    }

    pub fn paid_sum(&self) -> f64 {
        self.paid.iter().sum()
    }

    pub fn organic_sum(&self) -> f64 {
        self.organic.iter().sum()
    }

    /// Multiply both channels by `factor`.
    pub fn scaled(self, factor: f64) -> Self {
        Self {
            paid: self.paid.into_iter().map(|v| v * factor).collect(),
            organic: self.organic.into_iter().map(|v| v * factor).collect(),
        }
    }
}

/// Normalized weights for `users` spread over the series.
fn spread(series: &mut [f64], users: f64, weights: &[f64]) {
    let sum: f64 = weights.iter().sum();
    if sum <= 0.0 || users == 0.0 {
        return;
    }
    for (slot, w) in series.iter_mut().zip(weights) {
        *slot += users * w / sum;
    }
}

/// Power-law acquisition pattern `d^-exponent` for days 1..=horizon.
pub fn steady_pattern(horizon: usize, exponent: f64) -> Vec<f64> {
    (1..=horizon).map(|d| (d as f64).powf(-exponent)).collect()
}

/// Weights of the reservoir burst over the horizon.
///
/// With time-lag on, `burst_d1_share` lands on day 1 and the rest follows the
/// tail weights over days 2..=7. Otherwise everything lands on day 1.
pub fn burst_profile(horizon: usize, time_lag: bool, k: &ModelConstants) -> Vec<f64> {
    let mut w = vec![0.0; horizon];
    if horizon == 0 {
        return w;
    }
    let tail_days = horizon.saturating_sub(1).min(k.burst_tail_weights.len());
    let tail = &k.burst_tail_weights[..tail_days];
    let tail_sum: f64 = tail.iter().sum();
    if !time_lag || tail_sum <= 0.0 {
        w[0] = 1.0;
        return w;
    }
    w[0] = k.burst_d1_share;
    for (i, t) in tail.iter().enumerate() {
        w[i + 1] = (1.0 - k.burst_d1_share) * t / tail_sum;
    }
    w
}

/// Brand uplift weights: a bell curve over the lag window, or uniform.
pub fn brand_profile(horizon: usize, time_lag: bool, k: &ModelConstants) -> Vec<f64> {
    if !time_lag {
        return vec![1.0; horizon];
    }
    let window = (k.brand_lag_window as usize).min(horizon);
    let z2 = |d: usize| {
        let z = (d as f64 - k.brand_lag_center) / k.brand_lag_sd;
        z * z
    };
    // Measured from the day nearest the center so a far-off center cannot
    // underflow the whole window to zero.
    let nearest = (1..=window).map(z2).fold(f64::INFINITY, f64::min);
    (1..=horizon)
        .map(|d| {
            if d <= window {
                (-0.5 * (z2(d) - nearest)).exp()
            } else {
                0.0
            }
        })
        .collect()
}

/// Steady-state launch acquisition: post-launch paid users and base organic
/// users following the power-law pattern.
pub fn steady_state(plan: &AcquisitionPlan, horizon: usize, k: &ModelConstants) -> NruSeries {
    let pattern = steady_pattern(horizon, k.acquisition_day_exponent);
    let mut out = NruSeries::zeros(horizon);
    spread(&mut out.paid, plan.launch_paid(), &pattern);
    spread(&mut out.organic, plan.base_organic, &pattern);
    out
}

/// Add the pre-launch reservoir burst (paid users).
pub fn with_reservoir_burst(
    mut series: NruSeries,
    users: f64,
    time_lag: bool,
    k: &ModelConstants,
) -> NruSeries {
    let profile = burst_profile(series.len(), time_lag, k);
    spread(&mut series.paid, users, &profile);
    series
}

/// Add brand-driven organic uplift (organic users).
pub fn with_brand_lag(
    mut series: NruSeries,
    users: f64,
    time_lag: bool,
    k: &ModelConstants,
) -> NruSeries {
    let profile = brand_profile(series.len(), time_lag, k);
    spread(&mut series.organic, users, &profile);
    series
}

/// Live-event traffic boosts.
///
/// An event in month `m >= 2` starts on day index `(m - 1) * 30` and adds
/// `prev * (traffic_boost - 1)` (organic x1.5) fading linearly over 7 days.
pub fn with_live_events(mut series: NruSeries, events: &[LiveEvent]) -> NruSeries {
    let horizon = series.len();
    for ev in events {
        if ev.month < 2 {
            continue;
        }
        let start = (ev.month as usize - 1) * 30;
        if start >= horizon {
            continue;
        }
        let boost_paid = series.paid[start - 1] * (ev.traffic_boost - 1.0);
        let boost_org = series.organic[start - 1] * (ev.traffic_boost - 1.0) * 1.5;
        for step in 0..7.min(horizon - start) {
            let fade = 1.0 - step as f64 / 7.0;
            let t = start + step;
            series.paid[t] = (series.paid[t] + boost_paid * fade).max(0.0);
            series.organic[t] = (series.organic[t] + boost_org * fade).max(0.0);
        }
    }
    series
}

/// Build the base daily NRU series for the plan (before live events and
/// scenario scaling). Channel sums equal the plan totals.
pub fn build_nru(
    plan: &AcquisitionPlan,
    horizon: usize,
    time_lag: bool,
    k: &ModelConstants,
) -> NruSeries {
    let base = steady_state(plan, horizon, k);
    let burst = with_reservoir_burst(base, plan.reservoir_users, time_lag, k);
    with_brand_lag(burst, plan.brand_organic, time_lag, k)
}
