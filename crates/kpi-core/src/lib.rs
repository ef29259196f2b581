#![deny(warnings)]

//! Core domain models and invariants for the KPI projection engine.
//!
//! This crate defines the serializable input value (`ProjectionAssumptions`),
//! the read-only lookup inputs (internal sample library, market benchmark
//! table), the documented model constants and validation helpers that reject
//! malformed assumptions before any computation starts.

pub mod tables;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;
use tracing::debug;

/// The three projection scenarios.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scenario {
    Best,
    Normal,
    Worst,
}

impl Scenario {
    /// All scenarios in reporting order.
    pub const ALL: [Scenario; 3] = [Scenario::Best, Scenario::Normal, Scenario::Worst];

    pub fn as_str(&self) -> &'static str {
        match self {
            Scenario::Best => "best",
            Scenario::Normal => "normal",
            Scenario::Worst => "worst",
        }
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Distribution platform.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Platform {
    Mobile,
    #[serde(rename = "PC")]
    Pc,
    Console,
}

/// Game genre used to key market benchmarks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Genre {
    #[serde(rename = "RPG")]
    Rpg,
    Strategy,
    Action,
    Puzzle,
    Simulation,
    Casual,
    Sports,
}

/// Launch region. Recorded for audit; it does not alter the numeric pipeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Region {
    Global,
    Korea,
    Japan,
    NorthAmerica,
    Europe,
    SoutheastAsia,
    China,
}

/// Subjective quality grade applied to benchmark-sourced values.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum QualityScore {
    S,
    A,
    B,
    C,
    D,
}

/// Business model type selecting the pay-rate/ARPPU reference record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum BmType {
    Hardcore,
    Midcore,
    Casual,
    #[serde(rename = "F2P_Cosmetic")]
    F2pCosmetic,
    Gacha,
}

/// Blended metrics tracked per day.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Retention,
    PayRate,
    Arppu,
}

/// One value per scenario.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScenarioValues<T> {
    pub best: T,
    pub normal: T,
    pub worst: T,
}

impl<T> ScenarioValues<T> {
    pub fn get(&self, scenario: Scenario) -> &T {
        match scenario {
            Scenario::Best => &self.best,
            Scenario::Normal => &self.normal,
            Scenario::Worst => &self.worst,
        }
    }
}

/// Marketing inputs for the acquisition model.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MarketingParams {
    /// User-acquisition budget (currency units, >= 0).
    pub ua_budget: f64,
    /// Brand budget (currency units, >= 0).
    pub brand_budget: f64,
    /// Target cost per acquisition (> 0).
    pub target_cpa: f64,
    /// Organic users per paid user before brand boost (>= 0).
    pub base_organic_ratio: f64,
    /// Share of the UA budget spent pre-launch on wishlists, in [0, 1].
    #[serde(default)]
    pub pre_marketing_share: f64,
    /// Wishlist to install conversion, in (0, 1].
    pub wishlist_conversion_rate: f64,
    /// Apply budget-saturation CPA inflation.
    #[serde(default = "default_true")]
    pub saturation: bool,
    /// Spread the reservoir burst over days 2-7 and lag brand uplift.
    #[serde(default = "default_true")]
    pub time_lag: bool,
}

/// Scenario adjustment relative to Normal. `0.1` means +10%.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ScenarioDelta {
    #[serde(default)]
    pub nru_delta: f64,
    #[serde(default)]
    pub pay_rate_delta: f64,
    #[serde(default)]
    pub arppu_delta: f64,
}

/// Best and Worst adjustments; Normal is the zero delta by definition.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScenarioDeltas {
    pub best: ScenarioDelta,
    pub worst: ScenarioDelta,
}

impl ScenarioDeltas {
    pub fn get(&self, scenario: Scenario) -> ScenarioDelta {
        match scenario {
            Scenario::Best => self.best,
            Scenario::Normal => ScenarioDelta::default(),
            Scenario::Worst => self.worst,
        }
    }
}

/// Optional ad monetization.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct AdRevenueParams {
    pub impressions_per_dau: f64,
    /// Revenue per thousand impressions.
    pub ecpm: f64,
}

/// Revenue inputs.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RevenueParams {
    /// Explicit Best/Worst deltas; `None` uses the BM-type defaults.
    #[serde(default)]
    pub scenario_deltas: Option<ScenarioDeltas>,
    /// Flat package price charged once per new user.
    #[serde(default)]
    pub package_price: Option<f64>,
    #[serde(default)]
    pub ads: Option<AdRevenueParams>,
    /// Apply weekday and monthly seasonality factors.
    #[serde(default = "default_true")]
    pub seasonality: bool,
}

/// A staffed role with monthly unit cost.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HrRole {
    pub role: String,
    pub headcount: u32,
    pub monthly_cost: f64,
}

/// Cost inputs. Ratios are fractions of gross revenue.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CostParams {
    pub infrastructure_ratio: f64,
    pub market_fee_ratio: f64,
    pub vat_ratio: f64,
    #[serde(default)]
    pub hr: Vec<HrRole>,
    pub sustaining_marketing_ratio: f64,
    /// Development cost amortized evenly over the horizon.
    #[serde(default)]
    pub dev_cost: Option<f64>,
}

impl CostParams {
    /// Total HR cost per month.
    pub fn hr_monthly(&self) -> f64 {
        self.hr
            .iter()
            .map(|r| r.headcount as f64 * r.monthly_cost)
            .sum()
    }
}

/// Internal/benchmark blending configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BlendParams {
    /// Internal-weight fraction in [0, 1].
    pub internal_weight: f64,
    pub genre: Genre,
    pub platforms: Vec<Platform>,
    #[serde(default)]
    pub quality_score: Option<QualityScore>,
    pub bm_type: BmType,
    #[serde(default)]
    pub regions: Vec<Region>,
    #[serde(default)]
    pub time_decay: bool,
}

/// A live-ops event boosting traffic and revenue in a 30-day month block.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LiveEvent {
    /// 1-based month block.
    pub month: u32,
    pub name: String,
    #[serde(default = "default_one")]
    pub traffic_boost: f64,
    #[serde(default = "default_one")]
    pub revenue_boost: f64,
}

/// Documented numeric constants of the model.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConstants {
    /// Combined budget above which CPA saturates.
    pub saturation_threshold: f64,
    pub saturation_log_coefficient: f64,
    /// Organic boost coefficient `k`.
    pub organic_boost_k: f64,
    /// Exponent of the steady-state acquisition decay `d^-x`.
    pub acquisition_day_exponent: f64,
    /// Share of reservoir users landing on day 1 when time-lag is on.
    pub burst_d1_share: f64,
    /// Weights for days 2..=7 of the reservoir tail.
    pub burst_tail_weights: Vec<f64>,
    pub brand_lag_center: f64,
    pub brand_lag_sd: f64,
    pub brand_lag_window: u32,
    /// Day at which time-decayed internal weight reaches its floor.
    pub blend_decay_days: u32,
    pub internal_weight_floor: f64,
    pub default_retention_a: f64,
    pub default_retention_b: f64,
    pub retention_b_min: f64,
    pub retention_b_max: f64,
    /// Days over which launch marketing spend is booked.
    pub marketing_spend_days: u32,
    /// Days per HR month.
    pub days_per_month: f64,
}

impl Default for ModelConstants {
    fn default() -> Self {
        Self {
            saturation_threshold: 500_000_000.0,
            saturation_log_coefficient: 0.1,
            organic_boost_k: 0.7,
            acquisition_day_exponent: 0.8,
            burst_d1_share: 0.8,
            burst_tail_weights: vec![6.0, 5.0, 4.0, 3.0, 2.0, 1.0],
            brand_lag_center: 15.0,
            brand_lag_sd: 20.0,
            brand_lag_window: 60,
            blend_decay_days: 90,
            internal_weight_floor: 0.1,
            default_retention_a: 1.336,
            default_retention_b: -0.818,
            retention_b_min: -1.0,
            retention_b_max: -0.3,
            marketing_spend_days: 30,
            days_per_month: 30.0,
        }
    }
}

/// Full, immutable input of one projection run.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProjectionAssumptions {
    pub launch_date: NaiveDate,
    /// Horizon length in days (>= 1).
    #[serde(default = "default_horizon")]
    pub horizon_days: u32,
    /// Day-1 retention target per scenario, in (0, 1].
    pub retention_targets: ScenarioValues<f64>,
    pub marketing: MarketingParams,
    pub revenue: RevenueParams,
    pub cost: CostParams,
    pub blending: BlendParams,
    /// Sample-game identifiers used to derive internal values.
    #[serde(default)]
    pub sample_games: Vec<String>,
    #[serde(default)]
    pub live_events: Vec<LiveEvent>,
    #[serde(default)]
    pub constants: ModelConstants,
}

impl ProjectionAssumptions {
    /// Horizon as a series length.
    pub fn horizon(&self) -> usize {
        self.horizon_days as usize
    }

    /// Scenario deltas actually in force for this run.
    pub fn scenario_deltas(&self) -> ScenarioDeltas {
        self.revenue
            .scenario_deltas
            .unwrap_or_else(|| tables::default_scenario_deltas(self.blending.bm_type))
    }
}

fn default_true() -> bool {
    true
}

fn default_one() -> f64 {
    1.0
}

fn default_horizon() -> u32 {
    365
}

/// Internal sample-game history, keyed by game name. Series start at D+1.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SampleLibrary {
    #[serde(default)]
    pub retention: BTreeMap<String, Vec<f64>>,
    #[serde(default)]
    pub nru: BTreeMap<String, Vec<f64>>,
    #[serde(default)]
    pub payment_rate: BTreeMap<String, Vec<f64>>,
    #[serde(default)]
    pub arppu: BTreeMap<String, Vec<f64>>,
}

impl SampleLibrary {
    /// Series of `metric` for `game`, if present and non-empty.
    pub fn series(&self, metric: Metric, game: &str) -> Option<&[f64]> {
        let map = match metric {
            Metric::Retention => &self.retention,
            Metric::PayRate => &self.payment_rate,
            Metric::Arppu => &self.arppu,
        };
        map.get(game).map(Vec::as_slice).filter(|s| !s.is_empty())
    }

    /// Whether any metric (including NRU) is recorded for `game`.
    pub fn contains_game(&self, game: &str) -> bool {
        self.retention.contains_key(game)
            || self.nru.contains_key(game)
            || self.payment_rate.contains_key(game)
            || self.arppu.contains_key(game)
    }

    /// Day-wise mean of `metric` over `games`. Shorter series hold their last
    /// value. Returns `None` when no listed game carries the metric.
    pub fn mean_series(&self, metric: Metric, games: &[String]) -> Option<Vec<f64>> {
        let series: Vec<&[f64]> = games
            .iter()
            .filter_map(|g| self.series(metric, g))
            .collect();
        mean_holding_last(&series)
    }
}

/// One market benchmark series for a genre/platform/metric key.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkEntry {
    pub genre: Genre,
    pub platform: Platform,
    pub metric: Metric,
    pub values: Vec<f64>,
}

/// Static external benchmark table.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketBenchmarks {
    #[serde(default)]
    pub entries: Vec<BenchmarkEntry>,
}

impl MarketBenchmarks {
    /// Day-wise mean over the platform set of entries matching `genre` and
    /// `metric`. `None` when the table has no such entry.
    pub fn lookup(&self, genre: Genre, platforms: &[Platform], metric: Metric) -> Option<Vec<f64>> {
        let series: Vec<&[f64]> = self
            .entries
            .iter()
            .filter(|e| {
                e.genre == genre
                    && e.metric == metric
                    && platforms.contains(&e.platform)
                    && !e.values.is_empty()
            })
            .map(|e| e.values.as_slice())
            .collect();
        mean_holding_last(&series)
    }
}

fn mean_holding_last(series: &[&[f64]]) -> Option<Vec<f64>> {
    // Empty series carry no data and do not count toward the mean.
    let series: Vec<&[f64]> = series.iter().copied().filter(|s| !s.is_empty()).collect();
    let len = series.iter().map(|s| s.len()).max()?;
    let n = series.len() as f64;
    let mut out = vec![0.0; len];
    for s in &series {
        let Some(&last) = s.last() else { continue };
        for (i, slot) in out.iter_mut().enumerate() {
            *slot += s.get(i).copied().unwrap_or(last);
        }
    }
    for v in &mut out {
        *v /= n;
    }
    Some(out)
}

/// Input validation errors. Raised before any computation starts.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("horizon must be at least 1 day, got {0}")]
    HorizonTooShort(u32),
    #[error("internal blending weight {0} is outside [0, 1]")]
    WeightOutOfRange(f64),
    #[error("target CPA must be > 0, got {0}")]
    NonPositiveCpa(f64),
    #[error("{field} must be >= 0, got {value}")]
    Negative { field: &'static str, value: f64 },
    #[error("{field} must be within [0, 1], got {value}")]
    RatioOutOfRange { field: &'static str, value: f64 },
    #[error("{scenario} day-1 retention must be within (0, 1], got {value}")]
    RetentionOutOfRange { scenario: Scenario, value: f64 },
    #[error("wishlist conversion rate must be within (0, 1], got {0}")]
    WishlistConversion(f64),
    #[error("{scenario} {field} must be > -1, got {value}")]
    DeltaOutOfRange {
        scenario: Scenario,
        field: &'static str,
        value: f64,
    },
    #[error("non-finite value in {0}")]
    NonFinite(&'static str),
    #[error("platform set is empty")]
    EmptyPlatforms,
    #[error("live event {name:?} has invalid month {month}")]
    LiveEventMonth { name: String, month: u32 },
    #[error("invalid model constant: {0}")]
    InvalidConstant(&'static str),
}

fn finite(field: &'static str, v: f64) -> Result<(), ValidationError> {
    if v.is_finite() {
        Ok(())
    } else {
        Err(ValidationError::NonFinite(field))
    }
}

fn non_negative(field: &'static str, v: f64) -> Result<(), ValidationError> {
    finite(field, v)?;
    if v < 0.0 {
        return Err(ValidationError::Negative { field, value: v });
    }
    Ok(())
}

fn unit_ratio(field: &'static str, v: f64) -> Result<(), ValidationError> {
    finite(field, v)?;
    if !(0.0..=1.0).contains(&v) {
        return Err(ValidationError::RatioOutOfRange { field, value: v });
    }
    Ok(())
}

/// Validate marketing inputs.
pub fn validate_marketing(m: &MarketingParams) -> Result<(), ValidationError> {
    non_negative("ua_budget", m.ua_budget)?;
    non_negative("brand_budget", m.brand_budget)?;
    finite("target_cpa", m.target_cpa)?;
    if m.target_cpa <= 0.0 {
        return Err(ValidationError::NonPositiveCpa(m.target_cpa));
    }
    non_negative("base_organic_ratio", m.base_organic_ratio)?;
    unit_ratio("pre_marketing_share", m.pre_marketing_share)?;
    finite("wishlist_conversion_rate", m.wishlist_conversion_rate)?;
    if m.wishlist_conversion_rate <= 0.0 || m.wishlist_conversion_rate > 1.0 {
        return Err(ValidationError::WishlistConversion(
            m.wishlist_conversion_rate,
        ));
    }
    Ok(())
}

/// Validate blending inputs.
pub fn validate_blending(b: &BlendParams) -> Result<(), ValidationError> {
    if !b.internal_weight.is_finite() || !(0.0..=1.0).contains(&b.internal_weight) {
        return Err(ValidationError::WeightOutOfRange(b.internal_weight));
    }
    if b.platforms.is_empty() {
        return Err(ValidationError::EmptyPlatforms);
    }
    Ok(())
}

/// Validate cost inputs.
pub fn validate_cost(c: &CostParams) -> Result<(), ValidationError> {
    unit_ratio("infrastructure_ratio", c.infrastructure_ratio)?;
    unit_ratio("market_fee_ratio", c.market_fee_ratio)?;
    unit_ratio("vat_ratio", c.vat_ratio)?;
    unit_ratio("sustaining_marketing_ratio", c.sustaining_marketing_ratio)?;
    for r in &c.hr {
        non_negative("hr.monthly_cost", r.monthly_cost)?;
    }
    if let Some(dev) = c.dev_cost {
        non_negative("dev_cost", dev)?;
    }
    Ok(())
}

/// Validate revenue inputs and the scenario deltas in force.
pub fn validate_revenue(r: &RevenueParams, deltas: &ScenarioDeltas) -> Result<(), ValidationError> {
    if let Some(p) = r.package_price {
        non_negative("package_price", p)?;
    }
    if let Some(ads) = &r.ads {
        non_negative("ads.impressions_per_dau", ads.impressions_per_dau)?;
        non_negative("ads.ecpm", ads.ecpm)?;
    }
    for scenario in Scenario::ALL {
        let d = deltas.get(scenario);
        for (field, value) in [
            ("nru_delta", d.nru_delta),
            ("pay_rate_delta", d.pay_rate_delta),
            ("arppu_delta", d.arppu_delta),
        ] {
            if !value.is_finite() || value <= -1.0 {
                return Err(ValidationError::DeltaOutOfRange {
                    scenario,
                    field,
                    value,
                });
            }
        }
    }
    Ok(())
}

/// Validate model constants. Every constant that shapes a series or a
/// divisor is checked so that acquisition never goes negative and every
/// profile has positive mass.
pub fn validate_constants(k: &ModelConstants) -> Result<(), ValidationError> {
    finite("saturation_threshold", k.saturation_threshold)?;
    if k.saturation_threshold <= 0.0 {
        return Err(ValidationError::InvalidConstant("saturation_threshold"));
    }
    // Saturation >= 1 keeps the effective CPA at or above the target CPA.
    non_negative("saturation_log_coefficient", k.saturation_log_coefficient)?;
    non_negative("organic_boost_k", k.organic_boost_k)?;
    non_negative("acquisition_day_exponent", k.acquisition_day_exponent)?;
    unit_ratio("burst_d1_share", k.burst_d1_share)?;
    for w in &k.burst_tail_weights {
        non_negative("burst_tail_weights", *w)?;
    }
    if !k.burst_tail_weights.is_empty() && k.burst_tail_weights.iter().sum::<f64>() <= 0.0 {
        return Err(ValidationError::InvalidConstant("burst_tail_weights"));
    }
    finite("brand_lag_center", k.brand_lag_center)?;
    finite("brand_lag_sd", k.brand_lag_sd)?;
    if k.brand_lag_sd <= 0.0 {
        return Err(ValidationError::InvalidConstant("brand_lag_sd"));
    }
    if k.brand_lag_window < 1 {
        return Err(ValidationError::InvalidConstant("brand_lag_window"));
    }
    if k.blend_decay_days < 2 {
        return Err(ValidationError::InvalidConstant("blend_decay_days"));
    }
    unit_ratio("internal_weight_floor", k.internal_weight_floor)?;
    finite("default_retention_a", k.default_retention_a)?;
    if k.default_retention_a <= 0.0 {
        return Err(ValidationError::InvalidConstant("default_retention_a"));
    }
    finite("default_retention_b", k.default_retention_b)?;
    finite("retention_b_min", k.retention_b_min)?;
    finite("retention_b_max", k.retention_b_max)?;
    if k.retention_b_min >= k.retention_b_max {
        return Err(ValidationError::InvalidConstant("retention_b band"));
    }
    if k.marketing_spend_days < 1 {
        return Err(ValidationError::InvalidConstant("marketing_spend_days"));
    }
    finite("days_per_month", k.days_per_month)?;
    if k.days_per_month <= 0.0 {
        return Err(ValidationError::InvalidConstant("days_per_month"));
    }
    Ok(())
}

/// Validate a complete assumptions value. Nothing is coerced.
pub fn validate_assumptions(a: &ProjectionAssumptions) -> Result<(), ValidationError> {
    if a.horizon_days < 1 {
        return Err(ValidationError::HorizonTooShort(a.horizon_days));
    }
    for scenario in Scenario::ALL {
        let r1 = *a.retention_targets.get(scenario);
        if !r1.is_finite() || r1 <= 0.0 || r1 > 1.0 {
            return Err(ValidationError::RetentionOutOfRange {
                scenario,
                value: r1,
            });
        }
    }
    validate_marketing(&a.marketing)?;
    validate_blending(&a.blending)?;
    validate_cost(&a.cost)?;
    validate_revenue(&a.revenue, &a.scenario_deltas())?;
    for ev in &a.live_events {
        if ev.month == 0 {
            return Err(ValidationError::LiveEventMonth {
                name: ev.name.clone(),
                month: ev.month,
            });
        }
        non_negative("live_events.traffic_boost", ev.traffic_boost)?;
        non_negative("live_events.revenue_boost", ev.revenue_boost)?;
    }
    validate_constants(&a.constants)?;
    debug!(horizon = a.horizon_days, "assumptions validated");
    Ok(())
}


#[cfg(test)]
mod tests {
    use super::fixtures::assumptions;
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn fixture_is_valid() {
        validate_assumptions(&assumptions()).unwrap();
    }

    #[test]
    fn horizon_zero_rejected() {
        let mut a = assumptions();
        a.horizon_days = 0;
        assert_eq!(
            validate_assumptions(&a),
            Err(ValidationError::HorizonTooShort(0))
        );
    }

    #[test]
    fn weight_outside_unit_interval_rejected_not_clamped() {
        let mut a = assumptions();
        a.blending.internal_weight = 1.2;
        assert_eq!(
            validate_assumptions(&a),
            Err(ValidationError::WeightOutOfRange(1.2))
        );
        a.blending.internal_weight = -0.01;
        assert!(validate_assumptions(&a).is_err());
        assert_eq!(a.blending.internal_weight, -0.01);
    }

    #[test]
    fn non_positive_cpa_rejected() {
        let mut a = assumptions();
        a.marketing.target_cpa = 0.0;
        assert_eq!(
            validate_assumptions(&a),
            Err(ValidationError::NonPositiveCpa(0.0))
        );
    }

    #[test]
    fn negative_budget_rejected() {
        let mut a = assumptions();
        a.marketing.ua_budget = -1.0;
        assert_eq!(
            validate_assumptions(&a),
            Err(ValidationError::Negative {
                field: "ua_budget",
                value: -1.0
            })
        );
    }

    #[test]
    fn retention_target_bounds() {
        let mut a = assumptions();
        a.retention_targets.worst = 0.0;
        assert!(matches!(
            validate_assumptions(&a),
            Err(ValidationError::RetentionOutOfRange {
                scenario: Scenario::Worst,
                ..
            })
        ));
    }

    #[test]
    fn delta_of_minus_one_rejected() {
        let mut a = assumptions();
        a.revenue.scenario_deltas = Some(ScenarioDeltas {
            best: ScenarioDelta::default(),
            worst: ScenarioDelta {
                nru_delta: -1.0,
                ..Default::default()
            },
        });
        assert!(matches!(
            validate_assumptions(&a),
            Err(ValidationError::DeltaOutOfRange {
                field: "nru_delta",
                ..
            })
        ));
    }

    fn constants_with(edit: impl FnOnce(&mut ModelConstants)) -> Result<(), ValidationError> {
        let mut k = ModelConstants::default();
        edit(&mut k);
        validate_constants(&k)
    }

    #[test]
    fn default_constants_are_valid() {
        validate_constants(&ModelConstants::default()).unwrap();
    }

    #[test]
    fn negative_saturation_coefficient_rejected() {
        assert_eq!(
            constants_with(|k| k.saturation_log_coefficient = -1.0),
            Err(ValidationError::Negative {
                field: "saturation_log_coefficient",
                value: -1.0
            })
        );
        assert_eq!(
            constants_with(|k| k.saturation_log_coefficient = f64::NAN),
            Err(ValidationError::NonFinite("saturation_log_coefficient"))
        );
    }

    #[test]
    fn negative_saturation_coefficient_fails_whole_assumptions() {
        let mut a = assumptions();
        a.constants.saturation_log_coefficient = -1.0;
        assert!(matches!(
            validate_assumptions(&a),
            Err(ValidationError::Negative {
                field: "saturation_log_coefficient",
                ..
            })
        ));
    }

    #[test]
    fn negative_organic_boost_rejected() {
        assert_eq!(
            constants_with(|k| k.organic_boost_k = -0.7),
            Err(ValidationError::Negative {
                field: "organic_boost_k",
                value: -0.7
            })
        );
    }

    #[test]
    fn acquisition_exponent_must_be_finite_and_non_negative() {
        assert_eq!(
            constants_with(|k| k.acquisition_day_exponent = -0.8),
            Err(ValidationError::Negative {
                field: "acquisition_day_exponent",
                value: -0.8
            })
        );
        assert_eq!(
            constants_with(|k| k.acquisition_day_exponent = f64::INFINITY),
            Err(ValidationError::NonFinite("acquisition_day_exponent"))
        );
    }

    #[test]
    fn saturation_threshold_must_be_positive() {
        assert_eq!(
            constants_with(|k| k.saturation_threshold = 0.0),
            Err(ValidationError::InvalidConstant("saturation_threshold"))
        );
    }

    #[test]
    fn default_retention_pair_must_be_finite() {
        assert_eq!(
            constants_with(|k| k.default_retention_a = f64::NAN),
            Err(ValidationError::NonFinite("default_retention_a"))
        );
        assert_eq!(
            constants_with(|k| k.default_retention_a = 0.0),
            Err(ValidationError::InvalidConstant("default_retention_a"))
        );
        assert_eq!(
            constants_with(|k| k.default_retention_b = f64::NEG_INFINITY),
            Err(ValidationError::NonFinite("default_retention_b"))
        );
    }

    #[test]
    fn brand_lag_window_must_cover_a_day() {
        assert_eq!(
            constants_with(|k| k.brand_lag_window = 0),
            Err(ValidationError::InvalidConstant("brand_lag_window"))
        );
        assert_eq!(
            constants_with(|k| k.brand_lag_sd = 0.0),
            Err(ValidationError::InvalidConstant("brand_lag_sd"))
        );
        assert_eq!(
            constants_with(|k| k.brand_lag_center = f64::NAN),
            Err(ValidationError::NonFinite("brand_lag_center"))
        );
    }

    #[test]
    fn internal_weight_floor_rejected_not_clamped() {
        assert_eq!(
            constants_with(|k| k.internal_weight_floor = 5.0),
            Err(ValidationError::RatioOutOfRange {
                field: "internal_weight_floor",
                value: 5.0
            })
        );
        assert!(constants_with(|k| k.internal_weight_floor = -0.1).is_err());
    }

    #[test]
    fn burst_tail_weights_need_mass() {
        assert_eq!(
            constants_with(|k| k.burst_tail_weights = vec![0.0; 6]),
            Err(ValidationError::InvalidConstant("burst_tail_weights"))
        );
        assert!(constants_with(|k| k.burst_tail_weights = vec![1.0, -1.0]).is_err());
        constants_with(|k| k.burst_tail_weights = vec![]).unwrap();
    }

    #[test]
    fn window_lengths_must_be_positive() {
        assert_eq!(
            constants_with(|k| k.marketing_spend_days = 0),
            Err(ValidationError::InvalidConstant("marketing_spend_days"))
        );
        assert_eq!(
            constants_with(|k| k.blend_decay_days = 1),
            Err(ValidationError::InvalidConstant("blend_decay_days"))
        );
        assert_eq!(
            constants_with(|k| k.days_per_month = 0.0),
            Err(ValidationError::InvalidConstant("days_per_month"))
        );
    }

    #[test]
    fn assumptions_yaml_uses_documented_defaults() {
        let yaml = r#"
launch_date: 2025-01-01
retention_targets: { best: 0.45, normal: 0.4, worst: 0.35 }
marketing:
  ua_budget: 100000000
  brand_budget: 0
  target_cpa: 2000
  base_organic_ratio: 0.2
  wishlist_conversion_rate: 0.15
revenue: {}
cost:
  infrastructure_ratio: 0.05
  market_fee_ratio: 0.3
  vat_ratio: 0.1
  sustaining_marketing_ratio: 0.07
blending:
  internal_weight: 0.5
  genre: RPG
  platforms: [Mobile, PC]
  bm_type: F2P_Cosmetic
"#;
        let a: ProjectionAssumptions = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(a.horizon_days, 365);
        assert!(a.marketing.saturation && a.marketing.time_lag);
        assert!(a.revenue.seasonality);
        assert_eq!(a.blending.bm_type, BmType::F2pCosmetic);
        assert_eq!(a.constants, ModelConstants::default());
        validate_assumptions(&a).unwrap();
    }

    #[test]
    fn sample_mean_holds_last_value() {
        let mut lib = SampleLibrary::default();
        lib.retention.insert("a".into(), vec![0.4, 0.3, 0.2]);
        lib.retention.insert("b".into(), vec![0.6]);
        let m = lib
            .mean_series(Metric::Retention, &["a".into(), "b".into(), "missing".into()])
            .unwrap();
        assert_eq!(m.len(), 3);
        assert!((m[0] - 0.5).abs() < 1e-12);
        assert!((m[2] - 0.4).abs() < 1e-12);
        assert!(lib.mean_series(Metric::Arppu, &["a".into()]).is_none());
    }

    #[test]
    fn empty_sample_series_is_ignored() {
        let mut lib = SampleLibrary::default();
        lib.retention.insert("a".into(), vec![0.4, 0.2]);
        lib.retention.insert("empty".into(), vec![]);
        let m = lib
            .mean_series(Metric::Retention, &["a".into(), "empty".into()])
            .unwrap();
        assert_eq!(m, vec![0.4, 0.2]);
        assert!(lib.mean_series(Metric::Retention, &["empty".into()]).is_none());
    }

    #[test]
    fn benchmark_lookup_filters_platforms() {
        let table = MarketBenchmarks {
            entries: vec![
                BenchmarkEntry {
                    genre: Genre::Rpg,
                    platform: Platform::Mobile,
                    metric: Metric::Retention,
                    values: vec![0.4, 0.2],
                },
                BenchmarkEntry {
                    genre: Genre::Rpg,
                    platform: Platform::Pc,
                    metric: Metric::Retention,
                    values: vec![0.6, 0.4],
                },
            ],
        };
        let mobile = table
            .lookup(Genre::Rpg, &[Platform::Mobile], Metric::Retention)
            .unwrap();
        assert_eq!(mobile, vec![0.4, 0.2]);
        let both = table
            .lookup(Genre::Rpg, &[Platform::Mobile, Platform::Pc], Metric::Retention)
            .unwrap();
        assert!((both[1] - 0.3).abs() < 1e-12);
        assert!(table
            .lookup(Genre::Puzzle, &[Platform::Mobile], Metric::Retention)
            .is_none());
    }

    #[test]
    fn assumptions_json_roundtrip() {
        let a = assumptions();
        let s = serde_json::to_string(&a).unwrap();
        let back: ProjectionAssumptions = serde_json::from_str(&s).unwrap();
        assert_eq!(back.launch_date, a.launch_date);
        assert_eq!(back.blending.bm_type, BmType::Midcore);
    }

    proptest! {
        #[test]
        fn any_weight_in_unit_interval_is_valid(w in 0.0f64..=1.0) {
            let mut a = assumptions();
            a.blending.internal_weight = w;
            prop_assert!(validate_assumptions(&a).is_ok());
        }

        #[test]
        fn hr_monthly_is_linear_in_headcount(n in 0u32..500, cost in 0.0f64..1e8) {
            let c = CostParams {
                infrastructure_ratio: 0.0,
                market_fee_ratio: 0.0,
                vat_ratio: 0.0,
                hr: vec![HrRole { role: "x".into(), headcount: n, monthly_cost: cost }],
                sustaining_marketing_ratio: 0.0,
                dev_cost: None,
            };
            prop_assert!((c.hr_monthly() - n as f64 * cost).abs() <= 1e-6 * (1.0 + n as f64 * cost));
        }
    }
}
