//! Fixed reference tables: quality multipliers, BM-type benchmark records,
//! default scenario deltas and seasonality factors.

use crate::{BmType, QualityScore, ScenarioDelta, ScenarioDeltas};
use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

/// Multiplier applied to benchmark-sourced values only.
pub fn quality_multiplier(score: QualityScore) -> f64 {
    match score {
        QualityScore::S => 1.20,
        QualityScore::A => 1.10,
        QualityScore::B => 1.00,
        QualityScore::C => 0.85,
        QualityScore::D => 0.70,
    }
}

/// Benchmark basis for a business model type.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BmReference {
    /// Day-1 retention used when no market retention series exists.
    pub d1_retention: f64,
    /// Daily fraction of DAU that pays.
    pub pay_rate: f64,
    /// Daily revenue per paying user.
    pub arppu: f64,
    /// Scenario spread for pay rate and ARPPU.
    pub variance: f64,
}

/// Reference record per BM type. Swapping the type swaps the record.
pub fn bm_reference(bm: BmType) -> BmReference {
    match bm {
        BmType::Hardcore => BmReference {
            d1_retention: 0.35,
            pay_rate: 0.025,
            arppu: 80.0,
            variance: 0.20,
        },
        BmType::Midcore => BmReference {
            d1_retention: 0.40,
            pay_rate: 0.05,
            arppu: 45.0,
            variance: 0.15,
        },
        BmType::Casual => BmReference {
            d1_retention: 0.45,
            pay_rate: 0.09,
            arppu: 20.0,
            variance: 0.10,
        },
        BmType::F2pCosmetic => BmReference {
            d1_retention: 0.42,
            pay_rate: 0.04,
            arppu: 15.0,
            variance: 0.05,
        },
        BmType::Gacha => BmReference {
            d1_retention: 0.38,
            pay_rate: 0.035,
            arppu: 110.0,
            variance: 0.20,
        },
    }
}

/// NRU spread between scenarios.
pub const DEFAULT_NRU_DELTA: f64 = 0.10;

/// Symmetric Best/Worst deltas derived from the BM variance.
pub fn default_scenario_deltas(bm: BmType) -> ScenarioDeltas {
    let v = bm_reference(bm).variance;
    ScenarioDeltas {
        best: ScenarioDelta {
            nru_delta: DEFAULT_NRU_DELTA,
            pay_rate_delta: v,
            arppu_delta: v,
        },
        worst: ScenarioDelta {
            nru_delta: -DEFAULT_NRU_DELTA,
            pay_rate_delta: -v,
            arppu_delta: -v,
        },
    }
}

pub fn weekday_factor(day: Weekday) -> f64 {
    match day {
        Weekday::Mon | Weekday::Tue | Weekday::Wed | Weekday::Thu => 0.85,
        Weekday::Fri => 1.05,
        Weekday::Sat => 1.25,
        Weekday::Sun => 1.15,
    }
}

/// Monthly factors, January first.
pub const MONTH_FACTORS: [f64; 12] = [
    1.05, 1.00, 0.95, 0.95, 1.00, 1.05, 1.20, 1.20, 0.95, 0.95, 1.00, 1.10,
];

/// `month` is 1-based.
pub fn month_factor(month: u32) -> f64 {
    MONTH_FACTORS
        .get(month.saturating_sub(1) as usize)
        .copied()
        .unwrap_or(1.0)
}

/// Combined weekday and month factor for a calendar date.
pub fn seasonality_factor(date: NaiveDate) -> f64 {
    weekday_factor(date.weekday()) * month_factor(date.month())
}
