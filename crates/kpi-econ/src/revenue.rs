//! Revenue and cost model plus the per-scenario summary.

use crate::{cohort, ratio_or_zero, EconError};
use crate::acquisition::NruSeries;
use chrono::{Days, NaiveDate};
use kpi_core::tables::seasonality_factor;
use kpi_core::{CostParams, LiveEvent, MarketingParams, ModelConstants, RevenueParams};
use serde::{Deserialize, Serialize};

/// `value * (1 + delta)` per day.
pub fn scenario_adjust(series: &[f64], delta: f64) -> Vec<f64> {
    series.iter().map(|v| v * (1.0 + delta)).collect()
}

/// Scenario-adjusted pay rate, kept within [0, 1].
pub fn adjust_pay_rate(series: &[f64], delta: f64) -> Vec<f64> {
    series
        .iter()
        .map(|v| (v * (1.0 + delta)).clamp(0.0, 1.0))
        .collect()
}

/// Seasonality factor for days 1..=horizon, day 1 being the launch date.
pub fn seasonality_series(launch: NaiveDate, horizon: usize, enabled: bool) -> Vec<f64> {
    if !enabled {
        return vec![1.0; horizon];
    }
    (0..horizon as u64)
        .map(|offset| {
            launch
                .checked_add_days(Days::new(offset))
                .map(seasonality_factor)
                .unwrap_or(1.0)
        })
        .collect()
}

/// Largest live-event revenue boost of each day's 30-day month block.
pub fn revenue_boosts(events: &[LiveEvent], horizon: usize) -> Vec<f64> {
    (0..horizon)
        .map(|t| {
            let month = (t / 30) as u32 + 1;
            events
                .iter()
                .filter(|e| e.month == month)
                .map(|e| e.revenue_boost)
                .fold(1.0, f64::max)
        })
        .collect()
}

/// Day-aligned inputs to gross revenue.
#[derive(Clone, Copy, Debug)]
pub struct RevenueInputs<'a> {
    pub dau: &'a [f64],
    pub nru: &'a [f64],
    pub pay_rate: &'a [f64],
    pub arppu: &'a [f64],
    pub seasonality: &'a [f64],
    pub revenue_boost: &'a [f64],
}

/// Gross revenue per day.
///
/// `(DAU * payRate * ARPPU + ads) * seasonality + NRU * package_price`,
/// times the live-event revenue boost.
pub fn gross_revenue(inputs: &RevenueInputs<'_>, params: &RevenueParams) -> Result<Vec<f64>, EconError> {
    let n = inputs.dau.len();
    for len in [
        inputs.nru.len(),
        inputs.pay_rate.len(),
        inputs.arppu.len(),
        inputs.seasonality.len(),
        inputs.revenue_boost.len(),
    ] {
        if len != n {
            return Err(EconError::LengthMismatch {
                expected: n,
                got: len,
            });
        }
    }
    let package = params.package_price.unwrap_or(0.0);
    let per_dau_ads = params
        .ads
        .map(|ads| ads.impressions_per_dau * ads.ecpm / 1000.0)
        .unwrap_or(0.0);
    Ok((0..n)
        .map(|d| {
            let dau = inputs.dau[d];
            let iap = dau * inputs.pay_rate[d] * inputs.arppu[d];
            let seasonal = (iap + dau * per_dau_ads) * inputs.seasonality[d];
            (seasonal + inputs.nru[d] * package) * inputs.revenue_boost[d]
        })
        .collect())
}

/// Marketing spend booked per day.
///
/// The pre-launch UA share lands on day 1; the rest of UA plus brand is spread
/// evenly over the first `marketing_spend_days` days.
pub fn marketing_spend_schedule(m: &MarketingParams, horizon: usize, k: &ModelConstants) -> Vec<f64> {
    let mut out = vec![0.0; horizon];
    if horizon == 0 {
        return out;
    }
    let pre = m.ua_budget * m.pre_marketing_share;
    let launch = m.ua_budget - pre + m.brand_budget;
    let days = (k.marketing_spend_days as usize).clamp(1, horizon);
    out[0] += pre;
    for slot in out.iter_mut().take(days) {
        *slot += launch / days as f64;
    }
    out
}

/// Daily money flows of one scenario.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DailyFinancials {
    pub gross: Vec<f64>,
    /// Gross after fee and VAT, minus infrastructure, HR and sustaining cost.
    pub net: Vec<f64>,
    /// All costs including marketing spend and dev amortization.
    pub cost: Vec<f64>,
    pub profit: Vec<f64>,
    pub cumulative_profit: Vec<f64>,
}

/// Derive net revenue, cost and profit from gross revenue.
pub fn project_financials(
    gross: &[f64],
    cost: &CostParams,
    marketing_spend: &[f64],
    k: &ModelConstants,
) -> Result<DailyFinancials, EconError> {
    let n = gross.len();
    if marketing_spend.len() != n {
        return Err(EconError::LengthMismatch {
            expected: n,
            got: marketing_spend.len(),
        });
    }
    let hr_daily = cost.hr_monthly() / k.days_per_month;
    let dev_daily = ratio_or_zero(cost.dev_cost.unwrap_or(0.0), n as f64);
    let keep = (1.0 - cost.market_fee_ratio) * (1.0 - cost.vat_ratio);

    let mut out = DailyFinancials {
        gross: gross.to_vec(),
        net: Vec::with_capacity(n),
        cost: Vec::with_capacity(n),
        profit: Vec::with_capacity(n),
        cumulative_profit: Vec::with_capacity(n),
    };
    let mut running = 0.0;
    for (g, spend) in gross.iter().zip(marketing_spend) {
        let operating = g * cost.infrastructure_ratio + hr_daily + g * cost.sustaining_marketing_ratio;
        let net = g * keep - operating;
        let profit = net - spend - dev_daily;
        running += profit;
        out.net.push(net);
        out.cost.push(operating + spend + dev_daily);
        out.profit.push(profit);
        out.cumulative_profit.push(running);
    }
    Ok(out)
}

/// First 1-based day with non-negative cumulative profit.
pub fn break_even_day(cumulative_profit: &[f64]) -> Option<u32> {
    cumulative_profit
        .iter()
        .position(|p| *p >= 0.0)
        .map(|i| i as u32 + 1)
}

/// Headline numbers of one scenario.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScenarioSummary {
    pub total_nru: f64,
    pub paid_nru: f64,
    pub organic_nru: f64,
    pub peak_dau: f64,
    pub average_dau: f64,
    pub total_gross_revenue: f64,
    pub total_net_revenue: f64,
    pub average_daily_revenue: f64,
    pub total_cost: f64,
    pub net_profit: f64,
    /// Net profit over total cost.
    pub roi: f64,
    /// Gross revenue over UA budget.
    pub paid_roas: f64,
    /// Gross revenue over UA plus brand budget.
    pub blended_roas: f64,
    pub ltv: f64,
    pub cac_paid: f64,
    pub cac_blended: f64,
    /// `None` when cumulative profit never turns non-negative.
    pub break_even_day: Option<u32>,
}

/// Summarize a scenario. Zero denominators yield zero ratios.
pub fn summarize(
    nru: &NruSeries,
    dau: &[f64],
    fin: &DailyFinancials,
    m: &MarketingParams,
) -> ScenarioSummary {
    let paid_nru = nru.paid_sum();
    let organic_nru = nru.organic_sum();
    let total_nru = paid_nru + organic_nru;
    let total_gross: f64 = fin.gross.iter().sum();
    let total_net: f64 = fin.net.iter().sum();
    let total_cost: f64 = fin.cost.iter().sum();
    let net_profit: f64 = fin.profit.iter().sum();
    let marketing = m.ua_budget + m.brand_budget;
    ScenarioSummary {
        total_nru,
        paid_nru,
        organic_nru,
        peak_dau: cohort::peak(dau),
        average_dau: cohort::mean(dau),
        total_gross_revenue: total_gross,
        total_net_revenue: total_net,
        average_daily_revenue: cohort::mean(&fin.gross),
        total_cost,
        net_profit,
        roi: ratio_or_zero(net_profit, total_cost),
        paid_roas: ratio_or_zero(total_gross, m.ua_budget),
        blended_roas: ratio_or_zero(total_gross, marketing),
        ltv: ratio_or_zero(total_net, total_nru),
        cac_paid: ratio_or_zero(m.ua_budget, paid_nru),
        cac_blended: ratio_or_zero(marketing, total_nru),
        break_even_day: break_even_day(&fin.cumulative_profit),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kpi_core::{AdRevenueParams, HrRole};
    use proptest::prelude::*;

    fn costs(hr_monthly: f64) -> CostParams {
        CostParams {
            infrastructure_ratio: 0.05,
            market_fee_ratio: 0.3,
            vat_ratio: 0.1,
            hr: vec![HrRole {
                role: "ops".into(),
                headcount: 1,
                monthly_cost: hr_monthly,
            }],
            sustaining_marketing_ratio: 0.07,
            dev_cost: None,
        }
    }

    fn revenue_params() -> RevenueParams {
        RevenueParams {
            scenario_deltas: None,
            package_price: None,
            ads: None,
            seasonality: false,
        }
    }

    fn gross_for(dau: f64, pay: f64, arppu: f64, days: usize) -> Vec<f64> {
        let dau = vec![dau; days];
        let zeros = vec![0.0; days];
        let pay = vec![pay; days];
        let arppu = vec![arppu; days];
        let ones = vec![1.0; days];
        gross_revenue(
            &RevenueInputs {
                dau: &dau,
                nru: &zeros,
                pay_rate: &pay,
                arppu: &arppu,
                seasonality: &ones,
                revenue_boost: &ones,
            },
            &revenue_params(),
        )
        .unwrap()
    }

    #[test]
    fn gross_is_dau_times_pay_rate_times_arppu() {
        let g = gross_for(10_000.0, 0.05, 40.0, 3);
        assert!(g.iter().all(|v| (*v - 20_000.0).abs() < 1e-9));
    }

    #[test]
    fn package_and_ads_add_to_gross() {
        let ones = [1.0, 1.0];
        let params = RevenueParams {
            package_price: Some(10.0),
            ads: Some(AdRevenueParams {
                impressions_per_dau: 5.0,
                ecpm: 2000.0,
            }),
            ..revenue_params()
        };
        let g = gross_revenue(
            &RevenueInputs {
                dau: &[100.0, 100.0],
                nru: &[50.0, 0.0],
                pay_rate: &[0.0, 0.0],
                arppu: &[0.0, 0.0],
                seasonality: &ones,
                revenue_boost: &[1.0, 2.0],
            },
            &params,
        )
        .unwrap();
        assert!((g[0] - (500.0 + 1000.0)).abs() < 1e-9);
        assert!((g[1] - 2000.0).abs() < 1e-9);
    }

    #[test]
    fn misaligned_inputs_rejected() {
        let err = gross_revenue(
            &RevenueInputs {
                dau: &[1.0, 2.0],
                nru: &[1.0],
                pay_rate: &[0.1, 0.1],
                arppu: &[1.0, 1.0],
                seasonality: &[1.0, 1.0],
                revenue_boost: &[1.0, 1.0],
            },
            &revenue_params(),
        )
        .unwrap_err();
        assert_eq!(err, EconError::LengthMismatch { expected: 2, got: 1 });
    }

    #[test]
    fn break_even_on_day_one_when_profitable_from_start() {
        let k = ModelConstants::default();
        let gross = gross_for(10_000.0, 0.1, 100.0, 30);
        let fin = project_financials(&gross, &costs(300_000.0), &vec![0.0; 30], &k).unwrap();
        assert!(fin.net[0] > 0.0);
        assert_eq!(break_even_day(&fin.cumulative_profit), Some(1));
    }

    #[test]
    fn dev_cost_is_amortized_over_the_horizon() {
        let k = ModelConstants::default();
        let gross = gross_for(10_000.0, 0.1, 100.0, 30);
        let mut spend = vec![0.0; 30];
        spend[0] = 300_000.0;
        let plain = costs(300_000.0);
        let with_dev = CostParams {
            dev_cost: Some(900_000.0),
            ..costs(300_000.0)
        };
        let base = project_financials(&gross, &plain, &spend, &k).unwrap();
        let dev = project_financials(&gross, &with_dev, &spend, &k).unwrap();
        for d in 0..30 {
            assert!((dev.cost[d] - base.cost[d] - 30_000.0).abs() < 1e-6);
            assert!((base.profit[d] - dev.profit[d] - 30_000.0).abs() < 1e-6);
            assert_eq!(dev.net[d], base.net[d]);
        }
        assert!((base.cumulative_profit[29] - dev.cumulative_profit[29] - 900_000.0).abs() < 1e-4);
        assert_eq!(break_even_day(&base.cumulative_profit), Some(8));
        assert_eq!(break_even_day(&dev.cumulative_profit), Some(28));
    }

    #[test]
    fn break_even_not_reached_without_revenue() {
        let k = ModelConstants::default();
        let gross = vec![0.0; 60];
        let fin = project_financials(&gross, &costs(3_000_000.0), &vec![0.0; 60], &k).unwrap();
        assert!(fin.profit.iter().all(|p| *p < 0.0));
        assert_eq!(break_even_day(&fin.cumulative_profit), None);
    }

    #[test]
    fn break_even_after_marketing_is_recovered() {
        assert_eq!(break_even_day(&[-10.0, -4.0, 0.0, 3.0]), Some(3));
        assert_eq!(break_even_day(&[]), None);
    }

    #[test]
    fn net_deducts_fee_vat_and_operating_costs() {
        let k = ModelConstants::default();
        let fin = project_financials(&[1000.0], &costs(30.0), &[0.0], &k).unwrap();
        let expected = 1000.0 * 0.7 * 0.9 - 1000.0 * 0.05 - 1.0 - 1000.0 * 0.07;
        assert!((fin.net[0] - expected).abs() < 1e-9);
    }

    #[test]
    fn spend_schedule_books_pre_launch_on_day_one() {
        let k = ModelConstants::default();
        let m = MarketingParams {
            ua_budget: 3000.0,
            brand_budget: 600.0,
            target_cpa: 10.0,
            base_organic_ratio: 0.2,
            pre_marketing_share: 0.1,
            wishlist_conversion_rate: 0.15,
            saturation: true,
            time_lag: true,
        };
        let s = marketing_spend_schedule(&m, 60, &k);
        assert!((s.iter().sum::<f64>() - 3600.0).abs() < 1e-9);
        assert!((s[0] - (300.0 + 110.0)).abs() < 1e-9);
        assert!((s[29] - 110.0).abs() < 1e-9);
        assert_eq!(s[30], 0.0);
        let short = marketing_spend_schedule(&m, 10, &k);
        assert!((short.iter().sum::<f64>() - 3600.0).abs() < 1e-9);
    }

    #[test]
    fn seasonality_follows_calendar() {
        // 2025-03-03 is a Monday.
        let launch = NaiveDate::from_ymd_opt(2025, 3, 3).unwrap();
        let s = seasonality_series(launch, 7, true);
        assert!((s[0] - 0.85 * 0.95).abs() < 1e-12);
        assert!((s[5] - 1.25 * 0.95).abs() < 1e-12);
        assert_eq!(seasonality_series(launch, 4, false), vec![1.0; 4]);
    }

    #[test]
    fn revenue_boost_takes_largest_event_of_month() {
        let events = vec![
            LiveEvent {
                month: 2,
                name: "a".into(),
                traffic_boost: 1.0,
                revenue_boost: 1.3,
            },
            LiveEvent {
                month: 2,
                name: "b".into(),
                traffic_boost: 1.0,
                revenue_boost: 1.5,
            },
        ];
        let b = revenue_boosts(&events, 90);
        assert_eq!(b[29], 1.0);
        assert_eq!(b[30], 1.5);
        assert_eq!(b[60], 1.0);
    }

    proptest! {
        #[test]
        fn pay_rate_adjustment_stays_in_unit_interval(v in 0.0f64..=1.0, delta in -0.99f64..3.0) {
            let out = adjust_pay_rate(&[v], delta);
            prop_assert!((0.0..=1.0).contains(&out[0]));
        }

        #[test]
        fn cumulative_profit_is_running_sum(gross in proptest::collection::vec(0.0f64..1e7, 1..100)) {
            let k = ModelConstants::default();
            let spend = vec![1000.0; gross.len()];
            let fin = project_financials(&gross, &costs(1e6), &spend, &k).unwrap();
            let total: f64 = fin.profit.iter().sum();
            let last = *fin.cumulative_profit.last().unwrap();
            prop_assert!((total - last).abs() <= 1e-6 * total.abs().max(1.0));
        }
    }
}
