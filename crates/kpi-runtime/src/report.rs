//! Executive summary rows with fixed-point rounding for presentation.

use crate::ProjectionOutput;
use kpi_core::Scenario;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;
use std::fmt::Write;

/// One scenario line of the executive summary. Money rounds to whole
/// currency units, percentages to one decimal place.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ExecutiveRow {
    pub scenario: Scenario,
    pub total_nru: Decimal,
    pub paid_nru: Decimal,
    pub organic_nru: Decimal,
    pub peak_dau: Decimal,
    pub gross_revenue: Decimal,
    pub net_revenue: Decimal,
    pub total_cost: Decimal,
    pub net_profit: Decimal,
    pub roi_pct: Decimal,
    pub paid_roas_pct: Decimal,
    pub blended_roas_pct: Decimal,
    pub ltv: Decimal,
    pub cac_paid: Decimal,
    pub cac_blended: Decimal,
    pub break_even: String,
}

fn rounded(v: f64, dp: u32) -> Decimal {
    Decimal::from_f64(v)
        .map(|d| d.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero))
        .unwrap_or(Decimal::ZERO)
}

/// Whole currency units (or users).
pub fn money(v: f64) -> Decimal {
    rounded(v, 0)
}

/// Ratio as a percentage with one decimal.
pub fn percent(ratio: f64) -> Decimal {
    rounded(ratio * 100.0, 1)
}

/// `D+N` for a break-even day, `Not Reached` otherwise.
pub fn break_even_label(day: Option<u32>) -> String {
    match day {
        Some(d) => format!("D+{d}"),
        None => "Not Reached".to_string(),
    }
}

pub fn executive_summary(out: &ProjectionOutput) -> Vec<ExecutiveRow> {
    out.scenarios
        .iter()
        .map(|r| {
            let s = &r.summary;
            ExecutiveRow {
                scenario: r.scenario,
                total_nru: money(s.total_nru),
                paid_nru: money(s.paid_nru),
                organic_nru: money(s.organic_nru),
                peak_dau: money(s.peak_dau),
                gross_revenue: money(s.total_gross_revenue),
                net_revenue: money(s.total_net_revenue),
                total_cost: money(s.total_cost),
                net_profit: money(s.net_profit),
                roi_pct: percent(s.roi),
                paid_roas_pct: percent(s.paid_roas),
                blended_roas_pct: percent(s.blended_roas),
                ltv: rounded(s.ltv, 2),
                cac_paid: rounded(s.cac_paid, 2),
                cac_blended: rounded(s.cac_blended, 2),
                break_even: break_even_label(s.break_even_day),
            }
        })
        .collect()
}

/// Plain-text table, one column per scenario.
pub fn render_table(rows: &[ExecutiveRow]) -> String {
    let fields: [(&str, fn(&ExecutiveRow) -> String); 15] = [
        ("Total NRU", |r| r.total_nru.to_string()),
        ("Paid NRU", |r| r.paid_nru.to_string()),
        ("Organic NRU", |r| r.organic_nru.to_string()),
        ("Peak DAU", |r| r.peak_dau.to_string()),
        ("Gross revenue", |r| r.gross_revenue.to_string()),
        ("Net revenue", |r| r.net_revenue.to_string()),
        ("Total cost", |r| r.total_cost.to_string()),
        ("Net profit", |r| r.net_profit.to_string()),
        ("ROI %", |r| r.roi_pct.to_string()),
        ("Paid ROAS %", |r| r.paid_roas_pct.to_string()),
        ("Blended ROAS %", |r| r.blended_roas_pct.to_string()),
        ("LTV", |r| r.ltv.to_string()),
        ("CAC (paid)", |r| r.cac_paid.to_string()),
        ("CAC (blended)", |r| r.cac_blended.to_string()),
        ("Break-even", |r| r.break_even.clone()),
    ];
    let mut out = String::new();
    let _ = write!(out, "{:<16}", "");
    for r in rows {
        let _ = write!(out, "{:>22}", r.scenario.as_str().to_uppercase());
    }
    out.push('\n');
    for (label, cell) in fields {
        let _ = write!(out, "{label:<16}");
        for r in rows {
            let _ = write!(out, "{:>22}", cell(r));
        }
        out.push('\n');
    }
    out
}
