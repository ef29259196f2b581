#![deny(warnings)]

//! Projection runtime: runs the Best, Normal and Worst scenarios for one set
//! of assumptions and assembles their series and summaries.

pub mod report;

use chrono::NaiveDate;
use kpi_core::{
    validate_assumptions, Genre, MarketBenchmarks, Platform, ProjectionAssumptions, Region,
    SampleLibrary, Scenario, ScenarioDelta, ScenarioDeltas, ValidationError,
};
use kpi_econ::acquisition::{self, AcquisitionPlan};
use kpi_econ::blend::{self, AppliedBlend};
use kpi_econ::retention::{self, RetentionFit};
use kpi_econ::revenue::{self, RevenueInputs, ScenarioSummary};
use kpi_econ::{cohort, EconError};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use tracing::{info, warn};

/// Pipeline stage a scenario failure is attributed to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Component {
    BenchmarkBlender,
    RetentionFitter,
    Acquisition,
    CohortAggregator,
    RevenueModel,
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Component::BenchmarkBlender => "benchmark blender",
            Component::RetentionFitter => "retention fitter",
            Component::Acquisition => "acquisition model",
            Component::CohortAggregator => "cohort aggregator",
            Component::RevenueModel => "revenue model",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Error)]
pub enum ProjectionError {
    #[error("invalid assumptions: {0}")]
    Invalid(#[from] ValidationError),
    #[error("{scenario} scenario failed in {component}: {source}")]
    Scenario {
        scenario: Scenario,
        component: Component,
        #[source]
        source: EconError,
    },
}

/// Daily series and headline numbers of one scenario. All series have
/// `horizon_days` entries, index 0 being D+1.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub scenario: Scenario,
    pub delta: ScenarioDelta,
    pub retention: RetentionFit,
    pub retention_curve: Vec<f64>,
    pub nru: Vec<f64>,
    pub nru_paid: Vec<f64>,
    pub nru_organic: Vec<f64>,
    pub dau: Vec<f64>,
    pub pay_rate: Vec<f64>,
    pub arppu: Vec<f64>,
    /// Gross revenue.
    pub revenue: Vec<f64>,
    pub net_revenue: Vec<f64>,
    pub cost: Vec<f64>,
    pub profit: Vec<f64>,
    pub cumulative_profit: Vec<f64>,
    pub summary: ScenarioSummary,
}

/// Parameters actually applied to a run, for audit.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AppliedConfig {
    pub blend: AppliedBlend,
    pub genre: Genre,
    pub platforms: Vec<Platform>,
    pub regions: Vec<Region>,
    pub acquisition: AcquisitionPlan,
    pub scenario_deltas: ScenarioDeltas,
    pub seasonality: bool,
    pub sample_games_used: Vec<String>,
    pub sample_games_missing: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProjectionOutput {
    pub launch_date: NaiveDate,
    pub horizon_days: u32,
    /// Best, Normal, Worst in that order.
    pub scenarios: Vec<ScenarioResult>,
    pub applied: AppliedConfig,
}

impl ProjectionOutput {
    pub fn scenario(&self, scenario: Scenario) -> Option<&ScenarioResult> {
        self.scenarios.iter().find(|r| r.scenario == scenario)
    }
}

struct ScenarioRun {
    result: ScenarioResult,
    blend: AppliedBlend,
    plan: AcquisitionPlan,
}

/// Run one scenario end to end. Assumptions are expected to be validated.
pub fn run_scenario(
    a: &ProjectionAssumptions,
    samples: &SampleLibrary,
    market: &MarketBenchmarks,
    scenario: Scenario,
) -> Result<ScenarioResult, ProjectionError> {
    run(a, samples, market, scenario).map(|r| r.result)
}

fn run(
    a: &ProjectionAssumptions,
    samples: &SampleLibrary,
    market: &MarketBenchmarks,
    scenario: Scenario,
) -> Result<ScenarioRun, ProjectionError> {
    let fail = |component: Component| {
        move |source: EconError| ProjectionError::Scenario {
            scenario,
            component,
            source,
        }
    };
    let horizon = a.horizon();
    let k = &a.constants;
    let delta = a.scenario_deltas().get(scenario);

    let blended = blend::blend_metrics(a, samples, market).map_err(fail(Component::BenchmarkBlender))?;
    let fit = retention::fit_retention(
        *a.retention_targets.get(scenario),
        blended.retention_history.as_deref(),
        k,
    )
    .map_err(fail(Component::RetentionFitter))?;
    let retention_curve = fit.curve(horizon);

    let plan = acquisition::plan_acquisition(&a.marketing, k).map_err(fail(Component::Acquisition))?;
    let nru = acquisition::build_nru(&plan, horizon, a.marketing.time_lag, k);
    let nru = acquisition::with_live_events(nru, &a.live_events).scaled(1.0 + delta.nru_delta);
    let nru_total = nru.total();

    let dau = cohort::cohort_dau(&nru_total, &retention_curve)
        .map_err(fail(Component::CohortAggregator))?;

    let pay_rate = revenue::adjust_pay_rate(&blended.pay_rate, delta.pay_rate_delta);
    let arppu = revenue::scenario_adjust(&blended.arppu, delta.arppu_delta);
    let seasonality = revenue::seasonality_series(a.launch_date, horizon, a.revenue.seasonality);
    let boosts = revenue::revenue_boosts(&a.live_events, horizon);
    let inputs = RevenueInputs {
        dau: &dau,
        nru: &nru_total,
        pay_rate: &pay_rate,
        arppu: &arppu,
        seasonality: &seasonality,
        revenue_boost: &boosts,
    };
    let gross = revenue::gross_revenue(&inputs, &a.revenue).map_err(fail(Component::RevenueModel))?;
    let spend = revenue::marketing_spend_schedule(&a.marketing, horizon, k);
    let fin = revenue::project_financials(&gross, &a.cost, &spend, k)
        .map_err(fail(Component::RevenueModel))?;
    let summary = revenue::summarize(&nru, &dau, &fin, &a.marketing);

    info!(
        scenario = %scenario,
        total_nru = summary.total_nru,
        peak_dau = summary.peak_dau,
        gross = summary.total_gross_revenue,
        break_even = ?summary.break_even_day,
        "scenario projected"
    );

    Ok(ScenarioRun {
        result: ScenarioResult {
            scenario,
            delta,
            retention: fit,
            retention_curve,
            nru: nru_total,
            nru_paid: nru.paid,
            nru_organic: nru.organic,
            dau,
            pay_rate,
            arppu,
            revenue: fin.gross,
            net_revenue: fin.net,
            cost: fin.cost,
            profit: fin.profit,
            cumulative_profit: fin.cumulative_profit,
            summary,
        },
        blend: blended.applied,
        plan,
    })
}

/// Validate the assumptions and project all three scenarios.
///
/// Scenarios run in parallel and share no mutable state; the output is
/// identical to running them one after another. Any scenario failure fails
/// the whole run, reported for the first failing scenario in Best, Normal,
/// Worst order.
pub fn run_projection(
    a: &ProjectionAssumptions,
    samples: &SampleLibrary,
    market: &MarketBenchmarks,
) -> Result<ProjectionOutput, ProjectionError> {
    validate_assumptions(a)?;
    let (sample_games_used, sample_games_missing): (Vec<String>, Vec<String>) = a
        .sample_games
        .iter()
        .cloned()
        .partition(|g| samples.contains_game(g));
    for game in &sample_games_missing {
        warn!(game = %game, "sample game not found in library");
    }
    info!(
        launch = %a.launch_date,
        horizon = a.horizon_days,
        samples = sample_games_used.len(),
        "running projection"
    );

    let (best, (normal, worst)) = rayon::join(
        || run(a, samples, market, Scenario::Best),
        || {
            rayon::join(
                || run(a, samples, market, Scenario::Normal),
                || run(a, samples, market, Scenario::Worst),
            )
        },
    );
    let (best, normal, worst) = (best?, normal?, worst?);

    let applied = AppliedConfig {
        blend: normal.blend,
        genre: a.blending.genre,
        platforms: a.blending.platforms.clone(),
        regions: a.blending.regions.clone(),
        acquisition: normal.plan,
        scenario_deltas: a.scenario_deltas(),
        seasonality: a.revenue.seasonality,
        sample_games_used,
        sample_games_missing,
    };
    Ok(ProjectionOutput {
        launch_date: a.launch_date,
        horizon_days: a.horizon_days,
        scenarios: vec![best.result, normal.result, worst.result],
        applied,
    })
}
