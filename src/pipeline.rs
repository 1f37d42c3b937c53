//! Runs every stage over a full dataset, one district at a time.
//!
//! A district that fails scoring is dropped entirely; a district with too
//! little history for forecasting or backtesting still gets scores and an
//! alert. Failures are reported alongside the results and never affect other
//! districts.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use crate::analyzers::alert::{evaluate, trend_at};
use crate::analyzers::backtest::backtest;
use crate::analyzers::forecast::forecast;
use crate::analyzers::ranking::rank_districts;
use crate::analyzers::score::{aups_series, compute_aups, demand_series, population_series};
use crate::analyzers::types::{
    AlertRecord, AlertTier, AupsValue, BacktestResult, BacktestSummary, DistrictPeriodRecord,
    DistrictRanking, ForecastPoint, SignalValidation,
};
use crate::analyzers::validation::validate_signal;
use crate::config::{ForecastTarget, PipelineConfig};
use crate::error::PressureError;

/// Pipeline stage a district failed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Score,
    Forecast,
    Backtest,
}

/// A per-district failure, reported instead of aborting the run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DistrictFailure {
    pub district_id: String,
    pub stage: Stage,
    pub kind: String,
    pub message: String,
}

impl DistrictFailure {
    fn new(district_id: &str, stage: Stage, error: &PressureError) -> Self {
        DistrictFailure {
            district_id: district_id.to_string(),
            stage,
            kind: error.kind().to_string(),
            message: error.to_string(),
        }
    }
}

/// Every table produced by one run, ordered by district then period.
#[derive(Debug, Default)]
pub struct PipelineOutput {
    /// Number of distinct districts in the input.
    pub districts: usize,
    pub aups: Vec<AupsValue>,
    pub forecasts: Vec<ForecastPoint>,
    pub backtest_results: Vec<BacktestResult>,
    pub backtest_summaries: Vec<BacktestSummary>,
    pub alerts: Vec<AlertRecord>,
    pub rankings: Vec<DistrictRanking>,
    pub validation: Option<SignalValidation>,
    pub failures: Vec<DistrictFailure>,
}

/// Top-level summary of a run, written next to the result tables.
#[derive(Debug, Serialize)]
pub struct RunReport {
    pub generated_at: DateTime<Utc>,
    pub config: PipelineConfig,
    pub districts_total: usize,
    pub districts_scored: usize,
    pub districts_failed: usize,
    /// Districts that parsed cleanly but had no recorded demand in any period.
    pub districts_without_demand: usize,
    pub red_flags: Vec<String>,
    pub edge_cases: Vec<String>,
    pub validation: Option<SignalValidation>,
}

impl PipelineOutput {
    /// Summarizes this output for the run report.
    pub fn report(&self, config: &PipelineConfig) -> RunReport {
        let with_tier = |tier: AlertTier| {
            self.alerts
                .iter()
                .filter(|a| a.tier == tier)
                .map(|a| a.district_id.clone())
                .collect::<Vec<_>>()
        };

        let districts_scored = self
            .aups
            .iter()
            .map(|a| a.district_id.as_str())
            .collect::<BTreeSet<_>>()
            .len();
        let districts_failed = self
            .failures
            .iter()
            .filter(|f| f.stage == Stage::Score)
            .count();

        RunReport {
            generated_at: Utc::now(),
            config: config.clone(),
            districts_total: self.districts,
            districts_scored,
            districts_failed,
            districts_without_demand: self
                .districts
                .saturating_sub(districts_scored + districts_failed),
            red_flags: with_tier(AlertTier::RedFlag),
            edge_cases: with_tier(AlertTier::EdgeCase),
            validation: self.validation.clone(),
        }
    }
}

/// Splits records by district, each sorted by period.
pub fn group_by_district(
    records: Vec<DistrictPeriodRecord>,
) -> BTreeMap<String, Vec<DistrictPeriodRecord>> {
    let mut grouped: BTreeMap<String, Vec<DistrictPeriodRecord>> = BTreeMap::new();
    for record in records {
        grouped
            .entry(record.district_id.clone())
            .or_default()
            .push(record);
    }
    for rows in grouped.values_mut() {
        rows.sort_by_key(|r| r.period);
    }
    grouped
}

/// Scores, forecasts, backtests and evaluates alerts for every district.
///
/// # Errors
///
/// Returns [`PressureError::InvalidConfig`] if `config` fails validation.
/// Per-district problems end up in [`PipelineOutput::failures`].
pub fn run(
    records: Vec<DistrictPeriodRecord>,
    config: &PipelineConfig,
) -> Result<PipelineOutput, PressureError> {
    config.validate()?;

    let districts = group_by_district(records);
    let mut output = PipelineOutput {
        districts: districts.len(),
        ..Default::default()
    };
    let mut latest = Vec::new();

    for (district_id, rows) in &districts {
        if let Some(current) = process_district(district_id, rows, config, &mut output) {
            latest.push(current);
        }
    }

    output.rankings = rank_districts(&latest);
    output.validation = validate_signal(&districts, config);

    info!(
        districts = districts.len(),
        scores = output.aups.len(),
        forecasts = output.forecasts.len(),
        backtested = output.backtest_results.len(),
        alerts = output.alerts.len(),
        failures = output.failures.len(),
        "Pipeline run complete"
    );

    Ok(output)
}

/// Runs all stages for one district, returning its latest score.
#[tracing::instrument(skip(rows, config, output))]
fn process_district(
    district_id: &str,
    rows: &[DistrictPeriodRecord],
    config: &PipelineConfig,
    output: &mut PipelineOutput,
) -> Option<AupsValue> {
    let aups = match compute_aups(rows, config) {
        Ok(aups) => aups,
        Err(e) => {
            warn!(error = %e, "Scoring failed, skipping district");
            output
                .failures
                .push(DistrictFailure::new(district_id, Stage::Score, &e));
            return None;
        }
    };

    let history = match config.forecast_target {
        ForecastTarget::Demand => demand_series(rows),
        ForecastTarget::Aups => aups_series(&aups),
    };
    match forecast(district_id, &history, config) {
        Ok(points) => output.forecasts.extend(points),
        Err(e) => {
            warn!(error = %e, "Forecast skipped");
            output
                .failures
                .push(DistrictFailure::new(district_id, Stage::Forecast, &e));
        }
    }

    match backtest(district_id, rows, config) {
        Ok(bt) => {
            output.backtest_results.extend(bt.results);
            output.backtest_summaries.push(bt.summary);
        }
        Err(e) => {
            warn!(error = %e, "Backtest skipped");
            output
                .failures
                .push(DistrictFailure::new(district_id, Stage::Backtest, &e));
        }
    }

    let current = aups.last().cloned();
    if let Some(current) = &current {
        let aups_trend = trend_at(&aups_series(&aups), current.period, config);
        let population_trend = trend_at(&population_series(rows), current.period, config);
        output
            .alerts
            .push(evaluate(current, aups_trend, population_trend, config));
    }

    output.aups.extend(aups);
    current
}
