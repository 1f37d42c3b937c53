//! Data types flowing through the scoring pipeline.

use serde::{Deserialize, Serialize};

/// One ingested row: a district's demand, capacity and population for one period.
///
/// `(district_id, period)` is unique across an input set. A missing
/// `demand_count` marks a gap that downstream stages skip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistrictPeriodRecord {
    pub district_id: String,
    pub period: i64,
    pub demand_count: Option<f64>,
    pub capacity: f64,
    pub population: u64,
}

/// Area Utilization Pressure Score for a district in one period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AupsValue {
    pub district_id: String,
    pub period: i64,
    pub score: f64,
}

/// A single value of a period-ordered series fed to the forecaster.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observation {
    pub period: i64,
    pub value: f64,
}

/// Predicted value for a future period, with a band that widens per step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub district_id: String,
    pub period: i64,
    pub predicted_demand: f64,
    pub lower_bound: f64,
    pub upper_bound: f64,
}

/// Single-step-ahead prediction compared against what actually happened.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestResult {
    pub district_id: String,
    pub period: i64,
    pub predicted_demand: f64,
    pub actual_demand: f64,
    pub absolute_error: f64,
    /// `None` when the actual demand was zero.
    pub percent_error: Option<f64>,
}

/// Per-district accuracy over all backtested periods.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestSummary {
    pub district_id: String,
    pub periods_tested: usize,
    pub mean_absolute_error: f64,
    /// Mean over the periods with a defined percent error only.
    pub mean_percent_error: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DistrictBacktest {
    pub results: Vec<BacktestResult>,
    pub summary: BacktestSummary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertTier {
    Normal,
    Watch,
    RedFlag,
    /// High pressure while population shrinks: a capacity shortfall rather
    /// than demand growth.
    EdgeCase,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Trend {
    Rising,
    Stable,
    Declining,
}

/// Risk classification of a district's current pressure score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertRecord {
    pub district_id: String,
    pub period: i64,
    pub tier: AlertTier,
    pub aups_score: f64,
    pub aups_trend: Trend,
    pub population_trend: Trend,
}

/// Position of a district in the pressure league table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistrictRanking {
    pub rank: usize,
    pub district_id: String,
    pub period: i64,
    pub score: f64,
    /// Score relative to the highest-scoring district, on a 0-100 scale.
    pub normalized_score: f64,
}

/// Outcome of the split-half check that high pressure precedes high demand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalValidation {
    pub split_period: i64,
    pub stress_threshold: f64,
    pub stressed_districts: Vec<String>,
    pub stressed_mean_demand: f64,
    pub normal_mean_demand: f64,
    pub lift: f64,
    pub is_valid: bool,
}
