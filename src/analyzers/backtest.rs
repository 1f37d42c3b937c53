use tracing::debug;

use crate::analyzers::forecast::forecast;
use crate::analyzers::score::demand_series;
use crate::analyzers::types::{
    BacktestResult, BacktestSummary, DistrictBacktest, DistrictPeriodRecord,
};
use crate::analyzers::utility::mean;
use crate::config::PipelineConfig;
use crate::error::PressureError;

/// Replays a district's demand history one step at a time.
///
/// For every period with at least `window_size` earlier observations, the
/// forecaster is re-run on the observations strictly before that period with
/// a horizon of one, and the prediction is compared against the recorded
/// demand. Periods with no recorded demand are neither predicted nor used as
/// history.
///
/// # Errors
///
/// Returns [`PressureError::InsufficientHistory`] when no period qualifies.
#[tracing::instrument(skip(records, config))]
pub fn backtest(
    district_id: &str,
    records: &[DistrictPeriodRecord],
    config: &PipelineConfig,
) -> Result<DistrictBacktest, PressureError> {
    let series = demand_series(records);
    let window = config.window_size;

    if series.len() <= window {
        return Err(PressureError::InsufficientHistory {
            district_id: district_id.to_string(),
            need: window + 1,
            have: series.len(),
        });
    }

    let single_step = config.with_horizon(1);
    let mut results = Vec::with_capacity(series.len() - window);

    for (i, actual) in series.iter().enumerate().skip(window) {
        let Some(prediction) = forecast(district_id, &series[..i], &single_step)?
            .into_iter()
            .next()
        else {
            continue;
        };

        let predicted = prediction.predicted_demand;
        let absolute_error = (predicted - actual.value).abs();
        let percent_error = if actual.value == 0.0 {
            None
        } else {
            Some(absolute_error / actual.value * 100.0)
        };

        results.push(BacktestResult {
            district_id: district_id.to_string(),
            period: actual.period,
            predicted_demand: predicted,
            actual_demand: actual.value,
            absolute_error,
            percent_error,
        });
    }

    let summary = summarize(district_id, &results);
    debug!(
        periods_tested = summary.periods_tested,
        mean_absolute_error = summary.mean_absolute_error,
        "Backtest complete"
    );

    Ok(DistrictBacktest { results, summary })
}

/// Aggregates backtest rows. Undefined percent errors are left out of the
/// percent mean but their absolute errors still count.
pub fn summarize(district_id: &str, results: &[BacktestResult]) -> BacktestSummary {
    let absolute: Vec<f64> = results.iter().map(|r| r.absolute_error).collect();
    let percent: Vec<f64> = results.iter().filter_map(|r| r.percent_error).collect();

    BacktestSummary {
        district_id: district_id.to_string(),
        periods_tested: results.len(),
        mean_absolute_error: mean(&absolute),
        mean_percent_error: if percent.is_empty() {
            None
        } else {
            Some(mean(&percent))
        },
    }
}
