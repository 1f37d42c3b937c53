use std::collections::VecDeque;

use tracing::debug;

use crate::analyzers::types::{ForecastPoint, Observation};
use crate::analyzers::utility::mean;
use crate::config::PipelineConfig;
use crate::error::PressureError;

/// Rolling-average forecast of `history` for `config.horizon` future periods.
///
/// The trailing `config.window_size` observations are averaged to predict the
/// next period; that prediction is then pushed into the window in place of an
/// actual value and the process repeats. Steps past the window size are
/// therefore averages of earlier predictions. Predicted periods continue from
/// the last observed period one at a time.
///
/// # Errors
///
/// Returns [`PressureError::InsufficientHistory`] when fewer than
/// `window_size` observations are available. Gaps in the history count
/// against that minimum. Returns [`PressureError::InvalidInput`] when a
/// forecast period would fall past `i64::MAX`.
pub fn forecast(
    district_id: &str,
    history: &[Observation],
    config: &PipelineConfig,
) -> Result<Vec<ForecastPoint>, PressureError> {
    let window = config.window_size;
    if history.len() < window {
        return Err(PressureError::InsufficientHistory {
            district_id: district_id.to_string(),
            need: window,
            have: history.len(),
        });
    }

    let Some(last) = history.last() else {
        // Only reachable with a zero window, which validate() rejects.
        return Ok(Vec::new());
    };

    let values: Vec<f64> = history.iter().map(|o| o.value).collect();
    let predictions = rolling_forecast(&values, window, config.horizon);

    debug!(
        district_id,
        last_period = last.period,
        horizon = config.horizon,
        "Forecast produced"
    );

    predictions
        .into_iter()
        .enumerate()
        .map(|(i, predicted)| {
            let step = i + 1;
            let period = i64::try_from(step)
                .ok()
                .and_then(|s| last.period.checked_add(s))
                .ok_or_else(|| {
                    PressureError::invalid_input(
                        district_id,
                        last.period,
                        format!("forecast step {step} overflows the period range"),
                    )
                })?;
            let uncertainty = config.band_base + config.band_step * step as f64;
            Ok(ForecastPoint {
                district_id: district_id.to_string(),
                period,
                predicted_demand: predicted,
                lower_bound: (predicted * (1.0 - uncertainty)).max(0.0),
                upper_bound: predicted * (1.0 + uncertainty),
            })
        })
        .collect()
}

/// Re-fed rolling mean over the last `window` of `values`.
///
/// Callers guarantee `values.len() >= window`.
fn rolling_forecast(values: &[f64], window: usize, horizon: usize) -> Vec<f64> {
    let mut trailing: VecDeque<f64> = values[values.len() - window..].iter().copied().collect();
    let mut predictions = Vec::with_capacity(horizon);

    for _ in 0..horizon {
        let next = mean(trailing.make_contiguous());
        predictions.push(next);
        trailing.pop_front();
        trailing.push_back(next);
    }

    predictions
}
