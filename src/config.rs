//! Tunable parameters shared by every stage of the pipeline.

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::error::PressureError;

/// Which series the forecaster extrapolates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ForecastTarget {
    #[default]
    Demand,
    Aups,
}

/// Immutable run configuration, handed by reference to each component.
///
/// Stored as a JSON object on disk; any omitted field keeps its default:
/// ```json
/// {
///   "baseline_population": 250000,
///   "window_size": 7,
///   "horizon": 30,
///   "red_flag_threshold": 80
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Population that maps to an adjustment factor of 1.0. `None` disables
    /// the population adjustment entirely.
    pub baseline_population: Option<f64>,
    pub window_size: usize,
    pub horizon: usize,
    pub watch_threshold: f64,
    pub red_flag_threshold: f64,
    /// Relative deviation from the trailing mean that counts as a trend (0.05 = 5%).
    pub trend_threshold: f64,
    pub forecast_target: ForecastTarget,
    /// Relative width of the forecast band at step zero.
    pub band_base: f64,
    /// Additional relative width per forecast step.
    pub band_step: f64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            baseline_population: None,
            window_size: 7,
            horizon: 30,
            watch_threshold: 60.0,
            red_flag_threshold: 80.0,
            trend_threshold: 0.05,
            forecast_target: ForecastTarget::Demand,
            band_base: 0.05,
            band_step: 0.01,
        }
    }
}

impl PipelineConfig {
    /// Loads the config from a JSON file at `path` and validates it.
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: PipelineConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Copy of this config with a different forecast horizon.
    pub fn with_horizon(&self, horizon: usize) -> Self {
        PipelineConfig {
            horizon,
            ..self.clone()
        }
    }

    /// Population adjustment applied to a raw utilization ratio.
    pub fn population_factor(&self, population: u64) -> f64 {
        match self.baseline_population {
            Some(baseline) => population as f64 / baseline,
            None => 1.0,
        }
    }

    pub fn validate(&self) -> Result<(), PressureError> {
        if self.window_size == 0 {
            return Err(PressureError::InvalidConfig(
                "window_size must be at least 1".into(),
            ));
        }
        if self.horizon == 0 {
            return Err(PressureError::InvalidConfig(
                "horizon must be at least 1".into(),
            ));
        }
        if let Some(baseline) = self.baseline_population {
            if !(baseline.is_finite() && baseline > 0.0) {
                return Err(PressureError::InvalidConfig(format!(
                    "baseline_population must be positive, got {baseline}"
                )));
            }
        }
        for (name, value) in [
            ("watch_threshold", self.watch_threshold),
            ("red_flag_threshold", self.red_flag_threshold),
        ] {
            if !value.is_finite() {
                return Err(PressureError::InvalidConfig(format!(
                    "{name} must be a finite number, got {value}"
                )));
            }
        }
        if self.watch_threshold > self.red_flag_threshold {
            return Err(PressureError::InvalidConfig(format!(
                "watch_threshold ({}) exceeds red_flag_threshold ({})",
                self.watch_threshold, self.red_flag_threshold
            )));
        }
        for (name, value) in [
            ("trend_threshold", self.trend_threshold),
            ("band_base", self.band_base),
            ("band_step", self.band_step),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(PressureError::InvalidConfig(format!(
                    "{name} must be a non-negative number, got {value}"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.window_size, 7);
        assert_eq!(config.horizon, 30);
        assert_eq!(config.watch_threshold, 60.0);
        assert_eq!(config.red_flag_threshold, 80.0);
        assert_eq!(config.trend_threshold, 0.05);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config: PipelineConfig =
            serde_json::from_str(r#"{"baseline_population": 1000, "forecast_target": "aups"}"#)
                .unwrap();
        assert_eq!(config.baseline_population, Some(1000.0));
        assert_eq!(config.forecast_target, ForecastTarget::Aups);
        assert_eq!(config.window_size, 7);
    }

    #[test]
    fn test_population_factor() {
        let mut config = PipelineConfig::default();
        assert_eq!(config.population_factor(5000), 1.0);

        config.baseline_population = Some(1000.0);
        assert_eq!(config.population_factor(1500), 1.5);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let config = PipelineConfig {
            window_size: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = PipelineConfig {
            baseline_population: Some(0.0),
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = PipelineConfig {
            watch_threshold: 90.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = PipelineConfig {
            trend_threshold: -0.1,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_non_finite_thresholds() {
        let config = PipelineConfig {
            watch_threshold: f64::NAN,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(PressureError::InvalidConfig(msg)) if msg.starts_with("watch_threshold")
        ));

        let config = PipelineConfig {
            red_flag_threshold: f64::INFINITY,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(PressureError::InvalidConfig(msg)) if msg.starts_with("red_flag_threshold")
        ));

        let config = PipelineConfig {
            watch_threshold: f64::NEG_INFINITY,
            red_flag_threshold: f64::NAN,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_file() {
        let path = format!(
            "{}/district_pressure_test_config.json",
            std::env::temp_dir().display()
        );
        std::fs::write(&path, r#"{"horizon": 14}"#).unwrap();

        let config = PipelineConfig::load(&path).unwrap();
        assert_eq!(config.horizon, 14);

        std::fs::remove_file(&path).unwrap();
    }
}
