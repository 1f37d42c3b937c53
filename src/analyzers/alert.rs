use crate::analyzers::types::{AlertRecord, AlertTier, AupsValue, Observation, Trend};
use crate::analyzers::utility::{exceeds_by, falls_short_by, mean};
use crate::config::PipelineConfig;

/// Converts a pressure score and population trend into an alert tier.
///
/// First match wins (default thresholds shown):
///
/// | Condition                           | Tier      |
/// |-------------------------------------|-----------|
/// | score > 80 and population DECLINING | EDGE_CASE |
/// | score > 80                          | RED_FLAG  |
/// | score > 60                          | WATCH     |
/// | otherwise                           | NORMAL    |
pub fn tier(score: f64, population_trend: Trend, config: &PipelineConfig) -> AlertTier {
    match score {
        s if s > config.red_flag_threshold && population_trend == Trend::Declining => {
            AlertTier::EdgeCase
        }
        s if s > config.red_flag_threshold => AlertTier::RedFlag,
        s if s > config.watch_threshold => AlertTier::Watch,
        _ => AlertTier::Normal,
    }
}

/// Classifies `current` against the mean of the values preceding it.
///
/// Only the last `window_size` entries of `preceding` are considered. With
/// nothing to compare against the trend is [`Trend::Stable`].
pub fn trend(current: f64, preceding: &[f64], config: &PipelineConfig) -> Trend {
    if preceding.is_empty() {
        return Trend::Stable;
    }
    let start = preceding.len().saturating_sub(config.window_size);
    let reference = mean(&preceding[start..]);

    if exceeds_by(current, reference, config.trend_threshold) {
        Trend::Rising
    } else if falls_short_by(current, reference, config.trend_threshold) {
        Trend::Declining
    } else {
        Trend::Stable
    }
}

/// Trend of the observation at `period` against the observations before it.
///
/// Returns [`Trend::Stable`] when `period` is not in the series.
pub fn trend_at(series: &[Observation], period: i64, config: &PipelineConfig) -> Trend {
    let Some(idx) = series.iter().position(|o| o.period == period) else {
        return Trend::Stable;
    };
    let preceding: Vec<f64> = series[..idx].iter().map(|o| o.value).collect();
    trend(series[idx].value, &preceding, config)
}

/// Builds the alert for a district's current score. Never touches the score data.
pub fn evaluate(
    current: &AupsValue,
    aups_trend: Trend,
    population_trend: Trend,
    config: &PipelineConfig,
) -> AlertRecord {
    AlertRecord {
        district_id: current.district_id.clone(),
        period: current.period,
        tier: tier(current.score, population_trend, config),
        aups_score: current.score,
        aups_trend,
        population_trend,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_boundaries() {
        let config = PipelineConfig::default();

        assert_eq!(tier(95.0, Trend::Declining, &config), AlertTier::EdgeCase);
        assert_eq!(tier(95.0, Trend::Stable, &config), AlertTier::RedFlag);
        assert_eq!(tier(95.0, Trend::Rising, &config), AlertTier::RedFlag);
        assert_eq!(tier(80.0, Trend::Declining, &config), AlertTier::Watch);
        assert_eq!(tier(80.0, Trend::Stable, &config), AlertTier::Watch);
        assert_eq!(tier(60.5, Trend::Stable, &config), AlertTier::Watch);
        assert_eq!(tier(60.0, Trend::Stable, &config), AlertTier::Normal);
        assert_eq!(tier(10.0, Trend::Declining, &config), AlertTier::Normal);
    }

    #[test]
    fn test_custom_thresholds() {
        let config = PipelineConfig {
            watch_threshold: 30.0,
            red_flag_threshold: 50.0,
            ..Default::default()
        };

        assert_eq!(tier(55.0, Trend::Stable, &config), AlertTier::RedFlag);
        assert_eq!(tier(40.0, Trend::Stable, &config), AlertTier::Watch);
    }

    #[test]
    fn test_trend_classification() {
        let config = PipelineConfig::default();
        let preceding = [100.0; 7];

        assert_eq!(trend(106.0, &preceding, &config), Trend::Rising);
        assert_eq!(trend(105.0, &preceding, &config), Trend::Stable);
        assert_eq!(trend(95.0, &preceding, &config), Trend::Stable);
        assert_eq!(trend(94.0, &preceding, &config), Trend::Declining);
    }

    #[test]
    fn test_trend_uses_last_window_only() {
        let config = PipelineConfig::default();
        let mut preceding = vec![1000.0; 3];
        preceding.extend([100.0; 7]);

        assert_eq!(trend(100.0, &preceding, &config), Trend::Stable);
    }

    #[test]
    fn test_trend_without_history_is_stable() {
        assert_eq!(trend(50.0, &[], &PipelineConfig::default()), Trend::Stable);
    }

    #[test]
    fn test_trend_at_period() {
        let series: Vec<Observation> = [10.0, 10.0, 10.0, 5.0]
            .iter()
            .enumerate()
            .map(|(i, v)| Observation {
                period: i as i64,
                value: *v,
            })
            .collect();
        let config = PipelineConfig::default();

        assert_eq!(trend_at(&series, 3, &config), Trend::Declining);
        assert_eq!(trend_at(&series, 2, &config), Trend::Stable);
        assert_eq!(trend_at(&series, 42, &config), Trend::Stable);
    }

    #[test]
    fn test_evaluate_builds_record() {
        let current = AupsValue {
            district_id: "D".to_string(),
            period: 12,
            score: 88.0,
        };

        let alert = evaluate(
            &current,
            Trend::Rising,
            Trend::Declining,
            &PipelineConfig::default(),
        );

        assert_eq!(alert.tier, AlertTier::EdgeCase);
        assert_eq!(alert.period, 12);
        assert_eq!(alert.aups_score, 88.0);
        assert_eq!(alert.aups_trend, Trend::Rising);
        assert_eq!(alert.population_trend, Trend::Declining);
    }
}
