use std::collections::BTreeMap;

use tracing::{debug, warn};

use crate::analyzers::score::compute_aups;
use crate::analyzers::types::{DistrictPeriodRecord, SignalValidation};
use crate::analyzers::utility::{mean, quantile};
use crate::config::PipelineConfig;

/// Share of districts treated as "stressed" in the first half.
const STRESS_QUANTILE: f64 = 0.8;

/// Checks whether districts under high pressure early on go on to see higher
/// demand later.
///
/// The overall period range is split at its midpoint. Districts whose mean
/// first-half AUPS is at or above the 80th percentile are marked stressed,
/// and their mean total second-half demand is compared with everyone else's.
/// Districts that fail scoring are left out. Returns `None` when either group
/// ends up empty.
pub fn validate_signal(
    districts: &BTreeMap<String, Vec<DistrictPeriodRecord>>,
    config: &PipelineConfig,
) -> Option<SignalValidation> {
    let periods = districts.values().flatten().map(|r| r.period);
    let (first, last) = periods.fold(None, |acc: Option<(i64, i64)>, p| match acc {
        None => Some((p, p)),
        Some((lo, hi)) => Some((lo.min(p), hi.max(p))),
    })?;
    // Widened so that spans covering most of the i64 range cannot overflow.
    let split_period = (first as i128 + (last as i128 - first as i128) / 2) as i64;

    let mut early_pressure = Vec::new();
    let mut late_demand = Vec::new();

    for (district_id, records) in districts {
        let (early, late): (Vec<_>, Vec<_>) = records
            .iter()
            .cloned()
            .partition(|r| r.period <= split_period);
        if early.is_empty() || late.is_empty() {
            continue;
        }

        let scores = match compute_aups(&early, config) {
            Ok(scores) if !scores.is_empty() => scores,
            Ok(_) => continue,
            Err(e) => {
                warn!(district_id = %district_id, error = %e, "Skipping district in signal validation");
                continue;
            }
        };
        let pressure = mean(&scores.iter().map(|s| s.score).collect::<Vec<_>>());
        let demand: f64 = late.iter().filter_map(|r| r.demand_count).sum();

        early_pressure.push((district_id.clone(), pressure));
        late_demand.push(demand);
    }

    let pressures: Vec<f64> = early_pressure.iter().map(|(_, p)| *p).collect();
    let stress_threshold = quantile(&pressures, STRESS_QUANTILE)?;

    let mut stressed_districts = Vec::new();
    let mut stressed = Vec::new();
    let mut normal = Vec::new();
    for ((district_id, pressure), demand) in early_pressure.into_iter().zip(late_demand) {
        if pressure >= stress_threshold {
            stressed_districts.push(district_id);
            stressed.push(demand);
        } else {
            normal.push(demand);
        }
    }

    if stressed.is_empty() || normal.is_empty() {
        debug!(
            stressed = stressed.len(),
            normal = normal.len(),
            "Signal validation needs both stressed and normal districts"
        );
        return None;
    }

    let stressed_mean_demand = mean(&stressed);
    let normal_mean_demand = mean(&normal);
    let lift = if normal_mean_demand > 0.0 {
        stressed_mean_demand / normal_mean_demand
    } else {
        1.0
    };

    Some(SignalValidation {
        split_period,
        stress_threshold,
        stressed_districts,
        stressed_mean_demand,
        normal_mean_demand,
        lift,
        is_valid: stressed_mean_demand > normal_mean_demand,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn district(id: &str, demand: &[f64]) -> (String, Vec<DistrictPeriodRecord>) {
        let records = demand
            .iter()
            .enumerate()
            .map(|(i, d)| DistrictPeriodRecord {
                district_id: id.to_string(),
                period: i as i64,
                demand_count: Some(*d),
                capacity: 100.0,
                population: 1000,
            })
            .collect();
        (id.to_string(), records)
    }

    #[test]
    fn test_stressed_districts_see_more_demand() {
        let districts: BTreeMap<_, _> = [
            district("A", &[90.0, 90.0, 95.0, 95.0]),
            district("B", &[20.0, 20.0, 25.0, 25.0]),
            district("C", &[30.0, 30.0, 30.0, 30.0]),
            district("D", &[10.0, 10.0, 10.0, 10.0]),
            district("E", &[40.0, 40.0, 35.0, 35.0]),
        ]
        .into_iter()
        .collect();

        let validation = validate_signal(&districts, &PipelineConfig::default()).unwrap();

        assert_eq!(validation.split_period, 1);
        assert_eq!(validation.stressed_districts, vec!["A".to_string()]);
        assert_eq!(validation.stressed_mean_demand, 190.0);
        // (50 + 60 + 20 + 70) / 4
        assert_eq!(validation.normal_mean_demand, 50.0);
        assert_eq!(validation.lift, 3.8);
        assert!(validation.is_valid);
    }

    #[test]
    fn test_single_district_is_inconclusive() {
        let districts: BTreeMap<_, _> = [district("A", &[10.0, 20.0, 30.0])].into_iter().collect();
        assert!(validate_signal(&districts, &PipelineConfig::default()).is_none());
    }

    #[test]
    fn test_split_over_full_period_range() {
        let mut low = district("LOW", &[10.0, 10.0]);
        for (i, r) in low.1.iter_mut().enumerate() {
            r.period = i64::MIN + i as i64;
        }
        let mut high = district("HIGH", &[90.0, 90.0]);
        for (i, r) in high.1.iter_mut().enumerate() {
            r.period = i64::MAX - 1 + i as i64;
        }
        let districts: BTreeMap<_, _> = [low, high].into_iter().collect();

        // Neither district straddles the midpoint, so nothing is comparable.
        assert!(validate_signal(&districts, &PipelineConfig::default()).is_none());
    }

    #[test]
    fn test_empty_input() {
        assert!(validate_signal(&BTreeMap::new(), &PipelineConfig::default()).is_none());
    }
}
