use tracing::debug;

use crate::analyzers::types::{AupsValue, DistrictPeriodRecord, Observation};
use crate::config::PipelineConfig;
use crate::error::PressureError;

/// Computes the Area Utilization Pressure Score for every period of a single
/// district.
///
/// `AUPS = demand / capacity * 100 * population factor`, where the factor is
/// `population / baseline_population` (1.0 when no baseline is configured).
/// Periods with no recorded demand are skipped rather than interpolated.
///
/// # Errors
///
/// Returns [`PressureError::InvalidInput`] if any record has a non-positive
/// capacity, a negative or non-finite demand, belongs to another district,
/// or breaks the strictly increasing period order.
pub fn compute_aups(
    records: &[DistrictPeriodRecord],
    config: &PipelineConfig,
) -> Result<Vec<AupsValue>, PressureError> {
    let Some(first) = records.first() else {
        return Ok(Vec::new());
    };
    let district_id = first.district_id.as_str();

    let mut scores = Vec::with_capacity(records.len());
    let mut previous_period: Option<i64> = None;

    for record in records {
        validate_record(record, district_id, previous_period)?;
        previous_period = Some(record.period);

        let Some(demand) = record.demand_count else {
            debug!(district_id, period = record.period, "No demand recorded, skipping period");
            continue;
        };

        let score =
            demand / record.capacity * 100.0 * config.population_factor(record.population);

        scores.push(AupsValue {
            district_id: district_id.to_string(),
            period: record.period,
            score,
        });
    }

    Ok(scores)
}

fn validate_record(
    record: &DistrictPeriodRecord,
    district_id: &str,
    previous_period: Option<i64>,
) -> Result<(), PressureError> {
    if record.district_id != district_id {
        return Err(PressureError::invalid_input(
            district_id,
            record.period,
            format!("record belongs to district {}", record.district_id),
        ));
    }

    if let Some(previous) = previous_period {
        if record.period == previous {
            return Err(PressureError::invalid_input(
                district_id,
                record.period,
                "duplicate period",
            ));
        }
        if record.period < previous {
            return Err(PressureError::invalid_input(
                district_id,
                record.period,
                format!("period out of order after {previous}"),
            ));
        }
    }

    if !(record.capacity.is_finite() && record.capacity > 0.0) {
        return Err(PressureError::invalid_input(
            district_id,
            record.period,
            format!("capacity must be positive, got {}", record.capacity),
        ));
    }

    if let Some(demand) = record.demand_count {
        if !(demand.is_finite() && demand >= 0.0) {
            return Err(PressureError::invalid_input(
                district_id,
                record.period,
                format!("demand must be a non-negative number, got {demand}"),
            ));
        }
    }

    Ok(())
}

/// Demand series of a district, leaving out periods with no recorded demand.
pub fn demand_series(records: &[DistrictPeriodRecord]) -> Vec<Observation> {
    records
        .iter()
        .filter_map(|r| {
            r.demand_count.map(|value| Observation {
                period: r.period,
                value,
            })
        })
        .collect()
}

pub fn aups_series(scores: &[AupsValue]) -> Vec<Observation> {
    scores
        .iter()
        .map(|s| Observation {
            period: s.period,
            value: s.score,
        })
        .collect()
}

pub fn population_series(records: &[DistrictPeriodRecord]) -> Vec<Observation> {
    records
        .iter()
        .map(|r| Observation {
            period: r.period,
            value: r.population as f64,
        })
        .collect()
}
