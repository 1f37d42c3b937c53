//! Error kinds raised by the scoring and forecasting core.

use thiserror::Error;

/// Failures surfaced by the per-district computations.
///
/// Every variant is scoped to a single district so that callers can record
/// the failure and keep processing the rest of the dataset.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PressureError {
    /// A record cannot be scored (non-positive capacity, negative demand,
    /// duplicate or out-of-order period, mixed districts).
    #[error("invalid input for district {district_id} at period {period}: {reason}")]
    InvalidInput {
        district_id: String,
        period: i64,
        reason: String,
    },

    #[error("insufficient history for district {district_id}: need {need} periods, have {have}")]
    InsufficientHistory {
        district_id: String,
        need: usize,
        have: usize,
    },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl PressureError {
    pub(crate) fn invalid_input(district_id: &str, period: i64, reason: impl Into<String>) -> Self {
        PressureError::InvalidInput {
            district_id: district_id.to_string(),
            period,
            reason: reason.into(),
        }
    }

    /// Short machine-friendly label used in failure tables.
    pub fn kind(&self) -> &'static str {
        match self {
            PressureError::InvalidInput { .. } => "invalid_input",
            PressureError::InsufficientHistory { .. } => "insufficient_history",
            PressureError::InvalidConfig(_) => "invalid_config",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insufficient_history_message() {
        let err = PressureError::InsufficientHistory {
            district_id: "D1".to_string(),
            need: 7,
            have: 3,
        };
        assert_eq!(
            err.to_string(),
            "insufficient history for district D1: need 7 periods, have 3"
        );
        assert_eq!(err.kind(), "insufficient_history");
    }

    #[test]
    fn test_invalid_input_helper() {
        let err = PressureError::invalid_input("D2", 4, "capacity must be positive");
        assert_eq!(err.kind(), "invalid_input");
        assert!(err.to_string().contains("period 4"));
    }
}
