//! District pressure scoring, forecasting and alerting.
//!
//! Scores every district's demand against its capacity, extrapolates demand
//! with a rolling average, measures how well that forecast would have done
//! historically, and classifies current pressure into alert tiers.

pub mod alert;
pub mod backtest;
pub mod forecast;
pub mod ranking;
pub mod score;
pub mod types;
pub mod utility;
pub mod validation;
