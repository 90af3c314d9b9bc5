//! # Footprint Math
//!
//! Numeric building blocks for the footprint forecasting pipeline.
//! This crate provides rolling-window statistics with `min_periods = 1`
//! semantics, descriptive statistics, a standard scaler and regression
//! quality metrics.

use thiserror::Error;

pub mod metrics;
pub mod rolling;
pub mod scaler;
pub mod statistics;

pub use metrics::{mean_absolute_error, r2_score, root_mean_squared_error};
pub use rolling::{trailing_window_stats, RollingWindow, WindowStats};
pub use scaler::StandardScaler;

/// Errors that can occur in numeric calculations
#[derive(Error, Debug)]
pub enum MathError {
    #[error("Insufficient data for calculation: {0}")]
    InsufficientData(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Calculation error: {0}")]
    CalculationError(String),
}

/// Result type for numeric operations
pub type Result<T> = std::result::Result<T, MathError>;
