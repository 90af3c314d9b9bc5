//! Error types for the footprint_forecast crate

use polars::prelude::PolarsError;
use thiserror::Error;

/// Custom error types for the footprint_forecast crate
#[derive(Debug, Error)]
pub enum ForecastError {
    /// Bad, missing or insufficient input data
    #[error("Validation error: {0}")]
    Validation(String),

    /// Model fitting could not be carried out
    #[error("Model training failed: {0}")]
    Training(String),

    /// A prediction step failed, e.g. a feature schema mismatch
    #[error("Prediction failed: {0}")]
    Forecast(String),

    /// Error from numeric helpers
    #[error("Math error: {0}")]
    Math(#[from] footprint_math::MathError),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Error from IO operations
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Error from JSON (de)serialization
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Error from Polars operations
    #[error("Polars error: {0}")]
    Polars(String),
}

/// How a failure should be reported across the service boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusClass {
    /// Malformed or insufficient input
    ClientError,
    /// Internal computation failure
    ServerError,
}

impl StatusClass {
    /// HTTP status code conventionally used for this class
    pub fn http_status(self) -> u16 {
        match self {
            StatusClass::ClientError => 400,
            StatusClass::ServerError => 500,
        }
    }
}

impl ForecastError {
    /// Classify the error for the hosting layer
    pub fn status_class(&self) -> StatusClass {
        match self {
            ForecastError::Validation(_) => StatusClass::ClientError,
            _ => StatusClass::ServerError,
        }
    }
}

/// Result type with our custom error
pub type Result<T> = std::result::Result<T, ForecastError>;

impl From<PolarsError> for ForecastError {
    fn from(err: PolarsError) -> Self {
        ForecastError::Polars(err.to_string())
    }
}

impl From<toml::de::Error> for ForecastError {
    fn from(err: toml::de::Error) -> Self {
        ForecastError::Config(err.to_string())
    }
}
