//! # Footprint Forecast
//!
//! A Rust library for forecasting daily carbon footprint series.
//!
//! ## Features
//!
//! - Observation parsing from JSON records or CSV, with validation and gap filling
//! - Typed feature engineering (calendar fields, lags, rolling statistics, trends)
//! - Gradient-boosted regression trees trained on a chronological split
//! - Iterative multi-day forecasting where each prediction feeds the next day
//! - Rolling z-score anomaly detection
//! - Insights and recommendations derived from the history
//! - A pluggable model repository for the persisted model artifact
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use footprint_forecast::{ForecastConfig, ForecastPipeline, InMemoryModelRepository};
//! use serde_json::json;
//!
//! let pipeline =
//!     ForecastPipeline::new(ForecastConfig::default(), InMemoryModelRepository::new())?;
//!
//! let history: Vec<_> = (1..=31)
//!     .map(|day| json!({ "date": format!("2024-01-{:02}", day), "carbonFootprint": 18.5 }))
//!     .collect();
//!
//! let request = json!({ "historicalData": history, "forecastDays": 7 });
//! let (status, body) = pipeline.handle_json(&request);
//! assert_eq!(status, 200);
//! println!("{}", body["forecastData"]);
//! # Ok::<(), footprint_forecast::ForecastError>(())
//! ```

pub mod anomaly;
pub mod config;
pub mod data;
pub mod error;
pub mod features;
pub mod forecaster;
pub mod insights;
pub mod models;
pub mod pipeline;
pub mod repository;
pub mod sample;

// Re-export commonly used types
pub use crate::anomaly::{Anomaly, AnomalyDetector, ExpectedRange};
pub use crate::config::ForecastConfig;
pub use crate::data::{DataLoader, Observation, ObservationSeries, SourceBreakdown};
pub use crate::error::{ForecastError, StatusClass};
pub use crate::features::{prepare, FeatureDescriptor, FeatureKind, FeatureSpec, FeatureTable};
pub use crate::forecaster::{forecast, ForecastPoint, Forecaster};
pub use crate::insights::{insights, recommendations};
pub use crate::models::{ModelTrainer, TrainedModel};
pub use crate::pipeline::{ErrorResponse, ForecastPipeline, ForecastRequest, ForecastResponse};
pub use crate::repository::{FileModelRepository, InMemoryModelRepository, ModelRepository};
pub use crate::sample::{generate_sample_data, sample_payload};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
