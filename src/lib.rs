//! # Footprint
//!
//! Umbrella crate for the carbon footprint forecasting workspace.
//!
//! - [`footprint_math`]: rolling statistics, scaling and regression metrics
//! - [`footprint_forecast`]: feature engineering, model training, forecasting,
//!   anomaly detection and insights
//!
//! ## Example
//!
//! ```
//! use chrono::NaiveDate;
//! use footprint_workspace::forecast::anomaly::detect;
//! use footprint_workspace::forecast::{generate_sample_data, prepare};
//!
//! let end = NaiveDate::from_ymd_opt(2024, 6, 30).unwrap();
//! let history = generate_sample_data(30, end, 42, false)?;
//! let table = prepare(history)?;
//! assert_eq!(table.len(), 30);
//! assert!(detect(&table).len() < 30);
//! # Ok::<(), footprint_workspace::ForecastError>(())
//! ```

pub use footprint_forecast as forecast;
pub use footprint_math as math;

pub use footprint_forecast::{
    ForecastConfig, ForecastError, ForecastPipeline, ForecastRequest, ForecastResponse,
};
