//! Pipeline configuration
//!
//! Every section deserializes with `#[serde(default)]`, so an empty TOML
//! document yields the standard configuration.

use crate::error::{ForecastError, Result};
use crate::models::BoostingParams;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Lag horizons, in days, used by the standard feature set
pub const DEFAULT_LAGS: [usize; 4] = [1, 7, 14, 30];
/// Rolling window lengths, in days, used by the standard feature set
pub const DEFAULT_ROLLING_WINDOWS: [usize; 3] = [7, 14, 30];
/// Trend delta horizons, in days, used by the standard feature set
pub const DEFAULT_TREND_HORIZONS: [usize; 3] = [1, 7, 30];
/// Minimum number of observations the boundary accepts
pub const MIN_DATA_POINTS: usize = 30;
/// Share of rows held out as the validation tail
pub const DEFAULT_VALIDATION_FRACTION: f64 = 0.2;
/// Anomaly z-score threshold
pub const DEFAULT_ANOMALY_THRESHOLD: f64 = 2.0;
/// Anomaly rolling window
pub const DEFAULT_ANOMALY_WINDOW: usize = 7;
/// Number of days forecast when a request does not ask for a horizon
pub const DEFAULT_FORECAST_DAYS: usize = 30;
/// Default location of the persisted model artifact
pub const DEFAULT_MODEL_PATH: &str = "models/footprint_model.json";

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastConfig {
    pub features: FeatureConfig,
    pub training: TrainingConfig,
    pub anomaly: AnomalyConfig,
    pub forecast: ForecastSettings,
    /// Location of the persisted model artifact
    pub model_path: PathBuf,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            features: FeatureConfig::default(),
            training: TrainingConfig::default(),
            anomaly: AnomalyConfig::default(),
            forecast: ForecastSettings::default(),
            model_path: PathBuf::from(DEFAULT_MODEL_PATH),
        }
    }
}

impl ForecastConfig {
    /// Parse and validate a TOML document
    pub fn from_toml(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml(&text)
    }

    /// Check every section for values the pipeline cannot work with
    pub fn validate(&self) -> Result<()> {
        self.features.validate()?;
        self.training.validate()?;
        self.anomaly.validate()?;
        self.forecast.validate()?;
        Ok(())
    }
}

/// Which lag, rolling and trend features are derived
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureConfig {
    pub lags: Vec<usize>,
    pub rolling_windows: Vec<usize>,
    pub trend_horizons: Vec<usize>,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            lags: DEFAULT_LAGS.to_vec(),
            rolling_windows: DEFAULT_ROLLING_WINDOWS.to_vec(),
            trend_horizons: DEFAULT_TREND_HORIZONS.to_vec(),
        }
    }
}

impl FeatureConfig {
    pub fn validate(&self) -> Result<()> {
        for (name, values) in [
            ("lags", &self.lags),
            ("rolling_windows", &self.rolling_windows),
            ("trend_horizons", &self.trend_horizons),
        ] {
            if values.is_empty() {
                return Err(ForecastError::Config(format!("{} must not be empty", name)));
            }
            if values.contains(&0) {
                return Err(ForecastError::Config(format!(
                    "{} must contain positive day counts",
                    name
                )));
            }
        }
        Ok(())
    }
}

/// Model fitting settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    /// Fraction of rows, taken from the end of the series, used for validation
    pub validation_fraction: f64,
    /// Smallest feature table the trainer accepts
    pub min_training_rows: usize,
    pub boosting: BoostingParams,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            validation_fraction: DEFAULT_VALIDATION_FRACTION,
            min_training_rows: MIN_DATA_POINTS,
            boosting: BoostingParams::default(),
        }
    }
}

impl TrainingConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.validation_fraction > 0.0 && self.validation_fraction < 1.0) {
            return Err(ForecastError::Config(format!(
                "validation_fraction must be between 0 and 1, got {}",
                self.validation_fraction
            )));
        }
        if self.min_training_rows < 2 {
            return Err(ForecastError::Config(
                "min_training_rows must be at least 2".to_string(),
            ));
        }
        self.boosting.validate()
    }
}

/// Anomaly detection settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnomalyConfig {
    /// Rolling window used for the local baseline
    pub window: usize,
    /// Absolute z-score above which a day is flagged
    pub threshold: f64,
    /// Below this many rows detection is skipped
    pub min_rows: usize,
}

impl Default for AnomalyConfig {
    fn default() -> Self {
        Self {
            window: DEFAULT_ANOMALY_WINDOW,
            threshold: DEFAULT_ANOMALY_THRESHOLD,
            min_rows: DEFAULT_ANOMALY_WINDOW,
        }
    }
}

impl AnomalyConfig {
    pub fn validate(&self) -> Result<()> {
        if self.window == 0 {
            return Err(ForecastError::Config(
                "anomaly window must be positive".to_string(),
            ));
        }
        if !(self.threshold > 0.0 && self.threshold.is_finite()) {
            return Err(ForecastError::Config(format!(
                "anomaly threshold must be a positive number, got {}",
                self.threshold
            )));
        }
        Ok(())
    }
}

/// Forecast request settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastSettings {
    /// Days forecast when a request does not specify a horizon
    pub default_horizon: usize,
    /// Largest horizon a request may ask for
    pub max_horizon: usize,
    /// Observations required before the pipeline runs
    pub min_history: usize,
}

impl Default for ForecastSettings {
    fn default() -> Self {
        Self {
            default_horizon: DEFAULT_FORECAST_DAYS,
            max_horizon: 365,
            min_history: MIN_DATA_POINTS,
        }
    }
}

impl ForecastSettings {
    pub fn validate(&self) -> Result<()> {
        if self.default_horizon > self.max_horizon {
            return Err(ForecastError::Config(format!(
                "default_horizon ({}) exceeds max_horizon ({})",
                self.default_horizon, self.max_horizon
            )));
        }
        if self.min_history == 0 {
            return Err(ForecastError::Config(
                "min_history must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
