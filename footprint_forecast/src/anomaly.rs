//! Rolling z-score anomaly detection

use crate::config::AnomalyConfig;
use crate::error::{ForecastError, Result};
use crate::features::FeatureTable;
use chrono::NaiveDate;
use footprint_math::rolling::rolling_stats;
use serde::{Serialize, Serializer};
use std::fmt;
use tracing::{debug, warn};

/// Tag reported for every anomaly found by the detector
pub const Z_SCORE_METHOD: &str = "Z-score";

/// Band of values considered normal at a given day
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExpectedRange {
    pub lower: f64,
    pub upper: f64,
}

impl ExpectedRange {
    pub fn contains(&self, value: f64) -> bool {
        value >= self.lower && value <= self.upper
    }
}

impl fmt::Display for ExpectedRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2} - {:.2}", self.lower, self.upper)
    }
}

impl Serialize for ExpectedRange {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A day whose footprint deviates from its rolling baseline
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Anomaly {
    pub date: NaiveDate,
    pub value: f64,
    pub expected_range: ExpectedRange,
    pub detection_method: String,
    #[serde(skip)]
    pub z_score: f64,
}

/// Flags days whose z-score against a trailing window exceeds a threshold
#[derive(Debug, Clone, Default)]
pub struct AnomalyDetector {
    config: AnomalyConfig,
}

impl AnomalyDetector {
    pub fn new(config: AnomalyConfig) -> Result<Self> {
        config
            .validate()
            .map_err(|e| ForecastError::Validation(e.to_string()))?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &AnomalyConfig {
        &self.config
    }

    /// Anomalies in date order
    ///
    /// Days whose window has no spread (a single value or identical values)
    /// are never flagged.
    pub fn detect(&self, table: &FeatureTable) -> Vec<Anomaly> {
        if table.len() < self.config.min_rows {
            debug!(
                rows = table.len(),
                min_rows = self.config.min_rows,
                "too few rows for anomaly detection"
            );
            return Vec::new();
        }

        let values = table.values();
        let stats = match rolling_stats(&values, self.config.window) {
            Ok(stats) => stats,
            Err(e) => {
                warn!(error = %e, "anomaly detection skipped");
                return Vec::new();
            }
        };

        let anomalies: Vec<Anomaly> = table
            .rows()
            .iter()
            .zip(&stats)
            .filter_map(|(row, stats)| {
                let std_dev = stats.std_dev.filter(|s| s.is_finite() && *s > f64::EPSILON)?;
                let z_score = (row.value - stats.mean) / std_dev;
                if !z_score.is_finite() || z_score.abs() <= self.config.threshold {
                    return None;
                }
                Some(Anomaly {
                    date: row.date,
                    value: row.value,
                    expected_range: ExpectedRange {
                        lower: stats.mean - 2.0 * std_dev,
                        upper: stats.mean + 2.0 * std_dev,
                    },
                    detection_method: Z_SCORE_METHOD.to_string(),
                    z_score,
                })
            })
            .collect();

        debug!(
            rows = table.len(),
            anomalies = anomalies.len(),
            "anomaly detection finished"
        );
        anomalies
    }
}

/// Detect anomalies with the default window and threshold
pub fn detect(table: &FeatureTable) -> Vec<Anomaly> {
    AnomalyDetector::default().detect(table)
}
