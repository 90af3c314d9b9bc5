//! Multi-step forecasting
//!
//! Each predicted day is appended to a working copy of the series, so lag,
//! rolling and trend features of later days see earlier predictions.

use crate::error::{ForecastError, Result};
use crate::features::{FeatureSpec, FeatureTable};
use crate::models::TrainedModel;
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::info;

/// One forecast day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub date: NaiveDate,
    /// Predicted footprint, non-negative and rounded to two decimals
    pub predicted: f64,
}

/// Rolls a trained model forward one day at a time
#[derive(Debug, Clone, Default)]
pub struct Forecaster {
    spec: FeatureSpec,
}

impl Forecaster {
    pub fn new(spec: FeatureSpec) -> Self {
        Self { spec }
    }

    pub fn spec(&self) -> &FeatureSpec {
        &self.spec
    }

    /// Forecast `horizon` days following the last row of `table`
    pub fn forecast(
        &self,
        table: &FeatureTable,
        model: &TrainedModel,
        horizon: usize,
    ) -> Result<Vec<ForecastPoint>> {
        let last_date = table.last_date().ok_or_else(|| {
            ForecastError::Forecast("Cannot forecast from an empty table".to_string())
        })?;

        let names = self.spec.names();
        if table.columns() != names.as_slice() || !model.is_compatible(&names) {
            return Err(ForecastError::Forecast(format!(
                "Feature schema mismatch: model was trained on {} columns, feature set has {}",
                model.metadata().feature_columns.len(),
                names.len()
            )));
        }

        let mut series = table.values();
        series.reserve(horizon);
        let mut points = Vec::with_capacity(horizon);

        for step in 1..=horizon {
            let date = last_date + Duration::days(step as i64);
            let features = self.spec.derive_row(date, &series, &series)?;
            let raw = model.predict_features(&features)?;
            if !raw.is_finite() {
                return Err(ForecastError::Forecast(format!(
                    "Non-finite prediction for {}",
                    date
                )));
            }

            let predicted = raw.max(0.0);
            points.push(ForecastPoint {
                date,
                predicted: round2(predicted),
            });
            series.push(predicted);
        }

        info!(
            horizon,
            start = %last_date,
            model_version = model.version(),
            "generated forecast"
        );

        Ok(points)
    }
}

/// Forecast with an explicit feature set
pub fn forecast(
    table: &FeatureTable,
    spec: &FeatureSpec,
    model: &TrainedModel,
    horizon: usize,
) -> Result<Vec<ForecastPoint>> {
    Forecaster::new(spec.clone()).forecast(table, model, horizon)
}

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round2() {
        assert_eq!(round2(1.234), 1.23);
        assert_eq!(round2(1.235001), 1.24);
        assert_eq!(round2(0.0), 0.0);
    }
}
