//! Regression models for footprint forecasting

use crate::error::{ForecastError, Result};
use crate::features::FeatureTable;
use chrono::{DateTime, Utc};
use footprint_math::{r2_score, StandardScaler};
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

pub mod gradient_boosting;
pub mod trainer;

pub use gradient_boosting::{BoostingParams, GradientBoostedTrees, GradientBoosting};
pub use trainer::ModelTrainer;

/// Version tag stored with every trained artifact
pub const MODEL_VERSION: &str = concat!("gbr-", env!("CARGO_PKG_VERSION"));

/// Fitted regressor mapping a feature vector to a footprint
pub trait FittedRegressor: Debug {
    /// Predict a single feature vector
    fn predict_row(&self, row: &[f64]) -> Result<f64>;

    /// Predict every row of a feature matrix
    fn predict(&self, rows: &[Vec<f64>]) -> Result<Vec<f64>> {
        rows.iter().map(|row| self.predict_row(row)).collect()
    }

    /// Name of the model
    fn name(&self) -> &str;
}

/// Regressor that can be fitted on a feature matrix
pub trait Regressor: Debug + Clone {
    /// The type of fitted model produced
    type Fitted: FittedRegressor;

    /// Fit the model on feature rows and their targets
    fn fit(&self, features: &[Vec<f64>], targets: &[f64]) -> Result<Self::Fitted>;

    /// Get the name of the model
    fn name(&self) -> &str;
}

/// Provenance of a trained model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMetadata {
    pub version: String,
    pub trained_at: DateTime<Utc>,
    /// Feature columns, in the order the model consumes them
    pub feature_columns: Vec<String>,
    pub training_rows: usize,
    pub validation_rows: usize,
    /// R² on the chronological validation tail
    pub validation_score: f64,
}

/// Scaler and ensemble fitted together, the unit that is persisted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainedModel {
    regressor: GradientBoostedTrees,
    scaler: StandardScaler,
    metadata: ModelMetadata,
}

impl TrainedModel {
    pub fn new(
        regressor: GradientBoostedTrees,
        scaler: StandardScaler,
        metadata: ModelMetadata,
    ) -> Result<Self> {
        let width = metadata.feature_columns.len();
        if scaler.n_features() != width || regressor.n_features() != width {
            return Err(ForecastError::Training(format!(
                "Scaler ({}) and regressor ({}) widths must match {} feature columns",
                scaler.n_features(),
                regressor.n_features(),
                width
            )));
        }
        Ok(Self {
            regressor,
            scaler,
            metadata,
        })
    }

    pub fn metadata(&self) -> &ModelMetadata {
        &self.metadata
    }

    pub fn scaler(&self) -> &StandardScaler {
        &self.scaler
    }

    pub fn regressor(&self) -> &GradientBoostedTrees {
        &self.regressor
    }

    pub fn version(&self) -> &str {
        &self.metadata.version
    }

    /// True when the model was fitted on exactly these feature columns
    pub fn is_compatible(&self, columns: &[String]) -> bool {
        self.metadata.feature_columns == columns
    }

    /// Scale a raw feature vector and predict it
    pub fn predict_features(&self, row: &[f64]) -> Result<f64> {
        let scaled = self
            .scaler
            .transform_row(row)
            .map_err(|e| ForecastError::Forecast(e.to_string()))?;
        self.regressor.predict_row(&scaled)
    }

    /// Predict every row of a feature table
    pub fn predict_table(&self, table: &FeatureTable) -> Result<Vec<f64>> {
        self.ensure_compatible(table)?;
        table
            .rows()
            .iter()
            .map(|row| self.predict_features(&row.features))
            .collect()
    }

    /// R² of the model on every row of `table`
    pub fn score(&self, table: &FeatureTable) -> Result<f64> {
        let predictions = self.predict_table(table)?;
        Ok(r2_score(&table.values(), &predictions)?)
    }

    fn ensure_compatible(&self, table: &FeatureTable) -> Result<()> {
        if table.is_empty() {
            return Err(ForecastError::Forecast("Feature table is empty".to_string()));
        }
        if !self.is_compatible(table.columns()) {
            return Err(ForecastError::Forecast(format!(
                "Feature columns do not match the model: expected {} columns, got {}",
                self.metadata.feature_columns.len(),
                table.columns().len()
            )));
        }
        Ok(())
    }
}
