//! Model training on a prepared feature table

use crate::config::TrainingConfig;
use crate::error::{ForecastError, Result};
use crate::features::FeatureTable;
use crate::models::{
    FittedRegressor, GradientBoosting, ModelMetadata, Regressor, TrainedModel, MODEL_VERSION,
};
use chrono::Utc;
use footprint_math::{mean_absolute_error, r2_score, root_mean_squared_error, StandardScaler};
use tracing::info;

/// Fits a scaler and a boosted ensemble on a chronological split
#[derive(Debug, Clone)]
pub struct ModelTrainer {
    config: TrainingConfig,
    regressor: GradientBoosting,
}

impl ModelTrainer {
    pub fn new(config: TrainingConfig) -> Result<Self> {
        config.validate()?;
        let regressor = GradientBoosting::new(config.boosting.clone())?;
        Ok(Self { config, regressor })
    }

    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    /// Number of leading rows used for fitting; the rest form the validation tail
    pub fn split_index(&self, rows: usize) -> usize {
        ((1.0 - self.config.validation_fraction) * rows as f64).floor() as usize
    }

    /// Fit on the leading rows and score on the validation tail
    pub fn train(&self, table: &FeatureTable) -> Result<TrainedModel> {
        let n = table.len();
        if n < self.config.min_training_rows {
            return Err(ForecastError::Training(format!(
                "Need at least {} rows to train, got {}",
                self.config.min_training_rows, n
            )));
        }

        let split = self.split_index(n);
        if split == 0 || split == n {
            return Err(ForecastError::Training(format!(
                "Chronological split of {} rows leaves an empty partition",
                n
            )));
        }

        let features = table.feature_matrix();
        let targets = table.values();
        let (train_x, valid_x) = features.split_at(split);
        let (train_y, valid_y) = targets.split_at(split);

        let scaler = StandardScaler::fit(train_x)?;
        let fitted = self
            .regressor
            .fit(&scaler.transform(train_x)?, train_y)?;

        let predictions = fitted.predict(&scaler.transform(valid_x)?)?;
        let score = r2_score(valid_y, &predictions)?;
        let mae = mean_absolute_error(valid_y, &predictions)?;
        let rmse = root_mean_squared_error(valid_y, &predictions)?;

        info!(
            model = fitted.name(),
            training_rows = train_y.len(),
            validation_rows = valid_y.len(),
            r2 = score,
            mae,
            rmse,
            "trained footprint model"
        );

        let metadata = ModelMetadata {
            version: MODEL_VERSION.to_string(),
            trained_at: Utc::now(),
            feature_columns: table.columns().to_vec(),
            training_rows: train_y.len(),
            validation_rows: valid_y.len(),
            validation_score: score,
        };

        TrainedModel::new(fitted, scaler, metadata)
    }
}
