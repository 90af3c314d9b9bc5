//! Request-level orchestration
//!
//! The pipeline turns a `historicalData` payload into a forecast response.
//! The trained model comes from the injected [`ModelRepository`]; a missing,
//! unreadable or incompatible artifact triggers retraining.

use crate::anomaly::{Anomaly, AnomalyDetector};
use crate::config::ForecastConfig;
use crate::data::{DataLoader, Observation};
use crate::error::{ForecastError, Result, StatusClass};
use crate::features::{FeatureSpec, FeatureTable};
use crate::forecaster::{ForecastPoint, Forecaster};
use crate::insights::{insights, recommendations};
use crate::models::{ModelTrainer, TrainedModel};
use crate::repository::ModelRepository;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

/// Incoming forecast request
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastRequest {
    #[serde(default)]
    pub historical_data: Vec<Value>,
    /// Days to forecast; the configured default horizon when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub forecast_days: Option<usize>,
}

impl ForecastRequest {
    pub fn from_json(payload: &Value) -> Result<Self> {
        serde_json::from_value(payload.clone())
            .map_err(|e| ForecastError::Validation(format!("Invalid request: {}", e)))
    }
}

/// Successful forecast result
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastResponse {
    pub forecast_data: Vec<ForecastPoint>,
    pub anomalies: Vec<Anomaly>,
    pub insights: Vec<String>,
    pub recommendations: Vec<String>,
    pub model_score: f64,
    pub model_version: String,
}

/// Failure payload returned across the boundary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl From<&ForecastError> for ErrorResponse {
    fn from(err: &ForecastError) -> Self {
        let error = match err {
            ForecastError::Validation(message) => message.clone(),
            other => other.to_string(),
        };
        Self { error }
    }
}

/// Feature builder, model resolution, forecaster, anomaly detector and
/// insight generator wired together
pub struct ForecastPipeline<R: ModelRepository> {
    config: ForecastConfig,
    spec: FeatureSpec,
    trainer: ModelTrainer,
    detector: AnomalyDetector,
    forecaster: Forecaster,
    repository: R,
}

impl<R: ModelRepository> ForecastPipeline<R> {
    pub fn new(config: ForecastConfig, repository: R) -> Result<Self> {
        config.validate()?;
        let spec = FeatureSpec::from_config(&config.features)?;
        let trainer = ModelTrainer::new(config.training.clone())?;
        let detector = AnomalyDetector::new(config.anomaly.clone())?;
        let forecaster = Forecaster::new(spec.clone());

        Ok(Self {
            config,
            spec,
            trainer,
            detector,
            forecaster,
            repository,
        })
    }

    pub fn config(&self) -> &ForecastConfig {
        &self.config
    }

    pub fn spec(&self) -> &FeatureSpec {
        &self.spec
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    /// Serve a raw JSON payload, returning an HTTP-style status and body
    pub fn handle_json(&self, payload: &Value) -> (u16, Value) {
        let outcome = ForecastRequest::from_json(payload)
            .and_then(|request| self.run(&request))
            .and_then(|response| Ok(serde_json::to_value(response)?));

        match outcome {
            Ok(body) => (200, body),
            Err(e) => {
                let status = e.status_class();
                match status {
                    StatusClass::ClientError => warn!(error = %e, "rejected forecast request"),
                    StatusClass::ServerError => warn!(error = %e, "forecast request failed"),
                }
                let body = serde_json::json!({ "error": ErrorResponse::from(&e).error });
                (status.http_status(), body)
            }
        }
    }

    /// Serve a parsed request
    pub fn run(&self, request: &ForecastRequest) -> Result<ForecastResponse> {
        self.check_history_size(request.historical_data.len())?;
        let horizon = self.horizon(request.forecast_days)?;
        let observations = DataLoader::from_json_records(&request.historical_data)?;
        self.run_observations(observations, horizon)
    }

    /// Run every stage on already parsed observations
    pub fn run_observations(
        &self,
        observations: Vec<Observation>,
        horizon: usize,
    ) -> Result<ForecastResponse> {
        self.check_history_size(observations.len())?;
        if horizon > self.config.forecast.max_horizon {
            return Err(self.horizon_error(horizon));
        }

        let table = self.spec.prepare(observations)?;
        let (model, model_score) = self.resolve_model(&table)?;
        let forecast_data = self.forecaster.forecast(&table, &model, horizon)?;

        let anomalies = self.detector.detect(&table);
        let insights = insights(&table);
        let recommendations = recommendations(&table, &anomalies);

        info!(
            rows = table.len(),
            horizon,
            anomalies = anomalies.len(),
            insights = insights.len(),
            model_score,
            "forecast request completed"
        );

        Ok(ForecastResponse {
            forecast_data,
            anomalies,
            insights,
            recommendations,
            model_score,
            model_version: model.version().to_string(),
        })
    }

    fn check_history_size(&self, len: usize) -> Result<()> {
        if len == 0 {
            return Err(ForecastError::Validation(
                "No historical data provided".to_string(),
            ));
        }
        let required = self.config.forecast.min_history;
        if len < required {
            return Err(ForecastError::Validation(format!(
                "Insufficient data. Need at least {} data points",
                required
            )));
        }
        Ok(())
    }

    fn horizon(&self, requested: Option<usize>) -> Result<usize> {
        let horizon = requested.unwrap_or(self.config.forecast.default_horizon);
        if horizon > self.config.forecast.max_horizon {
            return Err(self.horizon_error(horizon));
        }
        Ok(horizon)
    }

    fn horizon_error(&self, horizon: usize) -> ForecastError {
        ForecastError::Validation(format!(
            "forecastDays must be at most {}, got {}",
            self.config.forecast.max_horizon, horizon
        ))
    }

    /// Stored model and its score on `table`, or a freshly trained one
    fn resolve_model(&self, table: &FeatureTable) -> Result<(TrainedModel, f64)> {
        match self.repository.load() {
            Some(model) if model.is_compatible(table.columns()) => match model.score(table) {
                Ok(score) => {
                    let score = if score.is_finite() {
                        score
                    } else {
                        model.metadata().validation_score
                    };
                    info!(version = model.version(), score, "using stored model");
                    return Ok((model, score));
                }
                Err(e) => warn!(error = %e, "stored model cannot score current data, retraining"),
            },
            Some(model) => warn!(
                version = model.version(),
                stored_columns = model.metadata().feature_columns.len(),
                current_columns = table.columns().len(),
                "stored model feature schema differs, retraining"
            ),
            None => info!("no stored model, training"),
        }

        let model = self.trainer.train(table)?;
        if let Err(e) = self.repository.save(&model) {
            warn!(error = %e, "failed to persist trained model");
        }
        let score = model.metadata().validation_score;
        Ok((model, score))
    }
}
