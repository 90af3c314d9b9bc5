mod common;

use chrono::Duration;
use common::{date, observations, uniform};
use footprint_forecast::config::{FeatureConfig, TrainingConfig};
use footprint_forecast::{
    forecast, generate_sample_data, prepare, FeatureSpec, ForecastError, Forecaster, ModelTrainer,
};
use rstest::rstest;

#[test]
fn test_uniform_series_forecasts_the_level() {
    let table = prepare(observations(date(2024, 1, 1), &uniform(30, 10.0))).unwrap();
    let model = ModelTrainer::new(TrainingConfig::default())
        .unwrap()
        .train(&table)
        .unwrap();

    let points = Forecaster::default().forecast(&table, &model, 5).unwrap();

    assert_eq!(points.len(), 5);
    for point in &points {
        assert!((point.predicted - 10.0).abs() < 1e-9);
    }
}

#[rstest]
#[case(0)]
#[case(1)]
#[case(30)]
#[case(90)]
fn test_forecast_steps_one_day_at_a_time(#[case] horizon: usize) {
    let end = date(2024, 3, 31);
    let table = prepare(generate_sample_data(45, end, 5, true).unwrap()).unwrap();
    let model = ModelTrainer::new(TrainingConfig::default())
        .unwrap()
        .train(&table)
        .unwrap();

    let points = forecast(&table, &FeatureSpec::standard(), &model, horizon).unwrap();

    assert_eq!(points.len(), horizon);
    for (i, point) in points.iter().enumerate() {
        assert_eq!(point.date, end + Duration::days(i as i64 + 1));
        assert!(point.predicted >= 0.0);
        assert_eq!(point.predicted, (point.predicted * 100.0).round() / 100.0);
    }
}

#[test]
fn test_forecast_is_deterministic() {
    let table = prepare(generate_sample_data(40, date(2024, 5, 1), 9, false).unwrap()).unwrap();
    let model = ModelTrainer::new(TrainingConfig::default())
        .unwrap()
        .train(&table)
        .unwrap();
    let forecaster = Forecaster::default();

    assert_eq!(
        forecaster.forecast(&table, &model, 14).unwrap(),
        forecaster.forecast(&table, &model, 14).unwrap()
    );
}

#[test]
fn test_schema_mismatch_is_a_forecast_error() {
    let input = observations(date(2024, 1, 1), &uniform(30, 10.0));
    let standard = prepare(input.clone()).unwrap();
    let model = ModelTrainer::new(TrainingConfig::default())
        .unwrap()
        .train(&standard)
        .unwrap();

    let narrow = FeatureSpec::from_config(&FeatureConfig {
        lags: vec![1],
        rolling_windows: vec![7],
        trend_horizons: vec![1],
    })
    .unwrap();
    let narrow_table = narrow.prepare(input).unwrap();

    assert!(matches!(
        forecast(&narrow_table, &narrow, &model, 5),
        Err(ForecastError::Forecast(_))
    ));
    // table prepared with a different feature set than the forecaster uses
    assert!(matches!(
        Forecaster::default().forecast(&narrow_table, &model, 5),
        Err(ForecastError::Forecast(_))
    ));
}

#[test]
fn test_forecast_serializes_dates_as_days() {
    let table = prepare(observations(date(2024, 1, 1), &uniform(30, 10.0))).unwrap();
    let model = ModelTrainer::new(TrainingConfig::default())
        .unwrap()
        .train(&table)
        .unwrap();

    let points = Forecaster::default().forecast(&table, &model, 1).unwrap();
    let value = serde_json::to_value(&points).unwrap();

    assert_eq!(value, serde_json::json!([{"date": "2024-01-31", "predicted": 10.0}]));
}
