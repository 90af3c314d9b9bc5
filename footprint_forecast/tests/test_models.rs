mod common;

use chrono::NaiveDate;
use common::{date, observations, uniform};
use footprint_forecast::config::TrainingConfig;
use footprint_forecast::models::{BoostingParams, FittedRegressor, MODEL_VERSION};
use footprint_forecast::{
    generate_sample_data, prepare, FileModelRepository, ForecastError, InMemoryModelRepository,
    ModelRepository, ModelTrainer,
};

fn sample_table(days: usize) -> footprint_forecast::FeatureTable {
    let end = NaiveDate::from_ymd_opt(2024, 6, 30).unwrap();
    prepare(generate_sample_data(days, end, 11, false).unwrap()).unwrap()
}

#[test]
fn test_uniform_series_trains_perfectly() {
    let table = prepare(observations(date(2024, 1, 1), &uniform(30, 10.0))).unwrap();
    let trainer = ModelTrainer::new(TrainingConfig::default()).unwrap();

    let model = trainer.train(&table).unwrap();
    let metadata = model.metadata();

    assert_eq!(metadata.training_rows, 24);
    assert_eq!(metadata.validation_rows, 6);
    assert_eq!(metadata.validation_score, 1.0);
    assert_eq!(metadata.version, MODEL_VERSION);
    assert_eq!(metadata.feature_columns, table.columns());
    assert_eq!(model.predict_features(&table.rows()[0].features).unwrap(), 10.0);
}

#[test]
fn test_sample_series_trains_with_finite_score() {
    let table = sample_table(90);
    let trainer = ModelTrainer::new(TrainingConfig::default()).unwrap();

    let model = trainer.train(&table).unwrap();

    assert!(model.metadata().validation_score.is_finite());
    assert_eq!(model.regressor().n_trees(), 100);
    let score = model.score(&table).unwrap();
    assert!(score.is_finite());
    assert!(score > 0.0, "in-sample score {}", score);
}

#[test]
fn test_training_is_reproducible() {
    let table = sample_table(60);
    let trainer = ModelTrainer::new(TrainingConfig::default()).unwrap();

    let first = trainer.train(&table).unwrap();
    let second = trainer.train(&table).unwrap();

    assert_eq!(first.regressor(), second.regressor());
    assert_eq!(first.scaler(), second.scaler());
}

#[test]
fn test_too_few_rows() {
    let table = prepare(observations(date(2024, 1, 1), &uniform(20, 10.0))).unwrap();
    let trainer = ModelTrainer::new(TrainingConfig::default()).unwrap();

    assert!(matches!(
        trainer.train(&table),
        Err(ForecastError::Training(_))
    ));
}

#[test]
fn test_small_validation_fraction() {
    let config = TrainingConfig {
        validation_fraction: 0.01,
        min_training_rows: 5,
        ..TrainingConfig::default()
    };
    let table = prepare(observations(date(2024, 1, 1), &uniform(10, 10.0))).unwrap();
    let trainer = ModelTrainer::new(config).unwrap();

    assert_eq!(trainer.split_index(10), 9);
    assert!(trainer.train(&table).is_ok());

    let table = prepare(observations(date(2024, 1, 1), &uniform(50, 10.0))).unwrap();
    assert_eq!(trainer.split_index(50), 49);
    assert!(trainer.train(&table).is_ok());
}

#[test]
fn test_invalid_training_config() {
    let config = TrainingConfig {
        boosting: BoostingParams {
            learning_rate: 0.0,
            ..BoostingParams::default()
        },
        ..TrainingConfig::default()
    };
    assert!(ModelTrainer::new(config).is_err());

    let config = TrainingConfig {
        validation_fraction: 1.0,
        ..TrainingConfig::default()
    };
    assert!(ModelTrainer::new(config).is_err());
}

#[test]
fn test_schema_compatibility() {
    let table = sample_table(40);
    let model = ModelTrainer::new(TrainingConfig::default())
        .unwrap()
        .train(&table)
        .unwrap();

    assert!(model.is_compatible(table.columns()));
    assert!(!model.is_compatible(&table.columns()[1..]));
    assert!(model.predict_features(&[1.0, 2.0]).is_err());
}

#[test]
fn test_file_repository_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("model.json");
    let repository = FileModelRepository::new(&path);
    let table = sample_table(40);
    let model = ModelTrainer::new(TrainingConfig::default())
        .unwrap()
        .train(&table)
        .unwrap();

    assert!(repository.load().is_none());
    repository.save(&model).unwrap();
    assert!(path.exists());
    let entries: Vec<_> = std::fs::read_dir(path.parent().unwrap())
        .unwrap()
        .map(|e| e.unwrap().file_name())
        .collect();
    assert_eq!(entries, vec![std::ffi::OsString::from("model.json")]);

    let loaded = repository.load().unwrap();
    assert_eq!(loaded.metadata().feature_columns, model.metadata().feature_columns);
    assert_eq!(loaded.metadata().trained_at, model.metadata().trained_at);
    assert_eq!(loaded.version(), model.version());

    let original = model.predict_table(&table).unwrap();
    let restored = loaded.predict_table(&table).unwrap();
    for (a, b) in original.iter().zip(&restored) {
        assert!((a - b).abs() < 1e-9);
    }
}

#[test]
fn test_concurrent_saves_all_succeed() {
    let dir = tempfile::tempdir().unwrap();
    let repository = FileModelRepository::new(dir.path().join("model.json"));
    let model = ModelTrainer::new(TrainingConfig::default())
        .unwrap()
        .train(&sample_table(40))
        .unwrap();
    repository.save(&model).unwrap();

    let failures = std::thread::scope(|scope| {
        let writers: Vec<_> = (0..4)
            .map(|_| {
                scope.spawn(|| {
                    (0..25)
                        .filter(|_| repository.save(&model).is_err())
                        .count()
                })
            })
            .collect();
        let reader = scope.spawn(|| (0..50).filter(|_| repository.load().is_none()).count());

        let failed_saves: usize = writers.into_iter().map(|w| w.join().unwrap()).sum();
        (failed_saves, reader.join().unwrap())
    });

    assert_eq!(failures, (0, 0));
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
}

#[test]
fn test_in_memory_repository_replaces_model() {
    let repository = InMemoryModelRepository::new();
    let trainer = ModelTrainer::new(TrainingConfig::default()).unwrap();

    let first = trainer.train(&sample_table(40)).unwrap();
    repository.save(&first).unwrap();
    assert_eq!(repository.load().unwrap().metadata().training_rows, 32);

    let second = trainer.train(&sample_table(50)).unwrap();
    repository.save(&second).unwrap();
    assert_eq!(repository.load().unwrap().metadata().training_rows, 40);
}

#[test]
fn test_regressor_name() {
    let table = sample_table(30);
    let model = ModelTrainer::new(TrainingConfig::default())
        .unwrap()
        .train(&table)
        .unwrap();

    assert!(model.regressor().name().starts_with("Gradient Boosting"));
}
