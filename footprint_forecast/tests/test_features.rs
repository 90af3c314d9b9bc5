mod common;

use approx::assert_relative_eq;
use common::{date, observations};
use footprint_forecast::config::FeatureConfig;
use footprint_forecast::features::{is_holiday, CalendarField, FillPolicy};
use footprint_forecast::{prepare, FeatureDescriptor, FeatureSpec};
use pretty_assertions::assert_eq;
use rstest::rstest;

fn ramp(n: usize) -> Vec<f64> {
    (1..=n).map(|i| i as f64).collect()
}

#[test]
fn test_standard_columns() {
    let spec = FeatureSpec::standard();
    let names = spec.names();

    assert_eq!(spec.len(), 9 + 4 + 12 + 3);
    assert_eq!(names[0], "day_of_week");
    assert!(names.contains(&"lag_30".to_string()));
    assert!(names.contains(&"rolling_std_14".to_string()));
    assert!(names.contains(&"trend_7".to_string()));
    assert_eq!(names.last().unwrap(), "trend_30");
}

#[test]
fn test_one_finite_row_per_date() {
    let table = prepare(observations(date(2024, 1, 1), &ramp(45))).unwrap();

    assert_eq!(table.len(), 45);
    assert_eq!(table.dates()[0], date(2024, 1, 1));
    assert_eq!(table.last_date(), Some(date(2024, 2, 14)));
    for row in table.rows() {
        assert_eq!(row.features.len(), table.columns().len());
        assert!(row.features.iter().all(|f| f.is_finite()));
    }
}

#[rstest]
#[case("rolling_std_7")]
#[case("rolling_std_14")]
#[case("rolling_std_30")]
fn test_single_point_std_is_zero(#[case] column: &str) {
    let table = prepare(observations(date(2024, 1, 1), &[7.0, 9.0, 4.0])).unwrap();
    let values = table.column(column).unwrap();

    assert_eq!(values[0], 0.0);
    assert!(values[1] > 0.0);
}

#[test]
fn test_lag_falls_back_to_most_recent_value() {
    let table = prepare(observations(date(2024, 1, 1), &ramp(10))).unwrap();
    let lag_1 = table.column("lag_1").unwrap();
    let lag_7 = table.column("lag_7").unwrap();

    // the first row has no history and uses its own value
    assert_eq!(lag_1[0], 1.0);
    assert_eq!(lag_1[5], 5.0);
    // fewer than 7 prior rows: the previous day
    assert_eq!(lag_7[3], 3.0);
    assert_eq!(lag_7[6], 6.0);
    // enough history: seven days back
    assert_eq!(lag_7[7], 1.0);
    assert_eq!(lag_7[9], 3.0);
}

#[test]
fn test_rolling_and_trend_values() {
    let table = prepare(observations(date(2024, 1, 1), &ramp(10))).unwrap();

    let mean_7 = table.column("rolling_mean_7").unwrap();
    assert_relative_eq!(mean_7[0], 1.0);
    assert_relative_eq!(mean_7[2], 2.0);
    assert_relative_eq!(mean_7[9], 7.0);

    let min_7 = table.column("rolling_min_7").unwrap();
    let max_7 = table.column("rolling_max_7").unwrap();
    assert_eq!((min_7[9], max_7[9]), (4.0, 10.0));

    let std_7 = table.column("rolling_std_7").unwrap();
    assert_relative_eq!(std_7[1], 0.5_f64.sqrt(), epsilon = 1e-12);

    let trend_1 = table.column("trend_1").unwrap();
    let trend_7 = table.column("trend_7").unwrap();
    assert_eq!(trend_1[0], 0.0);
    assert_eq!(trend_1[4], 1.0);
    assert_eq!(trend_7[6], 0.0);
    assert_eq!(trend_7[7], 7.0);
}

#[test]
fn test_calendar_fields() {
    // 2024-12-25 is a Wednesday in winter, Q4, ISO week 52
    let christmas = date(2024, 12, 25);
    assert_eq!(CalendarField::DayOfWeek.value(christmas), 2.0);
    assert_eq!(CalendarField::IsWeekend.value(christmas), 0.0);
    assert_eq!(CalendarField::IsHoliday.value(christmas), 1.0);
    assert_eq!(CalendarField::IsWinter.value(christmas), 1.0);
    assert_eq!(CalendarField::IsSummer.value(christmas), 0.0);
    assert_eq!(CalendarField::Quarter.value(christmas), 4.0);
    assert_eq!(CalendarField::WeekOfYear.value(christmas), 52.0);

    let saturday = date(2024, 7, 6);
    assert_eq!(CalendarField::DayOfWeek.value(saturday), 5.0);
    assert_eq!(CalendarField::IsWeekend.value(saturday), 1.0);
    assert_eq!(CalendarField::IsSummer.value(saturday), 1.0);

    assert!(is_holiday(date(2024, 7, 4)));
    assert!(!is_holiday(date(2024, 7, 5)));
}

#[test]
fn test_descriptor_fill_policies() {
    assert_eq!(FeatureDescriptor::lag(7).fill, FillPolicy::MostRecent);
    assert_eq!(FeatureDescriptor::trend(7).fill, FillPolicy::Zero);
    assert_eq!(FeatureDescriptor::calendar(CalendarField::Month).fill, FillPolicy::Defined);
    assert_eq!(FeatureDescriptor::lag(14).name(), "lag_14");
}

#[test]
fn test_prepare_is_idempotent() {
    let input = observations(date(2024, 3, 1), &[3.0, 8.0, 1.0, 4.0, 9.0, 2.0, 6.0, 5.0]);

    let first = prepare(input.clone()).unwrap();
    let second = prepare(input).unwrap();

    assert_eq!(first, second);
}

#[test]
fn test_custom_feature_config() {
    let config = FeatureConfig {
        lags: vec![2, 1, 2],
        rolling_windows: vec![3],
        trend_horizons: vec![1],
    };
    let spec = FeatureSpec::from_config(&config).unwrap();

    assert_eq!(spec.len(), 9 + 2 + 4 + 1);
    assert_eq!(spec.names()[9..11], ["lag_1".to_string(), "lag_2".to_string()]);

    let bad = FeatureConfig {
        lags: vec![0],
        ..FeatureConfig::default()
    };
    assert!(FeatureSpec::from_config(&bad).is_err());
}

#[test]
fn test_export_to_dataframe() {
    let table = prepare(observations(date(2024, 1, 1), &ramp(5))).unwrap();

    let df = table.to_dataframe().unwrap();

    assert_eq!(df.height(), 5);
    assert_eq!(df.width(), table.columns().len() + 2);
}
