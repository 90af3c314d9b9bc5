#![allow(dead_code)]

use chrono::{Duration, NaiveDate};
use footprint_forecast::Observation;
use serde_json::{json, Value};

pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

/// Consecutive daily observations starting at `start`
pub fn observations(start: NaiveDate, values: &[f64]) -> Vec<Observation> {
    values
        .iter()
        .enumerate()
        .map(|(i, &v)| Observation::new(start + Duration::days(i as i64), v))
        .collect()
}

/// Consecutive daily `historicalData` records starting at `start`
pub fn records(start: NaiveDate, values: &[f64]) -> Vec<Value> {
    values
        .iter()
        .enumerate()
        .map(|(i, &v)| {
            json!({
                "date": (start + Duration::days(i as i64)).format("%Y-%m-%d").to_string(),
                "carbonFootprint": v,
            })
        })
        .collect()
}

/// `n` days of a constant footprint
pub fn uniform(n: usize, value: f64) -> Vec<f64> {
    vec![value; n]
}

/// Constant series with a single spike at `index`
pub fn with_spike(n: usize, base: f64, index: usize, spike: f64) -> Vec<f64> {
    let mut values = uniform(n, base);
    values[index] = spike;
    values
}
