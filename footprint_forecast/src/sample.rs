//! Synthetic footprint histories for demos and tests

use crate::data::{Observation, SourceBreakdown};
use crate::error::{ForecastError, Result};
use crate::features::is_weekend;
use crate::forecaster::round2;
use chrono::{Datelike, Duration, NaiveDate, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Bernoulli, Distribution, Uniform};
use serde_json::Value;

const BASE_TRANSPORT: f64 = 5.0;
const BASE_ENERGY: f64 = 8.0;
const BASE_WASTE: f64 = 3.0;
const BASE_FOOD: f64 = 4.0;
const WEEKEND_TRANSPORT_FACTOR: f64 = 1.4;
const WINTER_ENERGY_FACTOR: f64 = 1.2;
/// Daily noise is uniform in ±NOISE around 1
const NOISE: f64 = 0.1;
const SPIKE_PROBABILITY: f64 = 0.05;
const MAX_SPIKE: f64 = 0.5;

/// `days` consecutive observations ending at `end_date`
///
/// Transport is higher on weekends and energy higher in winter. Every source
/// shares one daily noise factor. With `inject_anomalies`, each day has a
/// small chance of a transport spike of up to +50%.
pub fn generate_sample_data(
    days: usize,
    end_date: NaiveDate,
    seed: u64,
    inject_anomalies: bool,
) -> Result<Vec<Observation>> {
    let mut rng = StdRng::seed_from_u64(seed);
    let noise = Uniform::new_inclusive(1.0 - NOISE, 1.0 + NOISE);
    let spike = Uniform::new_inclusive(0.0, MAX_SPIKE);
    let spike_day = Bernoulli::new(SPIKE_PROBABILITY)
        .map_err(|e| ForecastError::Validation(e.to_string()))?;

    let observations = (0..days)
        .rev()
        .map(|offset| {
            let date = end_date - Duration::days(offset as i64);
            let factor = noise.sample(&mut rng);

            let weekend = if is_weekend(date) { WEEKEND_TRANSPORT_FACTOR } else { 1.0 };
            let winter = if matches!(date.month(), 12 | 1 | 2) {
                WINTER_ENERGY_FACTOR
            } else {
                1.0
            };

            let mut transport = BASE_TRANSPORT * weekend * factor;
            if inject_anomalies && spike_day.sample(&mut rng) {
                transport *= 1.0 + spike.sample(&mut rng);
            }
            let energy = BASE_ENERGY * winter * factor;
            let waste = BASE_WASTE * factor;
            let food = BASE_FOOD * factor;

            Observation {
                date,
                carbon_footprint: Some(round2(transport + energy + waste + food)),
                sources: SourceBreakdown {
                    transportation: Some(round2(transport)),
                    energy: Some(round2(energy)),
                    waste: Some(round2(waste)),
                    food: Some(round2(food)),
                },
            }
        })
        .collect();

    Ok(observations)
}

/// JSON array of `days` sample records ending today
pub fn sample_payload(days: usize) -> Result<Value> {
    let today = Utc::now().date_naive();
    let observations = generate_sample_data(days, today, rand::random(), false)?;
    Ok(serde_json::to_value(observations)?)
}
