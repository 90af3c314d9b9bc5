//! Daily footprint observations: parsing, validation and gap filling

use crate::error::{ForecastError, Result};
use chrono::{DateTime, NaiveDate};
use polars::prelude::*;
use serde::Serialize;
use serde_json::Value;
use std::fs::File;
use std::path::Path;
use tracing::debug;

/// JSON/CSV field holding the observation date
pub const DATE_FIELD: &str = "date";
/// JSON/CSV field holding the total daily footprint
pub const FOOTPRINT_FIELD: &str = "carbonFootprint";
/// Largest share of missing footprint values accepted
pub const MAX_MISSING_FRACTION: f64 = 0.1;

/// Emission source categories that may accompany an observation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceCategory {
    Transportation,
    Energy,
    Waste,
    Food,
}

impl SourceCategory {
    pub const ALL: [SourceCategory; 4] = [
        SourceCategory::Transportation,
        SourceCategory::Energy,
        SourceCategory::Waste,
        SourceCategory::Food,
    ];

    /// Field name used in payloads
    pub fn key(self) -> &'static str {
        match self {
            SourceCategory::Transportation => "transportation",
            SourceCategory::Energy => "energy",
            SourceCategory::Waste => "waste",
            SourceCategory::Food => "food",
        }
    }

    /// Capitalized name for messages
    pub fn label(self) -> &'static str {
        match self {
            SourceCategory::Transportation => "Transportation",
            SourceCategory::Energy => "Energy",
            SourceCategory::Waste => "Waste",
            SourceCategory::Food => "Food",
        }
    }
}

/// Optional per-source split of a daily footprint
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct SourceBreakdown {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transportation: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub energy: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub waste: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub food: Option<f64>,
}

impl SourceBreakdown {
    pub fn get(&self, category: SourceCategory) -> Option<f64> {
        match category {
            SourceCategory::Transportation => self.transportation,
            SourceCategory::Energy => self.energy,
            SourceCategory::Waste => self.waste,
            SourceCategory::Food => self.food,
        }
    }

    pub fn set(&mut self, category: SourceCategory, value: Option<f64>) {
        match category {
            SourceCategory::Transportation => self.transportation = value,
            SourceCategory::Energy => self.energy = value,
            SourceCategory::Waste => self.waste = value,
            SourceCategory::Food => self.food = value,
        }
    }
}

/// A single day of measured footprint
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Observation {
    /// Calendar day of the measurement
    pub date: NaiveDate,
    /// Total footprint in kg CO2, `None` when the value was not recorded
    pub carbon_footprint: Option<f64>,
    /// Optional source split
    #[serde(flatten)]
    pub sources: SourceBreakdown,
}

impl Observation {
    /// Create an observation without a source breakdown
    pub fn new(date: NaiveDate, carbon_footprint: f64) -> Self {
        Self {
            date,
            carbon_footprint: Some(carbon_footprint),
            sources: SourceBreakdown::default(),
        }
    }

    /// Parse one record of a `historicalData` payload
    ///
    /// Both `date` and `carbonFootprint` keys must be present. A `null`
    /// footprint is accepted as a missing value.
    pub fn from_json(index: usize, record: &Value) -> Result<Self> {
        let fields = record.as_object().ok_or_else(|| {
            ForecastError::Validation(format!("Record {} is not an object", index))
        })?;

        let date = match fields.get(DATE_FIELD) {
            None => return Err(missing_field(DATE_FIELD, index)),
            Some(Value::String(text)) => parse_date(text)?,
            Some(other) => {
                return Err(ForecastError::Validation(format!(
                    "Invalid date format in record {}: {}",
                    index, other
                )))
            }
        };

        let carbon_footprint = match fields.get(FOOTPRINT_FIELD) {
            None => return Err(missing_field(FOOTPRINT_FIELD, index)),
            Some(value) => numeric_field(value, FOOTPRINT_FIELD, index)?,
        };

        let mut sources = SourceBreakdown::default();
        for category in SourceCategory::ALL {
            if let Some(value) = fields.get(category.key()) {
                sources.set(category, numeric_field(value, category.key(), index)?);
            }
        }

        Ok(Self {
            date,
            carbon_footprint,
            sources,
        })
    }
}

fn missing_field(field: &str, index: usize) -> ForecastError {
    ForecastError::Validation(format!(
        "Missing required field '{}' in record {}",
        field, index
    ))
}

fn numeric_field(value: &Value, field: &str, index: usize) -> Result<Option<f64>> {
    match value {
        Value::Null => Ok(None),
        Value::Number(number) => Ok(number.as_f64()),
        Value::String(text) => text.trim().parse::<f64>().map(Some).map_err(|_| {
            ForecastError::Validation(format!(
                "Field '{}' in record {} is not a number: {:?}",
                field, index, text
            ))
        }),
        other => Err(ForecastError::Validation(format!(
            "Field '{}' in record {} is not a number: {}",
            field, index, other
        ))),
    }
}

/// Parse `YYYY-MM-DD`, or the date part of an RFC 3339 timestamp
pub fn parse_date(text: &str) -> Result<NaiveDate> {
    let trimmed = text.trim();
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .or_else(|_| DateTime::parse_from_rfc3339(trimmed).map(|dt| dt.date_naive()))
        .map_err(|_| ForecastError::Validation(format!("Invalid date format in data: {:?}", text)))
}

/// Data loader for footprint observations
#[derive(Debug)]
pub struct DataLoader;

impl DataLoader {
    /// Parse the records of a `historicalData` array
    pub fn from_json_records(records: &[Value]) -> Result<Vec<Observation>> {
        records
            .iter()
            .enumerate()
            .map(|(index, record)| Observation::from_json(index, record))
            .collect()
    }

    /// Load observations from a CSV file with `date` and `carbonFootprint` columns
    pub fn from_csv<P: AsRef<Path>>(path: P) -> Result<Vec<Observation>> {
        let file = File::open(path)?;
        let df = CsvReader::new(file)
            .infer_schema(None)
            .has_header(true)
            .finish()?;

        Self::from_dataframe(&df)
    }

    /// Extract observations from an existing DataFrame
    pub fn from_dataframe(df: &DataFrame) -> Result<Vec<Observation>> {
        let column_names = df.get_column_names();
        for required in [DATE_FIELD, FOOTPRINT_FIELD] {
            if !column_names.contains(&required) {
                return Err(ForecastError::Validation(format!(
                    "Missing required column '{}' in data",
                    required
                )));
            }
        }

        let dates = df.column(DATE_FIELD)?.cast(&DataType::Utf8)?;
        let footprints = df.column(FOOTPRINT_FIELD)?.cast(&DataType::Float64)?;

        let mut source_columns = Vec::new();
        for category in SourceCategory::ALL {
            if column_names.contains(&category.key()) {
                let values = Self::float_column(df, category.key())?;
                source_columns.push((category, values));
            }
        }

        let mut observations = Vec::with_capacity(df.height());
        for (index, (date, footprint)) in dates
            .utf8()?
            .into_iter()
            .zip(footprints.f64()?.into_iter())
            .enumerate()
        {
            let date = match date {
                Some(text) => parse_date(text)?,
                None => return Err(missing_field(DATE_FIELD, index)),
            };

            let mut sources = SourceBreakdown::default();
            for (category, values) in &source_columns {
                sources.set(*category, values.get(index).copied().flatten());
            }

            observations.push(Observation {
                date,
                carbon_footprint: footprint,
                sources,
            });
        }

        Ok(observations)
    }

    fn float_column(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>> {
        let column = df.column(name)?.cast(&DataType::Float64)?;
        let values = column.f64()?.into_iter().collect();
        Ok(values)
    }
}

/// Validated, date-ordered, gap-free footprint series
#[derive(Debug, Clone, PartialEq)]
pub struct ObservationSeries {
    dates: Vec<NaiveDate>,
    values: Vec<f64>,
    sources: Vec<SourceBreakdown>,
    filled: usize,
}

impl ObservationSeries {
    /// Validate, sort and fill a set of observations
    ///
    /// Fails when the input is empty, more than 10% of footprints are
    /// missing, any footprint is negative or two observations share a date.
    pub fn from_observations(mut observations: Vec<Observation>) -> Result<Self> {
        if observations.is_empty() {
            return Err(ForecastError::Validation(
                "No historical data provided".to_string(),
            ));
        }

        let total = observations.len();
        let missing = observations
            .iter()
            .filter(|o| o.carbon_footprint.is_none())
            .count();
        if missing as f64 > total as f64 * MAX_MISSING_FRACTION {
            return Err(ForecastError::Validation(format!(
                "Too many missing values: {} of {} footprint values are missing",
                missing, total
            )));
        }

        if let Some(bad) = observations.iter().find(|o| {
            o.carbon_footprint
                .map_or(false, |value| !value.is_finite() || value < 0.0)
        }) {
            return Err(ForecastError::Validation(format!(
                "Carbon footprint must be a non-negative number (found {:?} on {})",
                bad.carbon_footprint, bad.date
            )));
        }

        observations.sort_by_key(|o| o.date);
        if let Some(pair) = observations.windows(2).find(|w| w[0].date == w[1].date) {
            return Err(ForecastError::Validation(format!(
                "Duplicate observations for {}",
                pair[0].date
            )));
        }

        let dates: Vec<NaiveDate> = observations.iter().map(|o| o.date).collect();
        let raw: Vec<Option<f64>> = observations.iter().map(|o| o.carbon_footprint).collect();
        let values = interpolate_missing(&dates, &raw)?;
        let sources = observations.iter().map(|o| o.sources).collect();

        debug!(rows = total, filled = missing, "validated footprint series");

        Ok(Self {
            dates,
            values,
            sources,
            filled: missing,
        })
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn sources(&self) -> &[SourceBreakdown] {
        &self.sources
    }

    /// Number of footprint values that were filled in
    pub fn filled(&self) -> usize {
        self.filled
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Fill gaps by linear interpolation over the day distance between the
/// nearest known neighbours; leading and trailing gaps copy the nearest known
/// value.
pub fn interpolate_missing(dates: &[NaiveDate], values: &[Option<f64>]) -> Result<Vec<f64>> {
    if dates.len() != values.len() {
        return Err(ForecastError::Validation(
            "Dates and values must have the same length".to_string(),
        ));
    }

    let known: Vec<usize> = values
        .iter()
        .enumerate()
        .filter_map(|(i, v)| v.map(|_| i))
        .collect();
    if known.is_empty() {
        return Err(ForecastError::Validation(
            "No footprint values present to fill gaps from".to_string(),
        ));
    }

    let mut filled = Vec::with_capacity(values.len());
    let mut next_known = 0;
    for (i, value) in values.iter().enumerate() {
        if let Some(v) = value {
            filled.push(*v);
            continue;
        }

        while next_known < known.len() && known[next_known] < i {
            next_known += 1;
        }
        let before = next_known.checked_sub(1).map(|k| known[k]);
        let after = known.get(next_known).copied();

        let fill = match (before, after) {
            (Some(b), Some(a)) => {
                let (vb, va) = (values[b].unwrap_or_default(), values[a].unwrap_or_default());
                let span = (dates[a] - dates[b]).num_days() as f64;
                let offset = (dates[i] - dates[b]).num_days() as f64;
                if span > 0.0 {
                    vb + (va - vb) * offset / span
                } else {
                    vb
                }
            }
            (Some(b), None) => values[b].unwrap_or_default(),
            (None, Some(a)) => values[a].unwrap_or_default(),
            (None, None) => values[known[0]].unwrap_or_default(),
        };
        filled.push(fill);
    }

    Ok(filled)
}
