//! Feature engineering for daily footprint series
//!
//! The feature set is an ordered list of typed descriptors. Each descriptor
//! knows how to derive its value for a row and how to fill the value when the
//! history is too short to define it, so a prepared table never holds gaps.
//!
//! Row derivation works from two views of the series:
//! - `prior`: the values strictly before the row, used by lag features;
//! - `anchor`: the values up to and including the latest known value, used by
//!   rolling statistics and trend deltas.
//!
//! For a historical row the anchor ends at the row itself. When forecasting,
//! the row's own value is unknown and the anchor ends at the latest known or
//! predicted value.

use crate::config::FeatureConfig;
use crate::data::{Observation, ObservationSeries, SourceBreakdown, FOOTPRINT_FIELD};
use crate::error::{ForecastError, Result};
use chrono::{Datelike, NaiveDate, Weekday};
use footprint_math::{trailing_window_stats, WindowStats};
use polars::prelude::*;
use std::fmt;
use tracing::debug;

/// Fields derived directly from the calendar date
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalendarField {
    /// Monday = 0 .. Sunday = 6
    DayOfWeek,
    Month,
    DayOfMonth,
    IsWeekend,
    IsHoliday,
    IsWinter,
    IsSummer,
    Quarter,
    /// ISO 8601 week number
    WeekOfYear,
}

impl CalendarField {
    pub const ALL: [CalendarField; 9] = [
        CalendarField::DayOfWeek,
        CalendarField::Month,
        CalendarField::DayOfMonth,
        CalendarField::IsWeekend,
        CalendarField::IsHoliday,
        CalendarField::IsWinter,
        CalendarField::IsSummer,
        CalendarField::Quarter,
        CalendarField::WeekOfYear,
    ];

    pub fn name(self) -> &'static str {
        match self {
            CalendarField::DayOfWeek => "day_of_week",
            CalendarField::Month => "month",
            CalendarField::DayOfMonth => "day_of_month",
            CalendarField::IsWeekend => "is_weekend",
            CalendarField::IsHoliday => "is_holiday",
            CalendarField::IsWinter => "is_winter",
            CalendarField::IsSummer => "is_summer",
            CalendarField::Quarter => "quarter",
            CalendarField::WeekOfYear => "week_of_year",
        }
    }

    /// Numeric value of the field for `date`
    pub fn value(self, date: NaiveDate) -> f64 {
        let month = date.month();
        let flag = |b: bool| if b { 1.0 } else { 0.0 };
        match self {
            CalendarField::DayOfWeek => date.weekday().num_days_from_monday() as f64,
            CalendarField::Month => month as f64,
            CalendarField::DayOfMonth => date.day() as f64,
            CalendarField::IsWeekend => flag(is_weekend(date)),
            CalendarField::IsHoliday => flag(is_holiday(date)),
            CalendarField::IsWinter => flag(matches!(month, 12 | 1 | 2)),
            CalendarField::IsSummer => flag(matches!(month, 6 | 7 | 8)),
            CalendarField::Quarter => ((month - 1) / 3 + 1) as f64,
            CalendarField::WeekOfYear => date.iso_week().week() as f64,
        }
    }
}

/// Saturday or Sunday
pub fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Fixed-date public holidays
pub fn is_holiday(date: NaiveDate) -> bool {
    matches!(
        (date.month(), date.day()),
        (1, 1)     // New Year's Day
        | (5, 1)   // Labour Day
        | (7, 4)   // Independence Day
        | (11, 11) // Armistice / Veterans Day
        | (12, 24) // Christmas Eve
        | (12, 25) // Christmas Day
        | (12, 26) // Boxing Day
        | (12, 31) // New Year's Eve
    )
}

/// Aggregate computed over a rolling window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RollingStat {
    Mean,
    Std,
    Min,
    Max,
}

impl RollingStat {
    pub const ALL: [RollingStat; 4] = [
        RollingStat::Mean,
        RollingStat::Std,
        RollingStat::Min,
        RollingStat::Max,
    ];

    fn name(self) -> &'static str {
        match self {
            RollingStat::Mean => "mean",
            RollingStat::Std => "std",
            RollingStat::Min => "min",
            RollingStat::Max => "max",
        }
    }

    fn select(self, stats: &WindowStats) -> Option<f64> {
        match self {
            RollingStat::Mean => Some(stats.mean),
            RollingStat::Std => stats.std_dev,
            RollingStat::Min => Some(stats.min),
            RollingStat::Max => Some(stats.max),
        }
    }
}

/// Derivation rule of a feature column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeatureKind {
    Calendar(CalendarField),
    /// Footprint the given number of days before the row
    Lag(usize),
    /// Aggregate over the trailing window of the given length
    Rolling { window: usize, stat: RollingStat },
    /// Difference between the anchor value and the value the given number of
    /// days before it
    Trend(usize),
}

impl fmt::Display for FeatureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeatureKind::Calendar(field) => write!(f, "{}", field.name()),
            FeatureKind::Lag(days) => write!(f, "lag_{}", days),
            FeatureKind::Rolling { window, stat } => {
                write!(f, "rolling_{}_{}", stat.name(), window)
            }
            FeatureKind::Trend(days) => write!(f, "trend_{}", days),
        }
    }
}

/// What to use when a feature cannot be derived from the available history
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillPolicy {
    /// Always derivable
    Defined,
    /// Most recent value available before the row
    MostRecent,
    /// Zero
    Zero,
}

/// One column of the feature table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureDescriptor {
    pub kind: FeatureKind,
    pub fill: FillPolicy,
}

impl FeatureDescriptor {
    pub fn calendar(field: CalendarField) -> Self {
        Self {
            kind: FeatureKind::Calendar(field),
            fill: FillPolicy::Defined,
        }
    }

    pub fn lag(days: usize) -> Self {
        Self {
            kind: FeatureKind::Lag(days),
            fill: FillPolicy::MostRecent,
        }
    }

    pub fn rolling(window: usize, stat: RollingStat) -> Self {
        let fill = match stat {
            RollingStat::Std => FillPolicy::Zero,
            _ => FillPolicy::Defined,
        };
        Self {
            kind: FeatureKind::Rolling { window, stat },
            fill,
        }
    }

    pub fn trend(days: usize) -> Self {
        Self {
            kind: FeatureKind::Trend(days),
            fill: FillPolicy::Zero,
        }
    }

    /// Column name
    pub fn name(&self) -> String {
        self.kind.to_string()
    }

    fn derive(&self, date: NaiveDate, prior: &[f64], anchor: &[f64]) -> Result<Option<f64>> {
        let value = match self.kind {
            FeatureKind::Calendar(field) => Some(field.value(date)),
            FeatureKind::Lag(days) => {
                if prior.len() >= days {
                    Some(prior[prior.len() - days])
                } else {
                    None
                }
            }
            FeatureKind::Rolling { window, stat } => {
                trailing_window_stats(anchor, window)?.and_then(|stats| stat.select(&stats))
            }
            FeatureKind::Trend(days) => {
                let n = anchor.len();
                if n > days {
                    Some(anchor[n - 1] - anchor[n - 1 - days])
                } else {
                    None
                }
            }
        };
        Ok(value)
    }

    fn fallback(&self, prior: &[f64], anchor: &[f64]) -> Option<f64> {
        match self.fill {
            FillPolicy::Defined => None,
            FillPolicy::MostRecent => prior.last().or_else(|| anchor.last()).copied(),
            FillPolicy::Zero => Some(0.0),
        }
    }

    /// Derived value with the fill policy applied
    pub fn resolve(&self, date: NaiveDate, prior: &[f64], anchor: &[f64]) -> Result<f64> {
        let value = match self.derive(date, prior, anchor)? {
            Some(value) => Some(value),
            None => self.fallback(prior, anchor),
        };
        value.ok_or_else(|| {
            ForecastError::Validation(format!(
                "Feature '{}' could not be derived for {}",
                self.name(),
                date
            ))
        })
    }
}

/// Ordered feature set
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureSpec {
    descriptors: Vec<FeatureDescriptor>,
}

impl Default for FeatureSpec {
    fn default() -> Self {
        Self::standard()
    }
}

impl FeatureSpec {
    /// Calendar fields, lags 1/7/14/30, rolling windows 7/14/30 and trends 1/7/30
    pub fn standard() -> Self {
        Self::build(&FeatureConfig::default())
    }

    /// Feature set for a validated configuration
    pub fn from_config(config: &FeatureConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: &FeatureConfig) -> Self {
        let sorted = |values: &[usize]| {
            let mut values = values.to_vec();
            values.sort_unstable();
            values.dedup();
            values
        };

        let mut descriptors: Vec<FeatureDescriptor> = CalendarField::ALL
            .iter()
            .map(|&field| FeatureDescriptor::calendar(field))
            .collect();
        descriptors.extend(sorted(&config.lags).into_iter().map(FeatureDescriptor::lag));
        for window in sorted(&config.rolling_windows) {
            descriptors.extend(
                RollingStat::ALL
                    .iter()
                    .map(|&stat| FeatureDescriptor::rolling(window, stat)),
            );
        }
        descriptors.extend(
            sorted(&config.trend_horizons)
                .into_iter()
                .map(FeatureDescriptor::trend),
        );

        Self { descriptors }
    }

    pub fn descriptors(&self) -> &[FeatureDescriptor] {
        &self.descriptors
    }

    /// Column names in table order
    pub fn names(&self) -> Vec<String> {
        self.descriptors.iter().map(FeatureDescriptor::name).collect()
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// Derive one feature vector
    pub fn derive_row(&self, date: NaiveDate, prior: &[f64], anchor: &[f64]) -> Result<Vec<f64>> {
        self.descriptors
            .iter()
            .map(|descriptor| descriptor.resolve(date, prior, anchor))
            .collect()
    }

    /// Validate, sort and fill raw observations, then derive every feature
    pub fn prepare(&self, observations: Vec<Observation>) -> Result<FeatureTable> {
        let series = ObservationSeries::from_observations(observations)?;
        self.prepare_series(&series)
    }

    /// Derive every feature for an already validated series
    pub fn prepare_series(&self, series: &ObservationSeries) -> Result<FeatureTable> {
        let values = series.values();
        let mut rows = Vec::with_capacity(series.len());

        for (i, (&date, &value)) in series.dates().iter().zip(values).enumerate() {
            let features = self.derive_row(date, &values[..i], &values[..=i])?;
            if let Some(pos) = features.iter().position(|f| !f.is_finite()) {
                return Err(ForecastError::Validation(format!(
                    "Feature '{}' is not finite for {}",
                    self.descriptors[pos].name(),
                    date
                )));
            }
            rows.push(FeatureRow {
                date,
                value,
                sources: series.sources()[i],
                features,
            });
        }

        debug!(
            rows = rows.len(),
            columns = self.len(),
            filled = series.filled(),
            "prepared feature table"
        );

        Ok(FeatureTable {
            columns: self.names(),
            rows,
        })
    }
}

/// Prepare observations with the standard feature set
pub fn prepare(observations: Vec<Observation>) -> Result<FeatureTable> {
    FeatureSpec::standard().prepare(observations)
}

/// One prepared day
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureRow {
    pub date: NaiveDate,
    /// Footprint after gap filling
    pub value: f64,
    pub sources: SourceBreakdown,
    /// One value per feature column, in column order
    pub features: Vec<f64>,
}

/// Prepared feature table, one row per observation date in ascending order
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureTable {
    columns: Vec<String>,
    rows: Vec<FeatureRow>,
}

impl FeatureTable {
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[FeatureRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.rows.iter().map(|r| r.date).collect()
    }

    /// Target footprint values
    pub fn values(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r.value).collect()
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.rows.last().map(|r| r.date)
    }

    /// Feature vectors, one per row
    pub fn feature_matrix(&self) -> Vec<Vec<f64>> {
        self.rows.iter().map(|r| r.features.clone()).collect()
    }

    /// Values of a single feature column
    pub fn column(&self, name: &str) -> Option<Vec<f64>> {
        let index = self.columns.iter().position(|c| c == name)?;
        Some(self.rows.iter().map(|r| r.features[index]).collect())
    }

    /// Export as a polars DataFrame with `date`, `carbonFootprint` and every
    /// feature column
    pub fn to_dataframe(&self) -> Result<DataFrame> {
        let mut columns = Vec::with_capacity(self.columns.len() + 2);
        columns.push(Series::new(
            "date",
            self.rows
                .iter()
                .map(|r| r.date.format("%Y-%m-%d").to_string())
                .collect::<Vec<String>>(),
        ));
        columns.push(Series::new(FOOTPRINT_FIELD, self.values()));
        for (index, name) in self.columns.iter().enumerate() {
            columns.push(Series::new(
                name.as_str(),
                self.rows
                    .iter()
                    .map(|r| r.features[index])
                    .collect::<Vec<f64>>(),
            ));
        }

        Ok(DataFrame::new(columns)?)
    }
}
