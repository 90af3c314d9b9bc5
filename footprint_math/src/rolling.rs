//! Rolling window statistics
//!
//! Windows follow `min_periods = 1` semantics: a window holding fewer values
//! than its period still reports a mean, minimum and maximum over what it has.
//! The sample standard deviation needs at least two values and is `None`
//! otherwise; callers decide how to fill it.

use crate::{MathError, Result};
use statrs::statistics::Statistics;
use std::collections::VecDeque;

/// Summary of the values currently inside a window
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowStats {
    /// Number of values the statistics were computed over
    pub count: usize,
    /// Arithmetic mean
    pub mean: f64,
    /// Sample standard deviation (n - 1), `None` below two values
    pub std_dev: Option<f64>,
    /// Smallest value
    pub min: f64,
    /// Largest value
    pub max: f64,
}

impl WindowStats {
    fn from_values<'a, I>(values: I) -> Option<Self>
    where
        I: Iterator<Item = &'a f64> + Clone,
    {
        let count = values.clone().count();
        if count == 0 {
            return None;
        }

        let std_dev = if count >= 2 {
            Some(values.clone().std_dev())
        } else {
            None
        };

        Some(Self {
            count,
            mean: values.clone().mean(),
            std_dev,
            min: Statistics::min(values.clone()),
            max: Statistics::max(values),
        })
    }

    /// Standard deviation with the undefined case filled as zero
    pub fn std_dev_or_zero(&self) -> f64 {
        self.std_dev.unwrap_or(0.0)
    }
}

/// Trailing window over a stream of values
#[derive(Debug, Clone)]
pub struct RollingWindow {
    period: usize,
    values: VecDeque<f64>,
}

impl RollingWindow {
    /// Create a new rolling window with the specified period
    pub fn new(period: usize) -> Result<Self> {
        if period == 0 {
            return Err(MathError::InvalidInput(
                "Period must be greater than zero".to_string(),
            ));
        }

        Ok(Self {
            period,
            values: VecDeque::with_capacity(period),
        })
    }

    /// Push a new value, evicting the oldest once the window is full
    pub fn update(&mut self, value: f64) {
        self.values.push_back(value);

        if self.values.len() > self.period {
            self.values.pop_front();
        }
    }

    /// Statistics over the values currently held, `None` while empty
    pub fn stats(&self) -> Option<WindowStats> {
        WindowStats::from_values(self.values.iter())
    }

    /// Get the current period
    pub fn period(&self) -> usize {
        self.period
    }

    /// Number of values currently held
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the window holds no values yet
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Reset the window, clearing all values
    pub fn reset(&mut self) {
        self.values.clear();
    }
}

/// Statistics over the last `window` values of `values`
///
/// Uses whatever is available when `values` is shorter than the window.
pub fn trailing_window_stats(values: &[f64], window: usize) -> Result<Option<WindowStats>> {
    if window == 0 {
        return Err(MathError::InvalidInput(
            "Window must be greater than zero".to_string(),
        ));
    }

    let start = values.len().saturating_sub(window);
    Ok(WindowStats::from_values(values[start..].iter()))
}

/// Rolling statistics for every position of `values`
///
/// Element `i` summarizes `values[i + 1 - window..=i]`, truncated at the start
/// of the series.
pub fn rolling_stats(values: &[f64], window: usize) -> Result<Vec<WindowStats>> {
    let mut rolling = RollingWindow::new(window)?;
    let mut result = Vec::with_capacity(values.len());

    for &value in values {
        rolling.update(value);
        if let Some(stats) = rolling.stats() {
            result.push(stats);
        }
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_single_value_window() {
        let mut window = RollingWindow::new(7).unwrap();
        assert!(window.stats().is_none());

        window.update(12.5);
        let stats = window.stats().unwrap();

        assert_eq!(stats.count, 1);
        assert_relative_eq!(stats.mean, 12.5);
        assert_eq!(stats.std_dev, None);
        assert_relative_eq!(stats.std_dev_or_zero(), 0.0);
        assert_relative_eq!(stats.min, 12.5);
        assert_relative_eq!(stats.max, 12.5);
    }

    #[test]
    fn test_window_eviction() {
        let mut window = RollingWindow::new(3).unwrap();
        for value in [1.0, 2.0, 3.0, 4.0, 5.0] {
            window.update(value);
        }

        let stats = window.stats().unwrap();
        assert_eq!(window.len(), 3);
        assert_relative_eq!(stats.mean, 4.0);
        assert_relative_eq!(stats.std_dev.unwrap(), 1.0);
        assert_relative_eq!(stats.min, 3.0);
        assert_relative_eq!(stats.max, 5.0);

        window.reset();
        assert!(window.is_empty());
    }

    #[test]
    fn test_rolling_stats_min_periods() {
        let stats = rolling_stats(&[2.0, 4.0, 6.0, 8.0], 3).unwrap();

        assert_eq!(stats.len(), 4);
        assert_relative_eq!(stats[0].mean, 2.0);
        assert_eq!(stats[0].std_dev, None);
        assert_relative_eq!(stats[1].mean, 3.0);
        assert_relative_eq!(stats[1].std_dev.unwrap(), 2.0_f64.sqrt());
        assert_relative_eq!(stats[3].mean, 6.0);
        assert_relative_eq!(stats[3].min, 4.0);
    }

    #[test]
    fn test_trailing_window_stats() {
        let values = [1.0, 1.0, 10.0, 20.0];
        let stats = trailing_window_stats(&values, 2).unwrap().unwrap();
        assert_relative_eq!(stats.mean, 15.0);
        assert_eq!(stats.count, 2);

        let short = trailing_window_stats(&values, 30).unwrap().unwrap();
        assert_eq!(short.count, 4);
        assert_relative_eq!(short.mean, 8.0);

        assert!(trailing_window_stats(&[], 7).unwrap().is_none());
    }

    #[test]
    fn test_zero_period_rejected() {
        assert!(RollingWindow::new(0).is_err());
        assert!(trailing_window_stats(&[1.0], 0).is_err());
        assert!(rolling_stats(&[1.0], 0).is_err());
    }
}
