//! Descriptive statistics over plain slices

use crate::{MathError, Result};
use statrs::statistics::Statistics;

/// Arithmetic mean, `None` for an empty slice
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().mean())
}

/// Sample standard deviation (n - 1), `None` below two values
pub fn sample_std_dev(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    Some(values.iter().std_dev())
}

/// Population standard deviation (n), `None` for an empty slice
pub fn population_std_dev(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().population_std_dev())
}

/// Relative change between consecutive values
///
/// Produces `values.len() - 1` elements. A zero predecessor yields a
/// non-finite element, which callers are expected to check.
pub fn pct_change(values: &[f64]) -> Vec<f64> {
    values.windows(2).map(|w| (w[1] - w[0]) / w[0]).collect()
}

/// Fail with a calculation error when `value` is NaN or infinite
pub fn ensure_finite(value: f64, what: &str) -> Result<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(MathError::CalculationError(format!(
            "{} is not a finite number",
            what
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_mean_and_std() {
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];

        assert_relative_eq!(mean(&values).unwrap(), 5.0);
        assert_relative_eq!(population_std_dev(&values).unwrap(), 2.0);
        assert_relative_eq!(
            sample_std_dev(&values).unwrap(),
            (32.0_f64 / 7.0).sqrt()
        );
    }

    #[test]
    fn test_degenerate_inputs() {
        assert!(mean(&[]).is_none());
        assert!(sample_std_dev(&[3.0]).is_none());
        assert!(population_std_dev(&[]).is_none());
        assert!(pct_change(&[1.0]).is_empty());
    }

    #[test]
    fn test_pct_change() {
        let changes = pct_change(&[10.0, 11.0, 9.9]);
        assert_eq!(changes.len(), 2);
        assert_relative_eq!(changes[0], 0.1);
        assert_relative_eq!(changes[1], -0.1, epsilon = 1e-12);

        let with_zero = pct_change(&[0.0, 1.0]);
        assert!(!with_zero[0].is_finite());
    }

    #[test]
    fn test_ensure_finite() {
        assert_relative_eq!(ensure_finite(1.5, "value").unwrap(), 1.5);
        assert!(ensure_finite(f64::NAN, "value").is_err());
        assert!(ensure_finite(f64::INFINITY, "value").is_err());
    }
}
