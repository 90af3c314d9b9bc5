//! Feature standardization
//!
//! Centers each column on its mean and divides by its population standard
//! deviation. Columns without variance are scaled by one so they map to zero
//! instead of dividing by zero.

use crate::{MathError, Result};
use serde::{Deserialize, Serialize};

/// Column-wise standard scaler fitted on a set of rows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    means: Vec<f64>,
    scales: Vec<f64>,
}

impl StandardScaler {
    /// Fit the scaler on `rows`, each row holding one value per column
    pub fn fit(rows: &[Vec<f64>]) -> Result<Self> {
        let first = rows.first().ok_or_else(|| {
            MathError::InsufficientData("Cannot fit a scaler on zero rows".to_string())
        })?;
        let width = first.len();
        if width == 0 {
            return Err(MathError::InvalidInput(
                "Rows must contain at least one column".to_string(),
            ));
        }
        if let Some(bad) = rows.iter().find(|row| row.len() != width) {
            return Err(MathError::InvalidInput(format!(
                "Inconsistent row width: expected {}, found {}",
                width,
                bad.len()
            )));
        }

        let n = rows.len() as f64;
        let mut means = vec![0.0; width];
        for row in rows {
            for (mean, value) in means.iter_mut().zip(row) {
                *mean += value;
            }
        }
        for mean in &mut means {
            *mean /= n;
        }

        let mut variances = vec![0.0; width];
        for row in rows {
            for ((variance, value), mean) in variances.iter_mut().zip(row).zip(&means) {
                *variance += (value - mean).powi(2);
            }
        }

        let scales = variances
            .into_iter()
            .map(|variance| {
                let std_dev = (variance / n).sqrt();
                if std_dev > f64::EPSILON && std_dev.is_finite() {
                    std_dev
                } else {
                    1.0
                }
            })
            .collect();

        Ok(Self { means, scales })
    }

    /// Number of columns the scaler was fitted on
    pub fn n_features(&self) -> usize {
        self.means.len()
    }

    /// Fitted column means
    pub fn means(&self) -> &[f64] {
        &self.means
    }

    /// Fitted column scales
    pub fn scales(&self) -> &[f64] {
        &self.scales
    }

    /// Standardize a single row
    pub fn transform_row(&self, row: &[f64]) -> Result<Vec<f64>> {
        if row.len() != self.n_features() {
            return Err(MathError::InvalidInput(format!(
                "Scaler expects {} features, got {}",
                self.n_features(),
                row.len()
            )));
        }

        Ok(row
            .iter()
            .zip(self.means.iter().zip(&self.scales))
            .map(|(value, (mean, scale))| (value - mean) / scale)
            .collect())
    }

    /// Standardize every row
    pub fn transform(&self, rows: &[Vec<f64>]) -> Result<Vec<Vec<f64>>> {
        rows.iter().map(|row| self.transform_row(row)).collect()
    }
}
