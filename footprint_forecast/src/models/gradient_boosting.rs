//! Gradient-boosted regression trees
//!
//! Squared-error boosting: the ensemble starts from the training mean and
//! each tree is fitted to the current residuals of a random subsample of the
//! rows. Subsampling draws from a seeded generator, so fitting the same data
//! twice yields the same ensemble.

use crate::error::{ForecastError, Result};
use crate::models::{FittedRegressor, Regressor};
use rand::rngs::StdRng;
use rand::seq::index::sample;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

/// Smallest impurity reduction that justifies a split
const MIN_SPLIT_GAIN: f64 = 1e-12;

/// Fixed hyperparameters of the ensemble
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoostingParams {
    pub n_estimators: usize,
    pub learning_rate: f64,
    pub max_depth: usize,
    /// Fraction of rows each tree is fitted on
    pub subsample: f64,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    pub seed: u64,
}

impl Default for BoostingParams {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            learning_rate: 0.1,
            max_depth: 3,
            subsample: 0.8,
            min_samples_split: 5,
            min_samples_leaf: 2,
            seed: 42,
        }
    }
}

impl BoostingParams {
    pub fn validate(&self) -> Result<()> {
        if self.n_estimators == 0 {
            return Err(ForecastError::Config(
                "n_estimators must be positive".to_string(),
            ));
        }
        if !(self.learning_rate > 0.0 && self.learning_rate <= 1.0) {
            return Err(ForecastError::Config(format!(
                "learning_rate must be in (0, 1], got {}",
                self.learning_rate
            )));
        }
        if self.max_depth == 0 {
            return Err(ForecastError::Config("max_depth must be positive".to_string()));
        }
        if !(self.subsample > 0.0 && self.subsample <= 1.0) {
            return Err(ForecastError::Config(format!(
                "subsample must be in (0, 1], got {}",
                self.subsample
            )));
        }
        if self.min_samples_split < 2 || self.min_samples_leaf == 0 {
            return Err(ForecastError::Config(
                "min_samples_split must be at least 2 and min_samples_leaf at least 1"
                    .to_string(),
            ));
        }
        Ok(())
    }
}

/// Unfitted gradient boosting regressor
#[derive(Debug, Clone)]
pub struct GradientBoosting {
    name: String,
    params: BoostingParams,
}

impl GradientBoosting {
    pub fn new(params: BoostingParams) -> Result<Self> {
        params.validate()?;
        Ok(Self {
            name: format!(
                "Gradient Boosting (trees={}, depth={}, lr={})",
                params.n_estimators, params.max_depth, params.learning_rate
            ),
            params,
        })
    }

    pub fn params(&self) -> &BoostingParams {
        &self.params
    }
}

impl Regressor for GradientBoosting {
    type Fitted = GradientBoostedTrees;

    fn fit(&self, features: &[Vec<f64>], targets: &[f64]) -> Result<Self::Fitted> {
        check_training_data(features, targets)?;

        let n = targets.len();
        let initial = targets.iter().sum::<f64>() / n as f64;
        let mut predictions = vec![initial; n];
        let mut rng = StdRng::seed_from_u64(self.params.seed);
        let sample_size = ((n as f64 * self.params.subsample).round() as usize).clamp(1, n);

        let mut trees = Vec::with_capacity(self.params.n_estimators);
        for _ in 0..self.params.n_estimators {
            let residuals: Vec<f64> = targets
                .iter()
                .zip(&predictions)
                .map(|(y, p)| y - p)
                .collect();

            let mut rows = if sample_size < n {
                sample(&mut rng, n, sample_size).into_vec()
            } else {
                (0..n).collect()
            };
            rows.sort_unstable();

            let tree = RegressionTree::fit(features, &residuals, rows, &self.params);
            for (prediction, row) in predictions.iter_mut().zip(features) {
                *prediction += self.params.learning_rate * tree.predict(row);
            }
            trees.push(tree);
        }

        Ok(GradientBoostedTrees {
            name: self.name.clone(),
            initial,
            learning_rate: self.params.learning_rate,
            n_features: features[0].len(),
            trees,
        })
    }

    fn name(&self) -> &str {
        &self.name
    }
}

fn check_training_data(features: &[Vec<f64>], targets: &[f64]) -> Result<()> {
    if features.is_empty() || features.len() != targets.len() {
        return Err(ForecastError::Training(format!(
            "Need matching, non-empty features and targets (got {} rows and {} targets)",
            features.len(),
            targets.len()
        )));
    }
    let width = features[0].len();
    if width == 0 || features.iter().any(|row| row.len() != width) {
        return Err(ForecastError::Training(
            "Feature rows must share a non-zero width".to_string(),
        ));
    }
    if features.iter().flatten().chain(targets).any(|v| !v.is_finite()) {
        return Err(ForecastError::Training(
            "Features and targets must be finite".to_string(),
        ));
    }
    Ok(())
}

/// Fitted ensemble
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradientBoostedTrees {
    name: String,
    initial: f64,
    learning_rate: f64,
    n_features: usize,
    trees: Vec<RegressionTree>,
}

impl GradientBoostedTrees {
    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }
}

impl FittedRegressor for GradientBoostedTrees {
    fn predict_row(&self, row: &[f64]) -> Result<f64> {
        if row.len() != self.n_features {
            return Err(ForecastError::Forecast(format!(
                "Model expects {} features, got {}",
                self.n_features,
                row.len()
            )));
        }
        Ok(self.initial
            + self.learning_rate * self.trees.iter().map(|t| t.predict(row)).sum::<f64>())
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
enum Node {
    Leaf {
        value: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

/// Binary regression tree stored as a flat node arena, root at index 0
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct RegressionTree {
    nodes: Vec<Node>,
}

struct SplitCandidate {
    feature: usize,
    threshold: f64,
    gain: f64,
}

impl RegressionTree {
    fn fit(
        features: &[Vec<f64>],
        targets: &[f64],
        rows: Vec<usize>,
        params: &BoostingParams,
    ) -> Self {
        let mut tree = Self { nodes: Vec::new() };
        tree.grow(features, targets, rows, 0, params);
        tree
    }

    fn grow(
        &mut self,
        features: &[Vec<f64>],
        targets: &[f64],
        rows: Vec<usize>,
        depth: usize,
        params: &BoostingParams,
    ) -> usize {
        let value = rows.iter().map(|&i| targets[i]).sum::<f64>() / rows.len().max(1) as f64;
        let index = self.nodes.len();
        self.nodes.push(Node::Leaf { value });

        if depth >= params.max_depth || rows.len() < params.min_samples_split {
            return index;
        }

        if let Some(split) = best_split(features, targets, &rows, params.min_samples_leaf) {
            let (left_rows, right_rows): (Vec<usize>, Vec<usize>) = rows
                .iter()
                .partition(|&&i| features[i][split.feature] <= split.threshold);

            let left = self.grow(features, targets, left_rows, depth + 1, params);
            let right = self.grow(features, targets, right_rows, depth + 1, params);
            self.nodes[index] = Node::Split {
                feature: split.feature,
                threshold: split.threshold,
                left,
                right,
            };
        }

        index
    }

    fn predict(&self, row: &[f64]) -> f64 {
        let mut index = 0;
        loop {
            match &self.nodes[index] {
                Node::Leaf { value } => return *value,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    index = if row[*feature] <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
            }
        }
    }
}

/// Split maximizing the reduction of squared error
///
/// Candidate thresholds sit halfway between consecutive distinct values and
/// must leave at least `min_leaf` rows on each side.
fn best_split(
    features: &[Vec<f64>],
    targets: &[f64],
    rows: &[usize],
    min_leaf: usize,
) -> Option<SplitCandidate> {
    let n = rows.len();
    if n < 2 * min_leaf {
        return None;
    }

    let total: f64 = rows.iter().map(|&i| targets[i]).sum();
    let parent_score = total * total / n as f64;
    let mut best: Option<SplitCandidate> = None;
    let mut sorted = rows.to_vec();

    for feature in 0..features[rows[0]].len() {
        sorted.sort_by(|&a, &b| features[a][feature].total_cmp(&features[b][feature]));

        let mut left_sum = 0.0;
        for k in 1..n {
            left_sum += targets[sorted[k - 1]];
            if k < min_leaf || n - k < min_leaf {
                continue;
            }

            let lower = features[sorted[k - 1]][feature];
            let upper = features[sorted[k]][feature];
            if upper <= lower {
                continue;
            }

            let right_sum = total - left_sum;
            let gain = left_sum * left_sum / k as f64
                + right_sum * right_sum / (n - k) as f64
                - parent_score;

            if gain > MIN_SPLIT_GAIN && best.as_ref().map_or(true, |b| gain > b.gain) {
                best = Some(SplitCandidate {
                    feature,
                    threshold: lower + (upper - lower) / 2.0,
                    gain,
                });
            }
        }
    }

    best
}
