// Tree and linear regressors combined into an ensemble

use super::encoder::FeatureMatrix;
use crate::error::{PricingError, Result};
use serde::{Deserialize, Serialize};

/// Regression tree in flattened array layout.
///
/// Node `i` is a leaf when `children_left[i] == -1`; otherwise samples with
/// `x[feature[i]] <= threshold[i]` go to `children_left[i]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegressionTree {
    pub children_left: Vec<i64>,
    pub children_right: Vec<i64>,
    pub feature: Vec<i64>,
    pub threshold: Vec<f64>,
    pub value: Vec<f64>,
}

impl RegressionTree {
    /// Single-leaf tree
    pub fn leaf(value: f64) -> Self {
        Self {
            children_left: vec![-1],
            children_right: vec![-1],
            feature: vec![-2],
            threshold: vec![-2.0],
            value: vec![value],
        }
    }

    /// Tree with one split at the root
    pub fn stump(feature: usize, threshold: f64, left: f64, right: f64) -> Self {
        Self {
            children_left: vec![1, -1, -1],
            children_right: vec![2, -1, -1],
            feature: vec![feature as i64, -2, -2],
            threshold: vec![threshold, -2.0, -2.0],
            value: vec![(left + right) / 2.0, left, right],
        }
    }

    pub fn node_count(&self) -> usize {
        self.value.len()
    }

    fn validate(&self, n_features: usize) -> Result<()> {
        let n = self.node_count();
        if n == 0 {
            return Err(PricingError::InvalidArtifact("tree has no nodes".to_string()));
        }
        if self.children_left.len() != n
            || self.children_right.len() != n
            || self.feature.len() != n
            || self.threshold.len() != n
        {
            return Err(PricingError::InvalidArtifact(
                "tree arrays have different lengths".to_string(),
            ));
        }

        for node in 0..n {
            let left = self.children_left[node];
            let right = self.children_right[node];
            if left < 0 {
                continue;
            }
            // Children are stored after their parent, which rules out cycles
            for child in [left, right] {
                if child <= node as i64 || child >= n as i64 {
                    return Err(PricingError::InvalidArtifact(format!(
                        "node {} has out-of-order child {}",
                        node, child
                    )));
                }
            }
            let feature = self.feature[node];
            if feature < 0 || feature as usize >= n_features {
                return Err(PricingError::InvalidArtifact(format!(
                    "node {} splits on feature {} of {}",
                    node, feature, n_features
                )));
            }
        }
        Ok(())
    }

    /// Predicts one row
    pub fn predict_row(&self, x: &[f64]) -> f64 {
        let mut node = 0usize;
        loop {
            let left = self.children_left[node];
            if left < 0 {
                return self.value[node];
            }
            // Split values were learned on single-precision inputs
            let v = x[self.feature[node] as usize] as f32 as f64;
            node = if v <= self.threshold[node] {
                left as usize
            } else {
                self.children_right[node] as usize
            };
        }
    }
}

/// Linear model `coef · x + intercept`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearModel {
    pub coef: Vec<f64>,
    pub intercept: f64,
}

impl LinearModel {
    pub fn predict_row(&self, x: &[f64]) -> f64 {
        self.coef.iter().zip(x).map(|(c, v)| c * v).sum::<f64>() + self.intercept
    }

    fn validate(&self, n_features: usize) -> Result<()> {
        if self.coef.len() != n_features {
            return Err(PricingError::FeatureMismatch {
                expected: n_features,
                actual: self.coef.len(),
            });
        }
        Ok(())
    }
}

/// Base estimator of an ensemble
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BaseEstimator {
    Linear(LinearModel),
    DecisionTree {
        tree: RegressionTree,
    },
    /// Mean of the tree outputs
    RandomForest {
        trees: Vec<RegressionTree>,
    },
    /// `init + learning_rate * sum(trees)`
    GradientBoosting {
        init: f64,
        learning_rate: f64,
        trees: Vec<RegressionTree>,
    },
}

impl BaseEstimator {
    fn validate(&self, n_features: usize) -> Result<()> {
        match self {
            BaseEstimator::Linear(model) => model.validate(n_features),
            BaseEstimator::DecisionTree { tree } => tree.validate(n_features),
            BaseEstimator::RandomForest { trees } | BaseEstimator::GradientBoosting { trees, .. } => {
                if trees.is_empty() {
                    return Err(PricingError::InvalidArtifact(
                        "tree ensemble has no trees".to_string(),
                    ));
                }
                trees.iter().try_for_each(|t| t.validate(n_features))
            }
        }
    }

    pub fn predict_row(&self, x: &[f64]) -> f64 {
        match self {
            BaseEstimator::Linear(model) => model.predict_row(x),
            BaseEstimator::DecisionTree { tree } => tree.predict_row(x),
            BaseEstimator::RandomForest { trees } => {
                trees.iter().map(|t| t.predict_row(x)).sum::<f64>() / trees.len() as f64
            }
            BaseEstimator::GradientBoosting { init, learning_rate, trees } => {
                init + learning_rate * trees.iter().map(|t| t.predict_row(x)).sum::<f64>()
            }
        }
    }

    /// Short kind label used in summaries
    pub fn kind(&self) -> &'static str {
        match self {
            BaseEstimator::Linear(_) => "linear",
            BaseEstimator::DecisionTree { .. } => "decision_tree",
            BaseEstimator::RandomForest { .. } => "random_forest",
            BaseEstimator::GradientBoosting { .. } => "gradient_boosting",
        }
    }
}

/// Named member of an ensemble
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NamedEstimator {
    pub name: String,
    pub estimator: BaseEstimator,
}

/// Ensemble regressor producing normalized price estimates
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnsembleRegressor {
    /// Final linear estimator fitted on the base predictions, optionally
    /// followed by the original features
    Stacking {
        n_features_in: usize,
        estimators: Vec<NamedEstimator>,
        final_estimator: LinearModel,
        #[serde(default)]
        passthrough: bool,
    },
    /// Weighted mean of the base predictions
    Voting {
        n_features_in: usize,
        estimators: Vec<NamedEstimator>,
        #[serde(default)]
        weights: Option<Vec<f64>>,
    },
}

impl EnsembleRegressor {
    /// Expected input width
    pub fn n_features_in(&self) -> usize {
        match self {
            EnsembleRegressor::Stacking { n_features_in, .. }
            | EnsembleRegressor::Voting { n_features_in, .. } => *n_features_in,
        }
    }

    pub fn estimators(&self) -> &[NamedEstimator] {
        match self {
            EnsembleRegressor::Stacking { estimators, .. }
            | EnsembleRegressor::Voting { estimators, .. } => estimators,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            EnsembleRegressor::Stacking { .. } => "stacking",
            EnsembleRegressor::Voting { .. } => "voting",
        }
    }

    /// Checks every member against the input width
    pub fn validate(&self) -> Result<()> {
        let n_features = self.n_features_in();
        if self.estimators().is_empty() {
            return Err(PricingError::InvalidArtifact(
                "ensemble has no estimators".to_string(),
            ));
        }
        for member in self.estimators() {
            member.estimator.validate(n_features).map_err(|e| {
                PricingError::InvalidArtifact(format!("estimator '{}': {}", member.name, e))
            })?;
        }

        match self {
            EnsembleRegressor::Stacking { estimators, final_estimator, passthrough, .. } => {
                let width = estimators.len() + if *passthrough { n_features } else { 0 };
                final_estimator.validate(width).map_err(|e| {
                    PricingError::InvalidArtifact(format!("final estimator: {}", e))
                })
            }
            EnsembleRegressor::Voting { estimators, weights, .. } => match weights {
                Some(w) if w.len() != estimators.len() => Err(PricingError::InvalidArtifact(
                    format!("{} weights for {} estimators", w.len(), estimators.len()),
                )),
                Some(w) if w.iter().sum::<f64>() == 0.0 => Err(PricingError::InvalidArtifact(
                    "voting weights sum to zero".to_string(),
                )),
                _ => Ok(()),
            },
        }
    }

    /// Predicts one normalized value per row
    pub fn predict(&self, features: &FeatureMatrix) -> Result<Vec<f64>> {
        let expected = self.n_features_in();
        if features.cols() != expected {
            return Err(PricingError::FeatureMismatch {
                expected,
                actual: features.cols(),
            });
        }
        Ok(features.iter_rows().map(|row| self.predict_row(row)).collect())
    }

    fn predict_row(&self, x: &[f64]) -> f64 {
        match self {
            EnsembleRegressor::Stacking { estimators, final_estimator, passthrough, .. } => {
                let mut stacked: Vec<f64> = estimators
                    .iter()
                    .map(|m| m.estimator.predict_row(x))
                    .collect();
                if *passthrough {
                    stacked.extend_from_slice(x);
                }
                final_estimator.predict_row(&stacked)
            }
            EnsembleRegressor::Voting { estimators, weights, .. } => {
                let predictions = estimators.iter().map(|m| m.estimator.predict_row(x));
                match weights {
                    Some(w) => {
                        predictions.zip(w).map(|(p, w)| p * w).sum::<f64>() / w.iter().sum::<f64>()
                    }
                    None => predictions.sum::<f64>() / estimators.len() as f64,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn named(name: &str, estimator: BaseEstimator) -> NamedEstimator {
        NamedEstimator {
            name: name.to_string(),
            estimator,
        }
    }

    #[test]
    fn test_tree_traversal() {
        let tree = RegressionTree::stump(1, 0.5, -1.0, 2.0);
        assert_eq!(tree.predict_row(&[9.0, 0.0]), -1.0);
        assert_eq!(tree.predict_row(&[9.0, 0.5]), -1.0);
        assert_eq!(tree.predict_row(&[9.0, 0.6]), 2.0);
    }

    #[test]
    fn test_base_estimators() {
        let x = [1.0, 2.0];
        let linear = BaseEstimator::Linear(LinearModel { coef: vec![0.5, 0.25], intercept: 1.0 });
        assert_eq!(linear.predict_row(&x), 2.0);

        let forest = BaseEstimator::RandomForest {
            trees: vec![RegressionTree::leaf(1.0), RegressionTree::leaf(3.0)],
        };
        assert_eq!(forest.predict_row(&x), 2.0);

        let boosting = BaseEstimator::GradientBoosting {
            init: 0.5,
            learning_rate: 0.1,
            trees: vec![RegressionTree::leaf(10.0), RegressionTree::stump(0, 0.0, 0.0, 5.0)],
        };
        assert!((boosting.predict_row(&x) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_stacking_with_passthrough() {
        let ensemble = EnsembleRegressor::Stacking {
            n_features_in: 2,
            estimators: vec![
                named("rf", BaseEstimator::DecisionTree { tree: RegressionTree::leaf(1.0) }),
                named("lr", BaseEstimator::Linear(LinearModel { coef: vec![1.0, 0.0], intercept: 0.0 })),
            ],
            final_estimator: LinearModel { coef: vec![0.5, 0.5, 0.0, 1.0], intercept: 0.0 },
            passthrough: true,
        };
        ensemble.validate().unwrap();

        let features = FeatureMatrix::from_rows(&[vec![3.0, 4.0], vec![1.0, 0.0]]).unwrap();
        assert_eq!(ensemble.predict(&features).unwrap(), vec![6.0, 1.0]);
    }

    #[test]
    fn test_voting_weights() {
        let ensemble = EnsembleRegressor::Voting {
            n_features_in: 1,
            estimators: vec![
                named("a", BaseEstimator::DecisionTree { tree: RegressionTree::leaf(1.0) }),
                named("b", BaseEstimator::DecisionTree { tree: RegressionTree::leaf(4.0) }),
            ],
            weights: Some(vec![2.0, 1.0]),
        };
        ensemble.validate().unwrap();
        let features = FeatureMatrix::from_rows(&[vec![0.0]]).unwrap();
        assert_eq!(ensemble.predict(&features).unwrap(), vec![2.0]);
    }

    #[test]
    fn test_validation() {
        let bad_feature = EnsembleRegressor::Voting {
            n_features_in: 1,
            estimators: vec![named("t", BaseEstimator::DecisionTree {
                tree: RegressionTree::stump(3, 0.0, 0.0, 1.0),
            })],
            weights: None,
        };
        assert!(bad_feature.validate().is_err());

        let mut cyclic = RegressionTree::stump(0, 0.0, 0.0, 1.0);
        cyclic.children_left[0] = 0;
        let cyclic = EnsembleRegressor::Voting {
            n_features_in: 1,
            estimators: vec![named("t", BaseEstimator::DecisionTree { tree: cyclic })],
            weights: None,
        };
        assert!(cyclic.validate().is_err());

        let bad_final = EnsembleRegressor::Stacking {
            n_features_in: 2,
            estimators: vec![named("t", BaseEstimator::DecisionTree { tree: RegressionTree::leaf(0.0) })],
            final_estimator: LinearModel { coef: vec![1.0, 1.0], intercept: 0.0 },
            passthrough: false,
        };
        assert!(bad_final.validate().is_err());
    }

    #[test]
    fn test_predict_checks_width() {
        let ensemble = EnsembleRegressor::Voting {
            n_features_in: 3,
            estimators: vec![named("t", BaseEstimator::DecisionTree { tree: RegressionTree::leaf(0.0) })],
            weights: None,
        };
        let features = FeatureMatrix::from_rows(&[vec![0.0, 1.0]]).unwrap();
        assert!(matches!(
            ensemble.predict(&features),
            Err(PricingError::FeatureMismatch { expected: 3, actual: 2 })
        ));
    }
}
