use serde::{Deserialize, Serialize};

use crate::model::ModelRole;
use crate::{Error, Result};

/// Fitted estimator operating on encoded feature vectors.
///
/// Weights are positional: the i-th coefficient or importance belongs to the i-th encoded
/// dimension emitted by the model's [`FeatureEncoder`](super::FeatureEncoder).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Estimator {
    /// Linear model. Classifiers apply the logistic function to the linear score.
    #[serde(rename_all = "camelCase")]
    Linear {
        intercept: f64,
        coefficients: Vec<f64>,
    },
    /// Ensemble of decision trees; the prediction is the mean of leaf values. Classifier leaves
    /// hold class-1 probabilities.
    #[serde(rename_all = "camelCase")]
    Forest {
        trees: Vec<Tree>,
        /// Impurity-based importance of every encoded dimension, as reported by training.
        feature_importances: Vec<f64>,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tree {
    /// Nodes in pre-order; index 0 is the root. Children always come after their parent.
    pub nodes: Vec<Node>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Node {
    /// Go to `left` when `row[feature] <= threshold`, to `right` otherwise.
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        value: f64,
    },
}

impl Estimator {
    /// Raw prediction for an encoded row.
    ///
    /// For the subscription role this is a class-1 probability, for the frequency role an
    /// unbounded estimate of the 1–7 frequency score.
    pub fn predict(&self, row: &[f64], role: ModelRole) -> f64 {
        match self {
            Estimator::Linear {
                intercept,
                coefficients,
            } => {
                let score = intercept
                    + coefficients
                        .iter()
                        .zip(row)
                        .map(|(w, x)| w * x)
                        .sum::<f64>();
                match role {
                    ModelRole::Subscription => sigmoid(score),
                    ModelRole::Frequency => score,
                }
            }
            Estimator::Forest { trees, .. } => {
                let sum = trees.iter().map(|tree| tree.predict(row)).sum::<f64>();
                sum / trees.len() as f64
            }
        }
    }

    /// Per-dimension importance weights, positional like the coefficients they come from.
    pub fn importances(&self) -> Vec<f64> {
        match self {
            Estimator::Linear { coefficients, .. } => {
                coefficients.iter().map(|w| w.abs()).collect()
            }
            Estimator::Forest {
                feature_importances,
                ..
            } => feature_importances.clone(),
        }
    }

    /// Check internal consistency against the encoder's output width.
    pub(crate) fn validate(&self, role: ModelRole, dimensions: usize) -> Result<()> {
        match self {
            Estimator::Linear {
                intercept,
                coefficients,
            } => {
                if coefficients.len() != dimensions {
                    return Err(Error::invalid_model(
                        role,
                        format!(
                            "expected {dimensions} coefficients, found {}",
                            coefficients.len()
                        ),
                    ));
                }
                if !intercept.is_finite() || coefficients.iter().any(|w| !w.is_finite()) {
                    return Err(Error::invalid_model(role, "non-finite coefficient"));
                }
            }
            Estimator::Forest {
                trees,
                feature_importances,
            } => {
                if trees.is_empty() {
                    return Err(Error::invalid_model(role, "forest has no trees"));
                }
                if feature_importances.len() != dimensions {
                    return Err(Error::invalid_model(
                        role,
                        format!(
                            "expected {dimensions} feature importances, found {}",
                            feature_importances.len()
                        ),
                    ));
                }
                if feature_importances
                    .iter()
                    .any(|w| !w.is_finite() || *w < 0.0)
                {
                    return Err(Error::invalid_model(
                        role,
                        "feature importances must be finite and non-negative",
                    ));
                }
                for (index, tree) in trees.iter().enumerate() {
                    tree.validate(role, dimensions)
                        .map_err(|reason| Error::invalid_model(role, format!("tree {index}: {reason}")))?;
                }
            }
        }
        Ok(())
    }
}

impl Tree {
    fn predict(&self, row: &[f64]) -> f64 {
        let mut index = 0;
        loop {
            match self.nodes[index] {
                Node::Leaf { value } => return value,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    index = if row[feature] <= threshold { left } else { right };
                }
            }
        }
    }

    /// Returns a reason string on failure; the caller attaches the tree index.
    fn validate(&self, role: ModelRole, dimensions: usize) -> std::result::Result<(), String> {
        if self.nodes.is_empty() {
            return Err("tree has no nodes".to_owned());
        }
        for (index, node) in self.nodes.iter().enumerate() {
            match *node {
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    if feature >= dimensions {
                        return Err(format!("node {index} splits on unknown dimension {feature}"));
                    }
                    if threshold.is_nan() {
                        return Err(format!("node {index} has NaN threshold"));
                    }
                    // Children after parent guarantees that traversal terminates.
                    if left <= index || right <= index || left >= self.nodes.len() || right >= self.nodes.len() {
                        return Err(format!("node {index} has invalid children"));
                    }
                }
                Node::Leaf { value } => {
                    let in_range = match role {
                        ModelRole::Subscription => (0.0..=1.0).contains(&value),
                        ModelRole::Frequency => value.is_finite(),
                    };
                    if !in_range {
                        return Err(format!("node {index} has invalid leaf value {value}"));
                    }
                }
            }
        }
        Ok(())
    }
}

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}
