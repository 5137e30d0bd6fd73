use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::models::RecommendedAction;
use crate::pipeline::encoding::EncodingTable;

use super::InferenceError;

/// The versioned, opaque artifact the model-artifact collaborator supplies:
/// the encoding table and the trained tree ensemble travel together so the
/// feature schema can never drift between them.
///
/// Loaded once at process start, immutable and shared read-only across all
/// inference calls.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub model_version: String,
    pub encoding: EncodingTable,
    /// Label set fixed at training time, in ordinal order.
    pub labels: Vec<RecommendedAction>,
    pub n_features: usize,
    pub trees: Vec<DecisionTree>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTree {
    pub root: TreeNode,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TreeNode {
    Split {
        feature: usize,
        threshold: f32,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
    },
    Leaf {
        /// Class probability distribution, one entry per label.
        distribution: Vec<f32>,
    },
}

impl TreeNode {
    /// Walk the tree: values below the threshold go left. The missing
    /// sentinel (-1.0) therefore routes left of any non-negative threshold.
    pub fn evaluate<'a>(&'a self, values: &[f32]) -> &'a [f32] {
        match self {
            TreeNode::Leaf { distribution } => distribution,
            TreeNode::Split {
                feature,
                threshold,
                left,
                right,
            } => {
                let value = values.get(*feature).copied().unwrap_or(f32::MIN);
                if value < *threshold {
                    left.evaluate(values)
                } else {
                    right.evaluate(values)
                }
            }
        }
    }

    fn check(&self, n_features: usize, n_labels: usize) -> Result<(), InferenceError> {
        match self {
            TreeNode::Leaf { distribution } => {
                if distribution.len() != n_labels {
                    return Err(InferenceError::InvalidArtifact(format!(
                        "leaf distribution has {} entries, expected {}",
                        distribution.len(),
                        n_labels
                    )));
                }
                if distribution.iter().any(|p| !p.is_finite() || *p < 0.0) {
                    return Err(InferenceError::InvalidArtifact(
                        "leaf distribution contains a non-finite or negative probability"
                            .into(),
                    ));
                }
                Ok(())
            }
            TreeNode::Split {
                feature,
                threshold,
                left,
                right,
            } => {
                if *feature >= n_features {
                    return Err(InferenceError::InvalidArtifact(format!(
                        "split references feature {feature}, model has {n_features}"
                    )));
                }
                if !threshold.is_finite() {
                    return Err(InferenceError::InvalidArtifact(
                        "split threshold is not finite".into(),
                    ));
                }
                left.check(n_features, n_labels)?;
                right.check(n_features, n_labels)
            }
        }
    }
}

impl ModelArtifact {
    /// Structural validation, run once at load. Inference relies on these
    /// invariants holding and never re-checks them per request.
    pub fn validate(&self) -> Result<(), InferenceError> {
        if self.trees.is_empty() {
            return Err(InferenceError::InvalidArtifact("artifact has no trees".into()));
        }
        if self.labels.is_empty() {
            return Err(InferenceError::InvalidArtifact("artifact has no labels".into()));
        }
        if self.n_features != self.encoding.arity() {
            return Err(InferenceError::InvalidArtifact(format!(
                "n_features {} disagrees with encoding table arity {}",
                self.n_features,
                self.encoding.arity()
            )));
        }
        for tree in &self.trees {
            tree.root.check(self.n_features, self.labels.len())?;
        }
        Ok(())
    }

    /// Average the leaf distributions across the ensemble.
    pub fn class_probabilities(&self, values: &[f32]) -> Vec<f32> {
        let mut probs = vec![0.0f32; self.labels.len()];
        for tree in &self.trees {
            let leaf = tree.root.evaluate(values);
            for (acc, p) in probs.iter_mut().zip(leaf) {
                *acc += p;
            }
        }
        let n = self.trees.len() as f32;
        for p in &mut probs {
            *p /= n;
        }
        probs
    }

    pub fn load(path: &Path) -> Result<Self, InferenceError> {
        let raw = fs::read_to_string(path).map_err(|e| {
            InferenceError::ModelUnavailable(format!("{}: {e}", path.display()))
        })?;
        let artifact: ModelArtifact = serde_json::from_str(&raw).map_err(|e| {
            InferenceError::ModelUnavailable(format!("{}: {e}", path.display()))
        })?;
        artifact.validate()?;
        Ok(artifact)
    }

    pub fn save(&self, path: &Path) -> Result<(), InferenceError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                InferenceError::ModelUnavailable(format!("{}: {e}", parent.display()))
            })?;
        }
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| InferenceError::InvalidArtifact(e.to_string()))?;
        fs::write(path, json).map_err(|e| {
            InferenceError::ModelUnavailable(format!("{}: {e}", path.display()))
        })
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::pipeline::encoding::FieldKind;

    /// A single-feature artifact over the full label set: feature 0 below
    /// `threshold` yields `low`, at or above yields `high`.
    pub fn stump_artifact(
        threshold: f32,
        low: Vec<f32>,
        high: Vec<f32>,
    ) -> ModelArtifact {
        let mut builder = EncodingTable::builder("stump-v1");
        builder.field("heart_rate", FieldKind::Numeric);
        ModelArtifact {
            model_version: "stump-test".into(),
            encoding: builder.build(),
            labels: RecommendedAction::ALL.to_vec(),
            n_features: 1,
            trees: vec![DecisionTree {
                root: TreeNode::Split {
                    feature: 0,
                    threshold,
                    left: Box::new(TreeNode::Leaf { distribution: low }),
                    right: Box::new(TreeNode::Leaf { distribution: high }),
                },
            }],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::stump_artifact;
    use super::*;

    #[test]
    fn evaluate_routes_below_threshold_left() {
        let artifact = stump_artifact(
            100.0,
            vec![0.7, 0.1, 0.1, 0.1],
            vec![0.1, 0.1, 0.1, 0.7],
        );
        assert_eq!(
            artifact.class_probabilities(&[80.0]),
            vec![0.7, 0.1, 0.1, 0.1]
        );
        assert_eq!(
            artifact.class_probabilities(&[100.0]),
            vec![0.1, 0.1, 0.1, 0.7]
        );
    }

    #[test]
    fn missing_sentinel_routes_left_of_nonnegative_thresholds() {
        let artifact = stump_artifact(
            100.0,
            vec![1.0, 0.0, 0.0, 0.0],
            vec![0.0, 0.0, 0.0, 1.0],
        );
        assert_eq!(
            artifact.class_probabilities(&[-1.0]),
            vec![1.0, 0.0, 0.0, 0.0]
        );
    }

    #[test]
    fn probabilities_average_across_trees() {
        let mut artifact = stump_artifact(
            100.0,
            vec![1.0, 0.0, 0.0, 0.0],
            vec![0.0, 0.0, 0.0, 1.0],
        );
        artifact.trees.push(DecisionTree {
            root: TreeNode::Leaf {
                distribution: vec![0.0, 1.0, 0.0, 0.0],
            },
        });

        let probs = artifact.class_probabilities(&[80.0]);
        assert_eq!(probs, vec![0.5, 0.5, 0.0, 0.0]);
    }

    #[test]
    fn validate_rejects_out_of_range_feature_index() {
        let mut artifact = stump_artifact(
            1.0,
            vec![1.0, 0.0, 0.0, 0.0],
            vec![0.0, 1.0, 0.0, 0.0],
        );
        if let TreeNode::Split { feature, .. } = &mut artifact.trees[0].root {
            *feature = 7;
        }
        assert!(matches!(
            artifact.validate(),
            Err(InferenceError::InvalidArtifact(_))
        ));
    }

    #[test]
    fn validate_rejects_wrong_leaf_width() {
        let mut artifact = stump_artifact(
            1.0,
            vec![1.0, 0.0, 0.0, 0.0],
            vec![0.0, 1.0, 0.0, 0.0],
        );
        artifact.trees.push(DecisionTree {
            root: TreeNode::Leaf {
                distribution: vec![1.0],
            },
        });
        assert!(artifact.validate().is_err());
    }

    #[test]
    fn validate_rejects_empty_ensemble() {
        let mut artifact = stump_artifact(
            1.0,
            vec![1.0, 0.0, 0.0, 0.0],
            vec![0.0, 1.0, 0.0, 0.0],
        );
        artifact.trees.clear();
        assert!(artifact.validate().is_err());
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model").join("stroke-model.json");

        let artifact = stump_artifact(
            100.0,
            vec![0.9, 0.1, 0.0, 0.0],
            vec![0.0, 0.0, 0.2, 0.8],
        );
        artifact.save(&path).unwrap();

        let loaded = ModelArtifact::load(&path).unwrap();
        assert_eq!(loaded.model_version, artifact.model_version);
        assert_eq!(loaded.labels, artifact.labels);
        assert_eq!(
            loaded.class_probabilities(&[120.0]),
            artifact.class_probabilities(&[120.0])
        );
    }

    #[test]
    fn load_missing_file_is_model_unavailable() {
        let err = ModelArtifact::load(Path::new("/nonexistent/model.json")).unwrap_err();
        assert!(matches!(err, InferenceError::ModelUnavailable(_)));
    }
}
