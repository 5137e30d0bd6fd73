pub mod artifact;
pub mod classifier;

pub use artifact::{DecisionTree, ModelArtifact, TreeNode};
pub use classifier::RiskClassifier;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum InferenceError {
    /// The model artifact failed to load. Fatal at startup — the process
    /// must not serve requests without a model.
    #[error("model artifact unavailable: {0}")]
    ModelUnavailable(String),

    /// Vector and model disagree on schema version or arity. Indicates a
    /// deployment bug; never silently truncated or padded over.
    #[error("feature schema mismatch: model expects {expected}, got {got}")]
    SchemaMismatch { expected: String, got: String },

    #[error("invalid model artifact: {0}")]
    InvalidArtifact(String),
}
