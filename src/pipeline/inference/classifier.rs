use std::path::Path;

use crate::models::ClassificationResult;
use crate::pipeline::encoding::{EncodingTable, FeatureVector};

use super::artifact::ModelArtifact;
use super::InferenceError;

/// Wraps the loaded model artifact. Stateless given the artifact; `&self`
/// everywhere, so concurrent calls from multiple requests need no locking.
pub struct RiskClassifier {
    artifact: ModelArtifact,
}

impl RiskClassifier {
    pub fn new(artifact: ModelArtifact) -> Result<Self, InferenceError> {
        artifact.validate()?;
        Ok(Self { artifact })
    }

    pub fn from_file(path: &Path) -> Result<Self, InferenceError> {
        Self::new(ModelArtifact::load(path)?)
    }

    pub fn model_version(&self) -> &str {
        &self.artifact.model_version
    }

    pub fn encoding_table(&self) -> &EncodingTable {
        &self.artifact.encoding
    }

    /// Classify one feature vector.
    ///
    /// The schema-version check comes first: positional trust alone is how
    /// silently-corrupted inferences happen. Length is checked as well —
    /// a short or long vector is never truncated or padded.
    ///
    /// Ties between equally probable labels go to the lowest ordinal code,
    /// so repeated calls are reproducible.
    pub fn predict(&self, vector: &FeatureVector) -> Result<ClassificationResult, InferenceError> {
        let expected_version = self.artifact.encoding.schema_version();
        if vector.schema_version != expected_version {
            return Err(InferenceError::SchemaMismatch {
                expected: format!("schema {expected_version}"),
                got: format!("schema {}", vector.schema_version),
            });
        }
        if vector.len() != self.artifact.n_features {
            return Err(InferenceError::SchemaMismatch {
                expected: format!("{} features", self.artifact.n_features),
                got: format!("{} features", vector.len()),
            });
        }

        let probs = self.artifact.class_probabilities(&vector.values);

        let mut best = 0usize;
        for (idx, p) in probs.iter().enumerate().skip(1) {
            // Strict comparison keeps ties on the lowest ordinal.
            if *p > probs[best] {
                best = idx;
            }
        }

        Ok(ClassificationResult {
            recommended_action: self.artifact.labels[best],
            confidence: probs[best],
            model_version: self.artifact.model_version.clone(),
        })
    }
}
