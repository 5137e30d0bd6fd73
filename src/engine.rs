//! Per-process engine state.
//!
//! The encoding table and trained model are loaded exactly once at startup
//! into immutable, shared handles; request handlers receive them by
//! reference and never re-load anything. A failed load is fatal — the
//! process must not serve requests without a model.

use std::path::Path;
use std::sync::Arc;

use serde::Serialize;

use crate::models::{DecisionEvent, PatientRecord};
use crate::pipeline::encoding::EncodingTable;
use crate::pipeline::inference::{InferenceError, RiskClassifier};
use crate::pipeline::orchestrator::{DecisionError, DecisionOrchestrator, OrchestratorConfig};
use crate::pipeline::retrieval::{
    EmbeddingGenerator, HashedSummaryEmbedder, InMemorySimilarityIndex, SimilarityIndex,
};

/// Answer for the model-artifact collaborator's health contract.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthStatus {
    pub status: &'static str,
    pub encoding_loaded: bool,
    pub model_loaded: bool,
    pub schema_version: String,
    pub model_version: String,
    pub embedder_version: String,
}

pub struct EngineState {
    table: Arc<EncodingTable>,
    classifier: Arc<RiskClassifier>,
    embedder_version: String,
    orchestrator: DecisionOrchestrator,
}

impl std::fmt::Debug for EngineState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineState")
            .field("embedder_version", &self.embedder_version)
            .finish_non_exhaustive()
    }
}

impl EngineState {
    /// Load the artifact and assemble the pipeline with the built-in local
    /// embedder and an in-memory index.
    pub fn load(artifact_path: &Path, config: OrchestratorConfig) -> Result<Self, InferenceError> {
        let embedder = Arc::new(HashedSummaryEmbedder::new());
        let index = Arc::new(InMemorySimilarityIndex::new(
            embedder.dimension(),
            embedder.version(),
        ));
        Self::load_with(artifact_path, config, embedder, index)
    }

    /// Same, with injected embedder/index implementations.
    pub fn load_with(
        artifact_path: &Path,
        config: OrchestratorConfig,
        embedder: Arc<dyn EmbeddingGenerator>,
        index: Arc<dyn SimilarityIndex>,
    ) -> Result<Self, InferenceError> {
        let classifier = Arc::new(RiskClassifier::from_file(artifact_path)?);
        let table = Arc::new(classifier.encoding_table().clone());

        tracing::info!(
            artifact = %artifact_path.display(),
            model_version = classifier.model_version(),
            schema_version = table.schema_version(),
            features = table.arity(),
            embedder = embedder.version(),
            "engine loaded"
        );

        let embedder_version = embedder.version().to_string();
        let orchestrator = DecisionOrchestrator::new(
            Arc::clone(&table),
            Arc::clone(&classifier),
            embedder,
            index,
            config,
        );

        Ok(Self {
            table,
            classifier,
            embedder_version,
            orchestrator,
        })
    }

    pub async fn decide(&self, record: &PatientRecord) -> Result<DecisionEvent, DecisionError> {
        self.orchestrator.decide(record).await
    }

    pub fn health(&self) -> HealthStatus {
        // Construction only succeeds with both artifacts loaded, so a live
        // EngineState always reports them present.
        HealthStatus {
            status: "ok",
            encoding_loaded: true,
            model_loaded: true,
            schema_version: self.table.schema_version().to_string(),
            model_version: self.classifier.model_version().to_string(),
            embedder_version: self.embedder_version.clone(),
        }
    }
}
