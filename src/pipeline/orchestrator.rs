//! Decision orchestration: ties ingestion → inference → retrieval →
//! decision-event assembly together with explicit failure semantics.
//!
//! Per request the stages run strictly forward:
//! Encoding → Classifying → Embedding → Retrieving → Assembling.
//! The first two are fatal on failure; the retrieval pair degrades.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;

use crate::models::{DecisionEvent, PatientRecord, RecordError, SimilarCase};
use crate::pipeline::encoding::{encode, EncodingError, EncodingTable};
use crate::pipeline::inference::{InferenceError, RiskClassifier};
use crate::pipeline::retrieval::{EmbeddingGenerator, RetrievalError, SimilarityIndex};

/// Fatal decision failures, reported to the caller with the underlying
/// cause preserved. Retrieval problems never appear here — they are folded
/// into the event's `retrieval_degraded` flag instead.
#[derive(Debug, thiserror::Error)]
pub enum DecisionError {
    #[error("invalid patient record: {0}")]
    InvalidRecord(#[from] RecordError),

    #[error("decision failed while encoding: {0}")]
    Encoding(#[from] EncodingError),

    #[error("decision failed while classifying: {0}")]
    Classification(#[from] InferenceError),
}

/// Request stages, forward-only. Used for log context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Encoding,
    Classifying,
    Embedding,
    Retrieving,
    Assembling,
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Encoding => "encoding",
            Stage::Classifying => "classifying",
            Stage::Embedding => "embedding",
            Stage::Retrieving => "retrieving",
            Stage::Assembling => "assembling",
        }
    }
}

#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Neighbors requested from the similarity index.
    pub top_k: usize,
    /// Bound on the whole embed+upsert+query sequence. Hitting it means
    /// retrieval-degraded, never an indefinite block.
    pub retrieval_timeout: Duration,
    /// When false the retrieval stages are skipped entirely.
    pub retrieval_enabled: bool,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            top_k: 5,
            retrieval_timeout: Duration::from_millis(2_000),
            retrieval_enabled: true,
        }
    }
}

/// Coordinates the pipeline components. All handles are shared, read-only
/// and loaded once at process start; the orchestrator holds no per-request
/// state, so any number of `decide` calls may run concurrently.
pub struct DecisionOrchestrator {
    table: Arc<EncodingTable>,
    classifier: Arc<RiskClassifier>,
    embedder: Arc<dyn EmbeddingGenerator>,
    index: Arc<dyn SimilarityIndex>,
    config: OrchestratorConfig,
}

impl DecisionOrchestrator {
    pub fn new(
        table: Arc<EncodingTable>,
        classifier: Arc<RiskClassifier>,
        embedder: Arc<dyn EmbeddingGenerator>,
        index: Arc<dyn SimilarityIndex>,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            table,
            classifier,
            embedder,
            index,
            config,
        }
    }

    /// Produce a decision event for one record.
    ///
    /// Either yields a complete event (possibly retrieval-degraded) or a
    /// typed failure — never a silently wrong classification.
    pub async fn decide(&self, record: &PatientRecord) -> Result<DecisionEvent, DecisionError> {
        let start = Instant::now();
        record.validate()?;

        tracing::debug!(patient_id = %record.id, stage = Stage::Encoding.as_str(), "pipeline stage");
        let vector = encode(record, &self.table)?;

        tracing::debug!(patient_id = %record.id, stage = Stage::Classifying.as_str(), "pipeline stage");
        let classification = self.classifier.predict(&vector).map_err(|e| {
            if matches!(e, InferenceError::SchemaMismatch { .. }) {
                // Deployment bug: the serving artifact disagrees with the
                // encoder schema. Operators need to see this.
                tracing::error!(patient_id = %record.id, error = %e, "schema mismatch at inference");
            }
            e
        })?;

        let (similar_cases, retrieval_degraded) = if self.config.retrieval_enabled {
            self.retrieve(record).await
        } else {
            (Vec::new(), false)
        };

        tracing::debug!(patient_id = %record.id, stage = Stage::Assembling.as_str(), "pipeline stage");
        let event = DecisionEvent {
            event_id: uuid::Uuid::new_v4(),
            patient_id: record.id.clone(),
            classification,
            similar_cases,
            retrieval_degraded,
            generated_at: Utc::now(),
        };

        tracing::info!(
            patient_id = %event.patient_id,
            action = event.classification.recommended_action.as_str(),
            confidence = event.classification.confidence,
            neighbors = event.similar_cases.len(),
            degraded = event.retrieval_degraded,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "decision produced"
        );

        Ok(event)
    }

    /// Embedding + Retrieving under a bounded timeout. Failures degrade:
    /// empty neighbors, flag set, cause logged — never a request failure.
    async fn retrieve(&self, record: &PatientRecord) -> (Vec<SimilarCase>, bool) {
        let embedder = Arc::clone(&self.embedder);
        let index = Arc::clone(&self.index);
        let record = record.clone();
        let k = self.config.top_k;

        // Embedder and index calls may block on the network; keep them off
        // the async worker threads.
        let task = tokio::task::spawn_blocking(move || -> Result<Vec<SimilarCase>, RetrievalError> {
            tracing::debug!(patient_id = %record.id, stage = Stage::Embedding.as_str(), "pipeline stage");
            let embedding = embedder.embed(&record)?;
            let query_vector = embedding.vector.clone();
            let own_id = embedding.patient_id.clone();

            tracing::debug!(patient_id = %record.id, stage = Stage::Retrieving.as_str(), "pipeline stage");
            index.upsert(embedding)?;

            // The subject's own embedding is in the index now; over-fetch
            // by one and drop it from the neighbor list.
            let neighbors = index.query(&query_vector, k + 1)?;
            Ok(neighbors
                .into_iter()
                .filter(|n| n.id != own_id)
                .take(k)
                .collect())
        });

        match tokio::time::timeout(self.config.retrieval_timeout, task).await {
            Ok(Ok(Ok(cases))) => (cases, false),
            Ok(Ok(Err(e))) => {
                tracing::warn!(error = %e, "similarity retrieval degraded");
                (Vec::new(), true)
            }
            Ok(Err(join_error)) => {
                tracing::warn!(error = %join_error, "retrieval task failed");
                (Vec::new(), true)
            }
            Err(_) => {
                tracing::warn!(
                    timeout_ms = self.config.retrieval_timeout.as_millis() as u64,
                    "similarity retrieval timed out"
                );
                (Vec::new(), true)
            }
        }
    }
}
