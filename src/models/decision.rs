use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::RecommendedAction;

/// Output of the risk classifier for one feature vector.
///
/// Carries the model version so stale-model mismatches stay detectable
/// downstream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassificationResult {
    pub recommended_action: RecommendedAction,
    /// Probability of the winning label, in [0,1].
    pub confidence: f32,
    pub model_version: String,
}

/// One nearest-neighbor hit from the similarity index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarCase {
    pub id: String,
    pub score: f32,
}

/// The unit handed to the alert-trigger collaborator. Ephemeral: produced
/// per inference call, consumed once, not persisted by the core.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecisionEvent {
    pub event_id: Uuid,
    pub patient_id: String,
    #[serde(flatten)]
    pub classification: ClassificationResult,
    pub similar_cases: Vec<SimilarCase>,
    /// True when similarity retrieval was attempted but unavailable —
    /// distinct from "no similar cases found".
    pub retrieval_degraded: bool,
    pub generated_at: DateTime<Utc>,
}
