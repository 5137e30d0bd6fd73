use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::PatientRecord;

use super::RetrievalError;

/// Default embedding dimension for the built-in feature-hash generator.
pub const EMBEDDING_DIM: usize = 384;

/// A patient embedding. Owned by the similarity index once upserted;
/// refreshes are delete+insert, never in-place mutation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Embedding {
    pub patient_id: String,
    pub vector: Vec<f32>,
    /// Embeddings from different generator versions are not comparable;
    /// the tag is what lets the index refuse to mix them.
    pub generator_version: String,
    pub created_at: DateTime<Utc>,
}

/// Embedding generator abstraction. Implementations must be deterministic
/// for the same record and generator version — no hidden randomness.
pub trait EmbeddingGenerator: Send + Sync {
    fn embed(&self, record: &PatientRecord) -> Result<Embedding, RetrievalError>;
    fn version(&self) -> &str;
    fn dimension(&self) -> usize;
}

// ---------------------------------------------------------------------------
// Feature-hash embedder (local, deterministic)
// ---------------------------------------------------------------------------

/// Local embedder: feature-hashes the record's clinical summary text into an
/// L2-normalized vector. No model download, no network, fully deterministic.
pub struct HashedSummaryEmbedder {
    dimension: usize,
}

impl HashedSummaryEmbedder {
    pub fn new() -> Self {
        Self {
            dimension: EMBEDDING_DIM,
        }
    }

    pub fn with_dimension(dimension: usize) -> Self {
        Self { dimension }
    }
}

impl Default for HashedSummaryEmbedder {
    fn default() -> Self {
        Self::new()
    }
}

impl EmbeddingGenerator for HashedSummaryEmbedder {
    fn embed(&self, record: &PatientRecord) -> Result<Embedding, RetrievalError> {
        let vector = hash_features(&record.summary_text(), self.dimension);
        Ok(Embedding {
            patient_id: record.id.clone(),
            vector,
            generator_version: self.version().to_string(),
            created_at: Utc::now(),
        })
    }

    fn version(&self) -> &str {
        "feature-hash-v1"
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

/// Signed feature hashing over whitespace/punctuation tokens, L2-normalized.
fn hash_features(text: &str, dim: usize) -> Vec<f32> {
    let mut vector = vec![0.0f32; dim];

    for token in text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
    {
        let h = fnv1a(token.as_bytes());
        let slot = (h % dim as u64) as usize;
        // One hash bit decides the sign, the rest the slot.
        let sign = if h & (1 << 63) == 0 { 1.0 } else { -1.0 };
        vector[slot] += sign;
    }

    let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for v in &mut vector {
            *v /= norm;
        }
    }
    vector
}

fn fnv1a(bytes: &[u8]) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for b in bytes {
        hash ^= u64::from(*b);
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
    }
    hash
}

// ---------------------------------------------------------------------------
// HTTP embedder (local embedding service)
// ---------------------------------------------------------------------------

/// Embedder backed by a local embedding service speaking the Ollama
/// `/api/embed` shape. Calls may block on the network, so callers run this
/// under a bounded timeout; unreachable service surfaces as
/// `EmbeddingUnavailable`, which the orchestrator treats as degraded, not
/// fatal.
pub struct HttpEmbedder {
    base_url: String,
    model: String,
    version: String,
    dimension: usize,
    client: reqwest::blocking::Client,
}

impl HttpEmbedder {
    pub fn new(base_url: &str, model: &str, dimension: usize, timeout_secs: u64) -> Self {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            version: format!("http/{model}"),
            dimension,
            client,
        }
    }
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

impl EmbeddingGenerator for HttpEmbedder {
    fn embed(&self, record: &PatientRecord) -> Result<Embedding, RetrievalError> {
        let url = format!("{}/api/embed", self.base_url);
        let body = EmbedRequest {
            model: &self.model,
            input: &record.summary_text(),
        };

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .map_err(|e| RetrievalError::EmbeddingUnavailable(e.to_string()))?
            .error_for_status()
            .map_err(|e| RetrievalError::EmbeddingUnavailable(e.to_string()))?;

        let parsed: EmbedResponse = response
            .json()
            .map_err(|e| RetrievalError::EmbeddingUnavailable(e.to_string()))?;

        let vector = parsed
            .embeddings
            .into_iter()
            .next()
            .ok_or_else(|| {
                RetrievalError::EmbeddingUnavailable("service returned no embedding".into())
            })?;

        if vector.len() != self.dimension {
            return Err(RetrievalError::DimensionMismatch {
                index: self.dimension,
                embedding: vector.len(),
            });
        }

        Ok(Embedding {
            patient_id: record.id.clone(),
            vector,
            generator_version: self.version.clone(),
            created_at: Utc::now(),
        })
    }

    fn version(&self) -> &str {
        &self.version
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PatientRecord, VitalSigns};

    fn record(id: &str, heart_rate: u32) -> PatientRecord {
        PatientRecord {
            id: id.into(),
            vital_signs: Some(VitalSigns {
                heart_rate: Some(heart_rate),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    #[test]
    fn embed_returns_configured_dimension() {
        let embedder = HashedSummaryEmbedder::new();
        let e = embedder.embed(&record("P1", 78)).unwrap();
        assert_eq!(e.vector.len(), EMBEDDING_DIM);
        assert_eq!(e.patient_id, "P1");
    }

    #[test]
    fn embed_is_deterministic_for_the_same_record() {
        let embedder = HashedSummaryEmbedder::new();
        let a = embedder.embed(&record("P1", 78)).unwrap();
        let b = embedder.embed(&record("P1", 78)).unwrap();
        assert_eq!(a.vector, b.vector);
    }

    #[test]
    fn different_records_embed_differently() {
        let embedder = HashedSummaryEmbedder::new();
        let a = embedder.embed(&record("P1", 78)).unwrap();
        let b = embedder.embed(&record("P2", 190)).unwrap();
        assert_ne!(a.vector, b.vector);
    }

    #[test]
    fn embed_is_l2_normalized() {
        let embedder = HashedSummaryEmbedder::new();
        let e = embedder.embed(&record("P1", 78)).unwrap();
        let norm: f32 = e.vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 0.01, "norm = {norm}");
    }

    #[test]
    fn embeddings_carry_the_generator_version() {
        let embedder = HashedSummaryEmbedder::new();
        let e = embedder.embed(&record("P1", 78)).unwrap();
        assert_eq!(e.generator_version, "feature-hash-v1");
    }

    #[test]
    fn http_embedder_reports_unreachable_service_as_unavailable() {
        // Nothing listens on this port; the call must fail fast and map to
        // the recoverable error, not panic.
        let embedder = HttpEmbedder::new("http://127.0.0.1:1", "all-minilm", 384, 1);
        let err = embedder.embed(&record("P1", 78)).unwrap_err();
        assert!(matches!(err, RetrievalError::EmbeddingUnavailable(_)));
    }
}
