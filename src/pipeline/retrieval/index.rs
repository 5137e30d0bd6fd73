use std::collections::HashMap;
use std::sync::RwLock;

use crate::models::SimilarCase;

use super::embedder::Embedding;
use super::RetrievalError;

/// Nearest-neighbor store over patient embeddings.
///
/// `upsert` of an existing identifier replaces the prior embedding
/// atomically: a concurrent `query` sees old or new, never neither and
/// never both. `query` on an empty index returns an empty sequence.
pub trait SimilarityIndex: Send + Sync {
    fn upsert(&self, embedding: Embedding) -> Result<(), RetrievalError>;

    /// Top-k cosine neighbors, scores descending. Ties go to the most
    /// recently inserted embedding.
    fn query(&self, vector: &[f32], k: usize) -> Result<Vec<SimilarCase>, RetrievalError>;
}

/// In-memory index. One entry per patient id under a single `RwLock`:
/// writes serialize (which is what makes replacement atomic) while reads
/// proceed concurrently with each other.
pub struct InMemorySimilarityIndex {
    dimension: usize,
    generator_version: String,
    entries: RwLock<HashMap<String, Embedding>>,
}

impl InMemorySimilarityIndex {
    pub fn new(dimension: usize, generator_version: &str) -> Self {
        Self {
            dimension,
            generator_version: generator_version.to_string(),
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SimilarityIndex for InMemorySimilarityIndex {
    fn upsert(&self, embedding: Embedding) -> Result<(), RetrievalError> {
        if embedding.generator_version != self.generator_version {
            return Err(RetrievalError::VersionMismatch {
                index: self.generator_version.clone(),
                embedding: embedding.generator_version,
            });
        }
        if embedding.vector.len() != self.dimension {
            return Err(RetrievalError::DimensionMismatch {
                index: self.dimension,
                embedding: embedding.vector.len(),
            });
        }

        let mut entries = self
            .entries
            .write()
            .map_err(|_| RetrievalError::Index("index lock poisoned".into()))?;
        entries.insert(embedding.patient_id.clone(), embedding);
        Ok(())
    }

    fn query(&self, vector: &[f32], k: usize) -> Result<Vec<SimilarCase>, RetrievalError> {
        if k == 0 {
            return Ok(Vec::new());
        }

        let entries = self
            .entries
            .read()
            .map_err(|_| RetrievalError::Index("index lock poisoned".into()))?;

        let mut scored: Vec<(f32, &Embedding)> = entries
            .values()
            .map(|e| (cosine_similarity(vector, &e.vector), e))
            .collect();

        // Score descending, then recency, then id for full determinism.
        scored.sort_by(|a, b| {
            b.0.partial_cmp(&a.0)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| b.1.created_at.cmp(&a.1.created_at))
                .then_with(|| a.1.patient_id.cmp(&b.1.patient_id))
        });

        Ok(scored
            .into_iter()
            .take(k)
            .map(|(score, e)| SimilarCase {
                id: e.patient_id.clone(),
                score,
            })
            .collect())
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    const VERSION: &str = "feature-hash-v1";

    fn embedding(id: &str, vector: Vec<f32>) -> Embedding {
        Embedding {
            patient_id: id.into(),
            vector,
            generator_version: VERSION.into(),
            created_at: Utc::now(),
        }
    }

    fn embedding_at(id: &str, vector: Vec<f32>, secs: i64) -> Embedding {
        Embedding {
            created_at: Utc.timestamp_opt(secs, 0).unwrap(),
            ..embedding(id, vector)
        }
    }

    #[test]
    fn self_similarity_is_maximal() {
        let index = InMemorySimilarityIndex::new(3, VERSION);
        index.upsert(embedding("P1", vec![0.2, 0.5, 0.3])).unwrap();

        let hits = index.query(&[0.2, 0.5, 0.3], 1).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "P1");
        assert!((hits[0].score - 1.0).abs() < 1e-6);
    }

    #[test]
    fn query_on_empty_index_returns_empty_not_error() {
        let index = InMemorySimilarityIndex::new(3, VERSION);
        assert!(index.query(&[1.0, 0.0, 0.0], 5).unwrap().is_empty());
    }

    #[test]
    fn upsert_replaces_prior_embedding_for_the_same_id() {
        let index = InMemorySimilarityIndex::new(2, VERSION);
        index.upsert(embedding("P1", vec![1.0, 0.0])).unwrap();
        index.upsert(embedding("P1", vec![0.0, 1.0])).unwrap();

        assert_eq!(index.len(), 1);
        let hits = index.query(&[0.0, 1.0], 5).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "P1");
        assert!((hits[0].score - 1.0).abs() < 1e-6);
    }

    #[test]
    fn results_are_score_descending_and_bounded_by_k() {
        let index = InMemorySimilarityIndex::new(3, VERSION);
        index.upsert(embedding("exact", vec![1.0, 0.0, 0.0])).unwrap();
        index.upsert(embedding("close", vec![0.8, 0.6, 0.0])).unwrap();
        index
            .upsert(embedding("orthogonal", vec![0.0, 1.0, 0.0]))
            .unwrap();

        let hits = index.query(&[1.0, 0.0, 0.0], 2).unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].id, "exact");
        assert_eq!(hits[1].id, "close");
        assert!(hits[0].score >= hits[1].score);
    }

    #[test]
    fn equal_scores_break_toward_most_recent_insertion() {
        let index = InMemorySimilarityIndex::new(2, VERSION);
        index
            .upsert(embedding_at("older", vec![1.0, 0.0], 1_000))
            .unwrap();
        index
            .upsert(embedding_at("newer", vec![1.0, 0.0], 2_000))
            .unwrap();

        let hits = index.query(&[1.0, 0.0], 2).unwrap();
        assert_eq!(hits[0].id, "newer");
        assert_eq!(hits[1].id, "older");
    }

    #[test]
    fn rejects_generator_version_mismatch() {
        let index = InMemorySimilarityIndex::new(2, VERSION);
        let mut e = embedding("P1", vec![1.0, 0.0]);
        e.generator_version = "feature-hash-v2".into();
        assert!(matches!(
            index.upsert(e),
            Err(RetrievalError::VersionMismatch { .. })
        ));
    }

    #[test]
    fn rejects_dimension_mismatch() {
        let index = InMemorySimilarityIndex::new(3, VERSION);
        assert!(matches!(
            index.upsert(embedding("P1", vec![1.0, 0.0])),
            Err(RetrievalError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn zero_k_returns_empty() {
        let index = InMemorySimilarityIndex::new(2, VERSION);
        index.upsert(embedding("P1", vec![1.0, 0.0])).unwrap();
        assert!(index.query(&[1.0, 0.0], 0).unwrap().is_empty());
    }

    #[test]
    fn concurrent_upserts_leave_one_entry_per_id() {
        use std::sync::Arc;

        let index = Arc::new(InMemorySimilarityIndex::new(2, VERSION));
        let mut handles = Vec::new();
        for i in 0..8 {
            let index = Arc::clone(&index);
            handles.push(std::thread::spawn(move || {
                let v = if i % 2 == 0 { vec![1.0, 0.0] } else { vec![0.0, 1.0] };
                index.upsert(embedding("P1", v)).unwrap();
            }));
        }
        for h in handles {
            h.join().unwrap();
        }

        assert_eq!(index.len(), 1);
    }
}
