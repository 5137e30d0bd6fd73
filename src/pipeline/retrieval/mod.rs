pub mod embedder;
pub mod index;

pub use embedder::{
    Embedding, EmbeddingGenerator, HashedSummaryEmbedder, HttpEmbedder, EMBEDDING_DIM,
};
pub use index::{InMemorySimilarityIndex, SimilarityIndex};

use thiserror::Error;

/// Retrieval-path failures are recoverable by contract: callers degrade to
/// an empty neighbor list instead of failing the request.
#[derive(Error, Debug)]
pub enum RetrievalError {
    #[error("embedding generation unavailable: {0}")]
    EmbeddingUnavailable(String),

    #[error("similarity index error: {0}")]
    Index(String),

    #[error("embedding generator version mismatch: index holds {index}, got {embedding}")]
    VersionMismatch { index: String, embedding: String },

    #[error("embedding dimension mismatch: index holds {index}, got {embedding}")]
    DimensionMismatch { index: usize, embedding: usize },
}
