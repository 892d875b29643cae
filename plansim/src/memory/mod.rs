//! Embeddings and the idea novelty store.

mod embedder;
mod novelty;

pub use embedder::{cosine_similarity, Embedder, HashingEmbedder};
pub use novelty::{BucketKey, InMemoryNoveltyStore, NoveltyStore};

use thiserror::Error;

/// Novelty store and embedder failures.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("embedding error: {0}")]
    EmbeddingError(String),
    #[error("storage error: {0}")]
    Storage(String),
}
