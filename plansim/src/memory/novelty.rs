//! Novelty store: near-duplicate detection for generated ideas, partitioned by bucket.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use super::embedder::{cosine_similarity, Embedder};
use super::StoreError;

/// Partition key. `round` is the 1-based round index; `scope` optionally isolates one plan.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BucketKey {
    pub scope: Option<String>,
    pub round: usize,
}

impl BucketKey {
    /// Bucket shared by every plan at this round.
    pub fn global(round: usize) -> Self {
        Self { scope: None, round }
    }

    pub fn scoped(scope: impl Into<String>, round: usize) -> Self {
        Self {
            scope: Some(scope.into()),
            round,
        }
    }
}

impl fmt::Display for BucketKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.scope {
            Some(scope) => write!(f, "{}/{}", scope, self.round),
            None => write!(f, "{}", self.round),
        }
    }
}

/// Idea memory queried before accepting a generated step.
///
/// **Interaction**: Held as `Arc<dyn NoveltyStore>` by `GenerateIdeaNode`.
#[async_trait]
pub trait NoveltyStore: Send + Sync {
    /// Whether `text` is at least `threshold`-similar to something already in `bucket`.
    async fn is_member(
        &self,
        text: &str,
        bucket: &BucketKey,
        threshold: f32,
    ) -> Result<bool, StoreError>;

    async fn add(&self, text: &str, bucket: &BucketKey) -> Result<(), StoreError>;
}

struct Entry {
    text: String,
    vector: Vec<f32>,
}

/// In-memory novelty store using an [`Embedder`] and cosine similarity. Not persistent.
pub struct InMemoryNoveltyStore {
    buckets: DashMap<BucketKey, Vec<Entry>>,
    embedder: Arc<dyn Embedder>,
}

impl InMemoryNoveltyStore {
    pub fn new(embedder: Arc<dyn Embedder>) -> Self {
        Self {
            buckets: DashMap::new(),
            embedder,
        }
    }

    /// Entries stored in `bucket`.
    pub fn len(&self, bucket: &BucketKey) -> usize {
        self.buckets.get(bucket).map_or(0, |b| b.len())
    }

    /// Texts stored in `bucket`, in insertion order.
    pub fn texts(&self, bucket: &BucketKey) -> Vec<String> {
        self.buckets
            .get(bucket)
            .map(|b| b.iter().map(|e| e.text.clone()).collect())
            .unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.iter().all(|b| b.is_empty())
    }

    async fn embed_one(&self, text: &str) -> Result<Vec<f32>, StoreError> {
        self.embedder
            .embed(&[text])
            .await?
            .pop()
            .ok_or_else(|| StoreError::EmbeddingError("embedder returned no vector".into()))
    }
}

#[async_trait]
impl NoveltyStore for InMemoryNoveltyStore {
    async fn is_member(
        &self,
        text: &str,
        bucket: &BucketKey,
        threshold: f32,
    ) -> Result<bool, StoreError> {
        if self.len(bucket) == 0 {
            return Ok(false);
        }
        let query = self.embed_one(text).await?;
        let best = self.buckets.get(bucket).and_then(|entries| {
            entries
                .iter()
                .map(|e| cosine_similarity(&query, &e.vector))
                .reduce(f32::max)
        });
        tracing::debug!(%bucket, ?best, threshold, "novelty lookup");
        Ok(best.is_some_and(|score| score >= threshold))
    }

    async fn add(&self, text: &str, bucket: &BucketKey) -> Result<(), StoreError> {
        let vector = self.embed_one(text).await?;
        self.buckets.entry(bucket.clone()).or_default().push(Entry {
            text: text.to_string(),
            vector,
        });
        Ok(())
    }
}
