//! Persona product index and relevance scoring of a sold item.
//!
//! The index is a CSV with at least a `Title` and a `Rank` column. The sold item's name is
//! embedded next to every title; the ranks of the [`TOP_K`] most similar titles are
//! averaged.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::memory::{cosine_similarity, Embedder, StoreError};

/// Titles whose ranks are averaged.
pub const TOP_K: usize = 3;

#[derive(Debug, Error)]
pub enum ProductIndexError {
    #[error("read index {}: {source}", path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("index {} has no usable rows", .0.display())]
    Empty(PathBuf),
    #[error("embedding: {0}")]
    Embedding(#[from] StoreError),
    #[error("index load task: {0}")]
    Task(String),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct IndexedProduct {
    #[serde(rename = "Title")]
    pub title: String,
    #[serde(rename = "Rank")]
    pub rank: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProductIndex {
    path: PathBuf,
    products: Vec<IndexedProduct>,
}

impl ProductIndex {
    /// Loads the index, skipping rows with an empty title or an unparsable rank.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ProductIndexError> {
        let path = path.as_ref().to_path_buf();
        let csv_error = |source| ProductIndexError::Csv {
            path: path.clone(),
            source,
        };
        let mut reader = csv::Reader::from_path(&path).map_err(csv_error)?;
        let mut products = Vec::new();
        let mut skipped = 0usize;
        for row in reader.deserialize::<IndexedProduct>() {
            match row {
                Ok(p) if !p.title.trim().is_empty() => products.push(p),
                Ok(_) => skipped += 1,
                Err(e) if e.is_io_error() => return Err(csv_error(e)),
                Err(_) => skipped += 1,
            }
        }
        if skipped > 0 {
            tracing::debug!(path = %path.display(), skipped, "index rows skipped");
        }
        if products.is_empty() {
            return Err(ProductIndexError::Empty(path));
        }
        Ok(Self { path, products })
    }

    /// [`ProductIndex::load`] on the blocking pool, for callers on the async runtime.
    pub async fn load_blocking(path: impl Into<PathBuf>) -> Result<Self, ProductIndexError> {
        let path = path.into();
        tokio::task::spawn_blocking(move || Self::load(path))
            .await
            .map_err(|e| ProductIndexError::Task(e.to_string()))?
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn products(&self) -> &[IndexedProduct] {
        &self.products
    }

    /// Average rank of the `k` titles most similar to `item_name`.
    pub async fn average_rank(
        &self,
        item_name: &str,
        embedder: &dyn Embedder,
        k: usize,
    ) -> Result<f64, ProductIndexError> {
        let mut texts: Vec<&str> = Vec::with_capacity(self.products.len() + 1);
        texts.push(item_name);
        texts.extend(self.products.iter().map(|p| p.title.as_str()));
        let vectors = embedder.embed(&texts).await?;
        let Some((query, titles)) = vectors.split_first() else {
            return Err(StoreError::EmbeddingError("embedder returned no vectors".into()).into());
        };
        if titles.len() != self.products.len() {
            return Err(StoreError::EmbeddingError(format!(
                "expected {} vectors, got {}",
                self.products.len(),
                titles.len()
            ))
            .into());
        }
        let mut scored: Vec<(f32, f64)> = titles
            .iter()
            .zip(&self.products)
            .map(|(v, p)| (cosine_similarity(query, v), p.rank))
            .collect();
        scored.sort_by(|a, b| b.0.total_cmp(&a.0));
        let top: Vec<f64> = scored.iter().take(k.max(1)).map(|(_, rank)| *rank).collect();
        Ok(top.iter().sum::<f64>() / top.len() as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::HashingEmbedder;

    fn write_index(body: &str) -> tempfile::NamedTempFile {
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(file.path(), body).unwrap();
        file
    }

    /// **Scenario**: Ranks of the three titles closest to the item are averaged.
    #[tokio::test]
    async fn average_rank_of_top_three() {
        let file = write_index(
            "Title,Rank,Score\n\
             chrome kitchen faucet,1,0.9\n\
             kitchen faucet with sprayer,2,0.8\n\
             brushed kitchen faucet,3,0.7\n\
             garden hose,10,0.1\n\
             dog leash,20,0.05\n",
        );
        let index = ProductIndex::load(file.path()).unwrap();
        assert_eq!(index.products().len(), 5);
        let avg = index
            .average_rank("kitchen faucet", &HashingEmbedder::default(), TOP_K)
            .await
            .unwrap();
        assert!((avg - 2.0).abs() < 1e-9, "{}", avg);
    }

    #[test]
    fn bad_rows_are_skipped() {
        let file = write_index("Title,Rank\nfaucet,1\n,2\nsink,not-a-number\n");
        let index = ProductIndex::load(file.path()).unwrap();
        assert_eq!(index.products().len(), 1);
    }

    #[tokio::test]
    async fn load_blocking_matches_load() {
        let file = write_index("Title,Rank\nfaucet,1\nsink,4\n");
        let index = ProductIndex::load_blocking(file.path()).await.unwrap();
        assert_eq!(index, ProductIndex::load(file.path()).unwrap());
        assert_eq!(index.path(), file.path());
        assert!(matches!(
            ProductIndex::load_blocking("/no/such/index.csv").await,
            Err(ProductIndexError::Csv { .. })
        ));
    }

    #[test]
    fn missing_columns_or_file_fail() {
        let file = write_index("Name,Score\nfaucet,1\n");
        assert!(matches!(ProductIndex::load(file.path()), Err(ProductIndexError::Empty(_))));
        assert!(matches!(
            ProductIndex::load("/no/such/index.csv"),
            Err(ProductIndexError::Csv { .. })
        ));
    }
}
