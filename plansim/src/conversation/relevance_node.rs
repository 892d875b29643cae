//! ScoreRelevance node: how well the sold item fits the persona's product index.
//!
//! Writes `product_avg_rank` on success. A missing sale or index, an unreadable index or an
//! embedding failure leaves the rank unset; none of them fail the run.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::AgentError;
use crate::graph::{Node, NodeOutput};
use crate::memory::Embedder;

use super::product_index::{ProductIndex, ProductIndexError, TOP_K};
use super::route::{ConversationNode, ConversationRoute};
use super::state::{ConversationState, ConversationUpdate};

pub struct RelevanceNode {
    embedder: Arc<dyn Embedder>,
}

impl RelevanceNode {
    pub fn new(embedder: Arc<dyn Embedder>) -> Self {
        Self { embedder }
    }

    async fn score(&self, item_name: &str, index_path: &Path) -> Result<f64, ProductIndexError> {
        let index = ProductIndex::load_blocking(index_path).await?;
        index
            .average_rank(item_name, self.embedder.as_ref(), TOP_K)
            .await
    }
}

#[async_trait]
impl Node<ConversationState, ConversationRoute> for RelevanceNode {
    fn id(&self) -> ConversationNode {
        ConversationNode::ScoreRelevance
    }

    async fn run(
        &self,
        state: &ConversationState,
    ) -> Result<NodeOutput<ConversationState, ConversationRoute>, AgentError> {
        let mut update = ConversationUpdate::default();
        match (&state.sale, &state.product_index_path) {
            (Some(sale), Some(path)) => match self.score(&sale.item_name, path).await {
                Ok(rank) => {
                    tracing::info!(item = %sale.item_name, avg_rank = rank, "relevance scored");
                    update.product_avg_rank = Some(Some(rank));
                }
                Err(e) => {
                    tracing::warn!(item = %sale.item_name, error = %e, "relevance scoring failed")
                }
            },
            _ => tracing::debug!("no sale or product index; skipping relevance"),
        }
        Ok(NodeOutput::new(update, ConversationRoute::RelevanceScored))
    }
}
