//! Initialize node: resolve the buyer persona and set up the conversation.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::AgentError;
use crate::graph::{Node, NodeOutput};
use crate::message::Message;

use super::config::ConversationConfig;
use super::persona::PersonaCatalog;
use super::prompt::OPENING_MESSAGE;
use super::route::{ConversationNode, ConversationRoute};
use super::state::{ConversationState, ConversationUpdate};

/// Loads the buyer prompt and product index for the configured (or first) persona, stores
/// the seller prompt and message limit, and opens an empty conversation with a greeting.
pub struct InitializeNode {
    catalog: PersonaCatalog,
    config: Arc<ConversationConfig>,
}

impl InitializeNode {
    pub fn new(config: Arc<ConversationConfig>) -> Self {
        Self {
            catalog: PersonaCatalog::new(config.persona_dir.clone()),
            config,
        }
    }
}

#[async_trait]
impl Node<ConversationState, ConversationRoute> for InitializeNode {
    fn id(&self) -> ConversationNode {
        ConversationNode::Initialize
    }

    async fn run(
        &self,
        state: &ConversationState,
    ) -> Result<NodeOutput<ConversationState, ConversationRoute>, AgentError> {
        let persona_id = self.catalog.resolve(self.config.persona_id.as_deref())?;
        let buyer_prompt = self.catalog.load_prompt(&persona_id)?;
        let index_path = self.catalog.index_path(&persona_id);
        tracing::info!(
            persona_id = %persona_id,
            index = ?index_path,
            message_limit = self.config.message_limit(),
            "conversation initialized"
        );

        let opening = state
            .messages
            .is_empty()
            .then(|| vec![Message::user(OPENING_MESSAGE)]);
        let update = ConversationUpdate {
            persona_id: Some(Some(persona_id)),
            buyer_prompt: Some(Some(buyer_prompt)),
            seller_prompt: Some(Some(self.config.seller_prompt.clone())),
            product_index_path: Some(index_path),
            message_limit: Some(self.config.message_limit()),
            messages: opening,
            ..Default::default()
        };
        Ok(NodeOutput::new(update, ConversationRoute::Initialized))
    }
}
