//! Buyer node: one persona-driven buyer turn. The buyer has no tools.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::AgentError;
use crate::graph::{Node, NodeOutput};
use crate::llm::{ChatRequest, LlmGateway};
use crate::message::Message;

use super::config::ConversationConfig;
use super::prompt::{self, BUYER_FALLBACK_PROMPT};
use super::route::{ConversationNode, ConversationRoute};
use super::state::{ConversationState, ConversationUpdate};
use super::turn::{chat_params, chat_with_fallback, error_snippet, fallback_messages, TurnReply};

pub const BUYER_TAG: &str = "buyer";
pub const BUYER_FALLBACK_TAG: &str = "buyer_fallback";

/// Appends one user message. Fails only when no buyer prompt was initialized.
pub struct BuyerNode {
    gateway: Arc<dyn LlmGateway>,
    config: Arc<ConversationConfig>,
}

impl BuyerNode {
    pub fn new(gateway: Arc<dyn LlmGateway>, config: Arc<ConversationConfig>) -> Self {
        Self { gateway, config }
    }
}

#[async_trait]
impl Node<ConversationState, ConversationRoute> for BuyerNode {
    fn id(&self) -> ConversationNode {
        ConversationNode::Buyer
    }

    async fn run(
        &self,
        state: &ConversationState,
    ) -> Result<NodeOutput<ConversationState, ConversationRoute>, AgentError> {
        let persona = state.buyer_prompt.as_deref().ok_or_else(|| {
            AgentError::ContractViolation("buyer prompt is not initialized".into())
        })?;
        let primary = ChatRequest {
            tag: BUYER_TAG.to_string(),
            messages: vec![Message::system(prompt::buyer_system(persona, &state.messages))],
            tools: Vec::new(),
            params: chat_params(&self.config.chat_model),
        };
        let fallback = ChatRequest {
            tag: BUYER_FALLBACK_TAG.to_string(),
            messages: fallback_messages(BUYER_FALLBACK_PROMPT, &state.messages),
            tools: Vec::new(),
            params: chat_params(&self.config.chat_model),
        };

        let content = match chat_with_fallback(self.gateway.as_ref(), primary, fallback).await {
            Ok(TurnReply::Primary(reply)) | Ok(TurnReply::Fallback(reply)) => reply.content,
            Err(e) => format!(
                "(System: Encountered error in buyer response generation: {}...)",
                error_snippet(&e)
            ),
        };
        Ok(NodeOutput::new(
            ConversationUpdate::message(Message::user(content)),
            ConversationRoute::BuyerReplied,
        ))
    }
}
