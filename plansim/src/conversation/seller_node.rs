//! Seller node: one seller turn, with the marketplace tools bound.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::AgentError;
use crate::graph::{Node, NodeOutput};
use crate::llm::{ChatRequest, LlmGateway};
use crate::message::Message;
use crate::tool_source::ToolSource;

use super::config::ConversationConfig;
use super::prompt::SELLER_FALLBACK_PROMPT;
use super::route::{ConversationNode, ConversationRoute};
use super::state::{ConversationState, ConversationUpdate};
use super::turn::{chat_params, chat_with_fallback, error_snippet, fallback_messages, TurnReply};

/// Chat tag of the seller's full turn.
pub const SELLER_TAG: &str = "seller";
/// Chat tag of the seller's tool-less fallback turn.
pub const SELLER_FALLBACK_TAG: &str = "seller_fallback";

/// Appends one assistant message, possibly carrying tool calls. Never fails on gateway errors.
pub struct SellerNode {
    gateway: Arc<dyn LlmGateway>,
    tools: Arc<dyn ToolSource>,
    config: Arc<ConversationConfig>,
}

impl SellerNode {
    pub fn new(
        gateway: Arc<dyn LlmGateway>,
        tools: Arc<dyn ToolSource>,
        config: Arc<ConversationConfig>,
    ) -> Self {
        Self {
            gateway,
            tools,
            config,
        }
    }
}

#[async_trait]
impl Node<ConversationState, ConversationRoute> for SellerNode {
    fn id(&self) -> ConversationNode {
        ConversationNode::Seller
    }

    async fn run(
        &self,
        state: &ConversationState,
    ) -> Result<NodeOutput<ConversationState, ConversationRoute>, AgentError> {
        let system = state
            .seller_prompt
            .as_deref()
            .unwrap_or(self.config.seller_prompt.as_str());
        let tools = self.tools.list_tools().await.unwrap_or_else(|e| {
            tracing::warn!(error = %e, "listing seller tools failed; replying without tools");
            Vec::new()
        });

        let mut messages = Vec::with_capacity(state.messages.len() + 1);
        messages.push(Message::system(system));
        messages.extend(state.messages.iter().cloned());
        let primary = ChatRequest {
            tag: SELLER_TAG.to_string(),
            messages,
            tools,
            params: chat_params(&self.config.chat_model),
        };
        let fallback = ChatRequest {
            tag: SELLER_FALLBACK_TAG.to_string(),
            messages: fallback_messages(SELLER_FALLBACK_PROMPT, &state.messages),
            tools: Vec::new(),
            params: chat_params(&self.config.chat_model),
        };

        let message = match chat_with_fallback(self.gateway.as_ref(), primary, fallback).await {
            Ok(TurnReply::Primary(reply)) => {
                if !reply.tool_calls.is_empty() {
                    tracing::debug!(calls = reply.tool_calls.len(), "seller requested tools");
                }
                Message::assistant_with_tools(reply.content, reply.tool_calls)
            }
            Ok(TurnReply::Fallback(reply)) => Message::assistant(reply.content),
            Err(e) => Message::assistant(format!(
                "Apologies, I encountered an error: {}... Let me try a simpler response.",
                error_snippet(&e)
            )),
        };
        Ok(NodeOutput::new(
            ConversationUpdate::message(message),
            ConversationRoute::SellerReplied,
        ))
    }
}
