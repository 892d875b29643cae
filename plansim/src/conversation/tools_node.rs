//! Tools node: run every tool call on the latest seller message.
//!
//! Calls run concurrently; results come back as one `Tool` message per call, in call order.
//! A failing call becomes an `Error: ...` result so the seller can react to it on its next
//! turn.

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::join_all;
use serde_json::Value;

use crate::error::AgentError;
use crate::graph::{Node, NodeOutput};
use crate::message::{Message, ToolCall};
use crate::tool_source::{ToolSource, ToolSourceError};

use super::route::{ConversationNode, ConversationRoute};
use super::state::{ConversationState, ConversationUpdate};

pub struct ToolsNode {
    tools: Arc<dyn ToolSource>,
}

impl ToolsNode {
    pub fn new(tools: Arc<dyn ToolSource>) -> Self {
        Self { tools }
    }

    async fn call(&self, call: &ToolCall) -> Result<String, ToolSourceError> {
        let arguments: Value = if call.arguments.trim().is_empty() {
            Value::Object(Default::default())
        } else {
            serde_json::from_str(&call.arguments)
                .map_err(|e| ToolSourceError::InvalidInput(e.to_string()))?
        };
        self.tools.call_tool(&call.name, arguments).await
    }
}

#[async_trait]
impl Node<ConversationState, ConversationRoute> for ToolsNode {
    fn id(&self) -> ConversationNode {
        ConversationNode::Tools
    }

    async fn run(
        &self,
        state: &ConversationState,
    ) -> Result<NodeOutput<ConversationState, ConversationRoute>, AgentError> {
        let calls = state
            .messages
            .last()
            .map(Message::tool_calls)
            .filter(|calls| !calls.is_empty())
            .ok_or_else(|| {
                AgentError::ContractViolation("latest message carries no tool calls".into())
            })?;

        let results = join_all(calls.iter().map(|call| async move {
            let content = match self.call(call).await {
                Ok(output) => output,
                Err(e) => {
                    tracing::warn!(tool = %call.name, error = %e, "tool call failed");
                    format!("Error: {}", e)
                }
            };
            tracing::debug!(tool = %call.name, bytes = content.len(), "tool call done");
            Message::tool(call.id.clone(), call.name.clone(), content)
        }))
        .await;
        let update = ConversationUpdate {
            messages: Some(results),
            ..Default::default()
        };
        Ok(NodeOutput::new(update, ConversationRoute::ToolsRan))
    }
}
