//! Conversation message types.
//!
//! Roles: System (prompt), User (buyer), Assistant (seller, optionally requesting tool calls),
//! Tool (result of one seller tool call). Used by `ConversationState::messages` and by
//! `ChatRequest`.

use serde::{Deserialize, Serialize};

/// A tool invocation requested by the assistant.
///
/// `arguments` is the raw JSON object text as produced by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub name: String,
    pub arguments: String,
    pub id: Option<String>,
}

impl ToolCall {
    pub fn new(name: impl Into<String>, arguments: impl Into<String>, id: Option<String>) -> Self {
        Self {
            name: name.into(),
            arguments: arguments.into(),
            id,
        }
    }
}

/// A single message in the conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Message {
    System(String),
    User(String),
    Assistant {
        content: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        tool_calls: Vec<ToolCall>,
    },
    /// Output of a tool call; `call_id` pairs it with the requesting `ToolCall::id`.
    Tool {
        call_id: Option<String>,
        name: String,
        content: String,
    },
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self::System(content.into())
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::User(content.into())
    }

    /// Assistant reply without tool calls.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::Assistant {
            content: content.into(),
            tool_calls: Vec::new(),
        }
    }

    pub fn assistant_with_tools(content: impl Into<String>, tool_calls: Vec<ToolCall>) -> Self {
        Self::Assistant {
            content: content.into(),
            tool_calls,
        }
    }

    pub fn tool(call_id: Option<String>, name: impl Into<String>, content: impl Into<String>) -> Self {
        Self::Tool {
            call_id,
            name: name.into(),
            content: content.into(),
        }
    }

    /// Text body regardless of role.
    pub fn content(&self) -> &str {
        match self {
            Message::System(c) | Message::User(c) => c,
            Message::Assistant { content, .. } | Message::Tool { content, .. } => content,
        }
    }

    /// Tool calls requested by this message; empty for every role but Assistant.
    pub fn tool_calls(&self) -> &[ToolCall] {
        match self {
            Message::Assistant { tool_calls, .. } => tool_calls,
            _ => &[],
        }
    }

    /// Role label used when rendering transcripts.
    pub fn role(&self) -> &'static str {
        match self {
            Message::System(_) => "system",
            Message::User(_) => "user",
            Message::Assistant { .. } => "assistant",
            Message::Tool { .. } => "tool",
        }
    }
}

/// Renders messages as `role: content` lines for prompts.
pub fn render_transcript(messages: &[Message]) -> String {
    messages
        .iter()
        .map(|m| format!("{}: {}", m.role(), m.content()))
        .collect::<Vec<_>>()
        .join("\n")
}
