//! Conversation state: transcript, persona context and the recorded sale.
//!
//! `messages` only grows. `sale` and `product_avg_rank` go from unset to set at most once;
//! later writes are rejected by the merge.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::channels::GraphState;
use crate::message::Message;
use crate::state_update;

/// Default turns per side.
pub const DEFAULT_MAX_TURNS: usize = 10;

/// Message cap for `max_turns` per side: seller opens, buyer answers, seller closes.
pub fn message_limit(max_turns: usize) -> usize {
    max_turns * 2 + 1
}

/// A detected purchase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaleRecord {
    pub item_id: Option<String>,
    pub item_name: String,
    pub price: Option<f64>,
    pub description: Option<String>,
    /// In `[0, 1]`.
    pub confidence: f32,
    pub timestamp: DateTime<Utc>,
    pub needs_review: bool,
    pub details: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationState {
    pub persona_id: Option<String>,
    pub buyer_prompt: Option<String>,
    pub seller_prompt: Option<String>,
    pub product_index_path: Option<PathBuf>,
    pub message_limit: usize,
    pub messages: Vec<Message>,
    pub sale: Option<SaleRecord>,
    pub product_avg_rank: Option<f64>,
}

impl Default for ConversationState {
    fn default() -> Self {
        Self {
            persona_id: None,
            buyer_prompt: None,
            seller_prompt: None,
            product_index_path: None,
            message_limit: message_limit(DEFAULT_MAX_TURNS),
            messages: Vec::new(),
            sale: None,
            product_avg_rank: None,
        }
    }
}

state_update! {
    /// Partial update returned by conversation nodes.
    pub struct ConversationUpdate for ConversationState {
        replace persona_id: Option<String>,
        replace buyer_prompt: Option<String>,
        replace seller_prompt: Option<String>,
        replace product_index_path: Option<PathBuf>,
        replace message_limit: usize,
        append messages: Vec<Message>,
        set_once sale: Option<SaleRecord>,
        set_once product_avg_rank: Option<f64>,
    }
}

impl GraphState for ConversationState {
    type Update = ConversationUpdate;
}

impl ConversationUpdate {
    /// Update appending a single message.
    pub fn message(message: Message) -> Self {
        Self {
            messages: Some(vec![message]),
            ..Default::default()
        }
    }
}

impl ConversationState {
    /// Starts from an existing transcript instead of the default greeting.
    pub fn with_messages(messages: Vec<Message>) -> Self {
        Self {
            messages,
            ..Default::default()
        }
    }

    pub fn sale_completed(&self) -> bool {
        self.sale.is_some()
    }

    pub fn at_message_limit(&self) -> bool {
        self.messages.len() >= self.message_limit
    }

    /// Last `n` messages, oldest first.
    pub fn recent_messages(&self, n: usize) -> &[Message] {
        &self.messages[self.messages.len().saturating_sub(n)..]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channels::StateUpdate;

    fn sale(name: &str) -> SaleRecord {
        SaleRecord {
            item_id: None,
            item_name: name.into(),
            price: Some(10.0),
            description: None,
            confidence: 0.9,
            timestamp: Utc::now(),
            needs_review: false,
            details: String::new(),
        }
    }

    /// **Scenario**: A recorded sale cannot be overwritten by a later analysis.
    #[test]
    fn sale_is_set_once() {
        let mut state = ConversationState::default();
        let report = ConversationUpdate {
            sale: Some(Some(sale("first"))),
            ..Default::default()
        }
        .apply_to(&mut state);
        assert_eq!(report.applied, ["sale"]);
        let report = ConversationUpdate {
            sale: Some(Some(sale("second"))),
            product_avg_rank: Some(Some(2.0)),
            ..Default::default()
        }
        .apply_to(&mut state);
        assert_eq!(report.rejected, ["sale"]);
        assert_eq!(state.sale.as_ref().map(|s| s.item_name.as_str()), Some("first"));
        assert_eq!(state.product_avg_rank, Some(2.0));
    }

    #[test]
    fn default_limit_is_twenty_one() {
        assert_eq!(ConversationState::default().message_limit, 21);
        assert_eq!(message_limit(3), 7);
    }

    #[test]
    fn messages_append() {
        let mut state = ConversationState::with_messages(vec![Message::user("hi")]);
        ConversationUpdate::message(Message::assistant("hello")).apply_to(&mut state);
        assert_eq!(state.messages.len(), 2);
        assert_eq!(state.recent_messages(1)[0].content(), "hello");
        assert_eq!(state.recent_messages(5).len(), 2);
    }
}
