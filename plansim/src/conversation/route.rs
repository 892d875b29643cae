//! Conversation graph nodes and transition table.
//!
//! ```text
//! initialize -> seller -> tools         -> seller
//!                      -> analyze_sale  -> score_relevance -> buyer | END
//!                                       -> buyer | END
//!                      -> buyer         -> seller
//!                      -> END
//! ```
//!
//! Unlike the planning graph, routes here carry no decision: where to go next is a function
//! of the merged state (pending tool calls, sale keywords, message count).

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::graph::{Next, Route};
use crate::message::Message;

use super::state::ConversationState;

/// Phrases that suggest a purchase is being discussed. Matched case-insensitively as
/// substrings.
pub const SALE_KEYWORDS: &[&str] = &[
    "buy",
    "purchase",
    "order",
    "sold",
    "deal",
    "payment",
    "confirm",
    "agree",
    "accept",
    "checkout",
    "shopping cart",
    "add to cart",
    "pay",
    "price is good",
    "sounds good",
    "I'll take it",
];

/// Messages scanned for sale keywords.
pub const KEYWORD_WINDOW: usize = 5;
/// Fewer messages than this never trigger analysis.
pub const MIN_MESSAGES_FOR_SALE: usize = 3;

/// True when any of the last [`KEYWORD_WINDOW`] messages mentions a sale keyword.
pub fn has_sale_indicator(messages: &[Message]) -> bool {
    if messages.len() < MIN_MESSAGES_FOR_SALE {
        return false;
    }
    let recent = &messages[messages.len().saturating_sub(KEYWORD_WINDOW)..];
    let text = recent
        .iter()
        .map(Message::content)
        .filter(|c| !c.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();
    SALE_KEYWORDS
        .iter()
        .any(|k| text.contains(&k.to_lowercase()))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversationNode {
    Initialize,
    Seller,
    Tools,
    Buyer,
    AnalyzeSale,
    ScoreRelevance,
}

impl ConversationNode {
    pub const ALL: [ConversationNode; 6] = [
        ConversationNode::Initialize,
        ConversationNode::Seller,
        ConversationNode::Tools,
        ConversationNode::Buyer,
        ConversationNode::AnalyzeSale,
        ConversationNode::ScoreRelevance,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ConversationNode::Initialize => "initialize",
            ConversationNode::Seller => "seller",
            ConversationNode::Tools => "tools",
            ConversationNode::Buyer => "buyer",
            ConversationNode::AnalyzeSale => "analyze_sale",
            ConversationNode::ScoreRelevance => "score_relevance",
        }
    }
}

impl fmt::Display for ConversationNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Route returned by each conversation node; one variant per node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversationRoute {
    Initialized,
    SellerReplied,
    ToolsRan,
    BuyerReplied,
    SaleAnalyzed,
    RelevanceScored,
}

impl Route<ConversationState> for ConversationRoute {
    type Node = ConversationNode;

    fn source(&self) -> ConversationNode {
        match self {
            ConversationRoute::Initialized => ConversationNode::Initialize,
            ConversationRoute::SellerReplied => ConversationNode::Seller,
            ConversationRoute::ToolsRan => ConversationNode::Tools,
            ConversationRoute::BuyerReplied => ConversationNode::Buyer,
            ConversationRoute::SaleAnalyzed => ConversationNode::AnalyzeSale,
            ConversationRoute::RelevanceScored => ConversationNode::ScoreRelevance,
        }
    }

    fn next(&self, state: &ConversationState) -> Next<ConversationNode> {
        match self {
            ConversationRoute::Initialized
            | ConversationRoute::ToolsRan
            | ConversationRoute::BuyerReplied => Next::Node(ConversationNode::Seller),
            ConversationRoute::SellerReplied => after_seller(state),
            ConversationRoute::SaleAnalyzed => {
                if state.sale_completed() && state.product_index_path.is_some() {
                    Next::Node(ConversationNode::ScoreRelevance)
                } else if state.at_message_limit() {
                    Next::End
                } else {
                    Next::Node(ConversationNode::Buyer)
                }
            }
            ConversationRoute::RelevanceScored => {
                if state.at_message_limit() {
                    Next::End
                } else {
                    Next::Node(ConversationNode::Buyer)
                }
            }
        }
    }

    fn successors(node: ConversationNode) -> &'static [Next<ConversationNode>] {
        match node {
            ConversationNode::Initialize | ConversationNode::Tools | ConversationNode::Buyer => {
                &[Next::Node(ConversationNode::Seller)]
            }
            ConversationNode::Seller => &[
                Next::End,
                Next::Node(ConversationNode::Tools),
                Next::Node(ConversationNode::AnalyzeSale),
                Next::Node(ConversationNode::Buyer),
            ],
            ConversationNode::AnalyzeSale => &[
                Next::Node(ConversationNode::ScoreRelevance),
                Next::End,
                Next::Node(ConversationNode::Buyer),
            ],
            ConversationNode::ScoreRelevance => &[Next::End, Next::Node(ConversationNode::Buyer)],
        }
    }
}

fn after_seller(state: &ConversationState) -> Next<ConversationNode> {
    let Some(last) = state.messages.last() else {
        return Next::End;
    };
    if !last.tool_calls().is_empty() {
        return Next::Node(ConversationNode::Tools);
    }
    if !state.sale_completed() && has_sale_indicator(&state.messages) {
        return Next::Node(ConversationNode::AnalyzeSale);
    }
    if state.at_message_limit() {
        return if state.sale_completed() {
            Next::End
        } else {
            Next::Node(ConversationNode::AnalyzeSale)
        };
    }
    Next::Node(ConversationNode::Buyer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::SaleRecord;
    use crate::message::ToolCall;

    fn state(messages: Vec<Message>) -> ConversationState {
        ConversationState::with_messages(messages)
    }

    fn sold() -> SaleRecord {
        SaleRecord {
            item_id: Some("v1|1|0".into()),
            item_name: "Faucet".into(),
            price: Some(49.99),
            description: None,
            confidence: 0.9,
            timestamp: chrono::Utc::now(),
            needs_review: false,
            details: String::new(),
        }
    }

    /// **Scenario**: Keywords match case-insensitively, only with at least three messages.
    #[test]
    fn sale_indicator_rules() {
        let two = vec![Message::user("I'll TAKE IT"), Message::assistant("ok")];
        assert!(!has_sale_indicator(&two));
        let three = vec![
            Message::user("hi"),
            Message::assistant("hello"),
            Message::user("Sounds GOOD to me"),
        ];
        assert!(has_sale_indicator(&three));
        let quiet = vec![Message::user("hi"), Message::assistant("hello"), Message::user("tell me more")];
        assert!(!has_sale_indicator(&quiet));
    }

    /// **Scenario**: Keywords older than the last five messages are ignored.
    #[test]
    fn sale_indicator_window() {
        let mut messages = vec![Message::user("I want to buy")];
        for _ in 0..5 {
            messages.push(Message::assistant("hello"));
        }
        assert!(!has_sale_indicator(&messages));
    }

    /// **Scenario**: A seller tool call goes to Tools, and Tools always returns to Seller.
    #[test]
    fn tool_loop_returns_to_seller() {
        let s = state(vec![
            Message::user("hi"),
            Message::assistant_with_tools("", vec![ToolCall::new("ebay_search_tool", "{}", None)]),
        ]);
        assert_eq!(ConversationRoute::SellerReplied.next(&s), Next::Node(ConversationNode::Tools));
        assert_eq!(ConversationRoute::ToolsRan.next(&s), Next::Node(ConversationNode::Seller));
    }

    #[test]
    fn seller_routing_table() {
        assert_eq!(ConversationRoute::SellerReplied.next(&state(vec![])), Next::End);

        let chat = vec![Message::user("hi"), Message::assistant("hello"), Message::user("what do you have")];
        assert_eq!(
            ConversationRoute::SellerReplied.next(&state(chat.clone())),
            Next::Node(ConversationNode::Buyer)
        );

        let mut at_limit = state(chat.clone());
        at_limit.message_limit = 3;
        assert_eq!(
            ConversationRoute::SellerReplied.next(&at_limit),
            Next::Node(ConversationNode::AnalyzeSale)
        );
        at_limit.sale = Some(sold());
        assert_eq!(ConversationRoute::SellerReplied.next(&at_limit), Next::End);
    }

    /// **Scenario**: Once a sale is recorded, keywords no longer route to analysis.
    #[test]
    fn analysis_is_not_reentered_after_sale() {
        let mut s = state(vec![
            Message::user("hi"),
            Message::assistant("hello"),
            Message::user("I'll take it"),
        ]);
        assert_eq!(
            ConversationRoute::SellerReplied.next(&s),
            Next::Node(ConversationNode::AnalyzeSale)
        );
        s.sale = Some(sold());
        assert_eq!(ConversationRoute::SellerReplied.next(&s), Next::Node(ConversationNode::Buyer));
    }

    #[test]
    fn after_analysis_and_scoring() {
        let mut s = state(vec![Message::user("hi")]);
        assert_eq!(ConversationRoute::SaleAnalyzed.next(&s), Next::Node(ConversationNode::Buyer));
        s.sale = Some(sold());
        assert_eq!(ConversationRoute::SaleAnalyzed.next(&s), Next::Node(ConversationNode::Buyer));
        s.product_index_path = Some("index.csv".into());
        assert_eq!(
            ConversationRoute::SaleAnalyzed.next(&s),
            Next::Node(ConversationNode::ScoreRelevance)
        );
        assert_eq!(ConversationRoute::RelevanceScored.next(&s), Next::Node(ConversationNode::Buyer));
        s.message_limit = 1;
        assert_eq!(ConversationRoute::RelevanceScored.next(&s), Next::End);
        s.product_index_path = None;
        assert_eq!(ConversationRoute::SaleAnalyzed.next(&s), Next::End);
    }

    #[test]
    fn every_route_target_is_a_declared_successor() {
        let routes = [
            ConversationRoute::Initialized,
            ConversationRoute::SellerReplied,
            ConversationRoute::ToolsRan,
            ConversationRoute::BuyerReplied,
            ConversationRoute::SaleAnalyzed,
            ConversationRoute::RelevanceScored,
        ];
        let s = state(vec![Message::user("hi"), Message::assistant("a"), Message::user("b")]);
        for r in routes {
            assert!(ConversationRoute::successors(r.source()).contains(&r.next(&s)), "{:?}", r);
        }
    }
}
