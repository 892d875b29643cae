//! Sale analysis: decide whether the buyer committed to a purchase and record the sale.
//!
//! The model judges the last [`ANALYSIS_WINDOW`] messages. Listing details come from the
//! whole transcript: the newest `**Product Description:**` block and the newest `Title:`
//! line, typically in item-question tool output. A title found there wins over the model's
//! item name. A failed analysis means "no sale" and the conversation continues.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::AgentError;
use crate::graph::{Node, NodeOutput};
use crate::llm::{invoke_structured, CallParams, LlmGateway, StructuredOutput};
use crate::message::Message;

use super::config::ConversationConfig;
use super::prompt;
use super::route::{ConversationNode, ConversationRoute, MIN_MESSAGES_FOR_SALE};
use super::state::{ConversationState, ConversationUpdate, SaleRecord};

/// Messages shown to the analyst.
pub const ANALYSIS_WINDOW: usize = 10;
/// Sales below this confidence are flagged for review.
pub const REVIEW_THRESHOLD: f32 = 0.8;
pub const UNKNOWN_ITEM: &str = "Unknown Item";

static DESCRIPTION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)\*\*Product Description:\*\*\s*\n(.*)").expect("valid description regex")
});

static TITLE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"-\s*(?:\*\*)?Title:(?:\*\*)?\s*([^\n]+)").expect("valid title regex")
});

/// Analyst verdict.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SaleAnalysis {
    pub sale_detected: bool,
    #[serde(default)]
    pub item_id: Option<String>,
    #[serde(default)]
    pub item_name: Option<String>,
    #[serde(default)]
    pub price: Option<f64>,
    pub confidence: f32,
}

impl StructuredOutput for SaleAnalysis {
    const SCHEMA_NAME: &'static str = "sale_analysis";

    fn json_schema() -> Value {
        json!({
            "type": "object",
            "properties": {
                "sale_detected": {"type": "boolean"},
                "item_id": {"type": ["string", "null"]},
                "item_name": {"type": ["string", "null"]},
                "price": {"type": ["number", "null"]},
                "confidence": {"type": "number", "minimum": 0, "maximum": 1}
            },
            "required": ["sale_detected", "confidence"]
        })
    }
}

/// Description and title scraped from the transcript, newest first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListingDetails {
    pub description: Option<String>,
    pub title: Option<String>,
}

pub fn extract_listing_details(messages: &[Message]) -> ListingDetails {
    let mut found = ListingDetails::default();
    for message in messages.iter().rev() {
        let content = message.content();
        if found.description.is_none() {
            if let Some(caps) = DESCRIPTION.captures(content) {
                found.description = Some(caps[1].trim().to_string());
            }
        }
        if found.title.is_none() {
            if let Some(caps) = TITLE.captures(content) {
                found.title = Some(caps[1].trim().to_string());
            }
        }
        if found.description.is_some() && found.title.is_some() {
            break;
        }
    }
    found
}

/// Sale record for a positive verdict; `None` when no sale was detected.
pub fn sale_record(
    analysis: SaleAnalysis,
    messages: &[Message],
    timestamp: DateTime<Utc>,
) -> Option<SaleRecord> {
    if !analysis.sale_detected {
        return None;
    }
    let confidence = if analysis.confidence.is_nan() {
        0.0
    } else {
        analysis.confidence.clamp(0.0, 1.0)
    };
    let listing = extract_listing_details(messages);
    if listing.description.is_none() {
        tracing::warn!("no product description found in transcript");
    }
    let item_name = listing
        .title
        .or(analysis.item_name.filter(|n| !n.trim().is_empty()))
        .unwrap_or_else(|| UNKNOWN_ITEM.to_string());

    let price = match analysis.price {
        Some(p) => format!("Price: ${:.2}.", p),
        None => "Price: Not found.".to_string(),
    };
    let item_id = match &analysis.item_id {
        Some(id) => format!("Item ID: {}.", id),
        None => "Item ID: Not found.".to_string(),
    };
    let details = format!(
        "Sale detected with confidence {:.2}. Item: '{}'. {} {} Description found: {}.",
        confidence,
        item_name,
        price,
        item_id,
        if listing.description.is_some() { "Yes" } else { "No" }
    );

    Some(SaleRecord {
        item_id: analysis.item_id,
        item_name,
        price: analysis.price,
        description: listing.description,
        confidence,
        timestamp,
        needs_review: confidence < REVIEW_THRESHOLD,
        details,
    })
}

pub struct SaleAnalysisNode {
    gateway: Arc<dyn LlmGateway>,
    config: Arc<ConversationConfig>,
}

impl SaleAnalysisNode {
    pub fn new(gateway: Arc<dyn LlmGateway>, config: Arc<ConversationConfig>) -> Self {
        Self { gateway, config }
    }
}

#[async_trait]
impl Node<ConversationState, ConversationRoute> for SaleAnalysisNode {
    fn id(&self) -> ConversationNode {
        ConversationNode::AnalyzeSale
    }

    async fn run(
        &self,
        state: &ConversationState,
    ) -> Result<NodeOutput<ConversationState, ConversationRoute>, AgentError> {
        let no_sale = || NodeOutput::new(ConversationUpdate::default(), ConversationRoute::SaleAnalyzed);
        if state.messages.len() < MIN_MESSAGES_FOR_SALE {
            tracing::debug!("too few messages to analyze for a sale");
            return Ok(no_sale());
        }

        let recent = state.recent_messages(ANALYSIS_WINDOW);
        let analysis: SaleAnalysis = match invoke_structured(
            self.gateway.as_ref(),
            prompt::sale_analysis(recent),
            CallParams::new(&self.config.chat_model),
        )
        .await
        {
            Ok(analysis) => analysis,
            Err(e) => {
                tracing::warn!(error = %e, "sale analysis failed; assuming no sale");
                return Ok(no_sale());
            }
        };

        match sale_record(analysis, &state.messages, Utc::now()) {
            Some(sale) => {
                tracing::info!(
                    item = %sale.item_name,
                    confidence = sale.confidence,
                    needs_review = sale.needs_review,
                    "{}",
                    sale.details
                );
                let update = ConversationUpdate {
                    sale: Some(Some(sale)),
                    ..Default::default()
                };
                Ok(NodeOutput::new(update, ConversationRoute::SaleAnalyzed))
            }
            None => {
                tracing::debug!("no sale detected");
                Ok(no_sale())
            }
        }
    }
}
