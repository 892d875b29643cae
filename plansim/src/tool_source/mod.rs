//! Tool source abstraction: list tools and call a tool.
//!
//! The seller agent depends on `ToolSource` instead of a concrete marketplace client. The
//! production backend (product search, item questions) lives outside this crate;
//! [`MockToolSource`] serves tests and offline runs.

mod mock;

pub use mock::MockToolSource;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;

/// Product search tool name.
pub const TOOL_PRODUCT_SEARCH: &str = "ebay_search_tool";
/// Item detail tool name. Its output carries a `**Product Description:**` block.
pub const TOOL_ITEM_QUESTION: &str = "answer_item_question_tool";

/// Tool specification handed to the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSpec {
    pub name: String,
    pub description: Option<String>,
    /// JSON Schema for arguments.
    pub input_schema: Value,
}

/// Errors from listing or calling tools.
#[derive(Debug, Error)]
pub enum ToolSourceError {
    #[error("tool not found: {0}")]
    NotFound(String),
    #[error("invalid arguments: {0}")]
    InvalidInput(String),
    #[error("tool backend error: {0}")]
    Backend(String),
}

/// Tool source: list tools and call a tool.
///
/// **Interaction**: `SellerNode` binds `list_tools()` to its chat calls; `ToolNode` calls
/// `call_tool` for every tool call on the latest seller message.
#[async_trait]
pub trait ToolSource: Send + Sync {
    async fn list_tools(&self) -> Result<Vec<ToolSpec>, ToolSourceError>;

    /// Calls `name` with JSON arguments; returns the tool's text output.
    async fn call_tool(&self, name: &str, arguments: Value) -> Result<String, ToolSourceError>;
}

/// Specs of the two seller tools, shared by real and mock sources.
pub fn seller_tool_specs() -> Vec<ToolSpec> {
    vec![
        ToolSpec {
            name: TOOL_PRODUCT_SEARCH.to_string(),
            description: Some(
                "Search the marketplace for products matching a query, optionally within a price range."
                    .to_string(),
            ),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "query": {"type": "string"},
                    "min_price": {"type": "number"},
                    "max_price": {"type": "number"}
                },
                "required": ["query"]
            }),
        },
        ToolSpec {
            name: TOOL_ITEM_QUESTION.to_string(),
            description: Some(
                "Get the full description and details of a product by its item id.".to_string(),
            ),
            input_schema: json!({
                "type": "object",
                "properties": {"item_id": {"type": "string"}},
                "required": ["item_id"]
            }),
        },
    ]
}
