//! Mock ToolSource for tests: fixed outputs per tool name, every call recorded.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use serde_json::Value;

use super::{seller_tool_specs, ToolSource, ToolSourceError, ToolSpec};

/// Mock tool source. Unknown tools fail with `NotFound`; listed tools without a scripted
/// output fail with `Backend`.
pub struct MockToolSource {
    specs: Vec<ToolSpec>,
    outputs: HashMap<String, String>,
    calls: Mutex<Vec<(String, Value)>>,
}

impl MockToolSource {
    /// Lists the seller tools with no outputs scripted.
    pub fn seller_tools() -> Self {
        Self {
            specs: seller_tool_specs(),
            outputs: HashMap::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_output(mut self, tool: impl Into<String>, output: impl Into<String>) -> Self {
        self.outputs.insert(tool.into(), output.into());
        self
    }

    /// Calls received, as (tool name, arguments).
    pub fn calls(&self) -> Vec<(String, Value)> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl ToolSource for MockToolSource {
    async fn list_tools(&self) -> Result<Vec<ToolSpec>, ToolSourceError> {
        Ok(self.specs.clone())
    }

    async fn call_tool(&self, name: &str, arguments: Value) -> Result<String, ToolSourceError> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((name.to_string(), arguments));
        if !self.specs.iter().any(|s| s.name == name) {
            return Err(ToolSourceError::NotFound(name.to_string()));
        }
        self.outputs
            .get(name)
            .cloned()
            .ok_or_else(|| ToolSourceError::Backend(format!("no output scripted for {}", name)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tool_source::{TOOL_ITEM_QUESTION, TOOL_PRODUCT_SEARCH};
    use serde_json::json;

    #[tokio::test]
    async fn returns_scripted_output_and_records_call() {
        let tools = MockToolSource::seller_tools().with_output(TOOL_PRODUCT_SEARCH, "1 result");
        let out = tools
            .call_tool(TOOL_PRODUCT_SEARCH, json!({"query": "faucet"}))
            .await
            .unwrap();
        assert_eq!(out, "1 result");
        assert_eq!(tools.calls()[0].1["query"], "faucet");
    }

    #[tokio::test]
    async fn unknown_and_unscripted_tools_fail() {
        let tools = MockToolSource::seller_tools();
        assert!(matches!(
            tools.call_tool("weather", json!({})).await,
            Err(ToolSourceError::NotFound(_))
        ));
        assert!(matches!(
            tools.call_tool(TOOL_ITEM_QUESTION, json!({})).await,
            Err(ToolSourceError::Backend(_))
        ));
        assert_eq!(tools.list_tools().await.unwrap().len(), 2);
    }
}
