//! LLM gateway seam.
//!
//! Nodes depend on [`LlmGateway`] instead of a vendor client. Two call shapes:
//!
//! * **Structured**: prompt in, JSON object matching a named schema out. Typed through
//!   [`StructuredOutput`] and [`invoke_structured`].
//! * **Chat**: message list (plus optional tool specs) in, assistant text and tool calls out.
//!   Used by the conversation agents.
//!
//! Vendor adapters live outside this crate. [`MockGateway`] scripts replies for tests;
//! [`RetryingGateway`] wraps any gateway with a [`RetryPolicy`] for transient failures.

mod mock;
mod retry;

pub use mock::MockGateway;
pub use retry::{RetryPolicy, RetryingGateway};

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::message::{Message, ToolCall};
use crate::tool_source::ToolSpec;

/// Gateway failure.
#[derive(Debug, Clone, Error)]
pub enum GatewayError {
    /// Timeouts, rate limits, connection resets: worth retrying.
    #[error("transient gateway error: {0}")]
    Transient(String),
    /// Auth, quota, bad request: retrying will not help.
    #[error("permanent gateway error: {0}")]
    Permanent(String),
    /// The reply did not match the requested schema.
    #[error("output for schema {schema} did not parse: {message}")]
    InvalidOutput { schema: String, message: String },
}

impl GatewayError {
    pub fn is_transient(&self) -> bool {
        matches!(self, GatewayError::Transient(_))
    }
}

/// A record type the model is asked to produce.
pub trait StructuredOutput: DeserializeOwned + Send {
    /// Schema name; also the key `MockGateway` scripts replies under.
    const SCHEMA_NAME: &'static str;

    /// JSON Schema of the expected object.
    fn json_schema() -> Value;
}

/// Model, sampling and vendor-specific parameters for one call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallParams {
    pub model: String,
    pub temperature: f32,
    /// Passed through verbatim (e.g. `top_p`).
    #[serde(default)]
    pub extra: Map<String, Value>,
}

impl CallParams {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            temperature: 0.0,
            extra: Map::new(),
        }
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn extra(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }
}

/// Structured call: prompt plus the schema the reply must satisfy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuredRequest {
    pub schema_name: String,
    pub json_schema: Value,
    pub prompt: String,
    pub params: CallParams,
}

impl StructuredRequest {
    pub fn for_output<T: StructuredOutput>(prompt: impl Into<String>, params: CallParams) -> Self {
        Self {
            schema_name: T::SCHEMA_NAME.to_string(),
            json_schema: T::json_schema(),
            prompt: prompt.into(),
            params,
        }
    }
}

/// Chat call. `tag` names the caller (e.g. `"seller"`) for logs and scripted mocks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub tag: String,
    pub messages: Vec<Message>,
    #[serde(default)]
    pub tools: Vec<ToolSpec>,
    pub params: CallParams,
}

/// Chat reply: assistant text and any tool calls it requested.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LlmResponse {
    pub content: String,
    #[serde(default)]
    pub tool_calls: Vec<ToolCall>,
}

impl LlmResponse {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            tool_calls: Vec::new(),
        }
    }

    pub fn with_tool_calls(content: impl Into<String>, tool_calls: Vec<ToolCall>) -> Self {
        Self {
            content: content.into(),
            tool_calls,
        }
    }
}

/// LLM access used by every node.
///
/// **Interaction**: Held as `Arc<dyn LlmGateway>` by plan and conversation nodes.
#[async_trait]
pub trait LlmGateway: Send + Sync {
    /// Returns a JSON object satisfying `request.json_schema`.
    async fn invoke_structured(&self, request: StructuredRequest) -> Result<Value, GatewayError>;

    async fn chat(&self, request: ChatRequest) -> Result<LlmResponse, GatewayError>;
}

/// Typed structured call: builds the request for `T`, parses the reply into `T`.
pub async fn invoke_structured<T: StructuredOutput>(
    gateway: &dyn LlmGateway,
    prompt: impl Into<String>,
    params: CallParams,
) -> Result<T, GatewayError> {
    let request = StructuredRequest::for_output::<T>(prompt, params);
    let value = gateway.invoke_structured(request).await?;
    serde_json::from_value(value).map_err(|e| GatewayError::InvalidOutput {
        schema: T::SCHEMA_NAME.to_string(),
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Verdict {
        ok: bool,
    }

    impl StructuredOutput for Verdict {
        const SCHEMA_NAME: &'static str = "verdict";
        fn json_schema() -> Value {
            json!({"type": "object", "properties": {"ok": {"type": "boolean"}}, "required": ["ok"]})
        }
    }

    /// **Scenario**: A well-formed reply parses into the typed record; the request carries the schema.
    #[tokio::test]
    async fn invoke_structured_parses_reply() {
        let gateway = MockGateway::new().with_structured("verdict", json!({"ok": true}));
        let params = CallParams::new("m").temperature(0.8).extra("top_p", json!(0.1));
        let v: Verdict = invoke_structured(&gateway, "judge", params).await.unwrap();
        assert_eq!(v, Verdict { ok: true });
        let req = &gateway.structured_requests("verdict")[0];
        assert_eq!(req.json_schema["required"][0], "ok");
        assert_eq!(req.params.extra.get("top_p"), Some(&json!(0.1)));
        assert_eq!(req.params.temperature, 0.8);
    }

    /// **Scenario**: A reply that does not match the schema is InvalidOutput naming the schema.
    #[tokio::test]
    async fn invoke_structured_rejects_mismatched_reply() {
        let gateway = MockGateway::new().with_structured("verdict", json!({"ok": "maybe"}));
        let err = invoke_structured::<Verdict>(&gateway, "judge", CallParams::new("m"))
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::InvalidOutput { ref schema, .. } if schema == "verdict"));
        assert!(!err.is_transient());
    }
}
