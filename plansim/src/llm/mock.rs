//! Scripted gateway for tests and offline runs.
//!
//! Structured replies are scripted per schema name, chat replies per request tag. Each key
//! holds a queue consumed in order, then an optional default repeated forever. Every request
//! is recorded so tests can count calls and inspect prompts.

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use serde_json::Value;

use super::{ChatRequest, GatewayError, LlmGateway, LlmResponse, StructuredRequest};

struct Script<T> {
    queue: VecDeque<Result<T, GatewayError>>,
    default: Option<T>,
}

impl<T> Default for Script<T> {
    fn default() -> Self {
        Self {
            queue: VecDeque::new(),
            default: None,
        }
    }
}

impl<T: Clone> Script<T> {
    fn next(&mut self) -> Option<Result<T, GatewayError>> {
        self.queue
            .pop_front()
            .or_else(|| self.default.clone().map(Ok))
    }
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Mock LLM gateway.
///
/// **Interaction**: Implements `LlmGateway`; pass as `Arc<dyn LlmGateway>` to runners.
#[derive(Default)]
pub struct MockGateway {
    structured: Mutex<HashMap<String, Script<Value>>>,
    chat: Mutex<HashMap<String, Script<LlmResponse>>>,
    structured_log: Mutex<Vec<StructuredRequest>>,
    chat_log: Mutex<Vec<ChatRequest>>,
}

impl MockGateway {
    pub fn new() -> Self {
        Self::default()
    }

    fn push_structured(self, schema: &str, item: Result<Value, GatewayError>) -> Self {
        lock(&self.structured)
            .entry(schema.to_string())
            .or_default()
            .queue
            .push_back(item);
        self
    }

    fn push_chat(self, tag: &str, item: Result<LlmResponse, GatewayError>) -> Self {
        lock(&self.chat)
            .entry(tag.to_string())
            .or_default()
            .queue
            .push_back(item);
        self
    }

    /// Queues one reply for `schema`.
    pub fn with_structured(self, schema: &str, value: Value) -> Self {
        self.push_structured(schema, Ok(value))
    }

    /// Queues one failure for `schema`.
    pub fn with_structured_error(self, schema: &str, error: GatewayError) -> Self {
        self.push_structured(schema, Err(error))
    }

    /// Reply for `schema` once its queue is empty.
    pub fn with_default_structured(self, schema: &str, value: Value) -> Self {
        lock(&self.structured)
            .entry(schema.to_string())
            .or_default()
            .default = Some(value);
        self
    }

    pub fn with_chat(self, tag: &str, response: LlmResponse) -> Self {
        self.push_chat(tag, Ok(response))
    }

    pub fn with_chat_error(self, tag: &str, error: GatewayError) -> Self {
        self.push_chat(tag, Err(error))
    }

    pub fn with_default_chat(self, tag: &str, response: LlmResponse) -> Self {
        lock(&self.chat).entry(tag.to_string()).or_default().default = Some(response);
        self
    }

    /// Structured calls made for `schema`, in order.
    pub fn structured_requests(&self, schema: &str) -> Vec<StructuredRequest> {
        lock(&self.structured_log)
            .iter()
            .filter(|r| r.schema_name == schema)
            .cloned()
            .collect()
    }

    pub fn structured_calls(&self, schema: &str) -> usize {
        lock(&self.structured_log)
            .iter()
            .filter(|r| r.schema_name == schema)
            .count()
    }

    /// Chat calls made with `tag`, in order.
    pub fn chat_requests(&self, tag: &str) -> Vec<ChatRequest> {
        lock(&self.chat_log)
            .iter()
            .filter(|r| r.tag == tag)
            .cloned()
            .collect()
    }

    pub fn chat_calls(&self, tag: &str) -> usize {
        lock(&self.chat_log).iter().filter(|r| r.tag == tag).count()
    }
}

#[async_trait]
impl LlmGateway for MockGateway {
    async fn invoke_structured(&self, request: StructuredRequest) -> Result<Value, GatewayError> {
        let schema = request.schema_name.clone();
        lock(&self.structured_log).push(request);
        let reply = lock(&self.structured).get_mut(&schema).and_then(Script::next);
        reply.unwrap_or_else(|| {
            Err(GatewayError::Permanent(format!(
                "no scripted reply for schema {}",
                schema
            )))
        })
    }

    async fn chat(&self, request: ChatRequest) -> Result<LlmResponse, GatewayError> {
        let tag = request.tag.clone();
        lock(&self.chat_log).push(request);
        let reply = lock(&self.chat).get_mut(&tag).and_then(Script::next);
        reply.unwrap_or_else(|| {
            Err(GatewayError::Permanent(format!(
                "no scripted chat reply for {}",
                tag
            )))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::CallParams;
    use serde_json::json;

    fn request(schema: &str) -> StructuredRequest {
        StructuredRequest {
            schema_name: schema.into(),
            json_schema: json!({}),
            prompt: "p".into(),
            params: CallParams::new("m"),
        }
    }

    fn chat(tag: &str) -> ChatRequest {
        ChatRequest {
            tag: tag.into(),
            messages: vec![],
            tools: vec![],
            params: CallParams::new("m"),
        }
    }

    /// **Scenario**: Queue first, then default forever; calls are counted per schema.
    #[tokio::test]
    async fn structured_queue_then_default() {
        let mock = MockGateway::new()
            .with_structured("a", json!(1))
            .with_structured_error("a", GatewayError::Transient("busy".into()))
            .with_default_structured("a", json!(2));
        assert_eq!(mock.invoke_structured(request("a")).await.unwrap(), json!(1));
        assert!(mock.invoke_structured(request("a")).await.unwrap_err().is_transient());
        assert_eq!(mock.invoke_structured(request("a")).await.unwrap(), json!(2));
        assert_eq!(mock.invoke_structured(request("a")).await.unwrap(), json!(2));
        assert_eq!(mock.structured_calls("a"), 4);
        assert_eq!(mock.structured_calls("b"), 0);
    }

    /// **Scenario**: An unscripted schema or tag is a permanent error, still recorded.
    #[tokio::test]
    async fn unscripted_is_permanent_error() {
        let mock = MockGateway::new();
        let err = mock.invoke_structured(request("x")).await.unwrap_err();
        assert!(matches!(err, GatewayError::Permanent(_)));
        let err = mock.chat(chat("seller")).await.unwrap_err();
        assert!(matches!(err, GatewayError::Permanent(_)));
        assert_eq!(mock.chat_calls("seller"), 1);
    }

    #[tokio::test]
    async fn chat_scripts_are_per_tag() {
        let mock = MockGateway::new()
            .with_chat("seller", LlmResponse::text("welcome"))
            .with_default_chat("buyer", LlmResponse::text("hmm"));
        assert_eq!(mock.chat(chat("buyer")).await.unwrap().content, "hmm");
        assert_eq!(mock.chat(chat("seller")).await.unwrap().content, "welcome");
        assert_eq!(mock.chat_requests("buyer").len(), 1);
    }
}
