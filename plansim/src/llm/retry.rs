//! Retry policies for gateway calls.
//!
//! Nodes never retry failed LLM calls themselves; wrapping the gateway in a
//! [`RetryingGateway`] retries transient failures below the graph.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use super::{ChatRequest, GatewayError, LlmGateway, LlmResponse, StructuredRequest};

/// How many times and with what delay to retry a failed call.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum RetryPolicy {
    /// Fail immediately.
    #[default]
    None,
    /// Constant delay between attempts.
    Fixed {
        max_attempts: usize,
        interval: Duration,
    },
    /// Delay grows by `multiplier` per attempt, capped at `max_interval`.
    Exponential {
        max_attempts: usize,
        initial_interval: Duration,
        max_interval: Duration,
        multiplier: f64,
    },
}

impl RetryPolicy {
    pub fn none() -> Self {
        RetryPolicy::None
    }

    pub fn fixed(max_attempts: usize, interval: Duration) -> Self {
        RetryPolicy::Fixed {
            max_attempts,
            interval,
        }
    }

    pub fn exponential(
        max_attempts: usize,
        initial_interval: Duration,
        max_interval: Duration,
        multiplier: f64,
    ) -> Self {
        RetryPolicy::Exponential {
            max_attempts,
            initial_interval,
            max_interval,
            multiplier,
        }
    }

    /// Whether retry number `attempt` (0-based) is allowed.
    pub fn should_retry(&self, attempt: usize) -> bool {
        attempt < self.max_attempts()
    }

    /// Delay before retry number `attempt`.
    pub fn delay(&self, attempt: usize) -> Duration {
        match self {
            RetryPolicy::None => Duration::ZERO,
            RetryPolicy::Fixed { interval, .. } => *interval,
            RetryPolicy::Exponential {
                initial_interval,
                max_interval,
                multiplier,
                ..
            } => {
                let secs = initial_interval.as_secs_f64() * multiplier.powi(attempt as i32);
                Duration::from_secs_f64(secs).min(*max_interval)
            }
        }
    }

    /// Retries allowed after the first attempt.
    pub fn max_attempts(&self) -> usize {
        match self {
            RetryPolicy::None => 0,
            RetryPolicy::Fixed { max_attempts, .. }
            | RetryPolicy::Exponential { max_attempts, .. } => *max_attempts,
        }
    }
}

/// Gateway decorator retrying [`GatewayError::Transient`] failures per policy.
pub struct RetryingGateway {
    inner: Arc<dyn LlmGateway>,
    policy: RetryPolicy,
}

impl RetryingGateway {
    pub fn new(inner: Arc<dyn LlmGateway>, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    async fn pause(&self, what: &str, attempt: usize, error: &GatewayError) {
        let delay = self.policy.delay(attempt);
        tracing::warn!(call = what, attempt = attempt + 1, ?delay, %error, "Retrying gateway call");
        if delay > Duration::ZERO {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl LlmGateway for RetryingGateway {
    async fn invoke_structured(&self, request: StructuredRequest) -> Result<Value, GatewayError> {
        let mut attempt = 0;
        loop {
            match self.inner.invoke_structured(request.clone()).await {
                Err(e) if e.is_transient() && self.policy.should_retry(attempt) => {
                    self.pause(&request.schema_name, attempt, &e).await;
                    attempt += 1;
                }
                other => return other,
            }
        }
    }

    async fn chat(&self, request: ChatRequest) -> Result<LlmResponse, GatewayError> {
        let mut attempt = 0;
        loop {
            match self.inner.chat(request.clone()).await {
                Err(e) if e.is_transient() && self.policy.should_retry(attempt) => {
                    self.pause(&request.tag, attempt, &e).await;
                    attempt += 1;
                }
                other => return other,
            }
        }
    }
}
