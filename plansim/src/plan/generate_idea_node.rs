//! GenerateIdea node: ask for the next step until the novelty store accepts one.
//!
//! Up to [`MAX_IDEA_RETRIES`] attempts with an identical prompt. Each candidate is checked
//! against the novelty bucket of the round about to start; a non-novel candidate is logged
//! and retried. When every attempt is rejected the last candidate is accepted anyway. The
//! accepted idea is added to the store exactly once per round, after the loop.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use crate::error::AgentError;
use crate::graph::{Node, NodeOutput};
use crate::llm::{invoke_structured, CallParams, GatewayError, LlmGateway};
use crate::memory::NoveltyStore;

use super::config::PlanConfig;
use super::prompt;
use super::route::{PlanNode, PlanRoute};
use super::state::{NextStep, Plan, PlanUpdate};

/// Attempts per round before a non-novel idea is accepted.
pub const MAX_IDEA_RETRIES: usize = 5;

const IDEA_TEMPERATURE: f32 = 0.8;
const IDEA_TOP_P: f64 = 0.1;

/// Proposes the round's step.
///
/// Appends the step. A failed attempt (gateway error) uses up one
/// attempt; the run fails only when no attempt produced an idea.
pub struct GenerateIdeaNode {
    gateway: Arc<dyn LlmGateway>,
    novelty: Arc<dyn NoveltyStore>,
    config: Arc<PlanConfig>,
}

impl GenerateIdeaNode {
    pub fn new(
        gateway: Arc<dyn LlmGateway>,
        novelty: Arc<dyn NoveltyStore>,
        config: Arc<PlanConfig>,
    ) -> Self {
        Self {
            gateway,
            novelty,
            config,
        }
    }

    fn params(&self) -> CallParams {
        CallParams::new(&self.config.thinking_model)
            .temperature(IDEA_TEMPERATURE)
            .extra("top_p", json!(IDEA_TOP_P))
    }
}

#[async_trait]
impl Node<Plan, PlanRoute> for GenerateIdeaNode {
    fn id(&self) -> PlanNode {
        PlanNode::GenerateIdea
    }

    async fn run(&self, state: &Plan) -> Result<NodeOutput<Plan, PlanRoute>, AgentError> {
        let round = state.next_round_index();
        let bucket = self.config.bucket(&state.plan_id, round);
        let prompt = prompt::generate_idea(state, &self.config);

        let mut accepted: Option<NextStep> = None;
        let mut last_error: Option<GatewayError> = None;
        for attempt in 1..=MAX_IDEA_RETRIES {
            let step: NextStep =
                match invoke_structured(self.gateway.as_ref(), prompt.clone(), self.params()).await
                {
                    Ok(step) => step,
                    Err(e) => {
                        tracing::warn!(round, attempt, error = %e, "idea generation failed");
                        last_error = Some(e);
                        continue;
                    }
                };
            let seen = match self
                .novelty
                .is_member(&step.idea, &bucket, self.config.novelty_threshold)
                .await
            {
                Ok(seen) => seen,
                Err(e) => {
                    tracing::warn!(round, attempt, error = %e, "novelty lookup failed; treating idea as seen");
                    true
                }
            };
            if !seen {
                accepted = Some(step);
                break;
            }
            tracing::warn!(round, attempt, idea = %step.idea, "idea is not novel");
            accepted = Some(step);
            if attempt == MAX_IDEA_RETRIES {
                tracing::warn!(round, "no novel idea after {} attempts; keeping the last one", MAX_IDEA_RETRIES);
            }
        }

        let Some(step) = accepted else {
            return Err(match last_error {
                Some(e) => AgentError::Gateway(e),
                None => AgentError::ExecutionFailed(format!(
                    "no idea generated for round {}",
                    round
                )),
            });
        };

        if let Err(e) = self.novelty.add(&step.idea, &bucket).await {
            tracing::warn!(round, bucket = %bucket, error = %e, "failed to record idea");
        }
        tracing::info!(plan_id = %state.plan_id, round, idea = %step.idea, "idea generated");

        let update = PlanUpdate {
            step_history: Some(vec![step]),
            ..Default::default()
        };
        Ok(NodeOutput::new(update, PlanRoute::IdeaGenerated))
    }
}
