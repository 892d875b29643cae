//! Summarize node: condense the aggregate assumptions once they grow.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::AgentError;
use crate::graph::{Node, NodeOutput};
use crate::llm::{invoke_structured, CallParams, LlmGateway};

use super::config::PlanConfig;
use super::prompt::{self, NO_STEPS_YET};
use super::route::{PlanNode, PlanRoute};
use super::state::{Assumptions, Plan, PlanUpdate};

/// List length at which summarization kicks in.
pub const SUMMARIZE_MIN_ENTRIES: usize = 3;

/// True when either list has at least `min` entries.
pub fn should_summarize(assumptions: &Assumptions, min: usize) -> bool {
    assumptions.ground_truth.len() >= min || assumptions.vulnerabilities.len() >= min
}

pub struct SummarizeNode {
    gateway: Arc<dyn LlmGateway>,
    config: Arc<PlanConfig>,
}

impl SummarizeNode {
    pub fn new(gateway: Arc<dyn LlmGateway>, config: Arc<PlanConfig>) -> Self {
        Self { gateway, config }
    }
}

#[async_trait]
impl Node<Plan, PlanRoute> for SummarizeNode {
    fn id(&self) -> PlanNode {
        PlanNode::Summarize
    }

    async fn run(&self, state: &Plan) -> Result<NodeOutput<Plan, PlanRoute>, AgentError> {
        let current = &state.cumulative_assumptions;
        if !should_summarize(current, SUMMARIZE_MIN_ENTRIES) {
            return Ok(NodeOutput::new(PlanUpdate::default(), PlanRoute::Summarized));
        }
        let last_idea = state
            .step_history
            .last()
            .map_or(NO_STEPS_YET, |s| s.idea.as_str());
        let summary: Assumptions = invoke_structured(
            self.gateway.as_ref(),
            prompt::summarize(current, last_idea),
            CallParams::new(&self.config.thinking_model),
        )
        .await?;
        tracing::debug!(
            truths_before = current.ground_truth.len(),
            truths_after = summary.ground_truth.len(),
            vulnerabilities_before = current.vulnerabilities.len(),
            vulnerabilities_after = summary.vulnerabilities.len(),
            "assumptions summarized"
        );
        let update = PlanUpdate {
            cumulative_assumptions: Some(summary),
            ..Default::default()
        };
        Ok(NodeOutput::new(update, PlanRoute::Summarized))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("s{}", i)).collect()
    }

    /// **Scenario**: (3, 0) triggers, (2, 2) does not, (0, 3) triggers.
    #[test]
    fn threshold_is_either_list() {
        assert!(should_summarize(&Assumptions::new(strings(3), strings(0)), 3));
        assert!(!should_summarize(&Assumptions::new(strings(2), strings(2)), 3));
        assert!(should_summarize(&Assumptions::new(strings(0), strings(3)), 3));
        assert!(!should_summarize(&Assumptions::default(), 3));
    }
}
