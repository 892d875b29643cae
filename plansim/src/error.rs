//! Node and run error types.
//!
//! Returned by `Node::run` and surfaced in `ExecutionStatus::Failed`. Collaborator
//! errors (gateway, persona files) convert with `?`.

use thiserror::Error;

use crate::conversation::PersonaError;
use crate::llm::GatewayError;

/// Node execution error. Any of these aborts the run.
#[derive(Debug, Error)]
pub enum AgentError {
    /// Execution failed with a message.
    #[error("execution failed: {0}")]
    ExecutionFailed(String),

    /// A required LLM call failed (Decide, outcomes, checks, triggered summarization).
    #[error("llm gateway: {0}")]
    Gateway(#[from] GatewayError),

    /// State required by a node is missing or a node broke the routing contract.
    #[error("contract violation: {0}")]
    ContractViolation(String),

    /// Persona prompt or index could not be resolved.
    #[error("persona: {0}")]
    Persona(#[from] PersonaError),
}
