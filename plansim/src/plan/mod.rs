//! Plan simulator: an LLM proposes, judges and evolves steps toward a goal under budget and
//! time constraints.
//!
//! Each round generates a novel idea, decides whether it succeeds, records the outcome, then
//! either checks the goal (success) or considers abandoning (failure). Rounds that continue
//! pass through summarization, which condenses the aggregate assumptions once they grow.

mod abandon_check_node;
mod config;
mod decide_node;
mod generate_idea_node;
mod goal_check_node;
mod outcome_node;
mod prompt;
mod route;
mod runner;
mod schema;
mod state;
mod summarize_node;

pub use abandon_check_node::AbandonCheckNode;
pub use config::{
    NoveltyScope, PlanConfig, DEFAULT_MAX_ROUNDS, DEFAULT_NOVELTY_THRESHOLD,
    DEFAULT_THINKING_MODEL, DEFAULT_TOPIC,
};
pub use decide_node::DecideNode;
pub use generate_idea_node::{GenerateIdeaNode, MAX_IDEA_RETRIES};
pub use goal_check_node::GoalCheckNode;
pub use outcome_node::{Branch, OutcomeNode};
pub use route::{PlanNode, PlanRoute};
pub use runner::{build_plan_graph, PlanRunResult, PlanRunner, PlanTermination};
pub use schema::{
    AbandonChoice, AbandonVerdict, Achieved, Decider, Decision, GoalVerdict,
};
pub use state::{
    Assumptions, FinalOutcome, InputState, NextStep, Outcome, Plan, PlanUpdate, RoundResult,
    Terminal,
};
pub use summarize_node::{should_summarize, SummarizeNode, SUMMARIZE_MIN_ENTRIES};
