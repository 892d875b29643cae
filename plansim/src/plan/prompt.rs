//! Prompt text for the planning nodes.

use super::config::PlanConfig;
use super::state::{Assumptions, NextStep, Plan};

/// Ideas shown to the goal and abandon checks.
pub const RECENT_IDEAS: usize = 3;
/// Aggregate ground truths shown to the goal and abandon checks.
pub const RECENT_TRUTHS: usize = 2;

/// Placeholder for summarization before any step exists.
pub const NO_STEPS_YET: &str = "No steps taken yet.";

fn bullets(items: &[impl AsRef<str>]) -> String {
    if items.is_empty() {
        return "- (none)".to_string();
    }
    items
        .iter()
        .map(|s| format!("- {}", s.as_ref()))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn generate_idea(plan: &Plan, config: &PlanConfig) -> String {
    let aggregate = &plan.cumulative_assumptions;
    format!(
        "You are planning toward a goal in the domain of {topic}.\n\n\
         Goal: {goal}\n\
         Remaining budget: {budget}\n\
         Remaining time: {time}\n\n\
         What we believe to be true:\n{truths}\n\n\
         Known vulnerabilities of the plan:\n{vulns}\n\n\
         Steps already tried:\n{previous}\n\n\
         Propose the single next step. It must differ from the steps already tried. \
         List the assumptions the step relies on.",
        topic = config.topic_label(),
        goal = plan.current_input().goal,
        budget = plan.resource_budget,
        time = plan.resource_time,
        truths = bullets(&aggregate.ground_truth),
        vulns = bullets(&aggregate.vulnerabilities),
        previous = bullets(&plan.previous_ideas()),
    )
}

/// Step with its declared prerequisites.
fn step_block(step: &NextStep) -> String {
    format!(
        "Proposed step: {idea}\n\
         The step assumes:\n{assumptions}",
        idea = step.idea,
        assumptions = bullets(&step.assumptions),
    )
}

pub fn decide(plan: &Plan, step: &NextStep, config: &PlanConfig) -> String {
    let aggregate = &plan.cumulative_assumptions;
    format!(
        "You are judging a plan in the domain of {topic}.\n\n\
         Goal: {goal}\n\
         Remaining budget: {budget}\n\
         Remaining time: {time}\n\n\
         What we believe to be true:\n{truths}\n\n\
         Known vulnerabilities:\n{vulns}\n\n\
         {step}\n\n\
         Imagine the step is carried out. Decide whether it succeeds or fails and give a \
         short reason. Answer \"success\" or \"failure\".",
        topic = config.topic_label(),
        goal = plan.current_input().goal,
        budget = plan.resource_budget,
        time = plan.resource_time,
        truths = bullets(&aggregate.ground_truth),
        vulns = bullets(&aggregate.vulnerabilities),
        step = step_block(step),
    )
}

pub fn success_outcome(plan: &Plan, step: &NextStep, config: &PlanConfig) -> String {
    outcome(plan, step, config, "succeeded")
}

pub fn failure_outcome(plan: &Plan, step: &NextStep, config: &PlanConfig) -> String {
    outcome(plan, step, config, "failed")
}

fn outcome(plan: &Plan, step: &NextStep, config: &PlanConfig, verdict: &str) -> String {
    let aggregate = &plan.cumulative_assumptions;
    format!(
        "You are predicting the result of a step in the domain of {topic}.\n\n\
         Goal: {goal}\n\
         Remaining budget: {budget}\n\
         Remaining time: {time}\n\n\
         What we believe to be true:\n{truths}\n\n\
         Known vulnerabilities:\n{vulns}\n\n\
         {step}\n\n\
         The step {verdict}. Describe what the attempt revealed: new truths, new \
         vulnerabilities, and the cost and time it consumed (non-negative numbers).",
        topic = config.topic_label(),
        goal = plan.current_input().goal,
        budget = plan.resource_budget,
        time = plan.resource_time,
        truths = bullets(&aggregate.ground_truth),
        vulns = bullets(&aggregate.vulnerabilities),
        step = step_block(step),
    )
}

fn recent_context(plan: &Plan) -> String {
    format!(
        "Goal: {goal}\n\
         Original ground truth:\n{seed}\n\n\
         Most recent steps:\n{ideas}\n\n\
         Most recent findings:\n{truths}",
        goal = plan.current_input().goal,
        seed = bullets(&plan.goal_state.assumptions.ground_truth),
        ideas = bullets(&plan.recent_ideas(RECENT_IDEAS)),
        truths = bullets(plan.recent_truths(RECENT_TRUTHS)),
    )
}

pub fn goal_check(plan: &Plan) -> String {
    format!(
        "{context}\n\nHas the goal been achieved? Answer \"yes\" or \"no\".",
        context = recent_context(plan),
    )
}

pub fn abandon_check(plan: &Plan) -> String {
    format!(
        "{context}\n\n\
         Remaining budget: {budget}\n\
         Remaining time: {time}\n\n\
         The last step failed. Should the plan be abandoned? Answer \"abandon\" or \"press on\".",
        context = recent_context(plan),
        budget = plan.resource_budget,
        time = plan.resource_time,
    )
}

pub fn summarize(assumptions: &Assumptions, last_idea: &str) -> String {
    format!(
        "The plan's current step is: {last_idea}\n\n\
         Ground truth:\n{truths}\n\n\
         Vulnerabilities:\n{vulns}\n\n\
         Condense both lists, keeping only what matters for the current step.",
        truths = bullets(&assumptions.ground_truth),
        vulns = bullets(&assumptions.vulnerabilities),
    )
}
