//! Plan state: the single record threaded through a planning run.
//!
//! Histories only grow, `cumulative_assumptions` is replaced wholesale each round, budget and
//! time only go down, and `final_outcome` is written once by the node that ends the run.
//! `plan_id` and `goal_state` are not part of [`PlanUpdate`], so no node can change them.

use serde::{Deserialize, Serialize};

use crate::channels::GraphState;
use crate::error::AgentError;
use crate::state_update;

/// Facts believed true and known weaknesses of the plan so far.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Assumptions {
    #[serde(default)]
    pub ground_truth: Vec<String>,
    #[serde(default)]
    pub vulnerabilities: Vec<String>,
}

impl Assumptions {
    pub fn new(ground_truth: Vec<String>, vulnerabilities: Vec<String>) -> Self {
        Self {
            ground_truth,
            vulnerabilities,
        }
    }

    /// Union by concatenation with what an outcome revealed; duplicates are kept.
    pub fn merged_with(&self, outcome: &Outcome) -> Assumptions {
        let mut merged = self.clone();
        merged.ground_truth.extend(outcome.new_truths.iter().cloned());
        merged
            .vulnerabilities
            .extend(outcome.new_vulnerabilities.iter().cloned());
        merged
    }
}

/// Goal text plus the assumptions it was stated under.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputState {
    pub goal: String,
    #[serde(default)]
    pub assumptions: Assumptions,
}

impl InputState {
    pub fn new(goal: impl Into<String>, assumptions: Assumptions) -> Self {
        Self {
            goal: goal.into(),
            assumptions,
        }
    }
}

/// One proposed step and the prerequisites it relies on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NextStep {
    pub idea: String,
    #[serde(default)]
    pub assumptions: Vec<String>,
}

/// What executing a step revealed and what it cost.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Outcome {
    #[serde(default)]
    pub new_truths: Vec<String>,
    #[serde(default)]
    pub new_vulnerabilities: Vec<String>,
    pub cost_increment: f64,
    pub time_increment: f64,
}

impl Outcome {
    /// Clamps negative (or NaN) increments to zero so resources never grow back.
    pub fn normalized(mut self) -> Self {
        if !(self.cost_increment >= 0.0) {
            tracing::warn!(cost_increment = self.cost_increment, "negative cost increment clamped to 0");
            self.cost_increment = 0.0;
        }
        if !(self.time_increment >= 0.0) {
            tracing::warn!(time_increment = self.time_increment, "negative time increment clamped to 0");
            self.time_increment = 0.0;
        }
        self
    }
}

/// Single-token record of one routing decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoundResult {
    #[serde(rename = "success")]
    Success,
    #[serde(rename = "failure")]
    Failure,
    #[serde(rename = "yes")]
    GoalAchieved,
    #[serde(rename = "no")]
    GoalNotAchieved,
    #[serde(rename = "abandon")]
    Abandon,
    #[serde(rename = "press on")]
    PressOn,
}

impl RoundResult {
    pub fn token(self) -> &'static str {
        match self {
            RoundResult::Success => "success",
            RoundResult::Failure => "failure",
            RoundResult::GoalAchieved => "yes",
            RoundResult::GoalNotAchieved => "no",
            RoundResult::Abandon => "abandon",
            RoundResult::PressOn => "press on",
        }
    }
}

/// How a completed run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Terminal {
    GoalAchieved,
    Abandoned,
}

/// Written by GoalCheck or AbandonCheck when it routes to END.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinalOutcome {
    pub verdict: Terminal,
    /// 1-based round in which the run ended.
    pub round: usize,
    pub last_outcome: Option<Outcome>,
}

/// Planning run state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    pub plan_id: String,
    pub goal_state: InputState,
    pub input_state_history: Vec<InputState>,
    pub step_history: Vec<NextStep>,
    pub outcome_history: Vec<Outcome>,
    pub cumulative_assumptions: Assumptions,
    pub round_result_history: Vec<RoundResult>,
    /// Remaining budget; may go negative.
    pub resource_budget: f64,
    /// Remaining time; may go negative.
    pub resource_time: f64,
    pub final_outcome: Option<FinalOutcome>,
}

state_update! {
    /// Partial update returned by plan nodes.
    pub struct PlanUpdate for Plan {
        append input_state_history: Vec<InputState>,
        append step_history: Vec<NextStep>,
        append outcome_history: Vec<Outcome>,
        replace cumulative_assumptions: Assumptions,
        append round_result_history: Vec<RoundResult>,
        replace resource_budget: f64,
        replace resource_time: f64,
        set_once final_outcome: Option<FinalOutcome>,
    }
}

impl GraphState for Plan {
    type Update = PlanUpdate;
}

impl Plan {
    /// New plan with a random id. The goal history holds the initial goal, other histories
    /// start empty, and the aggregate assumptions start as the goal's seed assumptions.
    pub fn new(goal_state: InputState, resource_budget: f64, resource_time: f64) -> Self {
        Self::with_id(
            uuid::Uuid::new_v4().to_string(),
            goal_state,
            resource_budget,
            resource_time,
        )
    }

    pub fn with_id(
        plan_id: impl Into<String>,
        goal_state: InputState,
        resource_budget: f64,
        resource_time: f64,
    ) -> Self {
        Self {
            plan_id: plan_id.into(),
            cumulative_assumptions: goal_state.assumptions.clone(),
            input_state_history: vec![goal_state.clone()],
            goal_state,
            step_history: Vec::new(),
            outcome_history: Vec::new(),
            round_result_history: Vec::new(),
            resource_budget,
            resource_time,
            final_outcome: None,
        }
    }

    /// Latest goal statement: the last input-state entry, else the original goal.
    pub fn current_input(&self) -> &InputState {
        self.input_state_history.last().unwrap_or(&self.goal_state)
    }

    /// 1-based index of the round whose idea is generated next.
    pub fn next_round_index(&self) -> usize {
        self.step_history.len() + 1
    }

    /// 1-based index of the round in progress (the one whose idea was generated last).
    pub fn current_round_index(&self) -> usize {
        self.step_history.len().max(1)
    }

    pub fn last_step(&self) -> Result<&NextStep, AgentError> {
        self.step_history.last().ok_or_else(|| {
            AgentError::ContractViolation("step_history is empty; no idea has been generated".into())
        })
    }

    pub fn last_outcome(&self) -> Option<&Outcome> {
        self.outcome_history.last()
    }

    /// Ideas of the last `n` steps, oldest first.
    pub fn recent_ideas(&self, n: usize) -> Vec<&str> {
        let start = self.step_history.len().saturating_sub(n);
        self.step_history[start..]
            .iter()
            .map(|s| s.idea.as_str())
            .collect()
    }

    /// Last `n` aggregate ground truths, oldest first.
    pub fn recent_truths(&self, n: usize) -> &[String] {
        let truths = &self.cumulative_assumptions.ground_truth;
        &truths[truths.len().saturating_sub(n)..]
    }

    pub fn previous_ideas(&self) -> Vec<&str> {
        self.step_history.iter().map(|s| s.idea.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channels::{MergePolicy, StateUpdate};

    fn plan() -> Plan {
        Plan::with_id(
            "p1",
            InputState::new(
                "Fix the faucet",
                Assumptions::new(vec!["water is on".into()], vec![]),
            ),
            100.0,
            1.0,
        )
    }

    fn step(idea: &str) -> NextStep {
        NextStep {
            idea: idea.into(),
            assumptions: vec![],
        }
    }

    /// **Scenario**: A new plan records only its goal and uses the seed assumptions as its aggregate.
    #[test]
    fn new_plan_records_only_its_goal() {
        let p = plan();
        assert!(p.step_history.is_empty() && p.outcome_history.is_empty());
        assert!(p.round_result_history.is_empty() && p.final_outcome.is_none());
        assert_eq!(p.input_state_history, [p.goal_state.clone()]);
        assert_eq!(p.cumulative_assumptions.ground_truth, ["water is on"]);
        assert_eq!(p.current_input().goal, "Fix the faucet");
        assert_eq!(p.next_round_index(), 1);
        assert!(!Plan::new(p.goal_state.clone(), 1.0, 1.0).plan_id.is_empty());
    }

    /// **Scenario**: Reading the last step of an empty history is a contract violation.
    #[test]
    fn last_step_on_empty_history_is_contract_violation() {
        assert!(matches!(plan().last_step(), Err(AgentError::ContractViolation(_))));
    }

    /// **Scenario**: Merge policies per field: histories append, aggregates replace.
    #[test]
    fn plan_update_schema() {
        assert_eq!(PlanUpdate::policy_of("step_history"), Some(MergePolicy::Append));
        assert_eq!(
            PlanUpdate::policy_of("cumulative_assumptions"),
            Some(MergePolicy::Replace)
        );
        assert_eq!(PlanUpdate::policy_of("final_outcome"), Some(MergePolicy::SetOnce));
        assert_eq!(PlanUpdate::policy_of("plan_id"), None);
        assert_eq!(PlanUpdate::policy_of("goal_state"), None);
    }

    #[test]
    fn recent_windows() {
        let mut p = plan();
        PlanUpdate {
            step_history: Some(vec![step("a"), step("b"), step("c"), step("d")]),
            cumulative_assumptions: Some(Assumptions::new(
                vec!["t1".into(), "t2".into(), "t3".into()],
                vec![],
            )),
            ..Default::default()
        }
        .apply_to(&mut p);
        assert_eq!(p.recent_ideas(3), ["b", "c", "d"]);
        assert_eq!(p.recent_truths(2), ["t2", "t3"]);
        assert_eq!(p.recent_ideas(10).len(), 4);
        assert_eq!(p.next_round_index(), 5);
        assert_eq!(p.last_step().unwrap().idea, "d");
    }

    /// **Scenario**: Outcome merge concatenates, keeping duplicates and order.
    #[test]
    fn assumptions_merge_is_concatenation() {
        let base = Assumptions::new(vec!["a".into()], vec!["v".into()]);
        let outcome = Outcome {
            new_truths: vec!["a".into(), "b".into()],
            new_vulnerabilities: vec![],
            cost_increment: 1.0,
            time_increment: 0.1,
        };
        let merged = base.merged_with(&outcome);
        assert_eq!(merged.ground_truth, ["a", "a", "b"]);
        assert_eq!(merged.vulnerabilities, ["v"]);
    }

    #[test]
    fn negative_increments_are_clamped() {
        let o = Outcome {
            new_truths: vec![],
            new_vulnerabilities: vec![],
            cost_increment: -5.0,
            time_increment: f64::NAN,
        }
        .normalized();
        assert_eq!(o.cost_increment, 0.0);
        assert_eq!(o.time_increment, 0.0);
    }

    #[test]
    fn round_result_tokens_match_serde() {
        for r in [
            RoundResult::Success,
            RoundResult::Failure,
            RoundResult::GoalAchieved,
            RoundResult::GoalNotAchieved,
            RoundResult::Abandon,
            RoundResult::PressOn,
        ] {
            assert_eq!(serde_json::to_value(r).unwrap(), r.token());
        }
    }
}
