//! Structured records the plan nodes request from the model.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::llm::StructuredOutput;

use super::state::{Assumptions, NextStep, Outcome, RoundResult};

fn string_list() -> Value {
    json!({"type": "array", "items": {"type": "string"}})
}

fn assumptions_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "ground_truth": string_list(),
            "vulnerabilities": string_list()
        },
        "required": ["ground_truth", "vulnerabilities"]
    })
}

impl StructuredOutput for NextStep {
    const SCHEMA_NAME: &'static str = "next_step";

    fn json_schema() -> Value {
        json!({
            "type": "object",
            "properties": {
                "idea": {"type": "string"},
                "assumptions": string_list()
            },
            "required": ["idea", "assumptions"]
        })
    }
}

impl StructuredOutput for Outcome {
    const SCHEMA_NAME: &'static str = "outcome";

    fn json_schema() -> Value {
        json!({
            "type": "object",
            "properties": {
                "new_truths": string_list(),
                "new_vulnerabilities": string_list(),
                "cost_increment": {"type": "number", "minimum": 0},
                "time_increment": {"type": "number", "minimum": 0}
            },
            "required": ["new_truths", "new_vulnerabilities", "cost_increment", "time_increment"]
        })
    }
}

impl StructuredOutput for Assumptions {
    const SCHEMA_NAME: &'static str = "assumptions";

    fn json_schema() -> Value {
        assumptions_schema()
    }
}

/// Judged result of executing a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Success,
    Failure,
}

impl From<Decision> for RoundResult {
    fn from(d: Decision) -> Self {
        match d {
            Decision::Success => RoundResult::Success,
            Decision::Failure => RoundResult::Failure,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Decider {
    pub reason: String,
    pub decision: Decision,
}

impl StructuredOutput for Decider {
    const SCHEMA_NAME: &'static str = "decision";

    fn json_schema() -> Value {
        json!({
            "type": "object",
            "properties": {
                "reason": {"type": "string"},
                "decision": {"type": "string", "enum": ["success", "failure"]}
            },
            "required": ["reason", "decision"]
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Achieved {
    Yes,
    No,
}

impl From<Achieved> for RoundResult {
    fn from(a: Achieved) -> Self {
        match a {
            Achieved::Yes => RoundResult::GoalAchieved,
            Achieved::No => RoundResult::GoalNotAchieved,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GoalVerdict {
    pub achieved: Achieved,
}

impl StructuredOutput for GoalVerdict {
    const SCHEMA_NAME: &'static str = "goal_check";

    fn json_schema() -> Value {
        json!({
            "type": "object",
            "properties": {"achieved": {"type": "string", "enum": ["yes", "no"]}},
            "required": ["achieved"]
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AbandonChoice {
    #[serde(rename = "abandon")]
    Abandon,
    #[serde(rename = "press on")]
    PressOn,
}

impl From<AbandonChoice> for RoundResult {
    fn from(c: AbandonChoice) -> Self {
        match c {
            AbandonChoice::Abandon => RoundResult::Abandon,
            AbandonChoice::PressOn => RoundResult::PressOn,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AbandonVerdict {
    pub abandon: AbandonChoice,
}

impl StructuredOutput for AbandonVerdict {
    const SCHEMA_NAME: &'static str = "abandon_check";

    fn json_schema() -> Value {
        json!({
            "type": "object",
            "properties": {"abandon": {"type": "string", "enum": ["abandon", "press on"]}},
            "required": ["abandon"]
        })
    }
}
