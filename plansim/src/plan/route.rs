//! Planning graph nodes and transition table.
//!
//! ```text
//! generate_idea -> decide -> success -> good_outcome -> goal_check   -> no       -> summarize -> generate_idea
//!                                                                    -> yes      -> END
//!                         -> failure -> bad_outcome  -> abandon_check -> press on -> summarize
//!                                                                    -> abandon  -> END
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::graph::{Next, Route};

use super::schema::{AbandonChoice, Achieved, Decision};
use super::state::Plan;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanNode {
    GenerateIdea,
    Decide,
    GoodOutcome,
    BadOutcome,
    GoalCheck,
    AbandonCheck,
    Summarize,
}

impl PlanNode {
    pub const ALL: [PlanNode; 7] = [
        PlanNode::GenerateIdea,
        PlanNode::Decide,
        PlanNode::GoodOutcome,
        PlanNode::BadOutcome,
        PlanNode::GoalCheck,
        PlanNode::AbandonCheck,
        PlanNode::Summarize,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            PlanNode::GenerateIdea => "generate_idea",
            PlanNode::Decide => "decide",
            PlanNode::GoodOutcome => "good_outcome",
            PlanNode::BadOutcome => "bad_outcome",
            PlanNode::GoalCheck => "goal_check",
            PlanNode::AbandonCheck => "abandon_check",
            PlanNode::Summarize => "summarize",
        }
    }
}

impl fmt::Display for PlanNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Route returned by each planning node. The variant names its node; the payload, if any,
/// is that node's decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanRoute {
    IdeaGenerated,
    Decided(Decision),
    SuccessRecorded,
    FailureRecorded,
    GoalChecked(Achieved),
    AbandonChecked(AbandonChoice),
    Summarized,
}

impl Route<Plan> for PlanRoute {
    type Node = PlanNode;

    fn source(&self) -> PlanNode {
        match self {
            PlanRoute::IdeaGenerated => PlanNode::GenerateIdea,
            PlanRoute::Decided(_) => PlanNode::Decide,
            PlanRoute::SuccessRecorded => PlanNode::GoodOutcome,
            PlanRoute::FailureRecorded => PlanNode::BadOutcome,
            PlanRoute::GoalChecked(_) => PlanNode::GoalCheck,
            PlanRoute::AbandonChecked(_) => PlanNode::AbandonCheck,
            PlanRoute::Summarized => PlanNode::Summarize,
        }
    }

    fn next(&self, _state: &Plan) -> Next<PlanNode> {
        match self {
            PlanRoute::IdeaGenerated => Next::Node(PlanNode::Decide),
            PlanRoute::Decided(Decision::Success) => Next::Node(PlanNode::GoodOutcome),
            PlanRoute::Decided(Decision::Failure) => Next::Node(PlanNode::BadOutcome),
            PlanRoute::SuccessRecorded => Next::Node(PlanNode::GoalCheck),
            PlanRoute::FailureRecorded => Next::Node(PlanNode::AbandonCheck),
            PlanRoute::GoalChecked(Achieved::Yes) => Next::End,
            PlanRoute::GoalChecked(Achieved::No) => Next::Node(PlanNode::Summarize),
            PlanRoute::AbandonChecked(AbandonChoice::Abandon) => Next::End,
            PlanRoute::AbandonChecked(AbandonChoice::PressOn) => Next::Node(PlanNode::Summarize),
            PlanRoute::Summarized => Next::Node(PlanNode::GenerateIdea),
        }
    }

    fn successors(node: PlanNode) -> &'static [Next<PlanNode>] {
        match node {
            PlanNode::GenerateIdea => &[Next::Node(PlanNode::Decide)],
            PlanNode::Decide => &[
                Next::Node(PlanNode::GoodOutcome),
                Next::Node(PlanNode::BadOutcome),
            ],
            PlanNode::GoodOutcome => &[Next::Node(PlanNode::GoalCheck)],
            PlanNode::BadOutcome => &[Next::Node(PlanNode::AbandonCheck)],
            PlanNode::GoalCheck | PlanNode::AbandonCheck => {
                &[Next::End, Next::Node(PlanNode::Summarize)]
            }
            PlanNode::Summarize => &[Next::Node(PlanNode::GenerateIdea)],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::{Assumptions, InputState};

    fn plan() -> Plan {
        Plan::with_id("p", InputState::new("g", Assumptions::default()), 1.0, 1.0)
    }

    /// **Scenario**: Every route's target is listed in its source node's successor table.
    #[test]
    fn next_is_always_a_declared_successor() {
        let routes = [
            PlanRoute::IdeaGenerated,
            PlanRoute::Decided(Decision::Success),
            PlanRoute::Decided(Decision::Failure),
            PlanRoute::SuccessRecorded,
            PlanRoute::FailureRecorded,
            PlanRoute::GoalChecked(Achieved::Yes),
            PlanRoute::GoalChecked(Achieved::No),
            PlanRoute::AbandonChecked(AbandonChoice::Abandon),
            PlanRoute::AbandonChecked(AbandonChoice::PressOn),
            PlanRoute::Summarized,
        ];
        let p = plan();
        for r in routes {
            assert!(
                PlanRoute::successors(r.source()).contains(&r.next(&p)),
                "{:?}",
                r
            );
        }
    }

    /// **Scenario**: Decide branches exclusively; terminal verdicts end the run.
    #[test]
    fn decision_table() {
        let p = plan();
        assert_eq!(
            PlanRoute::Decided(Decision::Success).next(&p),
            Next::Node(PlanNode::GoodOutcome)
        );
        assert_eq!(
            PlanRoute::Decided(Decision::Failure).next(&p),
            Next::Node(PlanNode::BadOutcome)
        );
        assert_eq!(PlanRoute::GoalChecked(Achieved::Yes).next(&p), Next::End);
        assert_eq!(
            PlanRoute::AbandonChecked(AbandonChoice::Abandon).next(&p),
            Next::End
        );
        assert_eq!(PlanRoute::Summarized.next(&p), Next::Node(PlanNode::GenerateIdea));
    }

    #[test]
    fn node_names_are_snake_case() {
        for n in PlanNode::ALL {
            assert_eq!(serde_json::to_value(n).unwrap(), n.as_str());
        }
    }
}
