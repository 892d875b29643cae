//! Per-field state merge semantics.
//!
//! A node never returns a full state. It returns a partial update whose fields are all
//! optional; the executor merges each present field into the current state with the policy
//! the state schema declares for that field. Absent fields are left untouched.
//!
//! Schemas are declared once with [`state_update!`](crate::state_update), which generates the
//! update struct and its [`StateUpdate`] impl:
//!
//! ```ignore
//! state_update! {
//!     pub struct PlanUpdate for Plan {
//!         append step_history: Vec<NextStep>,
//!         replace resource_budget: f64,
//!     }
//! }
//! ```

mod update;

use std::fmt::Debug;

use serde::{Deserialize, Serialize};

/// How an update value for one field is merged into the current value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MergePolicy {
    /// Concatenate onto the existing sequence; never removes or reorders.
    Append,
    /// Overwrite the existing value.
    Replace,
    /// Set an unset `Option` field; later writes are rejected.
    SetOnce,
}

/// One schema entry: field name and its merge policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldPolicy {
    pub name: &'static str,
    pub policy: MergePolicy,
}

/// Result of merging one update: fields written and fields rejected by `SetOnce`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeReport {
    pub applied: Vec<&'static str>,
    pub rejected: Vec<&'static str>,
}

/// Partial update for state `S`. Generated by `state_update!`.
pub trait StateUpdate<S>: Debug + Send + Sync + Sized + 'static {
    /// Field schema in declaration order.
    const FIELDS: &'static [FieldPolicy];

    /// Names of fields present in this update.
    fn touched_fields(&self) -> Vec<&'static str>;

    /// Merges every present field into `state`.
    fn apply_to(self, state: &mut S) -> MergeReport;

    fn policy_of(field: &str) -> Option<MergePolicy> {
        Self::FIELDS
            .iter()
            .find(|f| f.name == field)
            .map(|f| f.policy)
    }
}

/// State carried through a graph run, paired with its partial-update type.
pub trait GraphState: Clone + Debug + Send + Sync + 'static {
    type Update: StateUpdate<Self>;
}

/// `SetOnce` merge: writes `value` only when `current` is unset. Returns `false` on rejection.
pub fn set_once<T>(current: &mut Option<T>, value: Option<T>) -> bool {
    match (current.is_some(), value) {
        (_, None) => true,
        (false, Some(v)) => {
            *current = Some(v);
            true
        }
        (true, Some(_)) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_once_accepts_first_write_only() {
        let mut slot: Option<u32> = None;
        assert!(set_once(&mut slot, Some(1)));
        assert!(!set_once(&mut slot, Some(2)));
        assert!(set_once(&mut slot, None));
        assert_eq!(slot, Some(1));
    }
}
