//! Effects: side effects as data.
//!
//! The transition function returns effects instead of performing them; the
//! interpreter executes them against the issue tracker and the version-control
//! working copy. This keeps the state graph testable without mocking either.

use serde::{Deserialize, Serialize};

use super::state::WorkflowState;

/// A side-effecting action decided by the transition engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Effect {
    /// Create a work item under `parent_id`, reusing an existing child with
    /// the same title if one exists. The `(parent_id, title)` pair is the
    /// idempotency key that makes replays of a partially-completed creation
    /// step safe.
    CreateTicket {
        parent_id: String,
        title: String,
        description: String,
    },

    /// Mark a work item closed. Failure aborts the transition.
    CloseTicket { id: String },

    /// Attach an audit note to a work item. Best-effort: failures never block
    /// a transition.
    AddNote { id: String, text: String },

    /// Commit all pending working-copy changes, then verify the working copy
    /// is clean. A dirty result afterwards is an error.
    RunCommit { message: String },
}

/// Symbolic instruction for where the active pointer moves on an accepted
/// transition. Resolved against the (possibly extended) tree afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PointerMove {
    Stay,
    ToRoot,
    ToParent,
    ToNextSibling,
    /// Move to the first child created under `parent_id` by this transition's
    /// effects.
    ToFirstChildOf { parent_id: String },
}

/// Outcome of evaluating one event against one snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// The event advances the workflow.
    Applied {
        next_state: WorkflowState,
        pointer: PointerMove,
        effects: Vec<Effect>,
    },

    /// A valid but non-advancing turn (e.g. a clarifying question). No state
    /// or pointer change, no effects.
    Ignored,

    /// The event's content does not satisfy the current state's contract.
    /// Nothing is mutated; the reason is reported to the human.
    Rejected { reason: String },
}

impl Decision {
    pub fn is_applied(&self) -> bool {
        matches!(self, Decision::Applied { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn effect_serialization_roundtrip() {
        let effect = Effect::CreateTicket {
            parent_id: "root".into(),
            title: "Extract the parser".into(),
            description: "Pull parsing out of main".into(),
        };
        let json = serde_json::to_string(&effect).unwrap();
        let parsed: Effect = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, effect);
    }

    #[test]
    fn decision_is_applied() {
        let applied = Decision::Applied {
            next_state: WorkflowState::Plan,
            pointer: PointerMove::ToRoot,
            effects: vec![],
        };
        assert!(applied.is_applied());
        assert!(!Decision::Ignored.is_applied());
        let rejected = Decision::Rejected {
            reason: "nope".into(),
        };
        assert!(!rejected.is_applied());
    }
}
