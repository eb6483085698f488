//! Events fed into the transition engine, and the read-only snapshot of the
//! persisted workflow they are evaluated against.
//!
//! All external data the pure transition function needs (the root item's
//! current body text, the assistant's turn text) travels inside the event
//! payload; the function itself never performs I/O.

use serde::{Deserialize, Serialize};

use super::state::WorkflowState;

/// Read-only projection of the persisted workflow document.
///
/// `parent_id` and `next_sibling_id` are pre-resolved from the tree so the
/// transition function can decide pointer moves without tree access.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub state: WorkflowState,
    pub active_id: String,
    pub parent_id: Option<String>,
    pub next_sibling_id: Option<String>,
}

/// What happened since the engine last ran.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Event {
    /// An assistant turn finished.
    ///
    /// `completed_state` is the state the turn was produced against; a
    /// mismatch with the snapshot's current state marks the event stale.
    Complete {
        completed_state: WorkflowState,
        assistant_text: String,
        root_item_text: String,
    },

    /// Manual override approving a review stage (review-plan or review).
    ForceLgtm {
        completed_state: WorkflowState,
        /// Root item body, required to parse the plan in review-plan.
        root_item_text: Option<String>,
    },

    /// Out-of-band human confirmation that manual testing passed.
    ManualTestsPassed,
}

impl Event {
    /// Short label for audit records.
    pub fn label(&self) -> &'static str {
        match self {
            Event::Complete { .. } => "complete",
            Event::ForceLgtm { .. } => "force-lgtm",
            Event::ManualTestsPassed => "manual-tests-passed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_labels() {
        let complete = Event::Complete {
            completed_state: WorkflowState::Refine,
            assistant_text: String::new(),
            root_item_text: String::new(),
        };
        assert_eq!(complete.label(), "complete");
        assert_eq!(Event::ManualTestsPassed.label(), "manual-tests-passed");
    }

    #[test]
    fn event_serialization_roundtrip() {
        let event = Event::ForceLgtm {
            completed_state: WorkflowState::Review,
            root_item_text: None,
        };
        let json = serde_json::to_string(&event).unwrap();
        let parsed: Event = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, event);
    }
}
