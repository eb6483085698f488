use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The ten states of the workflow, linear with two bounded sub-loops:
///
/// refine → plan → review-plan → implement → review → implement-review(*)
/// → subtask-commit → manual-test → commit → complete
///
/// `implement ↔ review ↔ implement-review` loops while a review requests
/// follow-up findings; `subtask-commit → implement` loops once per remaining
/// subtask sibling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WorkflowState {
    Refine,
    Plan,
    ReviewPlan,
    Implement,
    Review,
    ImplementReview,
    SubtaskCommit,
    ManualTest,
    Commit,
    Complete,
}

impl WorkflowState {
    /// Tree depth the active node must have while the workflow is in this
    /// state. Root = 0, subtask = 1, finding = 2.
    pub fn expected_depth(&self) -> usize {
        match self {
            WorkflowState::Refine
            | WorkflowState::Plan
            | WorkflowState::ReviewPlan
            | WorkflowState::ManualTest
            | WorkflowState::Commit
            | WorkflowState::Complete => 0,
            WorkflowState::Implement | WorkflowState::Review | WorkflowState::SubtaskCommit => 1,
            WorkflowState::ImplementReview => 2,
        }
    }

    /// The directive tag(s) an assistant turn may carry in this state, for
    /// rejection messages. Empty for states that advance without a directive.
    pub fn expected_directives(&self) -> &'static str {
        match self {
            WorkflowState::Refine => "plan",
            WorkflowState::Plan => "review-plan",
            WorkflowState::ReviewPlan => "review-plan or implement",
            WorkflowState::Review => "subtask-commit or implement-review",
            _ => "",
        }
    }
}

impl fmt::Display for WorkflowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WorkflowState::Refine => "refine",
            WorkflowState::Plan => "plan",
            WorkflowState::ReviewPlan => "review-plan",
            WorkflowState::Implement => "implement",
            WorkflowState::Review => "review",
            WorkflowState::ImplementReview => "implement-review",
            WorkflowState::SubtaskCommit => "subtask-commit",
            WorkflowState::ManualTest => "manual-test",
            WorkflowState::Commit => "commit",
            WorkflowState::Complete => "complete",
        };
        write!(f, "{name}")
    }
}

impl FromStr for WorkflowState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "refine" => Ok(WorkflowState::Refine),
            "plan" => Ok(WorkflowState::Plan),
            "review-plan" => Ok(WorkflowState::ReviewPlan),
            "implement" => Ok(WorkflowState::Implement),
            "review" => Ok(WorkflowState::Review),
            "implement-review" => Ok(WorkflowState::ImplementReview),
            "subtask-commit" => Ok(WorkflowState::SubtaskCommit),
            "manual-test" => Ok(WorkflowState::ManualTest),
            "commit" => Ok(WorkflowState::Commit),
            "complete" => Ok(WorkflowState::Complete),
            other => Err(format!("unknown workflow state '{other}'")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_uses_kebab_case() {
        assert_eq!(WorkflowState::ReviewPlan.to_string(), "review-plan");
        assert_eq!(
            WorkflowState::ImplementReview.to_string(),
            "implement-review"
        );
        assert_eq!(WorkflowState::ManualTest.to_string(), "manual-test");
    }

    #[test]
    fn from_str_roundtrips_every_state() {
        let all = [
            WorkflowState::Refine,
            WorkflowState::Plan,
            WorkflowState::ReviewPlan,
            WorkflowState::Implement,
            WorkflowState::Review,
            WorkflowState::ImplementReview,
            WorkflowState::SubtaskCommit,
            WorkflowState::ManualTest,
            WorkflowState::Commit,
            WorkflowState::Complete,
        ];
        for state in all {
            assert_eq!(state.to_string().parse::<WorkflowState>().unwrap(), state);
        }
        assert!("not-a-state".parse::<WorkflowState>().is_err());
    }

    #[test]
    fn serde_matches_display() {
        let json = serde_json::to_string(&WorkflowState::SubtaskCommit).unwrap();
        assert_eq!(json, "\"subtask-commit\"");
        let parsed: WorkflowState = serde_json::from_str("\"manual-test\"").unwrap();
        assert_eq!(parsed, WorkflowState::ManualTest);
    }

    #[test]
    fn expected_depth_per_state() {
        assert_eq!(WorkflowState::Refine.expected_depth(), 0);
        assert_eq!(WorkflowState::Implement.expected_depth(), 1);
        assert_eq!(WorkflowState::Review.expected_depth(), 1);
        assert_eq!(WorkflowState::ImplementReview.expected_depth(), 2);
        assert_eq!(WorkflowState::SubtaskCommit.expected_depth(), 1);
        assert_eq!(WorkflowState::Commit.expected_depth(), 0);
    }
}
