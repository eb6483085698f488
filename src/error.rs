use thiserror::Error;

use crate::assistant::AssistantError;
use crate::git::VcsError;
use crate::tracker::TrackerError;

/// Top-level error for the driver and CLI surface.
#[derive(Debug, Error)]
pub enum HelmsmanError {
    #[error("No workflow document found. Run `helmsman start <ticket-id>` first.")]
    NoWorkflow,

    #[error("A workflow document already exists at {0}; finish or tear it down first")]
    WorkflowExists(String),

    #[error("A driver loop is already running for this workflow")]
    AlreadyRunning,

    #[error("Transition rejected: {0}")]
    Rejected(String),

    #[error(transparent)]
    Fault(#[from] EngineFault),

    #[error("Assistant runtime error: {0}")]
    Assistant(#[from] AssistantError),

    #[error("Tracker error: {0}")]
    Tracker(#[from] TrackerError),
}

/// Engine faults: failures that must leave the persisted document unmodified.
///
/// Covers failed external calls during effect execution, documents that fail
/// invariant validation on load or before save, and active-pointer resolution
/// targeting a nonexistent node. The engine never attempts automatic repair;
/// messages say so.
#[derive(Debug, Error)]
pub enum EngineFault {
    #[error(
        "workflow document failed invariant validation: {0}; \
         manual repair of the persisted document is required"
    )]
    Invariants(String),

    #[error(
        "active pointer resolution failed: {0}; \
         manual inspection of the persisted document may be required"
    )]
    PointerResolution(String),

    #[error(
        "tracker call failed while applying effects: {0}; \
         effects already executed were not rolled back, manual cleanup may be required"
    )]
    Tracker(#[from] TrackerError),

    #[error(
        "working-copy operation failed while applying effects: {0}; \
         manual cleanup may be required"
    )]
    Vcs(#[from] VcsError),

    #[error("failed to read or write the workflow document: {0}")]
    Io(#[from] std::io::Error),

    #[error("workflow document is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}
