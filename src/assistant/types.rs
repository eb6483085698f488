//! Wire types for the assistant runtime interface.
//!
//! All structs derive `Serialize` and `Deserialize` for JSON conversion
//! against the session endpoints the driver consumes.

use serde::{Deserialize, Serialize};

/// How an assistant turn ended.
///
/// Only `Completed` turns are ever fed into the transition engine; the
/// driver never guesses a transition from errored or aborted output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnStatus {
    Completed,
    Errored,
    Aborted,
}

/// One assistant turn in a conversation thread.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssistantTurn {
    /// Identifier assigned by the runtime, used as the replay dedup cursor.
    pub id: String,
    pub text: String,
    pub status: TurnStatus,
}

impl AssistantTurn {
    pub fn is_completed(&self) -> bool {
        self.status == TurnStatus::Completed
    }
}

/// Body of a prompt submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptRequest {
    pub prompt: String,
}

/// Response to binding a new session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BindResponse {
    pub session: String,
}
