//! Narrow interface to the assistant runtime: one conversation thread per
//! workflow, prompts in, turns out.

pub mod client;
pub mod error;
pub mod types;

pub use client::HttpAssistantClient;
pub use error::AssistantError;
pub use types::{AssistantTurn, TurnStatus};

/// The session seam the driver consumes. Implemented by the HTTP client and
/// by scripted mocks in tests.
pub trait AssistantSession {
    /// Open a fresh conversation thread and return its handle.
    async fn bind(&self) -> Result<String, AssistantError>;

    /// Submit a prompt; resolves once the runtime acknowledges processing,
    /// bounded by the client's acknowledgement timeout.
    async fn send_prompt(&self, session: &str, prompt: &str) -> Result<(), AssistantError>;

    /// Block until the assistant produces its next turn.
    async fn next_turn(&self, session: &str) -> Result<AssistantTurn, AssistantError>;

    /// All turns of the thread, oldest first. Used by replay on resume.
    async fn history(&self, session: &str) -> Result<Vec<AssistantTurn>, AssistantError>;
}
