//! Error types for the assistant runtime client.

use thiserror::Error;

/// Failures when talking to the assistant runtime.
#[derive(Debug, Error)]
pub enum AssistantError {
    /// The runtime did not acknowledge the prompt within the configured
    /// bound; the operation is reported failed rather than hanging.
    #[error("assistant runtime did not acknowledge the prompt within {waited_ms}ms")]
    AckTimeout { waited_ms: u64 },

    /// Error returned by the runtime (e.g. 401 invalid key, 500 internal).
    #[error("assistant API error (status {status}): {message}")]
    ApiError { status: u16, message: String },

    /// Underlying network failure (DNS, refused connection, timeout).
    #[error("network error: {0}")]
    NetworkError(#[from] reqwest::Error),
}
