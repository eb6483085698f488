//! Configuration loaded from `helmsman.toml`.
//!
//! [`HelmsmanConfig`] holds every tunable. Values absent from the file use
//! sensible defaults. The `HELMSMAN_TRACKER_TOKEN` and `ANTHROPIC_API_KEY`
//! environment variables take precedence over the file so secrets can stay
//! out of it.

use anyhow::Result;
use serde::Deserialize;
use std::path::Path;

/// Top-level configuration loaded from `helmsman.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct HelmsmanConfig {
    /// Base URL of the work-item tracker.
    #[serde(default = "default_tracker_base_url")]
    pub tracker_base_url: String,

    /// Bearer token for the tracker.
    #[serde(default)]
    pub tracker_token: String,

    /// Base URL of the assistant runtime.
    #[serde(default = "default_assistant_base_url")]
    pub assistant_base_url: String,

    /// API key for the assistant runtime.
    #[serde(default)]
    pub api_key: String,

    /// Seconds to wait for the runtime to acknowledge a prompt.
    #[serde(default = "default_ack_timeout_secs")]
    pub ack_timeout_secs: u64,

    /// Path of the persisted workflow document.
    #[serde(default = "default_document_path")]
    pub document_path: String,

    /// Path of the git working copy the workflow commits into.
    #[serde(default = "default_repo_path")]
    pub repo_path: String,
}

fn default_tracker_base_url() -> String {
    "http://localhost:8321".to_string()
}

fn default_assistant_base_url() -> String {
    "http://localhost:8787".to_string()
}

// Default bounded wait for prompt acknowledgement: 10 seconds.
fn default_ack_timeout_secs() -> u64 {
    10
}

fn default_document_path() -> String {
    ".helmsman/workflow.json".to_string()
}

fn default_repo_path() -> String {
    ".".to_string()
}

impl Default for HelmsmanConfig {
    fn default() -> Self {
        Self {
            tracker_base_url: default_tracker_base_url(),
            tracker_token: String::new(),
            assistant_base_url: default_assistant_base_url(),
            api_key: String::new(),
            ack_timeout_secs: default_ack_timeout_secs(),
            document_path: default_document_path(),
            repo_path: default_repo_path(),
        }
    }
}

impl HelmsmanConfig {
    /// Load configuration from `helmsman.toml` in the current directory,
    /// falling back to defaults if the file does not exist.
    pub fn load() -> Result<Self> {
        let path = Path::new("helmsman.toml");
        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            toml::from_str::<HelmsmanConfig>(&contents)?
        } else {
            Self::default()
        };

        // Environment takes precedence over the file for secrets.
        if let Ok(token) = std::env::var("HELMSMAN_TRACKER_TOKEN")
            && !token.is_empty()
        {
            config.tracker_token = token;
        }
        if let Ok(key) = std::env::var("ANTHROPIC_API_KEY")
            && !key.is_empty()
        {
            config.api_key = key;
        }

        Ok(config)
    }
}
