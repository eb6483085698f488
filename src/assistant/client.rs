use std::time::Duration;

use reqwest::Client;

use super::AssistantSession;
use super::error::AssistantError;
use super::types::{AssistantTurn, BindResponse, PromptRequest};

/// HTTP client for the assistant runtime's session endpoints.
pub struct HttpAssistantClient {
    api_key: String,
    client: Client,
    base_url: String,
    ack_timeout: Duration,
}

impl HttpAssistantClient {
    /// Create a client for the runtime at `base_url`. `ack_timeout` bounds
    /// how long a prompt submission may wait for acknowledgement.
    pub fn new(base_url: String, api_key: String, ack_timeout: Duration) -> Self {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(120))
            .build()
            .expect("failed to build HTTP client");
        Self {
            api_key,
            client,
            base_url,
            ack_timeout,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url.trim_end_matches('/'))
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, AssistantError> {
        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(AssistantError::ApiError {
                status: status.as_u16(),
                message,
            });
        }
        Ok(response)
    }
}

impl AssistantSession for HttpAssistantClient {
    async fn bind(&self) -> Result<String, AssistantError> {
        let response = self
            .client
            .post(self.url("/sessions"))
            .header("x-api-key", &self.api_key)
            .send()
            .await?;
        let body = Self::check(response).await?.json::<BindResponse>().await?;
        Ok(body.session)
    }

    async fn send_prompt(&self, session: &str, prompt: &str) -> Result<(), AssistantError> {
        let request = self
            .client
            .post(self.url(&format!("/sessions/{session}/prompts")))
            .header("x-api-key", &self.api_key)
            .json(&PromptRequest {
                prompt: prompt.to_string(),
            })
            .send();

        // Bounded wait for the runtime to acknowledge it started processing;
        // report failure instead of hanging indefinitely.
        let response = tokio::time::timeout(self.ack_timeout, request)
            .await
            .map_err(|_| AssistantError::AckTimeout {
                waited_ms: self.ack_timeout.as_millis() as u64,
            })??;
        Self::check(response).await?;
        Ok(())
    }

    async fn next_turn(&self, session: &str) -> Result<AssistantTurn, AssistantError> {
        let response = self
            .client
            .get(self.url(&format!("/sessions/{session}/turns/next")))
            .header("x-api-key", &self.api_key)
            .send()
            .await?;
        Ok(Self::check(response).await?.json::<AssistantTurn>().await?)
    }

    async fn history(&self, session: &str) -> Result<Vec<AssistantTurn>, AssistantError> {
        let response = self
            .client
            .get(self.url(&format!("/sessions/{session}/turns")))
            .header("x-api-key", &self.api_key)
            .send()
            .await?;
        Ok(Self::check(response)
            .await?
            .json::<Vec<AssistantTurn>>()
            .await?)
    }
}
