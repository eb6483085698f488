//! Issue/work-item tracker interface.
//!
//! The engine needs only a handful of primitives: create, close, get, note,
//! and child listing. [`HttpTracker`] speaks JSON over REST; the test builds
//! carry an in-memory implementation with the same contract.

use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("work item not found: {0}")]
    NotFound(String),

    #[error("tracker returned status {status}: {message}")]
    ApiError { status: u16, message: String },

    #[error("tracker transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Lifecycle status of a work item, ordered for idempotent-create ranking:
/// an in-progress item is the best reuse candidate, a closed one the worst.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TicketStatus {
    InProgress,
    Open,
    Closed,
}

impl TicketStatus {
    pub fn rank(&self) -> u8 {
        match self {
            TicketStatus::InProgress => 0,
            TicketStatus::Open => 1,
            TicketStatus::Closed => 2,
        }
    }
}

/// A work item as the tracker reports it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticket {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub body: String,
    pub status: TicketStatus,
    #[serde(default)]
    pub parent: Option<String>,
    #[serde(default)]
    pub labels: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// The narrow tracker interface the engine consumes. Transport is irrelevant
/// to the core; implementations decide REST vs memory.
pub trait Tracker {
    async fn create(
        &self,
        parent_id: &str,
        title: &str,
        description: &str,
    ) -> Result<String, TrackerError>;

    async fn close(&self, id: &str) -> Result<(), TrackerError>;

    async fn get(&self, id: &str) -> Result<Ticket, TrackerError>;

    async fn add_note(&self, id: &str, text: &str) -> Result<(), TrackerError>;

    async fn children_of(&self, parent_id: &str) -> Result<Vec<Ticket>, TrackerError>;
}

// ---------------------------------------------------------------------------
// HTTP implementation
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct CreateItemRequest<'a> {
    parent: &'a str,
    title: &'a str,
    description: &'a str,
}

#[derive(Debug, Deserialize)]
struct CreateItemResponse {
    id: String,
}

#[derive(Debug, Serialize)]
struct AddNoteRequest<'a> {
    text: &'a str,
}

/// REST client for the work-item tracker.
pub struct HttpTracker {
    token: String,
    client: Client,
    base_url: String,
}

impl HttpTracker {
    pub fn new(base_url: String, token: String) -> Self {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(60))
            .build()
            .expect("failed to build HTTP client");
        Self {
            token,
            client,
            base_url,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url.trim_end_matches('/'))
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, TrackerError> {
        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            let path = response.url().path().to_string();
            return Err(TrackerError::NotFound(path));
        }
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(TrackerError::ApiError {
                status: status.as_u16(),
                message,
            });
        }
        Ok(response)
    }
}

impl Tracker for HttpTracker {
    async fn create(
        &self,
        parent_id: &str,
        title: &str,
        description: &str,
    ) -> Result<String, TrackerError> {
        let response = self
            .client
            .post(self.url("/items"))
            .bearer_auth(&self.token)
            .json(&CreateItemRequest {
                parent: parent_id,
                title,
                description,
            })
            .send()
            .await?;
        let body = Self::check(response).await?.json::<CreateItemResponse>().await?;
        Ok(body.id)
    }

    async fn close(&self, id: &str) -> Result<(), TrackerError> {
        let response = self
            .client
            .post(self.url(&format!("/items/{id}/close")))
            .bearer_auth(&self.token)
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Ticket, TrackerError> {
        let response = self
            .client
            .get(self.url(&format!("/items/{id}")))
            .bearer_auth(&self.token)
            .send()
            .await?;
        Ok(Self::check(response).await?.json::<Ticket>().await?)
    }

    async fn add_note(&self, id: &str, text: &str) -> Result<(), TrackerError> {
        let response = self
            .client
            .post(self.url(&format!("/items/{id}/notes")))
            .bearer_auth(&self.token)
            .json(&AddNoteRequest { text })
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn children_of(&self, parent_id: &str) -> Result<Vec<Ticket>, TrackerError> {
        let response = self
            .client
            .get(self.url("/items"))
            .query(&[("parent", parent_id)])
            .bearer_auth(&self.token)
            .send()
            .await?;
        Ok(Self::check(response).await?.json::<Vec<Ticket>>().await?)
    }
}

// ---------------------------------------------------------------------------
// In-memory implementation
// ---------------------------------------------------------------------------

#[cfg(test)]
use std::collections::HashMap;
#[cfg(test)]
use std::sync::Arc;
#[cfg(test)]
use tokio::sync::Mutex;
#[cfg(test)]
use uuid::Uuid;

/// In-memory tracker with the same contract as [`HttpTracker`], shared by
/// the test suites of the interpreter and the driver. Clones share the same
/// store.
#[cfg(test)]
#[derive(Clone, Default)]
pub struct MemoryTracker {
    items: Arc<Mutex<HashMap<String, Ticket>>>,
}

#[cfg(test)]
impl MemoryTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a ticket as-is, e.g. to seed a pre-existing root work item.
    pub async fn seed(&self, ticket: Ticket) {
        self.items.lock().await.insert(ticket.id.clone(), ticket);
    }

    pub async fn len(&self) -> usize {
        self.items.lock().await.len()
    }
}

#[cfg(test)]
impl Tracker for MemoryTracker {
    async fn create(
        &self,
        parent_id: &str,
        title: &str,
        description: &str,
    ) -> Result<String, TrackerError> {
        let mut items = self.items.lock().await;
        let id = Uuid::new_v4().to_string();
        items.insert(
            id.clone(),
            Ticket {
                id: id.clone(),
                title: title.to_string(),
                body: description.to_string(),
                status: TicketStatus::Open,
                parent: Some(parent_id.to_string()),
                labels: Vec::new(),
                created_at: Utc::now(),
            },
        );
        Ok(id)
    }

    async fn close(&self, id: &str) -> Result<(), TrackerError> {
        let mut items = self.items.lock().await;
        let ticket = items
            .get_mut(id)
            .ok_or_else(|| TrackerError::NotFound(id.to_string()))?;
        ticket.status = TicketStatus::Closed;
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Ticket, TrackerError> {
        self.items
            .lock()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| TrackerError::NotFound(id.to_string()))
    }

    async fn add_note(&self, id: &str, text: &str) -> Result<(), TrackerError> {
        let mut items = self.items.lock().await;
        let ticket = items
            .get_mut(id)
            .ok_or_else(|| TrackerError::NotFound(id.to_string()))?;
        ticket.body.push_str("\n\nNote: ");
        ticket.body.push_str(text);
        Ok(())
    }

    async fn children_of(&self, parent_id: &str) -> Result<Vec<Ticket>, TrackerError> {
        let items = self.items.lock().await;
        let mut children: Vec<Ticket> = items
            .values()
            .filter(|t| t.parent.as_deref() == Some(parent_id))
            .cloned()
            .collect();
        children.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(children)
    }
}
