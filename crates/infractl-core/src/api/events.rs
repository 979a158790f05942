//! Workspace event logging.
//!
//! A best-effort side channel: it never returns an error and never blocks the
//! operation being logged.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::dispatch::LifecycleResult;
use crate::types::LifecycleOperation;

use super::{ApiClient, routes};

#[derive(Debug, Clone, Serialize)]
pub struct WorkspaceEvent {
    pub event_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operation: Option<LifecycleOperation>,
    pub data: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

impl WorkspaceEvent {
    pub fn new(event_type: impl Into<String>, data: serde_json::Value) -> Self {
        Self {
            event_type: event_type.into(),
            operation: None,
            data,
            created_at: Utc::now(),
        }
    }

    /// Summary of a finished lifecycle run.
    pub fn lifecycle(result: &LifecycleResult) -> Self {
        Self {
            event_type: "lifecycle".to_string(),
            operation: Some(result.operation),
            data: serde_json::json!({
                "attempted": result.attempted,
                "completed": result.completed,
                "dry_run": result.dry_run,
            }),
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct EventWorkspace {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EventResponse {
    pub id: i64,
}

#[derive(Serialize)]
struct EventCreateRequest<'a> {
    event: &'a WorkspaceEvent,
    workspace: &'a EventWorkspace,
}

impl ApiClient {
    /// Log an event; returns `None` when the API is disabled or anything fails.
    pub async fn log_workspace_event(
        &self,
        event: &WorkspaceEvent,
        workspace: &EventWorkspace,
    ) -> Option<EventResponse> {
        if !self.is_enabled() {
            return None;
        }

        tracing::debug!("Logging {} workspace event", event.event_type);
        let body = EventCreateRequest { event, workspace };
        match self
            .post_json::<_, EventResponse>(routes::WORKSPACE_EVENT_CREATE, &body)
            .await
        {
            Ok(response) => {
                tracing::debug!("Workspace event response: {:?}", response);
                response
            }
            Err(e) => {
                tracing::debug!("Could not log workspace event: {e:#}");
                None
            }
        }
    }
}
