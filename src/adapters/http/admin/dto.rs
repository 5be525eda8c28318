//! Data Transfer Objects for the admin endpoints.

use serde::Serialize;

use crate::application::{Cycle, Toggles};
use crate::domain::cycle::{CycleConfig, CycleMetadata};

/// A cycle's definition, identity and live progress.
#[derive(Debug, Clone, Serialize)]
pub struct CycleResponse {
    pub id: String,
    #[serde(flatten)]
    pub config: CycleConfig,
    pub metadata: CycleMetadata,
}

impl CycleResponse {
    pub async fn from_cycle(cycle: &Cycle) -> Self {
        Self {
            id: cycle.id().to_string(),
            config: cycle.transform_to_config(),
            metadata: cycle.metadata().await,
        }
    }
}

/// Scheduler flags and status.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SchedulerResponse {
    #[serde(flatten)]
    pub toggles: Toggles,
    pub enabled: bool,
    pub running: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Error response.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error code.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
}

impl ErrorResponse {
    pub fn not_found(resource: &str, id: &str) -> Self {
        Self {
            code: "NOT_FOUND".to_string(),
            message: format!("{} not found: {}", resource, id),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            code: "BAD_REQUEST".to_string(),
            message: message.into(),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self {
            code: "CONFLICT".to_string(),
            message: message.into(),
        }
    }
}
