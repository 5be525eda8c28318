//! HTTP handlers for the admin endpoints.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

use super::dto::{CycleResponse, ErrorResponse, SchedulerResponse};
use crate::application::{Scheduler, SchedulerError};
use crate::domain::cycle::CycleConfig;

// ════════════════════════════════════════════════════════════════════════════════
// Application State
// ════════════════════════════════════════════════════════════════════════════════

/// Shared state for the admin routes.
#[derive(Clone)]
pub struct AdminAppState {
    pub scheduler: Arc<Scheduler>,
}

impl AdminAppState {
    pub fn new(scheduler: Arc<Scheduler>) -> Self {
        Self { scheduler }
    }

    async fn scheduler_response(&self, message: Option<String>) -> SchedulerResponse {
        let toggles = self.scheduler.toggles().await;
        SchedulerResponse {
            toggles,
            enabled: toggles.enabled(),
            running: self.scheduler.is_running().await,
            message,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Cycle Handlers
// ════════════════════════════════════════════════════════════════════════════════

/// GET /cycles
pub async fn list_cycles(
    State(state): State<AdminAppState>,
) -> Result<impl IntoResponse, AdminApiError> {
    let mut response = Vec::new();
    for cycle in state.scheduler.cycles().await {
        response.push(CycleResponse::from_cycle(&cycle).await);
    }
    Ok(Json(response))
}

/// POST /cycles
pub async fn create_cycle(
    State(state): State<AdminAppState>,
    Json(config): Json<CycleConfig>,
) -> Result<impl IntoResponse, AdminApiError> {
    let cycle = state.scheduler.add_cycle(config).await?;
    Ok((StatusCode::CREATED, Json(CycleResponse::from_cycle(&cycle).await)))
}

/// GET /cycles/:id
pub async fn get_cycle(
    State(state): State<AdminAppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AdminApiError> {
    let cycle = state
        .scheduler
        .cycle(&id)
        .await
        .ok_or(AdminApiError::NotFound(id))?;
    Ok(Json(CycleResponse::from_cycle(&cycle).await))
}

/// DELETE /cycles/:id
pub async fn delete_cycle(
    State(state): State<AdminAppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AdminApiError> {
    state.scheduler.delete_cycle(&id).await?;
    Ok(StatusCode::OK)
}

/// POST /cycles/:id/resume
pub async fn resume_cycle(
    State(state): State<AdminAppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AdminApiError> {
    state.scheduler.resume_cycle(&id).await?;
    Ok(StatusCode::OK)
}

/// POST /cycles/:id/stop
pub async fn stop_cycle(
    State(state): State<AdminAppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AdminApiError> {
    state.scheduler.stop_cycle(&id).await?;
    Ok(StatusCode::OK)
}

/// POST /cycles/:id/reset
pub async fn reset_cycle(
    State(state): State<AdminAppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AdminApiError> {
    state.scheduler.reset_cycle(&id).await?;
    Ok(StatusCode::OK)
}

// ════════════════════════════════════════════════════════════════════════════════
// Scheduler Handlers
// ════════════════════════════════════════════════════════════════════════════════

/// GET /scheduler
pub async fn scheduler_status(State(state): State<AdminAppState>) -> impl IntoResponse {
    Json(state.scheduler_response(None).await)
}

/// POST /scheduler/start
///
/// Always answers 200; a disabled scheduler is reported in the body.
pub async fn start_scheduler(State(state): State<AdminAppState>) -> impl IntoResponse {
    let message = match state.scheduler.start().await {
        Ok(()) => None,
        Err(e) => {
            tracing::info!(error = %e, "Scheduler start requested while disabled");
            Some(e.to_string())
        }
    };
    Json(state.scheduler_response(message).await)
}

/// POST /scheduler/shutdown
pub async fn shutdown_scheduler(State(state): State<AdminAppState>) -> impl IntoResponse {
    state.scheduler.shutdown().await;
    Json(state.scheduler_response(None).await)
}

/// POST /scheduler/toggle
///
/// The raw body is the new manual flag; anything other than `true` disables.
pub async fn toggle_scheduler(
    State(state): State<AdminAppState>,
    body: String,
) -> impl IntoResponse {
    state.scheduler.manual_toggle_handler(&body).await;
    Json(state.scheduler_response(None).await)
}

// ════════════════════════════════════════════════════════════════════════════════
// Error Handling
// ════════════════════════════════════════════════════════════════════════════════

/// API error type that converts scheduler errors to HTTP responses.
#[derive(Debug)]
pub enum AdminApiError {
    BadRequest(String),
    NotFound(String),
    Conflict(String),
}

impl From<SchedulerError> for AdminApiError {
    fn from(err: SchedulerError) -> Self {
        match err {
            SchedulerError::CycleNotFound(id) => AdminApiError::NotFound(id),
            SchedulerError::CycleExists(id) => {
                AdminApiError::Conflict(format!("Cycle already exists: {}", id))
            }
            SchedulerError::InvalidConfig(e) => AdminApiError::BadRequest(e.to_string()),
            e @ SchedulerError::NotEnabled { .. } => AdminApiError::Conflict(e.to_string()),
        }
    }
}

impl IntoResponse for AdminApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, error) = match self {
            AdminApiError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, ErrorResponse::bad_request(msg))
            }
            AdminApiError::NotFound(id) => {
                (StatusCode::NOT_FOUND, ErrorResponse::not_found("Cycle", &id))
            }
            AdminApiError::Conflict(msg) => (StatusCode::CONFLICT, ErrorResponse::conflict(msg)),
        };

        (status, Json(error)).into_response()
    }
}
