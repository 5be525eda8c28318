//! Route configuration for admin endpoints.

use axum::routing::{get, post};
use axum::Router;

use super::handlers::{
    create_cycle, delete_cycle, get_cycle, list_cycles, reset_cycle, resume_cycle,
    scheduler_status, shutdown_scheduler, start_scheduler, stop_cycle, toggle_scheduler,
    AdminAppState,
};

/// Creates the admin router with all endpoints.
///
/// Routes:
/// - `GET /cycles`, `POST /cycles`
/// - `GET /cycles/:id`, `DELETE /cycles/:id`
/// - `POST /cycles/:id/resume`, `POST /cycles/:id/stop`, `POST /cycles/:id/reset`
/// - `GET /scheduler`
/// - `POST /scheduler/start`, `POST /scheduler/shutdown`, `POST /scheduler/toggle`
pub fn admin_router() -> Router<AdminAppState> {
    Router::new()
        .route("/cycles", get(list_cycles).post(create_cycle))
        .route("/cycles/:id", get(get_cycle).delete(delete_cycle))
        .route("/cycles/:id/resume", post(resume_cycle))
        .route("/cycles/:id/stop", post(stop_cycle))
        .route("/cycles/:id/reset", post(reset_cycle))
        .route("/scheduler", get(scheduler_status))
        .route("/scheduler/start", post(start_scheduler))
        .route("/scheduler/shutdown", post(shutdown_scheduler))
        .route("/scheduler/toggle", post(toggle_scheduler))
}
