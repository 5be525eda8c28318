//! HTTP adapter for carousel administration.
//!
//! Endpoints:
//! - `GET /cycles` - List cycles with their progress
//! - `POST /cycles` - Register a cycle from its definition
//! - `GET /cycles/:id` - Get one cycle
//! - `DELETE /cycles/:id` - Stop and remove a cycle
//! - `POST /cycles/:id/resume` - Start a stopped cycle
//! - `POST /cycles/:id/stop` - Stop a cycle, keeping its progress
//! - `POST /cycles/:id/reset` - Stop, clear progress and start again
//! - `GET /scheduler` - Enable flags and run status
//! - `POST /scheduler/start` - Start every cycle
//! - `POST /scheduler/shutdown` - Stop every cycle
//! - `POST /scheduler/toggle` - Set the manual enable flag from a `true`/`false` body

mod dto;
mod handlers;
mod routes;

pub use dto::{CycleResponse, ErrorResponse, SchedulerResponse};
pub use handlers::{AdminApiError, AdminAppState};
pub use routes::admin_router;
