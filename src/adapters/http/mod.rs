//! HTTP adapters - REST API implementations.
//!
//! - `admin` - Cycle and scheduler administration

pub mod admin;

pub use admin::{admin_router, AdminAppState};
