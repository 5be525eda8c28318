//! Foundation module - Shared domain primitives.
//!
//! Contains identifiers, the duration codec, and error types
//! that form the vocabulary of the carousel domain.

pub mod duration;
mod errors;
mod ids;

pub use duration::{format_duration, parse_duration};
pub use errors::ValidationError;
pub use ids::CycleId;
