//! Domain layer containing the carousel's vocabulary.
//!
//! # Module Organization
//!
//! - `foundation` - Shared primitives (ids, duration codec, errors)
//! - `content` - Native documents as read from the store
//! - `cycle` - Cycle definitions, state, progress and checkpoints
//! - `filter` - Skip predicates applied during id ingestion

pub mod content;
pub mod cycle;
pub mod filter;
pub mod foundation;
