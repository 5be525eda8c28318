//! Cycle module - definitions, state and progress of republishing cycles.
//!
//! - `config` - Cycle definitions and identity
//! - `state` - Set-of-tags cycle state
//! - `metadata` - Live progress counters
//! - `checkpoint` - Persisted `(config, metadata)` records and their keys

mod checkpoint;
mod config;
mod metadata;
mod state;

pub use checkpoint::{checkpoint_key, checkpoint_stamp, CycleCheckpoint, CHECKPOINT_CONTENT_TYPE};
pub use config::{CycleConfig, CycleSettings, CycleType};
pub use metadata::CycleMetadata;
pub use state::{CycleState, StateTag};
