//! Checkpoint records persisted per cycle.

use chrono::{DateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};

use super::config::CycleConfig;
use super::metadata::CycleMetadata;
use crate::domain::foundation::CycleId;

/// Content type every checkpoint is written with and must be read back with.
pub const CHECKPOINT_CONTENT_TYPE: &str = "application/json";

/// One persisted `(config, metadata)` pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CycleCheckpoint {
    pub config: CycleConfig,
    pub metadata: CycleMetadata,
}

impl CycleCheckpoint {
    pub fn new(config: CycleConfig, metadata: CycleMetadata) -> Self {
        Self { config, metadata }
    }

    /// Metadata to install into a cycle running `current`.
    ///
    /// A changed definition invalidates stored progress.
    pub fn metadata_for(self, current: &CycleConfig) -> Option<CycleMetadata> {
        if &self.config == current {
            Some(self.metadata)
        } else {
            None
        }
    }
}

/// Timestamp component of a checkpoint key: `yyyymmddThhmmssCC` in UTC,
/// where `CC` is hundredths of a second. Keys sort lexicographically by time.
pub fn checkpoint_stamp(at: DateTime<Utc>) -> String {
    let centis = at.nanosecond().min(999_999_999) / 10_000_000;
    format!("{}{:02}", at.format("%Y%m%dT%H%M%S"), centis)
}

/// Full object key for a checkpoint of `id` written at `at`.
pub fn checkpoint_key(id: &CycleId, at: DateTime<Utc>) -> String {
    format!("{}/{}", id, checkpoint_stamp(at))
}
