//! Live progress counters for a cycle.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::state::CycleState;

/// Progress of a cycle, snapshot-copied into every checkpoint.
///
/// Unknown fields are rejected on load so a checkpoint written by an
/// incompatible version is never half-applied.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CycleMetadata {
    #[serde(default)]
    pub current_publish_uuid: String,

    #[serde(default)]
    pub errors: u64,

    #[serde(default)]
    pub progress: f64,

    #[serde(default)]
    pub state: CycleState,

    #[serde(default)]
    pub completed: u64,

    #[serde(default)]
    pub total: u64,

    #[serde(default)]
    pub iteration: u64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub window_start: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub window_end: Option<DateTime<Utc>>,

    #[serde(default)]
    pub attempts: u64,
}

impl CycleMetadata {
    /// Starts a new pass over `total` ids.
    pub fn begin_iteration(&mut self, total: u64) {
        self.iteration += 1;
        self.completed = 0;
        self.errors = 0;
        self.total = total;
        self.update_progress();
    }

    /// Continues an interrupted pass over `total` ids from `completed`.
    ///
    /// Ids that failed before the interruption lie past the resume point and
    /// are attempted again, so their failures no longer count.
    pub fn resume_iteration(&mut self, total: u64) {
        self.errors = 0;
        self.total = total;
        self.update_progress();
    }

    /// Marks the current pass finished so the next one starts from zero.
    pub fn end_iteration(&mut self) {
        self.completed = 0;
        self.update_progress();
    }

    pub fn record_success(&mut self) {
        self.completed += 1;
        self.update_progress();
    }

    pub fn record_failure(&mut self) {
        self.errors += 1;
        self.update_progress();
    }

    pub fn update_progress(&mut self) {
        self.progress = if self.total == 0 {
            0.0
        } else {
            self.completed as f64 / self.total as f64
        };
    }

    /// Records the bounds of the window being swept.
    pub fn set_window(&mut self, start: DateTime<Utc>, end: DateTime<Utc>) {
        self.window_start = Some(start);
        self.window_end = Some(end);
    }
}
