//! Scheduler configuration and cycle definitions

use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use super::error::{ConfigError, ValidationError};
use crate::domain::cycle::CycleConfig;

/// Scheduler settings.
#[derive(Debug, Clone, Deserialize)]
pub struct SchedulerConfig {
    /// YAML file listing the cycle definitions
    #[serde(default = "default_cycles_path")]
    pub cycles_path: String,

    /// Seconds between checkpoints
    #[serde(default = "default_checkpoint_interval")]
    pub checkpoint_interval_secs: u64,

    /// Optional file of uuids (one per line) that are never published
    pub blacklist_path: Option<String>,

    /// Skip documents whose body is an image
    #[serde(default)]
    pub filter_images: bool,

    /// Initial value of the manual enable flag
    #[serde(default = "default_manual_enabled")]
    pub manual_enabled: bool,
}

impl SchedulerConfig {
    pub fn checkpoint_interval(&self) -> Duration {
        Duration::from_secs(self.checkpoint_interval_secs)
    }

    /// Validate scheduler configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.cycles_path.is_empty() {
            return Err(ValidationError::MissingRequired("SCHEDULER__CYCLES_PATH"));
        }
        if self.checkpoint_interval_secs == 0 {
            return Err(ValidationError::InvalidInterval("scheduler.checkpoint_interval_secs"));
        }
        Ok(())
    }

    /// Reads the cycle definitions file.
    pub fn load_cycles(&self) -> Result<Vec<CycleConfig>, ConfigError> {
        load_cycle_definitions(&self.cycles_path)
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            cycles_path: default_cycles_path(),
            checkpoint_interval_secs: default_checkpoint_interval(),
            blacklist_path: None,
            filter_images: false,
            manual_enabled: default_manual_enabled(),
        }
    }
}

/// Parses a YAML list of cycle definitions.
pub fn load_cycle_definitions(path: impl AsRef<Path>) -> Result<Vec<CycleConfig>, ConfigError> {
    let path = path.as_ref();
    let failed = |reason: String| ConfigError::CycleDefinitions {
        path: path.display().to_string(),
        reason,
    };

    let text = std::fs::read_to_string(path).map_err(|e| failed(e.to_string()))?;
    serde_yaml::from_str(&text).map_err(|e| failed(e.to_string()))
}

fn default_cycles_path() -> String {
    "./cycles.yml".to_string()
}

fn default_checkpoint_interval() -> u64 {
    60
}

fn default_manual_enabled() -> bool {
    true
}
