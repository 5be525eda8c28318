//! Checkpoint storage configuration

use serde::Deserialize;

/// Where cycle checkpoints are kept.
#[derive(Debug, Clone, Deserialize)]
pub struct MetadataConfig {
    /// Directory backing the checkpoint object store
    #[serde(default = "default_path")]
    pub path: String,
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self {
            path: default_path(),
        }
    }
}

fn default_path() -> String {
    "./data/checkpoints".to_string()
}
