//! Cluster health configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;
use super::notifier::is_http_url;

/// Services whose good-to-go status drives the automatic enable flag.
#[derive(Debug, Clone, Deserialize)]
pub struct ClusterConfig {
    /// Base URLs probed at `/__gtg` (comma-separated)
    pub services: Option<String>,

    /// Seconds between probes
    #[serde(default = "default_check_interval")]
    pub check_interval_secs: u64,

    /// Per-probe timeout in seconds
    #[serde(default = "default_probe_timeout")]
    pub probe_timeout_secs: u64,
}

impl ClusterConfig {
    /// Get service URLs as a vector
    pub fn services_list(&self) -> Vec<String> {
        self.services
            .as_ref()
            .map(|s| {
                s.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn check_interval(&self) -> Duration {
        Duration::from_secs(self.check_interval_secs)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }

    /// Validate cluster configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.check_interval_secs == 0 {
            return Err(ValidationError::InvalidInterval("cluster.check_interval_secs"));
        }
        if self.probe_timeout_secs == 0 {
            return Err(ValidationError::InvalidTimeout);
        }
        if !self.services_list().iter().all(|s| is_http_url(s)) {
            return Err(ValidationError::InvalidUrl("cluster.services"));
        }
        Ok(())
    }
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            services: None,
            check_interval_secs: default_check_interval(),
            probe_timeout_secs: default_probe_timeout(),
        }
    }
}

fn default_check_interval() -> u64 {
    30
}

fn default_probe_timeout() -> u64 {
    5
}
