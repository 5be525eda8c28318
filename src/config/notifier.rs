//! Notifier configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Downstream notifier endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct NotifierConfig {
    /// Base URL; content is posted to `{url}/notify`
    pub url: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl NotifierConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Validate notifier configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.url.is_empty() {
            return Err(ValidationError::MissingRequired("NOTIFIER__URL"));
        }
        if !is_http_url(&self.url) {
            return Err(ValidationError::InvalidUrl("notifier.url"));
        }
        if self.timeout_secs == 0 {
            return Err(ValidationError::InvalidTimeout);
        }
        Ok(())
    }
}

pub(super) fn is_http_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

fn default_timeout() -> u64 {
    10
}
