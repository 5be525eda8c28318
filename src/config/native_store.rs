//! Native store configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Connection settings for the native document store (PostgreSQL).
#[derive(Debug, Clone, Deserialize)]
pub struct NativeStoreConfig {
    /// PostgreSQL connection URL
    pub url: String,

    /// Maximum connections allowed
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Connection acquire timeout in seconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

impl NativeStoreConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// Validate native store configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.url.is_empty() {
            return Err(ValidationError::MissingRequired("NATIVE_STORE__URL"));
        }
        if !self.url.starts_with("postgres://") && !self.url.starts_with("postgresql://") {
            return Err(ValidationError::InvalidNativeStoreUrl);
        }
        if self.max_connections == 0 || self.max_connections > 100 {
            return Err(ValidationError::InvalidPoolSize);
        }
        if self.connect_timeout_secs == 0 {
            return Err(ValidationError::InvalidInterval("native_store.connect_timeout_secs"));
        }
        Ok(())
    }
}

fn default_max_connections() -> u32 {
    10
}

fn default_connect_timeout() -> u64 {
    5
}
