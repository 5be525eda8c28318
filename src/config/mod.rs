//! Application configuration module
//!
//! This module provides type-safe configuration loading from environment variables
//! using the `config` and `dotenvy` crates. Configuration is loaded with the
//! `PUBLISH_CAROUSEL` prefix and nested values use double underscores as separators.
//!
//! # Example
//!
//! ```no_run
//! use publish_carousel::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("Admin API on {}", config.server.socket_addr().unwrap());
//! ```

mod cluster;
mod error;
mod metadata;
mod native_store;
mod notifier;
mod scheduler;
mod server;

pub use cluster::ClusterConfig;
pub use error::{ConfigError, ValidationError};
pub use metadata::MetadataConfig;
pub use native_store::NativeStoreConfig;
pub use notifier::NotifierConfig;
pub use scheduler::{load_cycle_definitions, SchedulerConfig};
pub use server::{Environment, ServerConfig};

use serde::Deserialize;

/// Root application configuration
///
/// Load using [`AppConfig::load()`] which reads from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Admin server configuration (host, port, environment)
    #[serde(default)]
    pub server: ServerConfig,

    /// Native document store connection
    pub native_store: NativeStoreConfig,

    /// Downstream notifier
    pub notifier: NotifierConfig,

    /// Checkpoint storage
    #[serde(default)]
    pub metadata: MetadataConfig,

    /// Scheduler settings and cycle definitions
    #[serde(default)]
    pub scheduler: SchedulerConfig,

    /// Cluster health probes
    #[serde(default)]
    pub cluster: ClusterConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// This function:
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with `PUBLISH_CAROUSEL` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    /// 4. Deserializes into typed configuration structs
    ///
    /// # Environment Variable Format
    ///
    /// - `PUBLISH_CAROUSEL__SERVER__PORT=8080` -> `server.port = 8080`
    /// - `PUBLISH_CAROUSEL__NATIVE_STORE__URL=...` -> `native_store.url = ...`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Required environment variables are missing
    /// - Values cannot be parsed into expected types
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (development)
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("PUBLISH_CAROUSEL")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if any configuration value is invalid.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.native_store.validate()?;
        self.notifier.validate()?;
        self.scheduler.validate()?;
        self.cluster.validate()?;
        Ok(())
    }

    /// Check if running in production environment
    pub fn is_production(&self) -> bool {
        self.server.is_production()
    }
}
