//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),

    #[error("Failed to read cycle definitions from {path}: {reason}")]
    CycleDefinitions { path: String, reason: String },
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("Invalid port number")]
    InvalidPort,

    #[error("Invalid socket address: {0}")]
    InvalidSocketAddr(String),

    #[error("Invalid request timeout")]
    InvalidTimeout,

    #[error("Invalid native store URL format")]
    InvalidNativeStoreUrl,

    #[error("Pool size must be between 1 and 100")]
    InvalidPoolSize,

    #[error("Invalid URL for {0}: must be http(s)")]
    InvalidUrl(&'static str),

    #[error("Interval for {0} must be positive")]
    InvalidInterval(&'static str),
}
