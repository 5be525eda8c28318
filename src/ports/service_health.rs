//! ServiceHealthCheck port - Good-to-go probes for services the carousel depends on.

use async_trait::async_trait;

/// Reason a dependency is not good to go.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{service} is not good to go: {reason}")]
pub struct HealthCheckError {
    pub service: String,
    pub reason: String,
}

impl HealthCheckError {
    pub fn new(service: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            reason: reason.into(),
        }
    }
}

/// Port for probing one dependency.
#[async_trait]
pub trait ServiceHealthCheck: Send + Sync {
    /// Human-readable name for logs.
    fn name(&self) -> &str;

    /// Returns `Ok` when the dependency is healthy.
    async fn gtg(&self) -> Result<(), HealthCheckError>;
}
