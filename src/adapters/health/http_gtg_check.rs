//! Good-to-go probes over HTTP.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::sync::Arc;
use std::time::Duration;

use crate::ports::{HealthCheckError, Notifier, ServiceHealthCheck};

/// Probes `{base_url}/__gtg`; only `200 OK` is healthy.
#[derive(Debug, Clone)]
pub struct HttpGtgCheck {
    name: String,
    url: String,
    client: Client,
}

impl HttpGtgCheck {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, HealthCheckError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| HealthCheckError::new(base_url, e.to_string()))?;
        Ok(Self {
            name: base_url.to_string(),
            url: format!("{}/__gtg", base_url.trim_end_matches('/')),
            client,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl ServiceHealthCheck for HttpGtgCheck {
    fn name(&self) -> &str {
        &self.name
    }

    async fn gtg(&self) -> Result<(), HealthCheckError> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| HealthCheckError::new(&self.name, e.to_string()))?;

        match response.status() {
            StatusCode::OK => Ok(()),
            status => Err(HealthCheckError::new(
                &self.name,
                format!("status {}", status.as_u16()),
            )),
        }
    }
}

/// Health of the notifier this carousel publishes to.
pub struct NotifierGtgCheck {
    notifier: Arc<dyn Notifier>,
}

impl NotifierGtgCheck {
    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        Self { notifier }
    }
}

#[async_trait]
impl ServiceHealthCheck for NotifierGtgCheck {
    fn name(&self) -> &str {
        "notifier"
    }

    async fn gtg(&self) -> Result<(), HealthCheckError> {
        self.notifier
            .gtg()
            .await
            .map_err(|e| HealthCheckError::new(self.name(), e.to_string()))
    }
}
