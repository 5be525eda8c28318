//! HTTP Notifier - Implementation of Notifier for the downstream notifier service.
//!
//! # Configuration
//!
//! ```ignore
//! let config = HttpNotifierConfig::new("http://cms-notifier:8080")
//!     .with_timeout(Duration::from_secs(10));
//!
//! let notifier = HttpNotifier::new(config)?;
//! ```
//!
//! Each document is posted to `{base_url}/notify` with the carousel headers;
//! only `200 OK` counts as delivered.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::time::Duration;

use crate::domain::content::Content;
use crate::ports::{Notifier, NotifierError};

/// Transaction id header.
pub const REQUEST_ID_HEADER: &str = "X-Request-Id";
/// Content digest header used downstream for dedupe.
pub const NATIVE_HASH_HEADER: &str = "X-Native-Hash";
/// Publisher identity header.
pub const ORIGIN_SYSTEM_HEADER: &str = "X-Origin-System-Id";

/// Configuration for the HTTP notifier.
#[derive(Debug, Clone)]
pub struct HttpNotifierConfig {
    /// Base URL of the notifier service.
    pub base_url: String,
    /// Request timeout.
    pub timeout: Duration,
}

impl HttpNotifierConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: Duration::from_secs(10),
        }
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Notifier speaking HTTP.
#[derive(Debug, Clone)]
pub struct HttpNotifier {
    config: HttpNotifierConfig,
    client: Client,
}

impl HttpNotifier {
    pub fn new(config: HttpNotifierConfig) -> Result<Self, NotifierError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| NotifierError::InvalidRequest(e.to_string()))?;
        Ok(Self { config, client })
    }

    fn notify_url(&self) -> String {
        format!("{}/notify", self.config.base_url.trim_end_matches('/'))
    }

    fn gtg_url(&self) -> String {
        format!("{}/__gtg", self.config.base_url.trim_end_matches('/'))
    }
}

fn transport_error(e: reqwest::Error) -> NotifierError {
    if e.is_timeout() {
        NotifierError::Timeout
    } else if e.is_builder() {
        NotifierError::InvalidRequest(e.to_string())
    } else {
        NotifierError::Transport(e.to_string())
    }
}

#[async_trait]
impl Notifier for HttpNotifier {
    async fn notify(
        &self,
        origin: &str,
        tid: &str,
        content: &Content,
        hash: &str,
    ) -> Result<(), NotifierError> {
        let body = serde_json::to_vec(&content.body)
            .map_err(|e| NotifierError::InvalidRequest(e.to_string()))?;

        let response = self
            .client
            .post(self.notify_url())
            .header(REQUEST_ID_HEADER, tid)
            .header(NATIVE_HASH_HEADER, hash)
            .header(ORIGIN_SYSTEM_HEADER, origin)
            .header(reqwest::header::CONTENT_TYPE, content.content_type.as_str())
            .body(body)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if status != StatusCode::OK {
            tracing::debug!(tid = %tid, status = status.as_u16(), "Notifier rejected content");
            return Err(NotifierError::Status {
                status: status.as_u16(),
            });
        }
        Ok(())
    }

    async fn gtg(&self) -> Result<(), NotifierError> {
        let response = self
            .client
            .get(self.gtg_url())
            .send()
            .await
            .map_err(transport_error)?;

        if response.status() != StatusCode::OK {
            return Err(NotifierError::Status {
                status: response.status().as_u16(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::content::DEFAULT_CONTENT_TYPE;
    use axum::body::Bytes;
    use axum::http::{HeaderMap, StatusCode as ServerStatus};
    use axum::routing::{get, post};
    use axum::Router;
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    type Captured = Arc<Mutex<Vec<(HeaderMap, Bytes)>>>;

    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    async fn capturing_server(status: ServerStatus) -> (String, Captured) {
        let captured: Captured = Arc::default();
        let sink = captured.clone();
        let router = Router::new()
            .route(
                "/notify",
                post(move |headers: HeaderMap, body: Bytes| {
                    let sink = sink.clone();
                    async move {
                        sink.lock().unwrap().push((headers, body));
                        status
                    }
                }),
            )
            .route("/__gtg", get(|| async { ServerStatus::OK }));
        (serve(router).await, captured)
    }

    fn content() -> Content {
        match json!({"uuid": "a1", "title": "t"}) {
            serde_json::Value::Object(map) => Content::new(map, DEFAULT_CONTENT_TYPE),
            _ => unreachable!(),
        }
    }

    #[test]
    fn urls_tolerate_trailing_slash() {
        let notifier = HttpNotifier::new(HttpNotifierConfig::new("http://notifier:8080/")).unwrap();
        assert_eq!(notifier.notify_url(), "http://notifier:8080/notify");
        assert_eq!(notifier.gtg_url(), "http://notifier:8080/__gtg");
    }

    #[tokio::test]
    async fn notify_sends_carousel_headers_and_body() {
        let (url, captured) = capturing_server(ServerStatus::OK).await;
        let notifier = HttpNotifier::new(HttpNotifierConfig::new(url)).unwrap();

        notifier
            .notify("methode-web-pub", "tid_1_carousel_1494863672", &content(), "abc123")
            .await
            .unwrap();

        let captured = captured.lock().unwrap();
        let (headers, body) = &captured[0];
        assert_eq!(headers[REQUEST_ID_HEADER], "tid_1_carousel_1494863672");
        assert_eq!(headers[NATIVE_HASH_HEADER], "abc123");
        assert_eq!(headers[ORIGIN_SYSTEM_HEADER], "methode-web-pub");
        assert_eq!(headers["content-type"], DEFAULT_CONTENT_TYPE);
        let sent: serde_json::Value = serde_json::from_slice(body).unwrap();
        assert_eq!(sent["uuid"], "a1");
    }

    #[tokio::test]
    async fn non_ok_status_is_an_error() {
        let (url, _) = capturing_server(ServerStatus::SERVICE_UNAVAILABLE).await;
        let notifier = HttpNotifier::new(HttpNotifierConfig::new(url)).unwrap();

        let result = notifier.notify("o", "tid", &content(), "h").await;

        assert!(matches!(result, Err(NotifierError::Status { status: 503 })));
    }

    #[tokio::test]
    async fn gtg_probes_service() {
        let (url, _) = capturing_server(ServerStatus::OK).await;
        let notifier = HttpNotifier::new(HttpNotifierConfig::new(url)).unwrap();
        assert!(notifier.gtg().await.is_ok());
    }

    #[tokio::test]
    async fn unreachable_service_is_transport_error() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let notifier = HttpNotifier::new(
            HttpNotifierConfig::new(format!("http://{}", addr)).with_timeout(Duration::from_secs(2)),
        )
        .unwrap();

        let result = notifier.gtg().await;

        assert!(result.unwrap_err().is_transient());
    }
}
