//! Native content as read back from the document store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Default content type when the store does not record one.
pub const DEFAULT_CONTENT_TYPE: &str = "application/json";

/// One native document: an opaque attribute map plus its MIME type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Content {
    /// Document attributes; `None` when the store returned no body.
    pub body: Option<Map<String, Value>>,
    /// MIME type forwarded as the notifier `Content-Type`.
    pub content_type: String,
}

impl Content {
    /// Creates content with a body.
    pub fn new(body: Map<String, Value>, content_type: impl Into<String>) -> Self {
        Self {
            body: Some(body),
            content_type: content_type.into(),
        }
    }

    /// Content for a document the store knows nothing about.
    pub fn empty(content_type: impl Into<String>) -> Self {
        Self {
            body: None,
            content_type: content_type.into(),
        }
    }

    /// The `uuid` attribute.
    pub fn uuid(&self) -> Option<&str> {
        self.str_attribute("uuid")
    }

    /// The existing transaction id, ignoring blank values.
    pub fn publish_reference(&self) -> Option<&str> {
        self.str_attribute("publishReference")
            .map(str::trim)
            .filter(|r| !r.is_empty())
    }

    /// The `type` attribute used by content filters.
    pub fn content_kind(&self) -> Option<&str> {
        self.str_attribute("type")
    }

    /// The `lastModified` attribute, when present and RFC3339.
    pub fn last_modified(&self) -> Option<DateTime<Utc>> {
        self.str_attribute("lastModified")
            .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
            .map(|dt| dt.with_timezone(&Utc))
    }

    fn str_attribute(&self, key: &str) -> Option<&str> {
        self.body.as_ref()?.get(key)?.as_str()
    }
}
