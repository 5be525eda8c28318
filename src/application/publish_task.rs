//! Publish task - republishes one native document to the notifier.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use super::native_reader::NativeReader;
use crate::ports::{NativeStoreError, Notifier, NotifierError};

/// Length of the random part of a generated transaction id.
const GENERATED_TID_LEN: usize = 10;

/// Errors publishing a single document. All are counted against the cycle's
/// `errors` and never stop it.
#[derive(Debug, Clone, Error)]
pub enum PublishError {
    #[error("No content found for {uuid}")]
    EmptyContent { uuid: String },

    #[error("Failed to read native content: {0}")]
    Read(#[from] NativeStoreError),

    #[error("Failed to notify: {0}")]
    Notify(#[from] NotifierError),
}

/// Republishes one document by id.
#[async_trait]
pub trait PublishTask: Send + Sync {
    async fn publish(&self, origin: &str, collection: &str, uuid: &str) -> Result<(), PublishError>;
}

/// Reads native content and forwards it to the notifier with a carousel tid.
pub struct NativeContentPublishTask {
    reader: NativeReader,
    notifier: Arc<dyn Notifier>,
}

impl NativeContentPublishTask {
    pub fn new(reader: NativeReader, notifier: Arc<dyn Notifier>) -> Self {
        Self { reader, notifier }
    }
}

#[async_trait]
impl PublishTask for NativeContentPublishTask {
    async fn publish(&self, origin: &str, collection: &str, uuid: &str) -> Result<(), PublishError> {
        let (content, hash) = self.reader.get(collection, uuid).await?;

        if content.body.is_none() {
            return Err(PublishError::EmptyContent {
                uuid: uuid.to_string(),
            });
        }

        let tid = carousel_tid(content.publish_reference(), Utc::now().timestamp());
        debug!(uuid = %uuid, tid = %tid, collection = %collection, "Publishing native content");

        self.notifier.notify(origin, &tid, &content, &hash).await?;
        Ok(())
    }
}

/// Transaction id for a republish at unix time `now`.
///
/// Reuses the document's own reference when it has one so the republish can
/// be traced back to the original publish.
pub fn carousel_tid(publish_reference: Option<&str>, now: i64) -> String {
    match publish_reference {
        Some(reference) => format!("{}_carousel_{}", reference, now),
        None => {
            let random = Uuid::new_v4().simple().to_string();
            format!(
                "tid_{}_carousel_{}_gentx",
                &random[..GENERATED_TID_LEN],
                now
            )
        }
    }
}
