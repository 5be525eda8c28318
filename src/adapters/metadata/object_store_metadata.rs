//! Checkpoint persistence on top of an ObjectStore.
//!
//! Every write creates a new object `{cycleId}/{timestamp}` holding
//! `{"config": ..., "metadata": ...}` as `application/json`. Loading reads
//! the greatest key for the cycle.

use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;

use crate::domain::cycle::{
    checkpoint_key, CycleCheckpoint, CycleConfig, CycleMetadata, CHECKPOINT_CONTENT_TYPE,
};
use crate::domain::foundation::CycleId;
use crate::ports::{MetadataError, MetadataReadWriter, ObjectStore};

/// MetadataReadWriter backed by an ObjectStore.
#[derive(Clone)]
pub struct ObjectStoreMetadataReadWriter {
    store: Arc<dyn ObjectStore>,
}

impl std::fmt::Debug for ObjectStoreMetadataReadWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectStoreMetadataReadWriter")
            .field("store", &"Arc<dyn ObjectStore>")
            .finish()
    }
}

impl ObjectStoreMetadataReadWriter {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl MetadataReadWriter for ObjectStoreMetadataReadWriter {
    async fn write_metadata(
        &self,
        id: &CycleId,
        config: &CycleConfig,
        metadata: &CycleMetadata,
    ) -> Result<(), MetadataError> {
        let checkpoint = CycleCheckpoint::new(config.clone(), metadata.clone());
        let body = serde_json::to_vec(&checkpoint)
            .map_err(|e| MetadataError::SerializationFailed(e.to_string()))?;

        let key = checkpoint_key(id, Utc::now());
        self.store
            .write(id.as_str(), &key, body, CHECKPOINT_CONTENT_TYPE)
            .await?;
        tracing::debug!(cycle_id = %id, key = %key, "Wrote checkpoint");
        Ok(())
    }

    async fn load_metadata(&self, id: &CycleId) -> Result<Option<CycleCheckpoint>, MetadataError> {
        let Some(key) = self.store.get_latest_key_for_id(id.as_str()).await? else {
            return Ok(None);
        };

        let object = self
            .store
            .read(&key)
            .await?
            .ok_or_else(|| MetadataError::Missing(key.clone()))?;

        if object.content_type != CHECKPOINT_CONTENT_TYPE {
            return Err(MetadataError::UnsupportedContentType {
                key,
                content_type: object.content_type,
            });
        }

        let checkpoint = serde_json::from_slice(&object.body)
            .map_err(|e| MetadataError::DeserializationFailed(e.to_string()))?;
        Ok(Some(checkpoint))
    }
}
