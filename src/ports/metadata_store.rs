//! MetadataReadWriter port - Persistence of cycle checkpoints.

use async_trait::async_trait;

use crate::domain::cycle::{CycleCheckpoint, CycleConfig, CycleMetadata};
use crate::domain::foundation::CycleId;

use super::ObjectStoreError;

/// Errors that can occur reading or writing checkpoints.
#[derive(Debug, Clone, thiserror::Error)]
pub enum MetadataError {
    #[error("Failed to serialize checkpoint: {0}")]
    SerializationFailed(String),

    #[error("Failed to deserialize checkpoint: {0}")]
    DeserializationFailed(String),

    #[error("Checkpoint {key} has unsupported content type {content_type:?}")]
    UnsupportedContentType { key: String, content_type: String },

    #[error("Checkpoint {0} disappeared before it could be read")]
    Missing(String),

    #[error("Object store error: {0}")]
    Store(#[from] ObjectStoreError),
}

/// Port for persisting and loading cycle progress.
#[async_trait]
pub trait MetadataReadWriter: Send + Sync {
    /// Persists a checkpoint for `id` under a new timestamped key.
    async fn write_metadata(
        &self,
        id: &CycleId,
        config: &CycleConfig,
        metadata: &CycleMetadata,
    ) -> Result<(), MetadataError>;

    /// Loads the latest checkpoint for `id`; `None` when none was written.
    async fn load_metadata(&self, id: &CycleId) -> Result<Option<CycleCheckpoint>, MetadataError>;
}
