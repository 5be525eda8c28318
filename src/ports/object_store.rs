//! ObjectStore port - Minimal keyed blob storage used for checkpoints.
//!
//! Objects are written under an id partition. Keys within a partition sort
//! lexicographically by write time, so the greatest key is the latest write.

use async_trait::async_trait;

/// Errors that can occur in object storage.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ObjectStoreError {
    #[error("Object key is invalid: {0}")]
    InvalidKey(String),

    #[error("IO error: {0}")]
    Io(String),
}

/// A stored object with its declared content type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub body: Vec<u8>,
    pub content_type: String,
}

/// Port for blob storage.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Writes `body` under `key` in the `id` partition.
    async fn write(
        &self,
        id: &str,
        key: &str,
        body: Vec<u8>,
        content_type: &str,
    ) -> Result<(), ObjectStoreError>;

    /// Reads an object; `None` when the key does not exist.
    async fn read(&self, key: &str) -> Result<Option<StoredObject>, ObjectStoreError>;

    /// Greatest key written for `id`, if any.
    async fn get_latest_key_for_id(&self, id: &str) -> Result<Option<String>, ObjectStoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[allow(dead_code)]
    fn assert_object_safe(_: &dyn ObjectStore) {}

    #[test]
    fn object_store_error_displays_cause() {
        let err = ObjectStoreError::InvalidKey("../x".to_string());
        assert!(err.to_string().contains("../x"));
    }
}
