//! In-Memory Object Store Adapter
//!
//! Stores objects in memory. Useful for testing and development.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::validate_key;
use crate::ports::{ObjectStore, ObjectStoreError, StoredObject};

/// In-memory object storage
#[derive(Debug, Clone, Default)]
pub struct InMemoryObjectStore {
    objects: Arc<RwLock<BTreeMap<String, StoredObject>>>,
    writes: Arc<RwLock<usize>>,
}

impl InMemoryObjectStore {
    /// Create a new in-memory store
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of writes (useful for tests)
    pub async fn write_count(&self) -> usize {
        *self.writes.read().await
    }

    /// All stored keys in order
    pub async fn keys(&self) -> Vec<String> {
        self.objects.read().await.keys().cloned().collect()
    }

    /// Store an object directly, bypassing validation (useful for tests)
    pub async fn put_raw(&self, key: &str, body: Vec<u8>, content_type: &str) {
        self.objects.write().await.insert(
            key.to_string(),
            StoredObject {
                body,
                content_type: content_type.to_string(),
            },
        );
    }
}

#[async_trait]
impl ObjectStore for InMemoryObjectStore {
    async fn write(
        &self,
        id: &str,
        key: &str,
        body: Vec<u8>,
        content_type: &str,
    ) -> Result<(), ObjectStoreError> {
        validate_key(Some(id), key)?;
        self.put_raw(key, body, content_type).await;
        *self.writes.write().await += 1;
        Ok(())
    }

    async fn read(&self, key: &str) -> Result<Option<StoredObject>, ObjectStoreError> {
        Ok(self.objects.read().await.get(key).cloned())
    }

    async fn get_latest_key_for_id(&self, id: &str) -> Result<Option<String>, ObjectStoreError> {
        let prefix = format!("{}/", id);
        let objects = self.objects.read().await;
        Ok(objects
            .range(prefix.clone()..)
            .take_while(|(key, _)| key.starts_with(&prefix))
            .map(|(key, _)| key.clone())
            .last())
    }
}
