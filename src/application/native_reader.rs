//! Reads native documents together with their content digest.

use std::sync::Arc;

use sha2::{Digest, Sha224};

use crate::domain::content::Content;
use crate::ports::{NativeStore, NativeStoreError};

/// Reads documents from the native store, one transaction per read.
#[derive(Clone)]
pub struct NativeReader {
    store: Arc<dyn NativeStore>,
}

impl NativeReader {
    pub fn new(store: Arc<dyn NativeStore>) -> Self {
        Self { store }
    }

    /// Reads `uuid` from `collection`, returning the content and its hash.
    pub async fn get(
        &self,
        collection: &str,
        uuid: &str,
    ) -> Result<(Content, String), NativeStoreError> {
        let tx = self.store.open().await?;
        let result = tx.read_native_content(collection, uuid).await;
        tx.close().await;

        let content = result?;
        let hash = content_hash(&content).map_err(|e| {
            NativeStoreError::Query(format!("unhashable content for {}: {}", uuid, e))
        })?;
        Ok((content, hash))
    }
}

/// Hex SHA-224 of the body as compact JSON. Object keys serialize in
/// sorted order, so equal documents hash equally whatever their key order.
pub fn content_hash(content: &Content) -> Result<String, serde_json::Error> {
    let canonical = serde_json::to_vec(&content.body)?;
    Ok(hex::encode(Sha224::digest(&canonical)))
}
