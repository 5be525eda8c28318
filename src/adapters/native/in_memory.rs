//! In-Memory Native Store Adapter
//!
//! Holds documents per collection in memory. Useful for testing and
//! development.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::content::{Content, DEFAULT_CONTENT_TYPE};
use crate::ports::{NativeStore, NativeStoreError, NativeTx, UuidIterator, UuidQuery};

#[derive(Debug, Clone)]
struct StoredDocument {
    uuid: String,
    body: Option<Map<String, Value>>,
    content_type: String,
    last_modified: DateTime<Utc>,
}

type Collections = HashMap<String, Vec<StoredDocument>>;

/// In-memory native store
#[derive(Debug, Clone, Default)]
pub struct InMemoryNativeStore {
    collections: Arc<RwLock<Collections>>,
    unavailable: Arc<AtomicBool>,
    opened: Arc<AtomicUsize>,
}

impl InMemoryNativeStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a document. Non-object bodies are stored without a body.
    pub async fn insert(
        &self,
        collection: &str,
        uuid: &str,
        body: Value,
        last_modified: DateTime<Utc>,
    ) {
        let body = match body {
            Value::Object(map) => Some(map),
            _ => None,
        };
        self.put(collection, uuid, body, last_modified).await;
    }

    /// Insert an id whose content reads back empty
    pub async fn insert_uuid_only(&self, collection: &str, uuid: &str, last_modified: DateTime<Utc>) {
        self.put(collection, uuid, None, last_modified).await;
    }

    /// Remove a document
    pub async fn remove(&self, collection: &str, uuid: &str) {
        if let Some(docs) = self.collections.write().await.get_mut(collection) {
            docs.retain(|d| d.uuid != uuid);
        }
    }

    /// Make `open` fail with a connection error (simulates an outage)
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Number of transactions opened so far
    pub fn open_count(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    async fn put(
        &self,
        collection: &str,
        uuid: &str,
        body: Option<Map<String, Value>>,
        last_modified: DateTime<Utc>,
    ) {
        let mut collections = self.collections.write().await;
        let docs = collections.entry(collection.to_string()).or_default();
        docs.retain(|d| d.uuid != uuid);
        docs.push(StoredDocument {
            uuid: uuid.to_string(),
            body,
            content_type: DEFAULT_CONTENT_TYPE.to_string(),
            last_modified,
        });
    }
}

#[async_trait]
impl NativeStore for InMemoryNativeStore {
    async fn open(&self) -> Result<Box<dyn NativeTx>, NativeStoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(NativeStoreError::Connection(
                "in-memory store marked unavailable".to_string(),
            ));
        }
        self.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(InMemoryNativeTx {
            collections: self.collections.clone(),
        }))
    }

    async fn close(&self) {}
}

struct InMemoryNativeTx {
    collections: Arc<RwLock<Collections>>,
}

impl InMemoryNativeTx {
    async fn snapshot(&self, collection: &str) -> Vec<StoredDocument> {
        self.collections
            .read()
            .await
            .get(collection)
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl NativeTx for InMemoryNativeTx {
    async fn find_uuids(
        &self,
        collection: &str,
        skip: usize,
        _batch_size: usize,
    ) -> Result<UuidQuery, NativeStoreError> {
        let mut docs = self.snapshot(collection).await;
        docs.sort_by(|a, b| b.last_modified.cmp(&a.last_modified));

        let total = docs.len();
        let uuids = docs.into_iter().skip(skip).map(|d| d.uuid).collect();
        Ok(UuidQuery {
            iterator: Box::new(InMemoryUuidIterator { uuids }),
            total,
        })
    }

    async fn find_uuids_in_time_window(
        &self,
        collection: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        _batch_size: usize,
    ) -> Result<UuidQuery, NativeStoreError> {
        let mut docs: Vec<StoredDocument> = self
            .snapshot(collection)
            .await
            .into_iter()
            .filter(|d| d.last_modified >= start && d.last_modified < end)
            .collect();
        docs.sort_by(|a, b| a.last_modified.cmp(&b.last_modified));

        let total = docs.len();
        let uuids = docs.into_iter().map(|d| d.uuid).collect();
        Ok(UuidQuery {
            iterator: Box::new(InMemoryUuidIterator { uuids }),
            total,
        })
    }

    async fn read_native_content(
        &self,
        collection: &str,
        uuid: &str,
    ) -> Result<Content, NativeStoreError> {
        let collections = self.collections.read().await;
        let found = collections
            .get(collection)
            .and_then(|docs| docs.iter().find(|d| d.uuid == uuid));

        Ok(match found {
            Some(StoredDocument {
                body: Some(body),
                content_type,
                ..
            }) => Content::new(body.clone(), content_type.clone()),
            _ => Content::empty(DEFAULT_CONTENT_TYPE),
        })
    }

    async fn ping(&self) -> Result<(), NativeStoreError> {
        Ok(())
    }

    async fn close(&self) {}
}

struct InMemoryUuidIterator {
    uuids: VecDeque<String>,
}

#[async_trait]
impl UuidIterator for InMemoryUuidIterator {
    async fn next(&mut self) -> Result<Option<String>, NativeStoreError> {
        Ok(self.uuids.pop_front())
    }

    async fn close(&mut self) -> Result<(), NativeStoreError> {
        self.uuids.clear();
        Ok(())
    }
}
