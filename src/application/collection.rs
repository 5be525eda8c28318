//! Id collections - bounded producers of document ids for a cycle pass.
//!
//! Two variants share the [`UuidCollection`] capability set:
//!
//! - [`NativeUuidCollection`] streams from a server-side cursor; `skip` is
//!   applied by the store before any filtering.
//! - [`InMemoryUuidCollection`] materialises the whole result, runs it
//!   through a [`FilterChain`], then applies `skip` to the filtered ids.
//!
//! In both variants `length` is the size of the full pass (before `skip`),
//! so `completed` counters and `skip` values always refer to the sequence
//! the variant yields.

use std::collections::VecDeque;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::filter::{FilterChain, FilterError};
use crate::ports::{NativeStoreError, NativeTx, UuidIterator, UuidQuery};

/// Errors produced while iterating a collection.
#[derive(Debug, Clone, Error)]
pub enum CollectionError {
    #[error("Iterator error: {0}")]
    Store(#[from] NativeStoreError),

    #[error("Filter error: {0}")]
    Filter(#[from] FilterError),
}

/// Bounded sequence of document ids.
#[async_trait]
pub trait UuidCollection: Send {
    /// Size of the full pass, before any skip.
    fn length(&self) -> usize;

    /// Whether the collection is exhausted.
    fn done(&self) -> bool;

    /// Next id, or `None` when finished.
    async fn next(&mut self) -> Result<Option<String>, CollectionError>;

    /// Releases underlying resources.
    async fn close(&mut self) -> Result<(), CollectionError>;
}

/// Collection streaming from a native store cursor.
pub struct NativeUuidCollection {
    iterator: Box<dyn UuidIterator>,
    length: usize,
    done: bool,
}

impl NativeUuidCollection {
    /// Opens a newest-first cursor over `collection`, skipping `skip` ids.
    pub async fn open(
        tx: &dyn NativeTx,
        collection: &str,
        skip: usize,
        batch_size: usize,
    ) -> Result<Self, CollectionError> {
        let query = tx.find_uuids(collection, skip, batch_size).await?;
        Ok(Self::from_query(query))
    }

    pub fn from_query(query: UuidQuery) -> Self {
        Self {
            iterator: query.iterator,
            length: query.total,
            done: false,
        }
    }
}

#[async_trait]
impl UuidCollection for NativeUuidCollection {
    fn length(&self) -> usize {
        self.length
    }

    fn done(&self) -> bool {
        self.done
    }

    async fn next(&mut self) -> Result<Option<String>, CollectionError> {
        if self.done {
            return Ok(None);
        }
        let next = self.iterator.next().await?;
        if next.is_none() {
            self.done = true;
        }
        Ok(next)
    }

    async fn close(&mut self) -> Result<(), CollectionError> {
        self.done = true;
        self.iterator.close().await?;
        Ok(())
    }
}

/// Fully materialised, filtered, skip-advanced snapshot of ids.
#[derive(Debug, Clone, Default)]
pub struct InMemoryUuidCollection {
    uuids: VecDeque<String>,
    length: usize,
}

impl InMemoryUuidCollection {
    /// Wraps an already filtered list of ids.
    pub fn from_uuids(uuids: Vec<String>) -> Self {
        let length = uuids.len();
        Self {
            uuids: uuids.into(),
            length,
        }
    }

    /// Drains `query`, keeps the ids `filters` accept (reading content from
    /// `collection` through `tx` when a filter needs it), then drops the
    /// first `skip` kept ids.
    pub async fn materialise(
        tx: &dyn NativeTx,
        collection: &str,
        mut query: UuidQuery,
        skip: usize,
        filters: &FilterChain,
    ) -> Result<Self, CollectionError> {
        let result = Self::drain(tx, collection, query.iterator.as_mut(), filters).await;
        let closed = query.iterator.close().await;

        let kept = result?;
        closed?;

        let length = kept.len();
        let mut uuids: VecDeque<String> = kept.into();
        uuids.drain(..skip.min(length));
        Ok(Self { uuids, length })
    }

    async fn drain(
        tx: &dyn NativeTx,
        collection: &str,
        iterator: &mut dyn UuidIterator,
        filters: &FilterChain,
    ) -> Result<Vec<String>, CollectionError> {
        let needs_content = filters.requires_content();
        let mut kept = Vec::new();

        while let Some(uuid) = iterator.next().await? {
            let content = if needs_content {
                Some(tx.read_native_content(collection, &uuid).await?)
            } else {
                None
            };
            if filters.keep(&uuid, content.as_ref())? {
                kept.push(uuid);
            }
        }
        Ok(kept)
    }

    /// Ids not yet yielded.
    pub fn remaining(&self) -> usize {
        self.uuids.len()
    }
}

#[async_trait]
impl UuidCollection for InMemoryUuidCollection {
    fn length(&self) -> usize {
        self.length
    }

    fn done(&self) -> bool {
        self.uuids.is_empty()
    }

    async fn next(&mut self) -> Result<Option<String>, CollectionError> {
        Ok(self.uuids.pop_front())
    }

    async fn close(&mut self) -> Result<(), CollectionError> {
        self.uuids.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::native::InMemoryNativeStore;
    use crate::domain::filter::{BlacklistFilter, ImageFilter};
    use crate::ports::NativeStore;
    use chrono::{Duration, Utc};
    use serde_json::json;
    use std::sync::Arc;

    async fn store_with(ids: &[(&str, &str)]) -> InMemoryNativeStore {
        let store = InMemoryNativeStore::new();
        let now = Utc::now();
        for (i, (uuid, kind)) in ids.iter().enumerate() {
            store
                .insert(
                    "methode",
                    uuid,
                    json!({"uuid": uuid, "type": kind}),
                    now - Duration::seconds(i as i64),
                )
                .await;
        }
        store
    }

    async fn drain(collection: &mut dyn UuidCollection) -> Vec<String> {
        let mut out = Vec::new();
        while let Some(uuid) = collection.next().await.unwrap() {
            out.push(uuid);
        }
        out
    }

    #[tokio::test]
    async fn native_collection_reports_full_length_and_skips() {
        let store = store_with(&[("a", "Article"), ("b", "Article"), ("c", "Article")]).await;
        let tx = store.open().await.unwrap();

        let mut collection = NativeUuidCollection::open(tx.as_ref(), "methode", 1, 80)
            .await
            .unwrap();

        assert_eq!(collection.length(), 3);
        assert!(!collection.done());
        assert_eq!(drain(&mut collection).await, vec!["b", "c"]);
        assert!(collection.done());
        collection.close().await.unwrap();
    }

    #[tokio::test]
    async fn in_memory_collection_applies_skip_after_filtering() {
        let store = store_with(&[
            ("a", "Article"),
            ("blocked", "Article"),
            ("b", "Image"),
            ("c", "Article"),
            ("d", "Article"),
        ])
        .await;
        let tx = store.open().await.unwrap();
        let filters = FilterChain::new()
            .with(Arc::new(BlacklistFilter::from_lines("blocked\n")))
            .with(Arc::new(ImageFilter));

        let query = tx.find_uuids("methode", 0, 80).await.unwrap();
        let mut collection = InMemoryUuidCollection::materialise(tx.as_ref(), "methode", query, 1, &filters)
            .await
            .unwrap();

        assert_eq!(collection.length(), 3);
        assert_eq!(collection.remaining(), 2);
        assert_eq!(drain(&mut collection).await, vec!["c", "d"]);
    }

    #[tokio::test]
    async fn in_memory_collection_skip_beyond_length_is_empty() {
        let store = store_with(&[("a", "Article")]).await;
        let tx = store.open().await.unwrap();
        let query = tx.find_uuids("methode", 0, 80).await.unwrap();

        let collection = InMemoryUuidCollection::materialise(
            tx.as_ref(),
            "methode",
            query,
            5,
            &FilterChain::new(),
        )
        .await
        .unwrap();

        assert_eq!(collection.length(), 1);
        assert!(collection.done());
    }

    #[tokio::test]
    async fn filter_errors_propagate() {
        let store = InMemoryNativeStore::new();
        store.insert_uuid_only("methode", "ghost", Utc::now()).await;
        let tx = store.open().await.unwrap();
        let query = tx.find_uuids("methode", 0, 80).await.unwrap();
        let filters = FilterChain::new().with(Arc::new(ImageFilter));

        let result =
            InMemoryUuidCollection::materialise(tx.as_ref(), "methode", query, 0, &filters).await;

        assert!(matches!(result, Err(CollectionError::Filter(_))));
    }

    #[tokio::test]
    async fn from_uuids_yields_in_order() {
        let mut collection =
            InMemoryUuidCollection::from_uuids(vec!["x".to_string(), "y".to_string()]);
        assert_eq!(collection.length(), 2);
        assert_eq!(drain(&mut collection).await, vec!["x", "y"]);
        assert!(collection.done());
    }
}
