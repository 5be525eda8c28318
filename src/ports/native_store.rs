//! NativeStore port - Interface to the document store holding native content.
//!
//! The store is opened into short-lived transactions. A transaction exposes
//! two id query shapes (whole collection, newest first; and a `lastModified`
//! window, oldest first) plus single-document reads.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::content::Content;

/// Errors that can occur talking to the native store.
#[derive(Debug, Clone, thiserror::Error)]
pub enum NativeStoreError {
    #[error("Native store connection failed: {0}")]
    Connection(String),

    #[error("Native store query failed: {0}")]
    Query(String),

    #[error("Native store cursor failed: {0}")]
    Cursor(String),

    #[error("Invalid collection name: {0}")]
    InvalidCollection(String),
}

/// Server-side cursor over document ids.
#[async_trait]
pub trait UuidIterator: Send {
    /// Next id, or `None` once the cursor is exhausted.
    async fn next(&mut self) -> Result<Option<String>, NativeStoreError>;

    /// Releases the cursor.
    async fn close(&mut self) -> Result<(), NativeStoreError>;
}

/// An id cursor together with the size of its result set.
pub struct UuidQuery {
    pub iterator: Box<dyn UuidIterator>,
    /// Number of documents matching the query before any `skip`.
    pub total: usize,
}

impl std::fmt::Debug for UuidQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UuidQuery").field("total", &self.total).finish()
    }
}

/// Port for opening sessions against the native store.
#[async_trait]
pub trait NativeStore: Send + Sync {
    /// Opens a transaction.
    async fn open(&self) -> Result<Box<dyn NativeTx>, NativeStoreError>;

    /// Releases all connections.
    async fn close(&self);
}

/// One session against the native store.
#[async_trait]
pub trait NativeTx: Send + Sync {
    /// Ids of the whole collection ordered by `lastModified` descending,
    /// skipping the first `skip`, fetched `batch_size` at a time.
    async fn find_uuids(
        &self,
        collection: &str,
        skip: usize,
        batch_size: usize,
    ) -> Result<UuidQuery, NativeStoreError>;

    /// Ids with `lastModified ∈ [start, end)` ordered ascending.
    async fn find_uuids_in_time_window(
        &self,
        collection: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        batch_size: usize,
    ) -> Result<UuidQuery, NativeStoreError>;

    /// Reads one document; a document that does not exist yields empty content.
    async fn read_native_content(
        &self,
        collection: &str,
        uuid: &str,
    ) -> Result<Content, NativeStoreError>;

    /// Checks the connection is alive.
    async fn ping(&self) -> Result<(), NativeStoreError>;

    /// Ends the session.
    async fn close(&self);
}
