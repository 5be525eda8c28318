//! PostgreSQL implementation of the NativeStore port.
//!
//! Each collection is a table:
//!
//! ```sql
//! CREATE TABLE methode (
//!     uuid          UUID PRIMARY KEY,
//!     content       JSONB,
//!     content_type  TEXT,
//!     last_modified TIMESTAMPTZ NOT NULL
//! );
//! ```
//!
//! Id queries are served by a paged cursor that fetches `batch_size` rows
//! at a time with `LIMIT/OFFSET`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::collections::VecDeque;
use std::time::Duration;

use crate::domain::content::{Content, DEFAULT_CONTENT_TYPE};
use crate::ports::{NativeStore, NativeStoreError, NativeTx, UuidIterator, UuidQuery};

/// PostgreSQL native store backed by a connection pool.
#[derive(Clone)]
pub struct PostgresNativeStore {
    pool: PgPool,
}

impl std::fmt::Debug for PostgresNativeStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostgresNativeStore")
            .field("pool", &"PgPool")
            .finish()
    }
}

impl PostgresNativeStore {
    /// Creates a store over an existing pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connects a new pool.
    pub async fn connect(
        url: &str,
        max_connections: u32,
        connect_timeout: Duration,
    ) -> Result<Self, NativeStoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(connect_timeout)
            .connect(url)
            .await
            .map_err(|e| NativeStoreError::Connection(e.to_string()))?;
        Ok(Self::new(pool))
    }
}

#[async_trait]
impl NativeStore for PostgresNativeStore {
    async fn open(&self) -> Result<Box<dyn NativeTx>, NativeStoreError> {
        let tx = PostgresNativeTx {
            pool: self.pool.clone(),
        };
        tx.ping().await?;
        Ok(Box::new(tx))
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}

/// Collection names are interpolated into SQL, so only plain identifiers pass.
fn table_name(collection: &str) -> Result<&str, NativeStoreError> {
    let mut chars = collection.chars();
    let valid = match chars.next() {
        Some(first) => {
            (first.is_ascii_alphabetic() || first == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
                && collection.len() <= 63
        }
        None => false,
    };
    if valid {
        Ok(collection)
    } else {
        Err(NativeStoreError::InvalidCollection(collection.to_string()))
    }
}

fn query_error(e: sqlx::Error) -> NativeStoreError {
    NativeStoreError::Query(e.to_string())
}

struct PostgresNativeTx {
    pool: PgPool,
}

#[async_trait]
impl NativeTx for PostgresNativeTx {
    async fn find_uuids(
        &self,
        collection: &str,
        skip: usize,
        batch_size: usize,
    ) -> Result<UuidQuery, NativeStoreError> {
        let table = table_name(collection)?;

        let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", table))
            .fetch_one(&self.pool)
            .await
            .map_err(query_error)?;

        let iterator = PagedUuidIterator {
            pool: self.pool.clone(),
            sql: format!(
                "SELECT uuid::text FROM {} ORDER BY last_modified DESC, uuid LIMIT $1 OFFSET $2",
                table
            ),
            window: None,
            offset: skip,
            batch_size: batch_size.max(1),
            buffer: VecDeque::new(),
            exhausted: false,
        };

        Ok(UuidQuery {
            iterator: Box::new(iterator),
            total: usize::try_from(total).unwrap_or(0),
        })
    }

    async fn find_uuids_in_time_window(
        &self,
        collection: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        batch_size: usize,
    ) -> Result<UuidQuery, NativeStoreError> {
        let table = table_name(collection)?;

        let total: i64 = sqlx::query_scalar(&format!(
            "SELECT COUNT(*) FROM {} WHERE last_modified >= $1 AND last_modified < $2",
            table
        ))
        .bind(start)
        .bind(end)
        .fetch_one(&self.pool)
        .await
        .map_err(query_error)?;

        let iterator = PagedUuidIterator {
            pool: self.pool.clone(),
            sql: format!(
                "SELECT uuid::text FROM {} WHERE last_modified >= $3 AND last_modified < $4 \
                 ORDER BY last_modified ASC, uuid LIMIT $1 OFFSET $2",
                table
            ),
            window: Some((start, end)),
            offset: 0,
            batch_size: batch_size.max(1),
            buffer: VecDeque::new(),
            exhausted: false,
        };

        Ok(UuidQuery {
            iterator: Box::new(iterator),
            total: usize::try_from(total).unwrap_or(0),
        })
    }

    async fn read_native_content(
        &self,
        collection: &str,
        uuid: &str,
    ) -> Result<Content, NativeStoreError> {
        let table = table_name(collection)?;

        let Ok(id) = uuid::Uuid::parse_str(uuid) else {
            return Ok(Content::empty(DEFAULT_CONTENT_TYPE));
        };

        let row = sqlx::query_as::<_, (Option<Value>, Option<String>)>(&format!(
            "SELECT content, content_type FROM {} WHERE uuid = $1",
            table
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(query_error)?;

        let content = match row {
            Some((Some(Value::Object(body)), content_type)) => Content::new(
                body,
                content_type.unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string()),
            ),
            Some((_, content_type)) => {
                Content::empty(content_type.unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string()))
            }
            None => Content::empty(DEFAULT_CONTENT_TYPE),
        };
        Ok(content)
    }

    async fn ping(&self) -> Result<(), NativeStoreError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| NativeStoreError::Connection(e.to_string()))?;
        Ok(())
    }

    async fn close(&self) {}
}

/// Cursor that pages through an id query `batch_size` rows at a time.
struct PagedUuidIterator {
    pool: PgPool,
    sql: String,
    window: Option<(DateTime<Utc>, DateTime<Utc>)>,
    offset: usize,
    batch_size: usize,
    buffer: VecDeque<String>,
    exhausted: bool,
}

impl PagedUuidIterator {
    async fn fetch_page(&mut self) -> Result<(), NativeStoreError> {
        let limit = i64::try_from(self.batch_size).unwrap_or(i64::MAX);
        let offset = i64::try_from(self.offset).unwrap_or(i64::MAX);

        let mut query = sqlx::query_scalar::<_, String>(&self.sql)
            .bind(limit)
            .bind(offset);
        if let Some((start, end)) = self.window {
            query = query.bind(start).bind(end);
        }

        let page = query
            .fetch_all(&self.pool)
            .await
            .map_err(|e| NativeStoreError::Cursor(e.to_string()))?;

        if page.len() < self.batch_size {
            self.exhausted = true;
        }
        self.offset += page.len();
        self.buffer.extend(page);
        Ok(())
    }
}

#[async_trait]
impl UuidIterator for PagedUuidIterator {
    async fn next(&mut self) -> Result<Option<String>, NativeStoreError> {
        if self.buffer.is_empty() && !self.exhausted {
            self.fetch_page().await?;
        }
        Ok(self.buffer.pop_front())
    }

    async fn close(&mut self) -> Result<(), NativeStoreError> {
        self.buffer.clear();
        self.exhausted = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_identifiers_are_valid_tables() {
        assert_eq!(table_name("methode").unwrap(), "methode");
        assert_eq!(table_name("_wordpress_2").unwrap(), "_wordpress_2");
    }

    #[test]
    fn injection_attempts_are_rejected() {
        for bad in ["", "1abc", "methode; DROP TABLE x", "a-b", "a.b", "\"quoted\""] {
            assert!(
                matches!(table_name(bad), Err(NativeStoreError::InvalidCollection(_))),
                "{} should be rejected",
                bad
            );
        }
    }

    #[test]
    fn overlong_identifiers_are_rejected() {
        let name = "a".repeat(64);
        assert!(table_name(&name).is_err());
    }
}
