//! Storage Adapters
//!
//! Implementations of the ObjectStore port used for cycle checkpoints, plus
//! the blacklist file loader.
//!
//! ## Available Adapters
//!
//! - **FileObjectStore** - Stores objects as files on disk
//! - **InMemoryObjectStore** - Stores objects in memory (testing/development)
//!
//! ## Usage
//!
//! ```ignore
//! use adapters::storage::{FileObjectStore, InMemoryObjectStore};
//!
//! // Production: file-based storage
//! let store = FileObjectStore::new("./data/checkpoints");
//!
//! // Testing: in-memory storage
//! let store = InMemoryObjectStore::new();
//! ```

mod file_blacklist;
mod file_object_store;
mod in_memory_object_store;

pub use file_blacklist::load_blacklist;
pub use file_object_store::FileObjectStore;
pub use in_memory_object_store::InMemoryObjectStore;

use crate::ports::ObjectStoreError;

/// Checks `key` is a relative `id/name` path with no traversal.
pub(crate) fn validate_key(id: Option<&str>, key: &str) -> Result<(), ObjectStoreError> {
    let mut segments = key.split('/');
    let (Some(prefix), Some(name), None) = (segments.next(), segments.next(), segments.next()) else {
        return Err(ObjectStoreError::InvalidKey(key.to_string()));
    };

    let bad_segment = |s: &str| s.is_empty() || s == "." || s == ".." || s.contains('\\');
    if bad_segment(prefix) || bad_segment(name) {
        return Err(ObjectStoreError::InvalidKey(key.to_string()));
    }
    if let Some(id) = id {
        if prefix != id {
            return Err(ObjectStoreError::InvalidKey(key.to_string()));
        }
    }
    Ok(())
}
