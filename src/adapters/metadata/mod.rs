//! Metadata adapters
//!
//! - **ObjectStoreMetadataReadWriter** - Checkpoints as JSON objects in an ObjectStore

mod object_store_metadata;

pub use object_store_metadata::ObjectStoreMetadataReadWriter;
