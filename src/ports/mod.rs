//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the carousel and the outside world. Adapters implement these ports.
//!
//! - `NativeStore` / `NativeTx` / `UuidIterator` - Source of native content
//! - `Notifier` - Downstream receiver of republished content
//! - `ObjectStore` - Blob storage for checkpoints
//! - `MetadataReadWriter` - Cycle checkpoint persistence
//! - `ServiceHealthCheck` - Dependency GTG probes

mod metadata_store;
mod native_store;
mod notifier;
mod object_store;
mod service_health;

pub use metadata_store::{MetadataError, MetadataReadWriter};
pub use native_store::{NativeStore, NativeStoreError, NativeTx, UuidIterator, UuidQuery};
pub use notifier::{Notifier, NotifierError};
pub use object_store::{ObjectStore, ObjectStoreError, StoredObject};
pub use service_health::{HealthCheckError, ServiceHealthCheck};
