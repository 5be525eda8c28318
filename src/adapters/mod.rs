//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the carousel to external systems:
//! - `native` - Native document stores (PostgreSQL, in-memory)
//! - `notifier` - Downstream notifier client
//! - `storage` - Object stores for checkpoints, blacklist loading
//! - `metadata` - Checkpoint persistence on top of an object store
//! - `health` - Good-to-go probes for the cluster watcher
//! - `http` - Admin API

pub mod health;
pub mod http;
pub mod metadata;
pub mod native;
pub mod notifier;
pub mod storage;
