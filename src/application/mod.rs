//! Application layer - Cycle engine, scheduling and checkpointing.
//!
//! Orchestrates domain types over the ports:
//!
//! - `throttle` - Token-bucket pacing
//! - `collection` - Id sequences fed to cycles
//! - `native_reader` / `publish_task` - Read one document and notify it
//! - `cycle` - Supervised republishing loops
//! - `registry` / `scheduler` / `checkpoint` - Ownership, enable flags, persistence
//! - `cluster_watcher` - Dependency health feeding the automatic flag

pub mod checkpoint;
pub mod cluster_watcher;
pub mod collection;
pub mod cycle;
pub mod native_reader;
pub mod publish_task;
pub mod registry;
pub mod scheduler;
pub mod throttle;

pub use checkpoint::{CheckpointHandler, CheckpointTask};
pub use cluster_watcher::ClusterWatcher;
pub use collection::{CollectionError, InMemoryUuidCollection, NativeUuidCollection, UuidCollection};
pub use cycle::{Cycle, CycleDeps, CycleError, CycleKind};
pub use native_reader::{content_hash, NativeReader};
pub use publish_task::{carousel_tid, NativeContentPublishTask, PublishError, PublishTask};
pub use registry::CycleRegistry;
pub use scheduler::{parse_toggle, Scheduler, SchedulerError, Toggles};
pub use throttle::{Throttle, ThrottleError, TokenBucketThrottle};
