//! Lifecycle shared by every cycle flavour.
//!
//! [`CycleCore`] owns a cycle's identity, config and metadata, and runs the
//! flavour-specific loop as a supervised tokio task:
//!
//! ```text
//! start ──► {starting} ──► loop (running / coolDown) ──┬─► {stopped}            (cancelled)
//!                                                      └─► {stopped, unhealthy} (fatal error or panic)
//! ```
//!
//! The loop receives a [`CycleContext`] through which it mutates metadata,
//! observes cancellation and drains id collections.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::{Mutex, RwLock};
use tokio::task::AbortHandle;
use tokio_util::sync::CancellationToken;

use crate::application::collection::{CollectionError, UuidCollection};
use crate::application::publish_task::PublishTask;
use crate::application::throttle::Throttle;
use crate::domain::cycle::{CycleConfig, CycleMetadata, CycleState};
use crate::domain::filter::FilterChain;
use crate::domain::foundation::CycleId;
use crate::ports::{NativeStore, NativeStoreError};

/// How long `stop` waits for a loop to wind down before aborting it.
pub const STOP_TIMEOUT: Duration = Duration::from_secs(10);

/// Page size for id cursors.
pub const BATCH_SIZE: usize = 80;

/// Conditions that end a cycle loop and mark it unhealthy.
#[derive(Debug, Clone, Error)]
pub enum CycleError {
    #[error("Native store unavailable: {0}")]
    Store(#[from] NativeStoreError),

    #[error("Iterator error: {0}")]
    Iterator(#[from] CollectionError),

    #[error("Collection {collection} is empty")]
    EmptyArchive { collection: String },
}

/// How a drain or wait ended without error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopExit {
    Finished,
    Cancelled,
}

/// Collaborators shared by every cycle.
#[derive(Clone)]
pub struct CycleDeps {
    pub store: Arc<dyn NativeStore>,
    pub publisher: Arc<dyn PublishTask>,
    pub filters: FilterChain,
}

impl std::fmt::Debug for CycleDeps {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CycleDeps")
            .field("store", &"Arc<dyn NativeStore>")
            .field("publisher", &"Arc<dyn PublishTask>")
            .field("filters", &self.filters)
            .finish()
    }
}

struct CycleShared {
    id: CycleId,
    config: CycleConfig,
    metadata: RwLock<CycleMetadata>,
    deps: CycleDeps,
}

/// Handles to a launched loop. `finished` is cancelled once the supervisor
/// has recorded the final state.
#[derive(Clone)]
struct RunningLoop {
    cancel: CancellationToken,
    body: AbortHandle,
    finished: CancellationToken,
}

impl RunningLoop {
    fn is_alive(&self) -> bool {
        !self.finished.is_cancelled()
    }
}

/// State machine and loop supervision common to all cycles.
pub struct CycleCore {
    shared: Arc<CycleShared>,
    control: Mutex<Option<RunningLoop>>,
}

impl CycleCore {
    pub fn new(config: CycleConfig, deps: CycleDeps) -> Self {
        Self {
            shared: Arc::new(CycleShared {
                id: config.id(),
                config,
                metadata: RwLock::new(CycleMetadata::default()),
                deps,
            }),
            control: Mutex::new(None),
        }
    }

    pub fn id(&self) -> &CycleId {
        &self.shared.id
    }

    pub fn config(&self) -> &CycleConfig {
        &self.shared.config
    }

    /// Snapshot of the current metadata.
    pub async fn metadata(&self) -> CycleMetadata {
        self.shared.metadata.read().await.clone()
    }

    /// Whether a loop task is alive.
    pub async fn is_running(&self) -> bool {
        self.control
            .lock()
            .await
            .as_ref()
            .map_or(false, RunningLoop::is_alive)
    }

    /// Launches `body` unless a loop is already alive. Returns immediately.
    pub async fn start<F, Fut>(&self, body: F)
    where
        F: FnOnce(CycleContext) -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), CycleError>> + Send + 'static,
    {
        let mut control = self.control.lock().await;
        if let Some(running) = control.as_ref() {
            if running.is_alive() {
                tracing::debug!(cycle_id = %self.shared.id, "Cycle already running");
                return;
            }
        }

        {
            let mut md = self.shared.metadata.write().await;
            md.state = CycleState::starting();
            md.attempts += 1;
        }
        tracing::info!(cycle_id = %self.shared.id, name = %self.shared.config.name, "Starting cycle");

        let cancel = CancellationToken::new();
        let ctx = CycleContext {
            shared: self.shared.clone(),
            cancel: cancel.clone(),
        };
        let task = tokio::spawn(body(ctx));
        let body_handle = task.abort_handle();

        let shared = self.shared.clone();
        let finished = CancellationToken::new();
        let done = finished.clone().drop_guard();
        tokio::spawn(async move {
            let _done = done;
            let state = match task.await {
                Ok(Ok(())) => CycleState::stopped(),
                Ok(Err(e)) => {
                    tracing::error!(cycle_id = %shared.id, error = %e, "Cycle stopped on fatal error");
                    CycleState::unhealthy()
                }
                Err(join) if join.is_panic() => {
                    tracing::error!(cycle_id = %shared.id, "Cycle loop panicked");
                    CycleState::unhealthy()
                }
                Err(_) => CycleState::stopped(),
            };
            shared.metadata.write().await.state = state;
            tracing::info!(cycle_id = %shared.id, "Cycle loop exited");
        });

        *control = Some(RunningLoop {
            cancel,
            body: body_handle,
            finished,
        });
    }

    /// Cancels the loop and waits for it, aborting after [`STOP_TIMEOUT`].
    ///
    /// The control lock is released before waiting; a `start` issued while
    /// the loop winds down is a no-op.
    pub async fn stop(&self) {
        let Some(running) = self.control.lock().await.clone() else {
            return;
        };
        if !running.is_alive() {
            return;
        }

        running.cancel.cancel();
        if tokio::time::timeout(STOP_TIMEOUT, running.finished.cancelled())
            .await
            .is_err()
        {
            tracing::warn!(cycle_id = %self.shared.id, "Cycle did not stop in time, aborting");
            running.body.abort();
            running.finished.cancelled().await;
        }
    }

    /// Discards all progress. Only meaningful while stopped.
    pub async fn clear_metadata(&self) {
        *self.shared.metadata.write().await = CycleMetadata::default();
    }

    /// Installs checkpointed progress; the cycle is left stopped.
    pub async fn restore(&self, mut metadata: CycleMetadata) {
        metadata.state = CycleState::stopped();
        *self.shared.metadata.write().await = metadata;
    }
}

/// Handle given to a running loop.
#[derive(Clone)]
pub struct CycleContext {
    shared: Arc<CycleShared>,
    cancel: CancellationToken,
}

impl CycleContext {
    pub fn id(&self) -> &CycleId {
        &self.shared.id
    }

    pub fn config(&self) -> &CycleConfig {
        &self.shared.config
    }

    pub fn deps(&self) -> &CycleDeps {
        &self.shared.deps
    }

    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub async fn metadata(&self) -> CycleMetadata {
        self.shared.metadata.read().await.clone()
    }

    /// Mutates metadata under the cycle's lock.
    pub async fn update<R>(&self, f: impl FnOnce(&mut CycleMetadata) -> R) -> R {
        let mut md = self.shared.metadata.write().await;
        f(&mut md)
    }

    pub async fn set_state(&self, state: CycleState) {
        self.update(|md| md.state = state).await;
    }

    /// Sleeps unless cancelled first.
    pub async fn sleep(&self, duration: Duration) -> LoopExit {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => LoopExit::Cancelled,
            _ = tokio::time::sleep(duration) => LoopExit::Finished,
        }
    }

    /// Enters `{coolDown}` for the configured cool-down.
    pub async fn cool_down(&self) -> LoopExit {
        self.set_state(CycleState::cool_down()).await;
        let cool_down = self.shared.config.cool_down();
        tracing::debug!(cycle_id = %self.shared.id, ?cool_down, "Cooling down");
        self.sleep(cool_down).await
    }

    /// Runs `fut` unless cancelled first.
    pub async fn cancellable<T>(&self, fut: impl Future<Output = T>) -> Option<T> {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => None,
            out = fut => Some(out),
        }
    }

    /// Publishes every id in `uuids`, one at a time, paced by `throttle`.
    ///
    /// Publish failures are counted and skipped; iterator failures are fatal.
    pub async fn publish_collection(
        &self,
        uuids: &mut dyn UuidCollection,
        throttle: &dyn Throttle,
    ) -> Result<LoopExit, CycleError> {
        let config = &self.shared.config;
        let publisher = &self.shared.deps.publisher;

        loop {
            let next = match self.cancellable(uuids.next()).await {
                Some(next) => next?,
                None => return Ok(LoopExit::Cancelled),
            };
            let Some(uuid) = next else {
                return Ok(LoopExit::Finished);
            };

            if throttle.queue().await.is_err() {
                return Ok(LoopExit::Cancelled);
            }

            self.update(|md| md.current_publish_uuid = uuid.clone()).await;

            let published = self
                .cancellable(publisher.publish(&config.origin, &config.collection, &uuid))
                .await;
            match published {
                None => return Ok(LoopExit::Cancelled),
                Some(Ok(())) => self.update(|md| md.record_success()).await,
                Some(Err(e)) => {
                    tracing::warn!(
                        cycle_id = %self.shared.id,
                        uuid = %uuid,
                        collection = %config.collection,
                        error = %e,
                        "Failed to publish"
                    );
                    self.update(|md| md.record_failure()).await;
                }
            }
        }
    }
}
