//! Scheduler - owns every cycle and decides when they run.
//!
//! Cycles run only while both enable flags are set:
//!
//! | Flag | Driven by |
//! |------|-----------|
//! | automatic | Cluster health (all dependencies good to go) |
//! | manual | Operators, through the admin API or configuration |
//!
//! A flag transition that enables the scheduler starts every cycle and the
//! checkpoint ticker; one that disables it stops them all and writes a final
//! checkpoint.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use serde::Serialize;
use thiserror::Error;
use tokio::sync::{Mutex, RwLock};

use super::checkpoint::{CheckpointHandler, CheckpointTask};
use super::cycle::{Cycle, CycleDeps};
use super::registry::CycleRegistry;
use crate::domain::cycle::CycleConfig;
use crate::domain::foundation::{CycleId, ValidationError};
use crate::ports::MetadataReadWriter;

/// Errors returned by scheduler operations.
#[derive(Debug, Clone, Error)]
pub enum SchedulerError {
    #[error("Scheduler is not enabled (automatic: {automatic}, manual: {manual})")]
    NotEnabled { automatic: bool, manual: bool },

    #[error("Cycle {0} already exists")]
    CycleExists(CycleId),

    #[error("Cycle {0} not found")]
    CycleNotFound(String),

    #[error("Invalid cycle definition: {0}")]
    InvalidConfig(#[from] ValidationError),
}

/// The two enable flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Toggles {
    pub automatic_enabled: bool,
    pub manual_enabled: bool,
}

impl Toggles {
    pub fn enabled(&self) -> bool {
        self.automatic_enabled && self.manual_enabled
    }
}

#[derive(Debug, Clone, Copy)]
enum Toggle {
    Automatic,
    Manual,
}

/// Parses a toggle value: `"true"` enables, anything else disables.
pub fn parse_toggle(value: &str) -> bool {
    value.trim() == "true"
}

/// Owner of all cycles.
pub struct Scheduler {
    registry: Arc<CycleRegistry>,
    toggles: RwLock<Toggles>,
    deps: CycleDeps,
    metadata: Arc<dyn MetadataReadWriter>,
    checkpoint_interval: Duration,
    checkpointer: Mutex<Option<CheckpointTask>>,
    transitions: Mutex<()>,
}

impl Scheduler {
    pub fn new(
        deps: CycleDeps,
        metadata: Arc<dyn MetadataReadWriter>,
        checkpoint_interval: Duration,
        toggles: Toggles,
    ) -> Self {
        Self {
            registry: Arc::new(CycleRegistry::new()),
            toggles: RwLock::new(toggles),
            deps,
            metadata,
            checkpoint_interval,
            checkpointer: Mutex::new(None),
            transitions: Mutex::new(()),
        }
    }

    pub fn registry(&self) -> &Arc<CycleRegistry> {
        &self.registry
    }

    /// Builds and registers a cycle. It is started straight away when the
    /// scheduler is running.
    pub async fn add_cycle(&self, config: CycleConfig) -> Result<Arc<Cycle>, SchedulerError> {
        let cycle = Arc::new(Cycle::new(config, self.deps.clone())?);

        if !self.registry.insert(cycle.clone()).await {
            return Err(SchedulerError::CycleExists(cycle.id().clone()));
        }
        tracing::info!(cycle_id = %cycle.id(), name = %cycle.name(), "Added cycle");

        if self.is_running().await {
            cycle.start().await;
        }
        Ok(cycle)
    }

    /// Stops and unregisters a cycle.
    pub async fn delete_cycle(&self, id: &str) -> Result<(), SchedulerError> {
        let id = parse_id(id)?;
        let cycle = self
            .registry
            .remove(&id)
            .await
            .ok_or_else(|| SchedulerError::CycleNotFound(id.to_string()))?;
        cycle.stop().await;
        tracing::info!(cycle_id = %id, "Deleted cycle");
        Ok(())
    }

    /// All cycles ordered by name.
    pub async fn cycles(&self) -> Vec<Arc<Cycle>> {
        self.registry.snapshot().await
    }

    pub async fn cycle(&self, id: &str) -> Option<Arc<Cycle>> {
        let id = id.parse::<CycleId>().ok()?;
        self.registry.get(&id).await
    }

    pub async fn resume_cycle(&self, id: &str) -> Result<(), SchedulerError> {
        self.find(id).await?.start().await;
        Ok(())
    }

    pub async fn stop_cycle(&self, id: &str) -> Result<(), SchedulerError> {
        self.find(id).await?.stop().await;
        Ok(())
    }

    pub async fn reset_cycle(&self, id: &str) -> Result<(), SchedulerError> {
        self.find(id).await?.reset().await;
        Ok(())
    }

    pub async fn toggles(&self) -> Toggles {
        *self.toggles.read().await
    }

    pub async fn is_enabled(&self) -> bool {
        self.toggles.read().await.enabled()
    }

    /// Whether the scheduler has been started and not shut down since.
    pub async fn is_running(&self) -> bool {
        self.checkpointer.lock().await.is_some()
    }

    /// Starts every cycle and the checkpoint ticker.
    pub async fn start(&self) -> Result<(), SchedulerError> {
        let toggles = self.toggles().await;
        if !toggles.enabled() {
            return Err(SchedulerError::NotEnabled {
                automatic: toggles.automatic_enabled,
                manual: toggles.manual_enabled,
            });
        }

        let mut checkpointer = self.checkpointer.lock().await;
        let cycles = self.registry.snapshot().await;
        tracing::info!(cycles = cycles.len(), "Starting scheduler");
        for cycle in &cycles {
            cycle.start().await;
        }

        if checkpointer.is_none() {
            let handler = Arc::new(CheckpointHandler::new(
                self.registry.clone(),
                self.metadata.clone(),
                self.checkpoint_interval,
            ));
            *checkpointer = Some(handler.spawn());
        }
        Ok(())
    }

    /// Stops every cycle, then the checkpoint ticker (which writes a final
    /// checkpoint).
    pub async fn shutdown(&self) {
        let mut checkpointer = self.checkpointer.lock().await;
        let cycles = self.registry.snapshot().await;
        tracing::info!(cycles = cycles.len(), "Shutting down scheduler");

        join_all(cycles.iter().map(|cycle| cycle.stop())).await;

        if let Some(task) = checkpointer.take() {
            task.stop().await;
        }
    }

    pub async fn automatic_toggle_handler(&self, value: &str) {
        self.toggle(Toggle::Automatic, value).await;
    }

    pub async fn manual_toggle_handler(&self, value: &str) {
        self.toggle(Toggle::Manual, value).await;
    }

    /// Flag updates and the start or shutdown they trigger run as one step,
    /// so concurrent flips leave the scheduler running exactly when enabled.
    async fn toggle(&self, which: Toggle, value: &str) {
        let _transition = self.transitions.lock().await;
        let enabled = parse_toggle(value);
        let (was, now) = {
            let mut toggles = self.toggles.write().await;
            let was = toggles.enabled();
            match which {
                Toggle::Automatic => toggles.automatic_enabled = enabled,
                Toggle::Manual => toggles.manual_enabled = enabled,
            }
            (was, toggles.enabled())
        };
        tracing::info!(toggle = ?which, enabled, "Scheduler toggle changed");

        if !was && now {
            if let Err(e) = self.start().await {
                tracing::warn!(error = %e, "Failed to start scheduler after toggle");
            }
        } else if was && !now {
            self.shutdown().await;
        }
    }

    /// Installs the latest checkpoint of every registered cycle. Progress
    /// recorded under a different definition is discarded.
    pub async fn restore_previous_state(&self) {
        for cycle in self.registry.snapshot().await {
            let checkpoint = match self.metadata.load_metadata(cycle.id()).await {
                Ok(Some(checkpoint)) => checkpoint,
                Ok(None) => continue,
                Err(e) => {
                    tracing::warn!(cycle_id = %cycle.id(), error = %e, "Failed to load checkpoint");
                    continue;
                }
            };

            match checkpoint.metadata_for(&cycle.transform_to_config()) {
                Some(metadata) => {
                    tracing::info!(
                        cycle_id = %cycle.id(),
                        completed = metadata.completed,
                        iteration = metadata.iteration,
                        "Restored cycle progress"
                    );
                    cycle.restore(metadata).await;
                }
                None => tracing::info!(
                    cycle_id = %cycle.id(),
                    "Cycle definition changed since checkpoint, starting fresh"
                ),
            }
        }
    }

    async fn find(&self, id: &str) -> Result<Arc<Cycle>, SchedulerError> {
        self.cycle(id)
            .await
            .ok_or_else(|| SchedulerError::CycleNotFound(id.to_string()))
    }
}

fn parse_id(id: &str) -> Result<CycleId, SchedulerError> {
    id.parse::<CycleId>()
        .map_err(|_| SchedulerError::CycleNotFound(id.to_string()))
}
