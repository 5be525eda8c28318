//! Checkpoint handler - periodically persists every cycle's progress.
//!
//! Runs as a background task per scheduler:
//!
//! 1. Skips the interval's immediate first tick
//! 2. On each tick writes `(config, metadata)` for every registered cycle
//! 3. On shutdown writes one final checkpoint per cycle
//!
//! Write failures are logged and never stop the ticker.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use super::registry::CycleRegistry;
use crate::ports::MetadataReadWriter;

/// Writes checkpoints for every cycle in a registry.
pub struct CheckpointHandler {
    registry: Arc<CycleRegistry>,
    writer: Arc<dyn MetadataReadWriter>,
    interval: Duration,
}

impl CheckpointHandler {
    pub fn new(
        registry: Arc<CycleRegistry>,
        writer: Arc<dyn MetadataReadWriter>,
        interval: Duration,
    ) -> Self {
        Self {
            registry,
            writer,
            interval,
        }
    }

    /// Writes one checkpoint per cycle, returning how many succeeded.
    pub async fn checkpoint_all(&self) -> usize {
        let mut written = 0;
        for cycle in self.registry.snapshot().await {
            let metadata = cycle.metadata().await;
            let config = cycle.transform_to_config();
            match self.writer.write_metadata(cycle.id(), &config, &metadata).await {
                Ok(()) => written += 1,
                Err(e) => {
                    tracing::warn!(cycle_id = %cycle.id(), error = %e, "Failed to checkpoint cycle")
                }
            }
        }
        written
    }

    /// Ticks until `shutdown`, then writes a final checkpoint.
    pub async fn run(&self, shutdown: CancellationToken) {
        let mut interval = tokio::time::interval(self.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        // Skip the first immediate tick
        interval.tick().await;

        loop {
            tokio::select! {
                biased;

                _ = shutdown.cancelled() => break,

                _ = interval.tick() => {
                    let written = self.checkpoint_all().await;
                    tracing::debug!(written, "Checkpoint tick");
                }
            }
        }

        let written = self.checkpoint_all().await;
        tracing::info!(written, "Wrote final checkpoint");
    }

    /// Spawns [`CheckpointHandler::run`] on the runtime.
    pub fn spawn(self: Arc<Self>) -> CheckpointTask {
        let cancel = CancellationToken::new();
        let shutdown = cancel.clone();
        let handle = tokio::spawn(async move { self.run(shutdown).await });
        CheckpointTask { cancel, handle }
    }
}

/// A running checkpoint ticker.
#[derive(Debug)]
pub struct CheckpointTask {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl CheckpointTask {
    /// Stops ticking and waits for the final checkpoint.
    pub async fn stop(self) {
        self.cancel.cancel();
        if let Err(e) = self.handle.await {
            tracing::error!(error = %e, "Checkpoint handler failed");
        }
    }
}
