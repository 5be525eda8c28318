//! Cluster watcher - drives the scheduler's automatic flag from dependency health.
//!
//! Probes every configured dependency on a fixed interval. The automatic
//! flag is `true` exactly when every probe passes; only changes are
//! forwarded to the scheduler.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tokio_util::sync::CancellationToken;

use super::scheduler::Scheduler;
use crate::ports::ServiceHealthCheck;

/// Periodic good-to-go prober.
pub struct ClusterWatcher {
    checks: Vec<Arc<dyn ServiceHealthCheck>>,
    interval: Duration,
    scheduler: Arc<Scheduler>,
}

impl ClusterWatcher {
    pub fn new(
        checks: Vec<Arc<dyn ServiceHealthCheck>>,
        interval: Duration,
        scheduler: Arc<Scheduler>,
    ) -> Self {
        Self {
            checks,
            interval,
            scheduler,
        }
    }

    /// Runs every probe concurrently; `true` when all pass.
    pub async fn check(&self) -> bool {
        let results = join_all(self.checks.iter().map(|check| check.gtg())).await;

        let mut healthy = true;
        for err in results.into_iter().filter_map(Result::err) {
            tracing::warn!(service = %err.service, reason = %err.reason, "Dependency not good to go");
            healthy = false;
        }
        healthy
    }

    /// Probes immediately, then every interval, until `shutdown`.
    pub async fn run(self, shutdown: CancellationToken) {
        tracing::info!(
            services = self.checks.len(),
            check_interval_secs = self.interval.as_secs(),
            "Cluster watcher started"
        );

        let mut interval = tokio::time::interval(self.interval);
        let mut last: Option<bool> = None;

        loop {
            tokio::select! {
                biased;

                _ = shutdown.cancelled() => {
                    tracing::info!("Cluster watcher shutting down");
                    break;
                }

                _ = interval.tick() => {
                    let healthy = self.check().await;
                    if last != Some(healthy) {
                        let value = if healthy { "true" } else { "false" };
                        self.scheduler.automatic_toggle_handler(value).await;
                        last = Some(healthy);
                    }
                }
            }
        }
    }
}
