//! Sliding time-window sweeps.
//!
//! Each window `[start, end)` is one iteration: its ids are materialised
//! oldest first, filtered, then published under a throttle sized so the
//! window's publishes spread across `timeWindow`. The next window starts
//! where the previous one ended.

use std::time::Duration;

use chrono::{DateTime, Utc};

use super::lifecycle::{CycleContext, CycleError, LoopExit, BATCH_SIZE};
use crate::application::collection::{CollectionError, InMemoryUuidCollection, UuidCollection};
use crate::application::throttle::{Throttle, TokenBucketThrottle};
use crate::domain::cycle::CycleState;
use crate::domain::filter::FilterChain;
use crate::ports::NativeTx;

/// Shortest window a fixed-window cycle will query.
pub const FIXED_BATCH_DURATION: Duration = Duration::from_secs(3);

/// How a window's throttle interval is derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowPacing {
    /// `timeWindow / publishes`, never below `minimum`.
    Fixed { minimum: Duration },
    /// `timeWindow / publishes`, within `[minimum, maximum]`.
    Scaling { minimum: Duration, maximum: Duration },
}

/// Pacing for a time-windowed cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindowed {
    pub time_window: Duration,
    pub pacing: WindowPacing,
}

impl TimeWindowed {
    pub fn fixed(time_window: Duration, minimum_throttle: Duration) -> Self {
        Self {
            time_window,
            pacing: WindowPacing::Fixed {
                minimum: minimum_throttle,
            },
        }
    }

    pub fn scaling(time_window: Duration, minimum_throttle: Duration, maximum_throttle: Duration) -> Self {
        Self {
            time_window,
            pacing: WindowPacing::Scaling {
                minimum: minimum_throttle,
                maximum: maximum_throttle,
            },
        }
    }

    /// Minimum window length; shorter windows are waited out before querying.
    pub fn batch_duration(&self) -> Duration {
        match self.pacing {
            WindowPacing::Fixed { .. } => FIXED_BATCH_DURATION,
            WindowPacing::Scaling { maximum, .. } => maximum,
        }
    }

    /// Throttle spreading `publishes` permits across the time window.
    pub fn throttle(&self, publishes: u64, ctx: &CycleContext) -> TokenBucketThrottle {
        let cancel = ctx.cancel_token().child_token();
        match self.pacing {
            WindowPacing::Fixed { minimum } => {
                TokenBucketThrottle::dynamic(self.time_window, minimum, publishes, 1, cancel)
            }
            WindowPacing::Scaling { minimum, maximum } => TokenBucketThrottle::capped_dynamic(
                self.time_window,
                minimum,
                maximum,
                publishes,
                1,
                cancel,
            ),
        }
    }

    /// Sweeps consecutive windows forever.
    pub async fn run(self, ctx: CycleContext) -> Result<(), CycleError> {
        let mut end = Utc::now();
        let mut start = ctx
            .metadata()
            .await
            .window_start
            .filter(|restored| *restored < end)
            .unwrap_or_else(|| end - chrono_duration(self.time_window));

        loop {
            let span = (end - start).to_std().unwrap_or(Duration::ZERO);
            let batch = self.batch_duration();
            if span < batch {
                if ctx.sleep(batch - span).await == LoopExit::Cancelled {
                    return Ok(());
                }
                end = Utc::now();
            }

            let tx = match ctx.cancellable(ctx.deps().store.open()).await {
                Some(tx) => tx?,
                None => return Ok(()),
            };
            let swept = self.sweep(&ctx, tx.as_ref(), start, end).await;
            tx.close().await;

            if swept? == LoopExit::Cancelled {
                return Ok(());
            }

            start = end;
            end = Utc::now();
        }
    }

    async fn sweep(
        &self,
        ctx: &CycleContext,
        tx: &dyn NativeTx,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<LoopExit, CycleError> {
        let collection = ctx.config().collection.as_str();
        let filters = &ctx.deps().filters;

        let materialised = ctx
            .cancellable(materialise_window(tx, collection, start, end, filters))
            .await;
        let mut uuids = match materialised {
            Some(uuids) => uuids?,
            None => return Ok(LoopExit::Cancelled),
        };

        let length = uuids.length() as u64;
        ctx.update(|md| {
            md.begin_iteration(length);
            md.set_window(start, end);
        })
        .await;
        tracing::debug!(cycle_id = %ctx.id(), %start, %end, length, "Sweeping window");

        if length == 0 {
            return Ok(ctx.cool_down().await);
        }

        ctx.set_state(CycleState::running()).await;
        let throttle = self.throttle(length + 1, ctx);
        let mut exit = ctx.publish_collection(&mut uuids, &throttle).await?;
        if exit == LoopExit::Finished && throttle.queue().await.is_err() {
            exit = LoopExit::Cancelled;
        }
        throttle.stop();
        Ok(exit)
    }
}

async fn materialise_window(
    tx: &dyn NativeTx,
    collection: &str,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    filters: &FilterChain,
) -> Result<InMemoryUuidCollection, CollectionError> {
    let query = tx
        .find_uuids_in_time_window(collection, start, end, BATCH_SIZE)
        .await?;
    InMemoryUuidCollection::materialise(tx, collection, query, 0, filters).await
}

fn chrono_duration(duration: Duration) -> chrono::Duration {
    chrono::Duration::from_std(duration).unwrap_or_else(|_| chrono::Duration::weeks(5_200))
}
