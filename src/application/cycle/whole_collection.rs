//! Whole-collection sweep under a fixed throttle.
//!
//! Each pass walks the collection newest first, resuming at `completed` so
//! a restarted cycle picks up where its last checkpoint left off. Without
//! filters ids stream from the store cursor; with filters the pass is
//! materialised and filtered first, and `completed` counts filtered ids.

use std::time::Duration;

use super::lifecycle::{CycleContext, CycleError, LoopExit, BATCH_SIZE};
use crate::application::collection::{
    CollectionError, InMemoryUuidCollection, NativeUuidCollection, UuidCollection,
};
use crate::application::throttle::{Throttle, TokenBucketThrottle};
use crate::domain::cycle::CycleState;
use crate::domain::filter::FilterChain;
use crate::ports::NativeTx;

/// Pacing for a whole-collection cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThrottledWholeCollection {
    pub throttle: Duration,
}

impl ThrottledWholeCollection {
    pub fn new(throttle: Duration) -> Self {
        Self { throttle }
    }

    /// Sweeps the collection forever, cooling down between passes.
    pub async fn run(self, ctx: CycleContext) -> Result<(), CycleError> {
        loop {
            let skip = usize::try_from(ctx.metadata().await.completed).unwrap_or(usize::MAX);

            let tx = match ctx.cancellable(ctx.deps().store.open()).await {
                Some(tx) => tx?,
                None => return Ok(()),
            };
            let swept = self.sweep(&ctx, tx.as_ref(), skip).await;
            tx.close().await;

            if swept? == LoopExit::Cancelled {
                return Ok(());
            }

            ctx.update(|md| md.end_iteration()).await;
            tracing::info!(cycle_id = %ctx.id(), "Completed whole-collection pass");

            if ctx.cool_down().await == LoopExit::Cancelled {
                return Ok(());
            }
        }
    }

    async fn sweep(
        &self,
        ctx: &CycleContext,
        tx: &dyn NativeTx,
        skip: usize,
    ) -> Result<LoopExit, CycleError> {
        let Some(mut uuids) = self.open(ctx, tx, skip).await? else {
            return Ok(LoopExit::Cancelled);
        };
        let length = uuids.length();

        if length == 0 {
            let _ = uuids.close().await;
            return Err(CycleError::EmptyArchive {
                collection: ctx.config().collection.clone(),
            });
        }

        let skip = if skip >= length {
            tracing::info!(
                cycle_id = %ctx.id(),
                skip,
                length,
                "Collection shrank below resume point, restarting pass"
            );
            let _ = uuids.close().await;
            uuids = match self.open(ctx, tx, 0).await? {
                Some(uuids) => uuids,
                None => return Ok(LoopExit::Cancelled),
            };
            0
        } else {
            skip
        };

        let total = uuids.length() as u64;
        ctx.update(|md| {
            if skip == 0 {
                md.begin_iteration(total);
            } else {
                md.resume_iteration(total);
            }
            md.state = CycleState::running();
        })
        .await;

        let throttle = TokenBucketThrottle::fixed(self.throttle, 1, ctx.cancel_token().child_token());
        let result = ctx.publish_collection(uuids.as_mut(), &throttle).await;
        throttle.stop();

        if let Err(e) = uuids.close().await {
            tracing::warn!(cycle_id = %ctx.id(), error = %e, "Failed to close id collection");
        }
        result
    }

    /// Opens the pass' id collection, or `None` when cancelled first.
    async fn open(
        &self,
        ctx: &CycleContext,
        tx: &dyn NativeTx,
        skip: usize,
    ) -> Result<Option<Box<dyn UuidCollection>>, CycleError> {
        let collection = ctx.config().collection.as_str();
        match ctx
            .cancellable(open_collection(tx, collection, skip, &ctx.deps().filters))
            .await
        {
            Some(uuids) => Ok(Some(uuids?)),
            None => Ok(None),
        }
    }
}

async fn open_collection(
    tx: &dyn NativeTx,
    collection: &str,
    skip: usize,
    filters: &FilterChain,
) -> Result<Box<dyn UuidCollection>, CollectionError> {
    if filters.is_empty() {
        let uuids = NativeUuidCollection::open(tx, collection, skip, BATCH_SIZE).await?;
        return Ok(Box::new(uuids));
    }
    let query = tx.find_uuids(collection, 0, BATCH_SIZE).await?;
    let uuids = InMemoryUuidCollection::materialise(tx, collection, query, skip, filters).await?;
    Ok(Box::new(uuids))
}
