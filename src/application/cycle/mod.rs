//! Cycles - long-running republishing loops over one collection.
//!
//! - `lifecycle` - Start/stop supervision, cancellation and the publish loop
//! - `whole_collection` - Newest-first sweeps of an entire collection
//! - `time_window` - Sliding `lastModified` window sweeps (fixed or scaling)

mod lifecycle;
mod time_window;
mod whole_collection;

pub use lifecycle::{
    CycleContext, CycleCore, CycleDeps, CycleError, LoopExit, BATCH_SIZE, STOP_TIMEOUT,
};
pub use time_window::{TimeWindowed, WindowPacing, FIXED_BATCH_DURATION};
pub use whole_collection::ThrottledWholeCollection;

use crate::domain::cycle::{CycleConfig, CycleMetadata, CycleSettings, CycleType};
use crate::domain::foundation::{CycleId, ValidationError};

/// Flavour of a cycle and its pacing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleKind {
    ThrottledWholeCollection(ThrottledWholeCollection),
    FixedWindow(TimeWindowed),
    ScalingWindow(TimeWindowed),
}

impl CycleKind {
    fn from_settings(settings: CycleSettings) -> Self {
        match settings {
            CycleSettings::ThrottledWholeCollection { throttle } => {
                CycleKind::ThrottledWholeCollection(ThrottledWholeCollection::new(throttle))
            }
            CycleSettings::FixedWindow {
                time_window,
                minimum_throttle,
            } => CycleKind::FixedWindow(TimeWindowed::fixed(time_window, minimum_throttle)),
            CycleSettings::ScalingWindow {
                time_window,
                minimum_throttle,
                maximum_throttle,
            } => CycleKind::ScalingWindow(TimeWindowed::scaling(
                time_window,
                minimum_throttle,
                maximum_throttle,
            )),
        }
    }

    async fn run(self, ctx: CycleContext) -> Result<(), CycleError> {
        match self {
            CycleKind::ThrottledWholeCollection(sweep) => sweep.run(ctx).await,
            CycleKind::FixedWindow(window) | CycleKind::ScalingWindow(window) => {
                window.run(ctx).await
            }
        }
    }
}

/// A configured cycle.
pub struct Cycle {
    core: CycleCore,
    kind: CycleKind,
}

impl Cycle {
    /// Builds a stopped cycle from a validated definition.
    pub fn new(config: CycleConfig, deps: CycleDeps) -> Result<Self, ValidationError> {
        let kind = CycleKind::from_settings(config.settings()?);
        Ok(Self {
            core: CycleCore::new(config, deps),
            kind,
        })
    }

    pub fn id(&self) -> &CycleId {
        self.core.id()
    }

    pub fn name(&self) -> &str {
        &self.core.config().name
    }

    pub fn kind(&self) -> CycleKind {
        self.kind
    }

    pub fn cycle_type(&self) -> CycleType {
        self.core.config().cycle_type
    }

    /// The definition this cycle was built from.
    pub fn transform_to_config(&self) -> CycleConfig {
        self.core.config().clone()
    }

    pub async fn metadata(&self) -> CycleMetadata {
        self.core.metadata().await
    }

    pub async fn is_running(&self) -> bool {
        self.core.is_running().await
    }

    /// Launches the loop; a no-op when already running.
    pub async fn start(&self) {
        let kind = self.kind;
        self.core.start(move |ctx| kind.run(ctx)).await;
    }

    /// Cancels the loop and waits for it to exit.
    pub async fn stop(&self) {
        self.core.stop().await;
    }

    /// Stops, discards progress and starts again.
    pub async fn reset(&self) {
        self.core.stop().await;
        self.core.clear_metadata().await;
        self.start().await;
    }

    /// Installs checkpointed progress while stopped.
    pub async fn restore(&self, metadata: CycleMetadata) {
        self.core.restore(metadata).await;
    }
}

impl std::fmt::Debug for Cycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cycle")
            .field("id", self.id())
            .field("kind", &self.kind)
            .finish()
    }
}
