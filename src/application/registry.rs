//! Registry of cycles shared between the scheduler and its checkpointer.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use super::cycle::Cycle;
use crate::domain::foundation::CycleId;

/// Cycles keyed by id.
#[derive(Debug, Default)]
pub struct CycleRegistry {
    cycles: RwLock<HashMap<CycleId, Arc<Cycle>>>,
}

impl CycleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `cycle`; returns `false` if its id is taken.
    pub async fn insert(&self, cycle: Arc<Cycle>) -> bool {
        let mut cycles = self.cycles.write().await;
        if cycles.contains_key(cycle.id()) {
            return false;
        }
        cycles.insert(cycle.id().clone(), cycle);
        true
    }

    pub async fn remove(&self, id: &CycleId) -> Option<Arc<Cycle>> {
        self.cycles.write().await.remove(id)
    }

    pub async fn get(&self, id: &CycleId) -> Option<Arc<Cycle>> {
        self.cycles.read().await.get(id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.cycles.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.cycles.read().await.is_empty()
    }

    /// All cycles ordered by name, then id. The lock is released on return.
    pub async fn snapshot(&self) -> Vec<Arc<Cycle>> {
        let mut cycles: Vec<Arc<Cycle>> = self.cycles.read().await.values().cloned().collect();
        cycles.sort_by(|a, b| a.name().cmp(b.name()).then_with(|| a.id().cmp(b.id())));
        cycles
    }
}
