//! Per-position withdrawal serialization

use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::core_types::PositionId;

/// One async mutex per position, created on first use and dropped once no
/// caller holds or waits on it.
///
/// Holds for the refresh → sufficiency check → pending insert window only.
/// In-process: multiple gateway instances would need a shared lock.
#[derive(Default)]
pub struct PositionLocks {
    locks: DashMap<PositionId, Arc<Mutex<()>>>,
}

/// Held while a position is locked; releasing it prunes the idle entry
pub struct PositionGuard<'a> {
    locks: &'a DashMap<PositionId, Arc<Mutex<()>>>,
    position_id: PositionId,
    guard: Option<OwnedMutexGuard<()>>,
}

impl PositionLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn acquire(&self, position_id: PositionId) -> PositionGuard<'_> {
        // Clone the Arc out so the shard lock is not held while waiting
        let lock = self
            .locks
            .entry(position_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        PositionGuard {
            locks: &self.locks,
            position_id,
            guard: Some(lock.lock_owned().await),
        }
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.locks.len()
    }
}

impl Drop for PositionGuard<'_> {
    fn drop(&mut self) {
        drop(self.guard.take());
        // Waiters and acquirers hold a clone, so a count of 1 means only the map is left
        self.locks
            .remove_if(&self.position_id, |_, lock| Arc::strong_count(lock) == 1);
    }
}
