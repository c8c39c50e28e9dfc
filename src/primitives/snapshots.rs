//! Snapshot operations.
//!
//! # Example
//!
//! ```ignore
//! let snapshot = db.snapshots.create(&world, Some("before the boss fight".into()))?;
//! assert!(db.snapshots.verify(&snapshot.id)?);
//! ```

use std::sync::Arc;

use chronicle_core::{Snapshot, WorldId};
use chronicle_engine::ReplayEngine;
use chronicle_primitives::SnapshotStore;
use chronicle_storage::Store;
use uuid::Uuid;

use crate::error::Result;

/// Snapshot operations.
///
/// Access via `db.snapshots`.
pub struct Snapshots {
    store: SnapshotStore,
    engine: Arc<ReplayEngine>,
}

impl Snapshots {
    pub(crate) fn new(store: Arc<Store>, engine: Arc<ReplayEngine>) -> Self {
        Self {
            store: SnapshotStore::new(store),
            engine,
        }
    }

    /// Capture the world's current state as a manual snapshot.
    ///
    /// Replays to the chain tip first, then stores the folded state with
    /// its checksum. A world with no events cannot be snapshotted.
    pub fn create(&self, world_id: &WorldId, description: Option<String>) -> Result<Snapshot> {
        Ok(self.engine.create_snapshot(world_id, description, false)?)
    }

    /// Look up a snapshot by id.
    pub fn get(&self, id: &Uuid) -> Result<Option<Snapshot>> {
        Ok(self.store.get_by_id(id)?)
    }

    /// Most recent snapshot of a world.
    pub fn latest(&self, world_id: &WorldId) -> Result<Option<Snapshot>> {
        Ok(self.store.get_latest(world_id)?)
    }

    /// Most recent snapshot with `event_id <= at`.
    pub fn nearest(&self, world_id: &WorldId, at: u64) -> Result<Option<Snapshot>> {
        Ok(self.store.get_nearest(world_id, at)?)
    }

    /// Snapshots of a world, newest first, up to `limit`.
    pub fn list(&self, world_id: &WorldId, limit: Option<usize>) -> Result<Vec<Snapshot>> {
        Ok(self.store.list(world_id, limit)?)
    }

    /// Keep the `keep` most recent snapshots, delete the rest.
    /// Returns the number deleted.
    pub fn cleanup(&self, world_id: &WorldId, keep: i64) -> Result<usize> {
        Ok(self.store.cleanup(world_id, keep)?)
    }

    /// Recompute a snapshot's checksum over its stored state.
    ///
    /// `false` means the stored state is corrupt.
    pub fn verify(&self, id: &Uuid) -> Result<bool> {
        Ok(self.store.verify(id)?)
    }
}
