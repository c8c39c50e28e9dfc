//! Snapshot store primitive.
//!
//! Point-in-time captures of reconstructed world state, checksummed over
//! their canonical JSON so storage corruption is detectable independently
//! of event-chain verification.

use std::sync::Arc;

use chrono::Utc;
use chronicle_core::canonical::canonical_stringify;
use chronicle_core::hash::{compute_hash, verify_hash};
use chronicle_core::{Error, Result, Snapshot, WorldId};
use chronicle_storage::Store;
use serde_json::Value;
use uuid::Uuid;

/// Checksummed world-state captures, queryable by cut-point event id.
#[derive(Clone)]
pub struct SnapshotStore {
    store: Arc<Store>,
}

impl SnapshotStore {
    /// Create a snapshot store over the given storage handle.
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }

    /// Capture `state` as of event `event_id`.
    ///
    /// The state is canonical-serialized; checksum and byte size are
    /// computed over that exact text. A snapshot at the same
    /// `(world_id, event_id)` boundary overwrites the previous one;
    /// avoiding concurrent manual snapshots at one boundary is the
    /// caller's responsibility.
    pub fn create(
        &self,
        world_id: &WorldId,
        event_id: u64,
        state: &Value,
        description: Option<String>,
        is_auto: bool,
    ) -> Result<Snapshot> {
        let state_json = canonical_stringify(state);
        let snapshot = Snapshot {
            id: Uuid::new_v4(),
            world_id: world_id.clone(),
            event_id,
            created_at: Utc::now(),
            description,
            checksum: compute_hash(&state_json),
            size_bytes: state_json.len() as u64,
            state_json,
            is_auto,
        };
        self.store.put_snapshot(snapshot.clone())?;
        tracing::debug!(
            world = %world_id,
            event_id,
            is_auto,
            size_bytes = snapshot.size_bytes,
            "stored snapshot"
        );
        Ok(snapshot)
    }

    /// Most recent snapshot with `event_id <= at`: the cheapest valid
    /// replay starting point. `None` means replay must start from genesis.
    pub fn get_nearest(&self, world_id: &WorldId, at: u64) -> Result<Option<Snapshot>> {
        Ok(self.store.nearest_snapshot(world_id, at))
    }

    /// Most recent snapshot of a world.
    pub fn get_latest(&self, world_id: &WorldId) -> Result<Option<Snapshot>> {
        Ok(self.store.snapshots_desc(world_id).into_iter().next())
    }

    /// Look up a snapshot by id.
    pub fn get_by_id(&self, id: &Uuid) -> Result<Option<Snapshot>> {
        Ok(self.store.snapshot_by_id(id))
    }

    /// Snapshots of a world, descending by event id, up to `limit`.
    pub fn list(&self, world_id: &WorldId, limit: Option<usize>) -> Result<Vec<Snapshot>> {
        let mut snapshots = self.store.snapshots_desc(world_id);
        if let Some(limit) = limit {
            snapshots.truncate(limit);
        }
        Ok(snapshots)
    }

    /// Keep the `keep` most recent snapshots and delete the rest.
    ///
    /// `keep = 0` deletes everything; a negative count is a validation
    /// error. Returns the number deleted.
    pub fn cleanup(&self, world_id: &WorldId, keep: i64) -> Result<usize> {
        if keep < 0 {
            return Err(Error::Validation(format!(
                "retention count must be non-negative, got {keep}"
            )));
        }
        let snapshots = self.store.snapshots_desc(world_id);
        let mut deleted = 0;
        for snapshot in snapshots.into_iter().skip(keep as usize) {
            if self.store.delete_snapshot(&snapshot.id)? {
                deleted += 1;
            }
        }
        Ok(deleted)
    }

    /// Recompute the checksum over the stored state and compare.
    ///
    /// `false` means the stored state no longer matches its checksum:
    /// storage corruption, reported as data rather than an error.
    pub fn verify(&self, id: &Uuid) -> Result<bool> {
        let snapshot = self
            .store
            .snapshot_by_id(id)
            .ok_or_else(|| Error::NotFound(format!("snapshot {id}")))?;
        Ok(verify_hash(&snapshot.state_json, &snapshot.checksum))
    }
}
