//! RNG cursor operations.
//!
//! Chronicle never generates random numbers — it records where each named
//! random stream stands, as a `(seed, call_index)` cursor per context.
//! Seeding your generator with `seed` and drawing `call_index` times puts
//! you exactly where the campaign left off.
//!
//! # Example
//!
//! ```ignore
//! db.rng.get_or_create(&world, "combat", 42)?;
//! let cursor = db.rng.increment(&world, "combat", Some(roll))?;
//! ```

use std::sync::Arc;

use chronicle_core::{RngState, WorldId};
use chronicle_primitives::RngStore;
use chronicle_storage::Store;

use crate::error::Result;

/// RNG cursor operations.
///
/// Access via `db.rng`.
pub struct Rng {
    store: RngStore,
}

impl Rng {
    pub(crate) fn new(store: Arc<Store>) -> Self {
        Self {
            store: RngStore::new(store),
        }
    }

    /// Get the cursor for a context, creating it at `call_index = 0` if
    /// absent. An existing cursor's seed wins over the one supplied here.
    pub fn get_or_create(&self, world_id: &WorldId, context: &str, seed: u64) -> Result<RngState> {
        Ok(self.store.get_or_create(world_id, context, seed)?)
    }

    /// The cursor for a context, if any.
    pub fn get(&self, world_id: &WorldId, context: &str) -> Result<Option<RngState>> {
        Ok(self.store.get(world_id, context)?)
    }

    /// Atomically advance a cursor by one draw, optionally recording the
    /// value drawn. The context must already exist.
    pub fn increment(
        &self,
        world_id: &WorldId,
        context: &str,
        last_value: Option<f64>,
    ) -> Result<RngState> {
        Ok(self.store.increment(world_id, context, last_value)?)
    }

    /// Rewind or fast-forward a cursor to an explicit call index.
    pub fn reset(&self, world_id: &WorldId, context: &str, call_index: u64) -> Result<RngState> {
        Ok(self.store.reset(world_id, context, call_index)?)
    }

    /// Re-seed a context. The cursor restarts at `call_index = 0`.
    pub fn update_seed(&self, world_id: &WorldId, context: &str, seed: u64) -> Result<RngState> {
        Ok(self.store.update_seed(world_id, context, seed)?)
    }

    /// All cursors of a world, ordered by context.
    pub fn list(&self, world_id: &WorldId) -> Result<Vec<RngState>> {
        Ok(self.store.get_all_for_world(world_id)?)
    }

    /// Names of the contexts present for a world, ordered.
    pub fn contexts(&self, world_id: &WorldId) -> Result<Vec<String>> {
        Ok(self.store.list_contexts(world_id)?)
    }

    /// Delete one context's cursor. Returns whether it existed.
    pub fn delete(&self, world_id: &WorldId, context: &str) -> Result<bool> {
        Ok(self.store.delete_context(world_id, context)?)
    }

    /// Delete every cursor of a world. Returns the number removed.
    pub fn delete_all(&self, world_id: &WorldId) -> Result<usize> {
        Ok(self.store.delete_all_for_world(world_id)?)
    }
}
