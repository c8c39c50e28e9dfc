//! RNG cursor store primitive.
//!
//! Tracks per-(world, context) deterministic-sequence cursors: a seed plus
//! the number of draws consumed. Replaying the same seed and re-issuing
//! exactly `call_index` draws before continuing reproduces bit-identical
//! subsequent output, which is what makes dice rolls and procedural
//! generation replayable.

use std::sync::Arc;

use chrono::Utc;
use chronicle_core::{Error, Result, RngState, WorldId};
use chronicle_storage::Store;
use uuid::Uuid;

/// Per-(world, context) deterministic RNG cursors.
#[derive(Clone)]
pub struct RngStore {
    store: Arc<Store>,
}

impl RngStore {
    /// Create an RNG store over the given storage handle.
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }

    /// Get the cursor for a context, creating it with `call_index = 0` if
    /// absent. Idempotent: an existing cursor is returned untouched, its
    /// seed wins over the one supplied here.
    pub fn get_or_create(&self, world_id: &WorldId, context: &str, seed: u64) -> Result<RngState> {
        if let Some(existing) = self.store.rng_get(world_id, context) {
            return Ok(existing);
        }
        let state = RngState {
            id: Uuid::new_v4(),
            world_id: world_id.clone(),
            context: context.to_string(),
            seed,
            call_index: 0,
            last_value: None,
            updated_at: Utc::now(),
        };
        self.store.rng_upsert(state.clone())?;
        Ok(state)
    }

    /// Look up a cursor without creating it.
    pub fn get(&self, world_id: &WorldId, context: &str) -> Result<Option<RngState>> {
        Ok(self.store.rng_get(world_id, context))
    }

    /// Atomically advance the cursor by one draw, optionally recording the
    /// raw value drawn. The context must already exist; callers
    /// `get_or_create` first.
    pub fn increment(
        &self,
        world_id: &WorldId,
        context: &str,
        last_value: Option<f64>,
    ) -> Result<RngState> {
        self.store
            .rng_update(world_id, context, |state| {
                state.call_index += 1;
                if last_value.is_some() {
                    state.last_value = last_value;
                }
                state.updated_at = Utc::now();
            })?
            .ok_or_else(|| missing(world_id, context))
    }

    /// Rewind (or fast-forward) the cursor to an explicit draw count,
    /// clearing the recorded last value. Used when rewinding for replay.
    pub fn reset(&self, world_id: &WorldId, context: &str, call_index: u64) -> Result<RngState> {
        self.store
            .rng_update(world_id, context, |state| {
                state.call_index = call_index;
                state.last_value = None;
                state.updated_at = Utc::now();
            })?
            .ok_or_else(|| missing(world_id, context))
    }

    /// Change the seed. A reseed invalidates history, so the cursor is
    /// forced back to `call_index = 0`.
    pub fn update_seed(&self, world_id: &WorldId, context: &str, seed: u64) -> Result<RngState> {
        self.store
            .rng_update(world_id, context, |state| {
                state.seed = seed;
                state.call_index = 0;
                state.last_value = None;
                state.updated_at = Utc::now();
            })?
            .ok_or_else(|| missing(world_id, context))
    }

    /// Every cursor of a world, ordered by context.
    pub fn get_all_for_world(&self, world_id: &WorldId) -> Result<Vec<RngState>> {
        Ok(self.store.rng_all(world_id))
    }

    /// Atomically replace all of a world's cursors with `states`, used
    /// when a loaded snapshot embeds RNG state. Returns the number restored.
    pub fn restore_from_snapshot(
        &self,
        world_id: &WorldId,
        states: Vec<RngState>,
    ) -> Result<usize> {
        let count = states.len();
        self.store.rng_replace_world(world_id, states)?;
        Ok(count)
    }

    /// Delete one context. Returns whether it existed.
    pub fn delete_context(&self, world_id: &WorldId, context: &str) -> Result<bool> {
        self.store.rng_delete(world_id, context)
    }

    /// Delete every context of a world. Returns the number removed.
    pub fn delete_all_for_world(&self, world_id: &WorldId) -> Result<usize> {
        self.store.rng_clear_world(world_id)
    }

    /// Names of the contexts present for a world, ordered.
    pub fn list_contexts(&self, world_id: &WorldId) -> Result<Vec<String>> {
        Ok(self
            .store
            .rng_all(world_id)
            .into_iter()
            .map(|s| s.context)
            .collect())
    }
}

fn missing(world_id: &WorldId, context: &str) -> Error {
    Error::NotFound(format!("RNG context '{context}' for world {world_id}"))
}
