//! Replay operations.
//!
//! # Example
//!
//! ```ignore
//! let result = db.replay.from_genesis(&world, &ReplayOptions::default())?;
//! assert!(result.success);
//! println!("{:?}", result.final_state.positions);
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;

use chronicle_core::{EventType, WorldId};
use chronicle_engine::{
    EventHandler, ReplayEngine, ReplayOptions, ReplayResult, RngCursor, StateComparison,
};
use serde_json::Value;
use uuid::Uuid;

use crate::error::Result;

/// Replay operations.
///
/// Access via `db.replay`.
pub struct Replay {
    engine: Arc<ReplayEngine>,
}

impl Replay {
    pub(crate) fn new(engine: Arc<ReplayEngine>) -> Self {
        Self { engine }
    }

    /// Rebuild a world's state from genesis.
    pub fn from_genesis(
        &self,
        world_id: &WorldId,
        options: &ReplayOptions,
    ) -> Result<ReplayResult> {
        Ok(self.engine.replay_from_genesis(world_id, options)?)
    }

    /// Rebuild a world's state starting from a stored snapshot.
    pub fn from_snapshot(
        &self,
        world_id: &WorldId,
        snapshot_id: &Uuid,
        options: &ReplayOptions,
    ) -> Result<ReplayResult> {
        Ok(self
            .engine
            .replay_from_snapshot(world_id, snapshot_id, options)?)
    }

    /// Rebuild a world's state as of `event_id`, starting from the
    /// nearest snapshot at or before it when one exists. `event_id`
    /// overrides any `to_event_id` already set on `options`.
    pub fn to_event(
        &self,
        world_id: &WorldId,
        event_id: u64,
        options: &ReplayOptions,
    ) -> Result<ReplayResult> {
        Ok(self.engine.replay_to_event(world_id, event_id, options)?)
    }

    /// Replay from genesis with full hash verification and compare the
    /// result against an expected state.
    pub fn verify(&self, world_id: &WorldId, expected: &Value) -> Result<StateComparison> {
        Ok(self.engine.verify_replay(world_id, expected)?)
    }

    /// Replace the fold handler for one event type.
    pub fn register_handler(&self, event_type: EventType, handler: EventHandler) {
        self.engine.register_handler(event_type, handler);
    }

    /// A world's stored RNG cursors, keyed by context.
    pub fn load_rng_states(&self, world_id: &WorldId) -> Result<BTreeMap<String, RngCursor>> {
        Ok(self.engine.load_rng_states(world_id)?)
    }

    /// Overwrite a world's stored RNG cursors with cursors taken from a
    /// replayed state. Returns the number restored.
    pub fn persist_rng_states(
        &self,
        world_id: &WorldId,
        cursors: &BTreeMap<String, RngCursor>,
    ) -> Result<usize> {
        Ok(self.engine.persist_rng_states(world_id, cursors)?)
    }
}
