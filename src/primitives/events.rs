//! Event log operations.
//!
//! # Example
//!
//! ```ignore
//! use chronicledb::prelude::*;
//!
//! let db = Chronicle::ephemeral();
//! let world = WorldId::new("world-1");
//!
//! let event = db.events.append(&world, EventType::Combat,
//!     Some("hero"), Some("goblin"), &json!({"damage": 7}))?;
//!
//! let verification = db.events.verify_chain(&world, None, None)?;
//! assert!(verification.valid);
//! ```

use std::sync::Arc;

use chronicle_core::{
    ChainVerification, Event, EventFilter, EventQueryResult, EventType, WorldId,
    SNAPSHOT_INTERVAL,
};
use chronicle_engine::ReplayEngine;
use chronicle_primitives::EventLog;
use chronicle_storage::Store;
use serde_json::Value;

use crate::error::Result;

/// Event log operations.
///
/// Access via `db.events`.
pub struct Events {
    log: EventLog,
    engine: Arc<ReplayEngine>,
}

impl Events {
    pub(crate) fn new(store: Arc<Store>, engine: Arc<ReplayEngine>) -> Self {
        Self {
            log: EventLog::new(store),
            engine,
        }
    }

    /// Append an event to a world's chain.
    ///
    /// The payload is canonicalized before hashing, so structurally equal
    /// payloads always produce the same event hash. Every
    /// [`SNAPSHOT_INTERVAL`]th global event triggers an automatic snapshot
    /// of its world; a snapshot failure is logged, never surfaced — the
    /// append itself has already succeeded.
    pub fn append(
        &self,
        world_id: &WorldId,
        event_type: EventType,
        actor_id: Option<&str>,
        target_id: Option<&str>,
        payload: &Value,
    ) -> Result<Event> {
        let event = self
            .log
            .append(world_id, event_type, actor_id, target_id, payload)?;

        if event.id % SNAPSHOT_INTERVAL == 0 {
            let description = Some(format!("auto snapshot at event {}", event.id));
            if let Err(e) = self.engine.create_snapshot(world_id, description, true) {
                tracing::warn!(
                    world = %world_id,
                    event = event.id,
                    error = %e,
                    "auto snapshot failed"
                );
            }
        }
        Ok(event)
    }

    /// Verify a world's hash chain over an inclusive id range.
    ///
    /// A broken chain comes back as `valid: false` with the failing link,
    /// not as an error.
    pub fn verify_chain(
        &self,
        world_id: &WorldId,
        from_id: Option<u64>,
        to_id: Option<u64>,
    ) -> Result<ChainVerification> {
        Ok(self.log.verify_chain(world_id, from_id, to_id)?)
    }

    /// Query events by filter, ascending by id.
    pub fn query(&self, filter: &EventFilter) -> Result<EventQueryResult> {
        Ok(self.log.query(filter)?)
    }

    /// Look up an event by its global id.
    pub fn get(&self, id: u64) -> Result<Option<Event>> {
        Ok(self.log.get_by_id(id)?)
    }

    /// Most recent event of a world.
    pub fn last(&self, world_id: &WorldId) -> Result<Option<Event>> {
        Ok(self.log.get_last_event(world_id)?)
    }

    /// Number of events recorded for a world.
    pub fn count(&self, world_id: &WorldId) -> Result<u64> {
        Ok(self.log.count_by_world(world_id)?)
    }
}
