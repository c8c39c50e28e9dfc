//! Deterministic replay.
//!
//! State is never stored as truth; it is always reconstructed by folding
//! the event log over a starting state (genesis or a snapshot). Replaying
//! the same events over the same start always yields the same state, so
//! snapshots are pure optimization.
//!
//! Replay failures (missing snapshot, checksum mismatch, broken chain)
//! come back as an unsuccessful [`ReplayResult`] carrying the partial
//! state, never as `Err`; an `Err` from these entry points means the
//! storage layer itself failed.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use chronicle_core::{Error, Event, Result, RngState, Snapshot, WorldId};
use chronicle_primitives::{EventLog, RngStore, SnapshotStore};
use chronicle_storage::Store;
use parking_lot::RwLock;
use uuid::Uuid;

use crate::handlers::{EventHandler, HandlerRegistry};
use crate::state::{diff_values, RngCursor, StateComparison, WorldState};

/// Options controlling a replay pass.
#[derive(Debug, Clone, Default)]
pub struct ReplayOptions {
    /// First event id to fold (defaults to the start of the range).
    pub from_event_id: Option<u64>,
    /// Last event id to fold, inclusive (defaults to the chain tip).
    pub to_event_id: Option<u64>,
    /// Verify every chain link and event hash while folding; the first
    /// failure aborts the replay.
    pub verify_hashes: bool,
    /// Walk (and optionally verify) the events without applying handlers.
    pub dry_run: bool,
}

/// Outcome of a replay pass.
#[derive(Debug, Clone)]
pub struct ReplayResult {
    /// Whether the replay ran to completion.
    pub success: bool,
    /// Number of events walked (including skipped ones on dry runs).
    pub events_replayed: u64,
    /// Id of the event the state is current as of: the last event folded,
    /// or the snapshot's cut point when resuming folded nothing. `None`
    /// only for a genesis replay over an empty range.
    pub final_event_id: Option<u64>,
    /// The reconstructed state; partial when `success` is false.
    pub final_state: WorldState,
    /// RNG cursors as of the final state, keyed by context.
    pub rng_states: BTreeMap<String, RngCursor>,
    /// Wall-clock duration of the pass.
    pub duration_ms: u64,
    /// What went wrong, when `success` is false.
    pub error: Option<String>,
}

/// Rebuilds world state by folding events through a [`HandlerRegistry`].
pub struct ReplayEngine {
    events: EventLog,
    snapshots: SnapshotStore,
    rng: RngStore,
    handlers: RwLock<HandlerRegistry>,
}

impl ReplayEngine {
    /// Create a replay engine with the default handlers.
    pub fn new(store: Arc<Store>) -> Self {
        Self {
            events: EventLog::new(store.clone()),
            snapshots: SnapshotStore::new(store.clone()),
            rng: RngStore::new(store),
            handlers: RwLock::new(HandlerRegistry::with_defaults()),
        }
    }

    /// Replace the handler for one event type for all subsequent replays.
    pub fn register_handler(&self, event_type: chronicle_core::EventType, handler: EventHandler) {
        self.handlers.write().register(event_type, handler);
    }

    /// Rebuild a world's state from its genesis state.
    pub fn replay_from_genesis(
        &self,
        world_id: &WorldId,
        options: &ReplayOptions,
    ) -> Result<ReplayResult> {
        let started = Instant::now();
        let state = WorldState::genesis(world_id);
        let from = options.from_event_id.unwrap_or(1);
        self.fold(world_id, state, from, None, options, started)
    }

    /// Rebuild a world's state starting from a stored snapshot.
    ///
    /// The snapshot's checksum is verified before its state is trusted; a
    /// corrupt or missing snapshot fails the replay without folding.
    pub fn replay_from_snapshot(
        &self,
        world_id: &WorldId,
        snapshot_id: &Uuid,
        options: &ReplayOptions,
    ) -> Result<ReplayResult> {
        let started = Instant::now();

        let snapshot = match self.snapshots.get_by_id(snapshot_id)? {
            Some(snapshot) => snapshot,
            None => {
                return Ok(self.failed(
                    world_id,
                    started,
                    format!("snapshot {snapshot_id} not found"),
                ))
            }
        };
        if snapshot.world_id != *world_id {
            return Ok(self.failed(
                world_id,
                started,
                format!(
                    "snapshot {snapshot_id} belongs to world '{}', not '{world_id}'",
                    snapshot.world_id
                ),
            ));
        }
        if !self.snapshots.verify(snapshot_id)? {
            return Ok(self.failed(
                world_id,
                started,
                format!("snapshot {snapshot_id} failed checksum verification"),
            ));
        }

        let state = match WorldState::from_json(&snapshot.state_json) {
            Ok(state) => state,
            Err(e) => {
                return Ok(self.failed(
                    world_id,
                    started,
                    format!("snapshot {snapshot_id} state unreadable: {e}"),
                ))
            }
        };

        self.fold(
            world_id,
            state,
            snapshot.event_id + 1,
            Some(snapshot.event_id),
            options,
            started,
        )
    }

    /// Rebuild a world's state as of `event_id`, starting from the nearest
    /// snapshot at or before it when one exists. `event_id` overrides any
    /// `to_event_id` already set on `options`.
    pub fn replay_to_event(
        &self,
        world_id: &WorldId,
        event_id: u64,
        options: &ReplayOptions,
    ) -> Result<ReplayResult> {
        let options = ReplayOptions {
            to_event_id: Some(event_id),
            ..options.clone()
        };
        match self.snapshots.get_nearest(world_id, event_id)? {
            Some(snapshot) => self.replay_from_snapshot(world_id, &snapshot.id, &options),
            None => self.replay_from_genesis(world_id, &options),
        }
    }

    /// Replay from genesis with hash verification and compare the result
    /// against an expected state, reporting path-level differences.
    pub fn verify_replay(
        &self,
        world_id: &WorldId,
        expected: &serde_json::Value,
    ) -> Result<StateComparison> {
        let options = ReplayOptions {
            verify_hashes: true,
            ..ReplayOptions::default()
        };
        let result = self.replay_from_genesis(world_id, &options)?;
        if !result.success {
            let reason = result
                .error
                .unwrap_or_else(|| "replay failed".to_string());
            return Ok(StateComparison {
                matches: false,
                differences: vec![reason],
            });
        }
        let actual = result.final_state.to_value()?;
        let differences = diff_values(expected, &actual);
        Ok(StateComparison {
            matches: differences.is_empty(),
            differences,
        })
    }

    /// Capture the world's current state as a snapshot.
    ///
    /// Replays to the chain tip first, so the snapshot always reflects a
    /// fully folded state. A world with no events cannot be snapshotted.
    pub fn create_snapshot(
        &self,
        world_id: &WorldId,
        description: Option<String>,
        is_auto: bool,
    ) -> Result<Snapshot> {
        let last = self
            .events
            .get_last_event(world_id)?
            .ok_or_else(|| Error::Validation(format!("world '{world_id}' has no events")))?;

        let result = self.replay_to_event(world_id, last.id, &ReplayOptions::default())?;
        if !result.success {
            return Err(Error::Internal(
                result
                    .error
                    .unwrap_or_else(|| "replay failed while snapshotting".to_string()),
            ));
        }

        let mut state = result.final_state;
        state.rng_states = self.load_rng_states(world_id)?;
        self.snapshots
            .create(world_id, last.id, &state.to_value()?, description, is_auto)
    }

    /// Overwrite the world's stored RNG cursors with the ones embedded in
    /// a replayed state. Returns the number restored.
    pub fn persist_rng_states(
        &self,
        world_id: &WorldId,
        cursors: &BTreeMap<String, RngCursor>,
    ) -> Result<usize> {
        let states = cursors
            .iter()
            .map(|(context, cursor)| RngState {
                id: Uuid::new_v4(),
                world_id: world_id.clone(),
                context: context.clone(),
                seed: cursor.seed,
                call_index: cursor.call_index,
                last_value: cursor.last_value,
                updated_at: Utc::now(),
            })
            .collect();
        self.rng.restore_from_snapshot(world_id, states)
    }

    /// The world's stored RNG cursors, keyed by context.
    pub fn load_rng_states(&self, world_id: &WorldId) -> Result<BTreeMap<String, RngCursor>> {
        Ok(self
            .rng
            .get_all_for_world(world_id)?
            .into_iter()
            .map(|state| {
                (
                    state.context,
                    RngCursor {
                        seed: state.seed,
                        call_index: state.call_index,
                        last_value: state.last_value,
                    },
                )
            })
            .collect())
    }

    /// The shared fold: walk events `[from, to]` over `state`.
    ///
    /// `resumed_at` is the snapshot's cut point when resuming, so an empty
    /// range still reports the event the state is current as of.
    fn fold(
        &self,
        world_id: &WorldId,
        mut state: WorldState,
        from: u64,
        resumed_at: Option<u64>,
        options: &ReplayOptions,
        started: Instant,
    ) -> Result<ReplayResult> {
        let to = options.to_event_id.unwrap_or(u64::MAX);
        let events = self.events.events_between(world_id, from, to)?;

        let mut expected = if options.verify_hashes {
            Some(self.events.hash_before(world_id, from)?)
        } else {
            None
        };

        // A fresh world's clock starts at its first event. A dry run
        // must hand the starting state back untouched, so it skips this
        // too.
        if !options.dry_run && state.created_at == chrono::DateTime::UNIX_EPOCH {
            if let Some(first) = events.first() {
                state.created_at = first.timestamp;
            }
        }

        let handlers = self.handlers.read();
        let mut replayed = 0u64;
        let mut final_event_id = resumed_at;

        for event in &events {
            if let Some(expected_hash) = &expected {
                if let Some(message) = check_event(event, expected_hash) {
                    tracing::warn!(world = %world_id, event = event.id, %message, "replay aborted");
                    return Ok(ReplayResult {
                        success: false,
                        events_replayed: replayed,
                        final_event_id,
                        rng_states: state.rng_states.clone(),
                        final_state: state,
                        duration_ms: started.elapsed().as_millis() as u64,
                        error: Some(message),
                    });
                }
                expected = Some(event.hash.clone());
            }

            if !options.dry_run {
                if let Some(handler) = handlers.get(event.event_type) {
                    // Handler failures skip the event, never abort the fold
                    if let Err(e) = handler(&mut state, event) {
                        tracing::warn!(
                            world = %world_id,
                            event = event.id,
                            event_type = %event.event_type,
                            error = %e,
                            "handler failed; event skipped"
                        );
                    }
                }
            }

            replayed += 1;
            final_event_id = Some(event.id);
        }
        drop(handlers);

        tracing::debug!(
            world = %world_id,
            events = replayed,
            dry_run = options.dry_run,
            "replay complete"
        );
        Ok(ReplayResult {
            success: true,
            events_replayed: replayed,
            final_event_id,
            rng_states: state.rng_states.clone(),
            final_state: state,
            duration_ms: started.elapsed().as_millis() as u64,
            error: None,
        })
    }

    fn failed(&self, world_id: &WorldId, started: Instant, error: String) -> ReplayResult {
        let state = WorldState::genesis(world_id);
        ReplayResult {
            success: false,
            events_replayed: 0,
            final_event_id: None,
            rng_states: state.rng_states.clone(),
            final_state: state,
            duration_ms: started.elapsed().as_millis() as u64,
            error: Some(error),
        }
    }
}

/// Check one event against the running chain expectation. Returns the
/// failure message, or `None` when the event checks out.
fn check_event(event: &Event, expected_prev: &str) -> Option<String> {
    if event.prev_hash != expected_prev {
        return Some(format!("Chain broken at event {}", event.id));
    }
    if event.recompute_hash() != event.hash {
        return Some(format!("Hash mismatch at event {}", event.id));
    }
    None
}
