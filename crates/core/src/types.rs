//! Core types for the campaign ledger.
//!
//! This module defines the persisted record shapes:
//! - [`Event`]: an immutable, hash-chained fact in a world's history
//! - [`Snapshot`]: a checksummed capture of reconstructed world state
//! - [`RngState`]: a per-(world, context) deterministic-sequence cursor
//!
//! plus the query/verification result shapes shared across layers.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::hash::{compute_event_hash, EventHashInput};

/// Every time the global event id crosses a multiple of this, the world that
/// received the event gets an automatic snapshot.
pub const SNAPSHOT_INTERVAL: u64 = 1000;

/// Identifier of a world (a campaign's isolated event chain).
///
/// Worlds partition the ledger: each world has its own hash chain even though
/// event ids are globally sequential.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorldId(String);

impl WorldId {
    /// Create a world id from any string-like value.
    pub fn new(id: impl Into<String>) -> Self {
        WorldId(id.into())
    }

    /// The id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for WorldId {
    fn from(s: &str) -> Self {
        WorldId(s.to_string())
    }
}

impl From<String> for WorldId {
    fn from(s: String) -> Self {
        WorldId(s)
    }
}

impl std::fmt::Display for WorldId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The closed set of domain event categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventType {
    /// Attack rolls, damage, defeat
    Combat,
    /// Actor position changes
    Movement,
    /// Spell casts and effects
    Spell,
    /// Item acquisition, use, transfer
    Item,
    /// Quest state transitions
    Quest,
    /// Dialogue, persuasion, reputation
    Social,
    /// Engine-level facts (RNG checkpoints, world lifecycle)
    System,
}

impl EventType {
    /// All event types, for iteration and dispatch-table construction.
    pub const ALL: [EventType; 7] = [
        EventType::Combat,
        EventType::Movement,
        EventType::Spell,
        EventType::Item,
        EventType::Quest,
        EventType::Social,
        EventType::System,
    ];

    /// The wire tag for this type (lowercase, matches serde encoding).
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::Combat => "combat",
            EventType::Movement => "movement",
            EventType::Spell => "spell",
            EventType::Item => "item",
            EventType::Quest => "quest",
            EventType::Social => "social",
            EventType::System => "system",
        }
    }
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for EventType {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "combat" => Ok(EventType::Combat),
            "movement" => Ok(EventType::Movement),
            "spell" => Ok(EventType::Spell),
            "item" => Ok(EventType::Item),
            "quest" => Ok(EventType::Quest),
            "social" => Ok(EventType::Social),
            "system" => Ok(EventType::System),
            other => Err(crate::Error::Validation(format!(
                "unknown event type: {other}"
            ))),
        }
    }
}

/// Render a timestamp the way it is hashed and displayed: ISO-8601 with
/// millisecond precision and a `Z` suffix.
pub fn iso_millis(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// An immutable fact about something that happened in a world.
///
/// Events are append-only and hash-chained per world: `prev_hash` is the
/// `hash` of the immediately preceding event in the same world, or the
/// genesis hash for the chain's first event. They are never mutated and
/// never deleted — deletion would break the chain for everything after it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Globally sequential id, assigned by the store on append (1-based)
    pub id: u64,
    /// World whose chain this event extends
    pub world_id: WorldId,
    /// Capture-time wall clock
    pub timestamp: DateTime<Utc>,
    /// Domain category
    pub event_type: EventType,
    /// Acting entity, if any (no referential integrity at this layer)
    pub actor_id: Option<String>,
    /// Target entity, if any
    pub target_id: Option<String>,
    /// Canonical-JSON payload string, shape specific to `event_type`
    pub payload: String,
    /// Hash of the predecessor in this world's chain (genesis hash if first)
    pub prev_hash: String,
    /// SHA-256 over this event's canonical hash layout
    pub hash: String,
}

impl Event {
    /// Recompute this event's hash from its own fields.
    ///
    /// Used by chain verification; for an untampered event the result equals
    /// the stored `hash`.
    pub fn recompute_hash(&self) -> String {
        let timestamp = iso_millis(&self.timestamp);
        compute_event_hash(&EventHashInput {
            id: self.id,
            timestamp: &timestamp,
            event_type: self.event_type.as_str(),
            actor_id: self.actor_id.as_deref(),
            target_id: self.target_id.as_deref(),
            payload: &self.payload,
            prev_hash: &self.prev_hash,
        })
    }

    /// Parse the payload back into JSON.
    pub fn payload_json(&self) -> crate::Result<serde_json::Value> {
        Ok(serde_json::from_str(&self.payload)?)
    }
}

/// First failure found while walking a chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainError {
    /// Id of the offending event
    pub event_id: u64,
    /// "Chain broken ..." (bad link) or "Hash mismatch ..." (bad content)
    pub message: String,
    /// Hash the walk expected at this position
    pub expected: String,
    /// Hash actually found
    pub found: String,
}

/// Result of walking a world's chain.
///
/// A broken chain is an expected, actionable outcome — it is reported here,
/// never as an operation error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainVerification {
    /// Whether every examined link and hash checked out
    pub valid: bool,
    /// Events examined before stopping
    pub verified_count: u64,
    /// The first failure, when `valid` is false
    pub error: Option<ChainError>,
}

impl ChainVerification {
    /// A fully valid walk over `verified_count` events.
    pub fn valid(verified_count: u64) -> Self {
        Self {
            valid: true,
            verified_count,
            error: None,
        }
    }

    /// A walk stopped at its first failure.
    pub fn invalid(verified_count: u64, error: ChainError) -> Self {
        Self {
            valid: false,
            verified_count,
            error: Some(error),
        }
    }
}

/// Query filter over a world's events.
///
/// `world_id` is required; everything else narrows the match. Results are
/// always in ascending id order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventFilter {
    /// World to query (required)
    pub world_id: WorldId,
    /// Restrict to one event type
    pub event_type: Option<EventType>,
    /// Restrict to one actor
    pub actor_id: Option<String>,
    /// Inclusive lower timestamp bound
    pub since: Option<DateTime<Utc>>,
    /// Inclusive upper timestamp bound
    pub until: Option<DateTime<Utc>>,
    /// Inclusive lower event-id bound
    pub from_event_id: Option<u64>,
    /// Inclusive upper event-id bound
    pub to_event_id: Option<u64>,
    /// Maximum events returned; clamped to `[1, 1000]`, default 100
    pub limit: Option<i64>,
}

impl EventFilter {
    /// Filter matching every event of a world.
    pub fn for_world(world_id: impl Into<WorldId>) -> Self {
        Self {
            world_id: world_id.into(),
            event_type: None,
            actor_id: None,
            since: None,
            until: None,
            from_event_id: None,
            to_event_id: None,
            limit: None,
        }
    }

    /// The limit after clamping to `[1, 1000]` (default 100).
    pub fn effective_limit(&self) -> usize {
        self.limit.unwrap_or(100).clamp(1, 1000) as usize
    }

    /// Whether an event passes every bound in this filter.
    pub fn matches(&self, event: &Event) -> bool {
        if event.world_id != self.world_id {
            return false;
        }
        if let Some(t) = self.event_type {
            if event.event_type != t {
                return false;
            }
        }
        if let Some(actor) = &self.actor_id {
            if event.actor_id.as_deref() != Some(actor.as_str()) {
                return false;
            }
        }
        if let Some(since) = self.since {
            if event.timestamp < since {
                return false;
            }
        }
        if let Some(until) = self.until {
            if event.timestamp > until {
                return false;
            }
        }
        if let Some(from) = self.from_event_id {
            if event.id < from {
                return false;
            }
        }
        if let Some(to) = self.to_event_id {
            if event.id > to {
                return false;
            }
        }
        true
    }
}

/// Page of events matching a filter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventQueryResult {
    /// Matching events, ascending by id, at most the effective limit
    pub events: Vec<Event>,
    /// Matches before the limit was applied
    pub total_count: u64,
    /// Whether `total_count` exceeds the returned page
    pub has_more: bool,
}

/// A captured, checksummed copy of fully-reconstructed world state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Opaque unique identifier
    pub id: Uuid,
    /// World the state belongs to
    pub world_id: WorldId,
    /// Last event folded into this state (the cut point)
    pub event_id: u64,
    /// When the snapshot was taken
    pub created_at: DateTime<Utc>,
    /// Optional operator note
    pub description: Option<String>,
    /// Canonical JSON of the reconstructed state
    pub state_json: String,
    /// SHA-256 of `state_json`; a mismatch signals storage corruption
    pub checksum: String,
    /// Byte length of `state_json`
    pub size_bytes: u64,
    /// True for cadence-triggered snapshots, false for user-requested ones
    pub is_auto: bool,
}

/// A per-(world, context) deterministic-sequence cursor.
///
/// Replaying the same `seed` and re-issuing exactly `call_index` draws before
/// continuing reproduces bit-identical subsequent output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RngState {
    /// Row identifier
    pub id: Uuid,
    /// Owning world
    pub world_id: WorldId,
    /// Free-form namespace, e.g. "combat" or "loot"
    pub context: String,
    /// Seed for the deterministic sequence
    pub seed: u64,
    /// Number of draws consumed so far
    pub call_index: u64,
    /// Most recent raw output, kept for debugging
    pub last_value: Option<f64>,
    /// Last modification time
    pub updated_at: DateTime<Utc>,
}
