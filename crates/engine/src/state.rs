//! Reconstructed world state and state comparison.
//!
//! [`WorldState`] is the value the replay fold produces. Well-known slices
//! are typed; anything a historical snapshot carried that this version does
//! not know about survives round-trips through the `extra` passthrough, so
//! old snapshot shapes keep loading.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use chronicle_core::{Result, WorldId};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// An actor's position in the world.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// East-west coordinate
    pub x: f64,
    /// North-south coordinate
    pub y: f64,
    /// Elevation; defaults to 0 when a movement event omits it
    #[serde(default)]
    pub z: f64,
}

/// A deterministic-sequence cursor as embedded in state and snapshots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RngCursor {
    /// Seed for the sequence
    pub seed: u64,
    /// Draws consumed so far
    #[serde(default)]
    pub call_index: u64,
    /// Most recent raw output, if recorded
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_value: Option<f64>,
}

/// Summary of the most recent event of a category, merged into state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventSummary {
    /// Id of the summarized event
    pub event_id: u64,
    /// Acting entity, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actor: Option<String>,
    /// Target entity, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    /// When the event was captured
    pub timestamp: DateTime<Utc>,
    /// The event payload's fields, merged in
    #[serde(flatten)]
    pub data: serde_json::Map<String, Value>,
}

/// Fully-reconstructed world state.
///
/// Field names on the wire match the persisted snapshot layout
/// (`createdAt`, `rngStates`, `lastCombatEvent`, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldState {
    /// World this state belongs to
    pub world_id: WorldId,
    /// When this state line began (genesis time)
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    /// Actor id -> latest position, maintained by movement events
    #[serde(default)]
    pub positions: BTreeMap<String, Position>,
    /// Quest id -> latest quest payload, maintained by quest events
    #[serde(default)]
    pub quests: BTreeMap<String, Value>,
    /// RNG cursors embedded in state (from system events or snapshots)
    #[serde(rename = "rngStates", default)]
    pub rng_states: BTreeMap<String, RngCursor>,
    /// Most recent combat event
    #[serde(
        rename = "lastCombatEvent",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub last_combat_event: Option<EventSummary>,
    /// Most recent spell event
    #[serde(
        rename = "lastSpellEvent",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub last_spell_event: Option<EventSummary>,
    /// Most recent item event
    #[serde(
        rename = "lastItemEvent",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub last_item_event: Option<EventSummary>,
    /// Most recent social event
    #[serde(
        rename = "lastSocialEvent",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub last_social_event: Option<EventSummary>,
    /// Most recent system event
    #[serde(
        rename = "lastSystemEvent",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub last_system_event: Option<EventSummary>,
    /// Fields from older state shapes this version does not model
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl WorldState {
    /// The empty genesis state for a world.
    ///
    /// `created_at` starts at the epoch; the replay fold stamps it with the
    /// first event's timestamp, keeping replays of the same history
    /// byte-identical.
    pub fn genesis(world_id: &WorldId) -> Self {
        Self {
            world_id: world_id.clone(),
            created_at: DateTime::UNIX_EPOCH,
            positions: BTreeMap::new(),
            quests: BTreeMap::new(),
            rng_states: BTreeMap::new(),
            last_combat_event: None,
            last_spell_event: None,
            last_item_event: None,
            last_social_event: None,
            last_system_event: None,
            extra: BTreeMap::new(),
        }
    }

    /// Load state from a snapshot's stored JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// The state as a JSON value (for snapshotting and comparison).
    pub fn to_value(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }
}

/// Outcome of comparing a replayed state against an expected one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateComparison {
    /// Whether the states are structurally identical
    pub matches: bool,
    /// One entry per difference, with dotted key paths
    pub differences: Vec<String>,
}

/// Deep-compare two JSON values, reporting differences with dotted paths.
///
/// Recursion into nested objects is by structural equality of keys: missing
/// keys, type mismatches, scalar value mismatches, and extra keys in the
/// actual value are reported separately. Arrays compare as whole values.
pub fn diff_values(expected: &Value, actual: &Value) -> Vec<String> {
    let mut differences = Vec::new();
    diff_at("", expected, actual, &mut differences);
    differences
}

fn join(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{path}.{key}")
    }
}

fn type_name(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn diff_at(path: &str, expected: &Value, actual: &Value, out: &mut Vec<String>) {
    match (expected, actual) {
        (Value::Object(exp), Value::Object(act)) => {
            for (key, exp_value) in exp {
                let child = join(path, key);
                match act.get(key) {
                    None => out.push(format!("missing key: {child}")),
                    Some(act_value) => diff_at(&child, exp_value, act_value, out),
                }
            }
            for key in act.keys() {
                if !exp.contains_key(key) {
                    out.push(format!("extra key: {}", join(path, key)));
                }
            }
        }
        _ if type_name(expected) != type_name(actual) => {
            out.push(format!(
                "type mismatch at {}: expected {}, got {}",
                if path.is_empty() { "(root)" } else { path },
                type_name(expected),
                type_name(actual)
            ));
        }
        _ if expected != actual => {
            out.push(format!(
                "value mismatch at {}: expected {expected}, got {actual}",
                if path.is_empty() { "(root)" } else { path },
            ));
        }
        _ => {}
    }
}
