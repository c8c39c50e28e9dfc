//! Typed event payloads.
//!
//! On disk a payload is opaque canonical JSON; at replay time each event
//! type parses into its own shape. Parsing is deliberately lenient
//! (unknown fields pass through, optional fields default) because
//! historical events written by older code must keep replaying.

use std::collections::BTreeMap;

use chronicle_core::{EventType, Result};
use serde::Deserialize;
use serde_json::Value;

use crate::state::RngCursor;

/// A movement event's payload: where the actor ended up.
#[derive(Debug, Clone, Deserialize)]
pub struct MovementPayload {
    /// Destination x
    #[serde(default)]
    pub to_x: f64,
    /// Destination y
    #[serde(default)]
    pub to_y: f64,
    /// Destination z; treated as 0 when omitted
    #[serde(default)]
    pub to_z: Option<f64>,
}

/// A quest event's payload: which quest changed, plus the change itself.
#[derive(Debug, Clone, Deserialize)]
pub struct QuestPayload {
    /// The quest this event is about
    pub quest_id: Option<String>,
    /// The rest of the payload (status, progress, notes)
    #[serde(flatten)]
    pub detail: serde_json::Map<String, Value>,
}

/// A system event's payload, possibly carrying RNG checkpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct SystemPayload {
    /// RNG cursors captured at this point, keyed by context
    #[serde(rename = "rngStates", default)]
    pub rng_states: Option<BTreeMap<String, RngCursor>>,
    /// The rest of the payload
    #[serde(flatten)]
    pub detail: serde_json::Map<String, Value>,
}

/// The closed union of payload shapes, tagged by event type.
///
/// Combat, spell, item, and social payloads are free-form per campaign
/// ruleset; they fold into state as last-event summaries only, so they stay
/// raw JSON here.
#[derive(Debug, Clone)]
pub enum EventPayload {
    /// Combat payload (free-form)
    Combat(Value),
    /// Parsed movement payload
    Movement(MovementPayload),
    /// Spell payload (free-form)
    Spell(Value),
    /// Item payload (free-form)
    Item(Value),
    /// Parsed quest payload
    Quest(QuestPayload),
    /// Social payload (free-form)
    Social(Value),
    /// Parsed system payload
    System(SystemPayload),
}

impl EventPayload {
    /// Parse a stored payload string according to its event type.
    pub fn parse(event_type: EventType, payload: &str) -> Result<Self> {
        Ok(match event_type {
            EventType::Combat => EventPayload::Combat(serde_json::from_str(payload)?),
            EventType::Movement => EventPayload::Movement(serde_json::from_str(payload)?),
            EventType::Spell => EventPayload::Spell(serde_json::from_str(payload)?),
            EventType::Item => EventPayload::Item(serde_json::from_str(payload)?),
            EventType::Quest => EventPayload::Quest(serde_json::from_str(payload)?),
            EventType::Social => EventPayload::Social(serde_json::from_str(payload)?),
            EventType::System => EventPayload::System(serde_json::from_str(payload)?),
        })
    }
}
