//! Per-event-type fold handlers.
//!
//! A handler applies one event to a [`WorldState`]. The registry ships with
//! a default handler per event type; callers can override any of them before
//! a replay to customize folding for their ruleset. Handler errors never
//! abort a replay — the engine logs them and skips the event.

use std::collections::HashMap;
use std::sync::Arc;

use chronicle_core::{Error, Event, EventType, Result};
use serde_json::Value;

use crate::payload::EventPayload;
use crate::state::{EventSummary, Position, WorldState};

/// A fold step: mutate the state according to one event.
pub type EventHandler = Arc<dyn Fn(&mut WorldState, &Event) -> Result<()> + Send + Sync>;

/// Maps event types to handlers. Registering for a type that already has a
/// handler replaces it.
pub struct HandlerRegistry {
    handlers: HashMap<EventType, EventHandler>,
}

impl HandlerRegistry {
    /// An empty registry. Events with no handler are counted but leave the
    /// state untouched.
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// A registry preloaded with the default handler for every event type.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(EventType::Combat, summary_handler(EventType::Combat));
        registry.register(EventType::Spell, summary_handler(EventType::Spell));
        registry.register(EventType::Item, summary_handler(EventType::Item));
        registry.register(EventType::Social, summary_handler(EventType::Social));
        registry.register(EventType::Movement, Arc::new(apply_movement));
        registry.register(EventType::Quest, Arc::new(apply_quest));
        registry.register(EventType::System, Arc::new(apply_system));
        registry
    }

    /// Register (or replace) the handler for an event type.
    pub fn register(&mut self, event_type: EventType, handler: EventHandler) {
        self.handlers.insert(event_type, handler);
    }

    pub fn get(&self, event_type: EventType) -> Option<&EventHandler> {
        self.handlers.get(&event_type)
    }
}

impl Default for HandlerRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// Build the last-event summary recorded by combat, spell, item, social,
/// and system handlers. Object payloads flatten into the summary; anything
/// else is kept under a "value" key.
fn summarize(event: &Event) -> Result<EventSummary> {
    let payload: Value = event.payload_json()?;
    let data = match payload {
        Value::Object(map) => map,
        other => {
            let mut map = serde_json::Map::new();
            map.insert("value".to_string(), other);
            map
        }
    };
    Ok(EventSummary {
        event_id: event.id,
        actor: event.actor_id.clone(),
        target: event.target_id.clone(),
        timestamp: event.timestamp,
        data,
    })
}

fn summary_handler(event_type: EventType) -> EventHandler {
    Arc::new(move |state: &mut WorldState, event: &Event| {
        let summary = summarize(event)?;
        let slot = match event_type {
            EventType::Combat => &mut state.last_combat_event,
            EventType::Spell => &mut state.last_spell_event,
            EventType::Item => &mut state.last_item_event,
            EventType::Social => &mut state.last_social_event,
            EventType::System => &mut state.last_system_event,
            _ => return Ok(()),
        };
        *slot = Some(summary);
        Ok(())
    })
}

/// Movement sets the actor's position. Events with no actor move nobody.
fn apply_movement(state: &mut WorldState, event: &Event) -> Result<()> {
    let EventPayload::Movement(movement) = EventPayload::parse(event.event_type, &event.payload)?
    else {
        return Ok(());
    };
    if let Some(actor) = &event.actor_id {
        state.positions.insert(
            actor.clone(),
            Position {
                x: movement.to_x,
                y: movement.to_y,
                z: movement.to_z.unwrap_or(0.0),
            },
        );
    }
    Ok(())
}

/// Quest events overwrite the quest's stored payload wholesale.
fn apply_quest(state: &mut WorldState, event: &Event) -> Result<()> {
    let EventPayload::Quest(quest) = EventPayload::parse(event.event_type, &event.payload)? else {
        return Ok(());
    };
    let quest_id = quest
        .quest_id
        .ok_or_else(|| Error::Validation("quest event missing quest_id".to_string()))?;
    state.quests.insert(quest_id, event.payload_json()?);
    Ok(())
}

/// System events record a summary and merge any RNG cursors they carry.
fn apply_system(state: &mut WorldState, event: &Event) -> Result<()> {
    let EventPayload::System(system) = EventPayload::parse(event.event_type, &event.payload)?
    else {
        return Ok(());
    };
    state.last_system_event = Some(summarize(event)?);
    if let Some(cursors) = system.rng_states {
        for (context, cursor) in cursors {
            state.rng_states.insert(context, cursor);
        }
    }
    Ok(())
}
