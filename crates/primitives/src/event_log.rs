//! Event log primitive.
//!
//! Immutable, append-only record of everything that happens in a world,
//! with per-world causal hash chaining for tamper-evidence.
//!
//! ## Design
//!
//! - Append-only: no update, no delete (a deletion would break the chain
//!   for every subsequent event)
//! - Event ids are globally sequential; chains are per world
//! - Single-writer-ordered per world: the storage layer holds the world's
//!   chain lock across read-tail / assign-id / hash / write
//! - A broken chain is a *finding*, reported as data, never as an error

use std::sync::Arc;

use chrono::Utc;
use chronicle_core::canonical::canonical_stringify;
use chronicle_core::hash::{compute_event_hash, EventHashInput};
use chronicle_core::types::iso_millis;
use chronicle_core::{
    ChainError, ChainVerification, Event, EventFilter, EventQueryResult, EventType, Result,
    WorldId, GENESIS_HASH,
};
use chronicle_storage::Store;
use serde_json::Value;

/// Append-only, hash-chained event store.
#[derive(Clone)]
pub struct EventLog {
    store: Arc<Store>,
}

impl EventLog {
    /// Create an event log over the given storage handle.
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }

    /// Append a new event to a world's chain.
    ///
    /// Looks up the chain tail (genesis hash for a fresh world), assigns the
    /// next global id, canonicalizes the payload, computes the event hash,
    /// and persists — all as one indivisible step under the world lock.
    pub fn append(
        &self,
        world_id: &WorldId,
        event_type: EventType,
        actor_id: Option<&str>,
        target_id: Option<&str>,
        payload: &Value,
    ) -> Result<Event> {
        let payload = canonical_stringify(payload);
        let event = self.store.append_event(world_id, |id, prev_hash| {
            let timestamp = Utc::now();
            let timestamp_iso = iso_millis(&timestamp);
            let hash = compute_event_hash(&EventHashInput {
                id,
                timestamp: &timestamp_iso,
                event_type: event_type.as_str(),
                actor_id,
                target_id,
                payload: &payload,
                prev_hash,
            });
            Ok(Event {
                id,
                world_id: world_id.clone(),
                timestamp,
                event_type,
                actor_id: actor_id.map(str::to_string),
                target_id: target_id.map(str::to_string),
                payload,
                prev_hash: prev_hash.to_string(),
                hash,
            })
        })?;
        tracing::debug!(
            world = %world_id,
            id = event.id,
            event_type = %event.event_type,
            "appended event"
        );
        Ok(event)
    }

    /// Walk a world's chain and check every link and hash.
    ///
    /// `from_id`/`to_id` bound the walk (inclusive). When starting mid-chain
    /// the expected prev-hash is seeded from the event immediately preceding
    /// `from_id` in the same world; at the true beginning it is the genesis
    /// hash. Stops at the first failure. An empty range is vacuously valid.
    pub fn verify_chain(
        &self,
        world_id: &WorldId,
        from_id: Option<u64>,
        to_id: Option<u64>,
    ) -> Result<ChainVerification> {
        let from = from_id.unwrap_or(1);
        let to = to_id.unwrap_or(u64::MAX);
        let events = self.store.events_in_range(world_id, from, to);

        let mut expected = match from_id {
            Some(from) => self
                .store
                .last_event_before(world_id, from)
                .map(|e| e.hash)
                .unwrap_or_else(|| GENESIS_HASH.clone()),
            None => GENESIS_HASH.clone(),
        };

        let mut verified = 0u64;
        for event in &events {
            if event.prev_hash != expected {
                return Ok(ChainVerification::invalid(
                    verified,
                    ChainError {
                        event_id: event.id,
                        message: format!("Chain broken at event {}", event.id),
                        expected,
                        found: event.prev_hash.clone(),
                    },
                ));
            }
            let recomputed = event.recompute_hash();
            if recomputed != event.hash {
                return Ok(ChainVerification::invalid(
                    verified,
                    ChainError {
                        event_id: event.id,
                        message: format!("Hash mismatch at event {}", event.id),
                        expected: recomputed,
                        found: event.hash.clone(),
                    },
                ));
            }
            expected = event.hash.clone();
            verified += 1;
        }
        Ok(ChainVerification::valid(verified))
    }

    /// Query events by filter, ascending by id.
    ///
    /// `total_count` reflects the filter before the limit; `has_more` is
    /// whether matches were cut off by the (clamped) limit.
    pub fn query(&self, filter: &EventFilter) -> Result<EventQueryResult> {
        let limit = filter.effective_limit();
        let mut matches: Vec<Event> = self
            .store
            .world_events(&filter.world_id)
            .into_iter()
            .filter(|e| filter.matches(e))
            .collect();
        let total_count = matches.len() as u64;
        matches.truncate(limit);
        Ok(EventQueryResult {
            events: matches,
            total_count,
            has_more: total_count > limit as u64,
        })
    }

    /// Most recent event of a world, or `None` for a world with no events.
    pub fn get_last_event(&self, world_id: &WorldId) -> Result<Option<Event>> {
        Ok(self.store.last_event(world_id))
    }

    /// Look up an event by its global id.
    pub fn get_by_id(&self, id: u64) -> Result<Option<Event>> {
        Ok(self.store.event_by_id(id))
    }

    /// Number of events recorded for a world.
    pub fn count_by_world(&self, world_id: &WorldId) -> Result<u64> {
        Ok(self.store.event_count(world_id))
    }

    /// Events of a world with ids in `[from, to]`, ascending.
    ///
    /// Range primitive used by the replay engine.
    pub fn events_between(&self, world_id: &WorldId, from: u64, to: u64) -> Result<Vec<Event>> {
        Ok(self.store.events_in_range(world_id, from, to))
    }

    /// Hash of the event immediately preceding `id` in this world's chain,
    /// or the genesis hash if there is none.
    pub fn hash_before(&self, world_id: &WorldId, id: u64) -> Result<String> {
        Ok(self
            .store
            .last_event_before(world_id, id)
            .map(|e| e.hash)
            .unwrap_or_else(|| GENESIS_HASH.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn setup() -> (Arc<Store>, EventLog) {
        let store = Arc::new(Store::ephemeral());
        let log = EventLog::new(store.clone());
        (store, log)
    }

    fn w(id: &str) -> WorldId {
        WorldId::new(id)
    }

    #[test]
    fn append_assigns_ids_and_links_chain() {
        let (_store, log) = setup();
        let world = w("w1");

        let e1 = log
            .append(&world, EventType::Combat, Some("a"), Some("g"), &json!({"dmg": 8}))
            .unwrap();
        let e2 = log
            .append(&world, EventType::Movement, Some("a"), None, &json!({"to_x": 5}))
            .unwrap();

        assert_eq!(e1.id, 1);
        assert_eq!(e2.id, 2);
        assert_eq!(e1.prev_hash, *GENESIS_HASH);
        assert_eq!(e2.prev_hash, e1.hash);
        assert_eq!(e1.recompute_hash(), e1.hash);
    }

    #[test]
    fn append_canonicalizes_payload() {
        let (_store, log) = setup();
        let world = w("w1");

        let event = log
            .append(
                &world,
                EventType::Item,
                None,
                None,
                &json!({"b": 2, "a": 1}),
            )
            .unwrap();
        assert_eq!(event.payload, r#"{"a":1,"b":2}"#);
    }

    #[test]
    fn verify_chain_valid_over_appends() {
        let (_store, log) = setup();
        let world = w("w1");
        for i in 0..10 {
            log.append(&world, EventType::System, None, None, &json!({"n": i}))
                .unwrap();
        }
        let verification = log.verify_chain(&world, None, None).unwrap();
        assert!(verification.valid);
        assert_eq!(verification.verified_count, 10);
        assert!(verification.error.is_none());
    }

    #[test]
    fn verify_chain_empty_world_is_vacuously_valid() {
        let (_store, log) = setup();
        let verification = log.verify_chain(&w("nobody"), None, None).unwrap();
        assert!(verification.valid);
        assert_eq!(verification.verified_count, 0);
    }

    #[test]
    fn tampered_hash_reports_hash_mismatch() {
        let (store, log) = setup();
        let world = w("w1");
        log.append(&world, EventType::Combat, Some("a"), None, &json!({}))
            .unwrap();
        let e2 = log
            .append(&world, EventType::Combat, Some("a"), None, &json!({}))
            .unwrap();

        let mut tampered = e2.clone();
        tampered.hash = "0".repeat(64);
        assert!(store.overwrite_event(tampered));

        let verification = log.verify_chain(&world, None, None).unwrap();
        assert!(!verification.valid);
        let error = verification.error.unwrap();
        assert_eq!(error.event_id, e2.id);
        assert!(error.message.contains("Hash mismatch"));
        assert_eq!(verification.verified_count, 1);
    }

    #[test]
    fn tampered_prev_hash_reports_chain_broken() {
        let (store, log) = setup();
        let world = w("w1");
        log.append(&world, EventType::Combat, Some("a"), None, &json!({}))
            .unwrap();
        let e2 = log
            .append(&world, EventType::Combat, Some("a"), None, &json!({}))
            .unwrap();

        let mut tampered = e2.clone();
        tampered.prev_hash = "f".repeat(64);
        // Keep the stored hash consistent with the forged link, so the link
        // check (not the content check) is what fires
        tampered.hash = tampered.recompute_hash();
        assert!(store.overwrite_event(tampered));

        let verification = log.verify_chain(&world, None, None).unwrap();
        assert!(!verification.valid);
        let error = verification.error.unwrap();
        assert_eq!(error.event_id, e2.id);
        assert!(error.message.contains("Chain broken"));
        assert_eq!(error.found, "f".repeat(64));
    }

    #[test]
    fn verify_chain_mid_range_seeds_from_predecessor() {
        let (_store, log) = setup();
        let world = w("w1");
        let mut ids = Vec::new();
        for _ in 0..5 {
            ids.push(
                log.append(&world, EventType::System, None, None, &json!({}))
                    .unwrap()
                    .id,
            );
        }
        let verification = log.verify_chain(&world, Some(ids[2]), Some(ids[4])).unwrap();
        assert!(verification.valid);
        assert_eq!(verification.verified_count, 3);
    }

    #[test]
    fn query_filters_and_paginates() {
        let (_store, log) = setup();
        let world = w("w1");
        for i in 0..7 {
            let event_type = if i % 2 == 0 {
                EventType::Combat
            } else {
                EventType::Movement
            };
            log.append(&world, event_type, Some("hero"), None, &json!({"n": i}))
                .unwrap();
        }
        // Another world's events never leak in
        log.append(&w("w2"), EventType::Combat, Some("hero"), None, &json!({}))
            .unwrap();

        let mut filter = EventFilter::for_world("w1");
        filter.event_type = Some(EventType::Combat);
        filter.limit = Some(2);

        let page = log.query(&filter).unwrap();
        assert_eq!(page.total_count, 4);
        assert_eq!(page.events.len(), 2);
        assert!(page.has_more);
        assert!(page.events.windows(2).all(|w| w[0].id < w[1].id));
    }

    #[test]
    fn lookups() {
        let (_store, log) = setup();
        let world = w("w1");
        assert!(log.get_last_event(&world).unwrap().is_none());
        assert_eq!(log.count_by_world(&world).unwrap(), 0);

        let event = log
            .append(&world, EventType::Social, Some("bard"), None, &json!({}))
            .unwrap();
        assert_eq!(log.get_last_event(&world).unwrap().unwrap().id, event.id);
        assert_eq!(log.get_by_id(event.id).unwrap().unwrap().hash, event.hash);
        assert!(log.get_by_id(999).unwrap().is_none());
        assert_eq!(log.count_by_world(&world).unwrap(), 1);
    }
}
