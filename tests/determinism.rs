//! Determinism and durability tests.
//!
//! Replaying the same history must always produce the same state, RNG
//! streams must resume exactly where they stopped, and a reopened ledger
//! must carry on as if it never closed.

use chronicledb::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng as _, SeedableRng};
use tempfile::TempDir;

fn world(id: &str) -> WorldId {
    WorldId::new(id)
}

fn init_logs() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

// ============================================================================
// Replay Determinism
// ============================================================================

#[test]
fn repeated_replays_are_byte_identical() {
    let db = Chronicle::ephemeral();
    let w = world("w1");
    for i in 0..50 {
        let (event_type, payload) = match i % 3 {
            0 => (EventType::Movement, json!({"to_x": i, "to_y": i * 2})),
            1 => (EventType::Combat, json!({"damage": i})),
            _ => (EventType::Quest, json!({"quest_id": format!("q{i}"), "step": i})),
        };
        db.events
            .append(&w, event_type, Some("hero"), None, &payload)
            .unwrap();
    }

    let first = db.replay.from_genesis(&w, &ReplayOptions::default()).unwrap();
    let second = db.replay.from_genesis(&w, &ReplayOptions::default()).unwrap();
    assert_eq!(
        first.final_state.to_value().unwrap(),
        second.final_state.to_value().unwrap()
    );
}

#[test]
fn snapshot_resume_equals_full_replay() {
    let db = Chronicle::ephemeral();
    let w = world("w1");
    for i in 0..10 {
        db.events
            .append(&w, EventType::Movement, Some("a"), None, &json!({"to_x": i, "to_y": 0}))
            .unwrap();
    }
    let snapshot = db.snapshots.create(&w, None).unwrap();
    for i in 10..20 {
        db.events
            .append(&w, EventType::Movement, Some("a"), None, &json!({"to_x": i, "to_y": 0}))
            .unwrap();
    }

    let full = db.replay.from_genesis(&w, &ReplayOptions::default()).unwrap();
    let resumed = db
        .replay
        .from_snapshot(&w, &snapshot.id, &ReplayOptions::default())
        .unwrap();
    assert!(full.success && resumed.success);
    assert_eq!(resumed.events_replayed, 10);
    assert_eq!(
        full.final_state.to_value().unwrap(),
        resumed.final_state.to_value().unwrap()
    );
}

#[test]
fn dry_run_counts_without_state() {
    let db = Chronicle::ephemeral();
    let w = world("w1");
    for _ in 0..5 {
        db.events
            .append(&w, EventType::Movement, Some("a"), None, &json!({"to_x": 1, "to_y": 1}))
            .unwrap();
    }
    let options = ReplayOptions {
        dry_run: true,
        verify_hashes: true,
        ..ReplayOptions::default()
    };
    let result = db.replay.from_genesis(&w, &options).unwrap();
    assert!(result.success);
    assert_eq!(result.events_replayed, 5);
    assert!(result.final_state.positions.is_empty());
    // The starting state comes back untouched, clock included
    assert_eq!(result.final_state.created_at, chrono::DateTime::UNIX_EPOCH);
}

// ============================================================================
// RNG Cursors
// ============================================================================

/// Draw `n` values from a fresh generator seeded with `seed`.
fn draws(seed: u64, n: u64) -> Vec<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n).map(|_| rng.gen::<f64>()).collect()
}

#[test]
fn cursor_resumes_the_exact_stream() {
    let db = Chronicle::ephemeral();
    let w = world("w1");
    db.rng.get_or_create(&w, "combat", 42).unwrap();

    // Session one: three draws, recording each
    let mut rng = StdRng::seed_from_u64(42);
    for _ in 0..3 {
        let value = rng.gen::<f64>();
        db.rng.increment(&w, "combat", Some(value)).unwrap();
    }

    // Session two: rebuild the generator from the cursor and draw once
    let cursor = db.rng.get(&w, "combat").unwrap().unwrap();
    assert_eq!(cursor.call_index, 3);
    let mut resumed = StdRng::seed_from_u64(cursor.seed);
    for _ in 0..cursor.call_index {
        resumed.gen::<f64>();
    }
    let next = resumed.gen::<f64>();
    assert_eq!(next, draws(42, 4)[3]);
}

#[test]
fn reseed_restarts_the_stream() {
    let db = Chronicle::ephemeral();
    let w = world("w1");
    db.rng.get_or_create(&w, "loot", 7).unwrap();
    db.rng.increment(&w, "loot", None).unwrap();

    let cursor = db.rng.update_seed(&w, "loot", 99).unwrap();
    assert_eq!(cursor.seed, 99);
    assert_eq!(cursor.call_index, 0);
    assert!(cursor.last_value.is_none());
}

#[test]
fn cursor_lifecycle_and_bulk_restore() {
    use std::collections::BTreeMap;

    let db = Chronicle::ephemeral();
    let w = world("w1");
    db.rng.get_or_create(&w, "combat", 1).unwrap();
    db.rng.get_or_create(&w, "loot", 2).unwrap();
    assert_eq!(db.rng.contexts(&w).unwrap(), vec!["combat", "loot"]);

    assert!(db.rng.delete(&w, "combat").unwrap());
    assert!(!db.rng.delete(&w, "combat").unwrap());
    assert_eq!(db.rng.list(&w).unwrap().len(), 1);

    // Restore a replayed state's cursors wholesale
    let mut cursors = BTreeMap::new();
    cursors.insert(
        "weather".to_string(),
        RngCursor {
            seed: 7,
            call_index: 4,
            last_value: Some(0.9),
        },
    );
    assert_eq!(db.replay.persist_rng_states(&w, &cursors).unwrap(), 1);
    assert!(db.rng.get(&w, "loot").unwrap().is_none());

    let loaded = db.replay.load_rng_states(&w).unwrap();
    assert_eq!(loaded["weather"].seed, 7);
    assert_eq!(loaded["weather"].call_index, 4);

    assert_eq!(db.rng.delete_all(&w).unwrap(), 1);
    assert!(db.rng.list(&w).unwrap().is_empty());
}

#[test]
fn replay_to_event_stops_at_the_cut_point() {
    let db = Chronicle::ephemeral();
    let w = world("w1");
    for i in 1..=6 {
        db.events
            .append(&w, EventType::Movement, Some("a"), None, &json!({"to_x": i, "to_y": 0}))
            .unwrap();
    }
    db.snapshots.create(&w, None).unwrap();
    db.events
        .append(&w, EventType::Movement, Some("a"), None, &json!({"to_x": 99, "to_y": 0}))
        .unwrap();

    let result = db.replay.to_event(&w, 6, &ReplayOptions::default()).unwrap();
    assert!(result.success);
    assert_eq!(result.final_event_id, Some(6));
    assert_eq!(result.final_state.positions["a"].x, 6.0);

    // verify_hashes rides along on the snapshot-accelerated path
    let verified = db
        .replay
        .to_event(
            &w,
            6,
            &ReplayOptions {
                verify_hashes: true,
                ..ReplayOptions::default()
            },
        )
        .unwrap();
    assert!(verified.success);
    assert_eq!(verified.final_event_id, Some(6));
}

#[test]
fn increment_missing_context_is_not_found() {
    let db = Chronicle::ephemeral();
    let err = db.rng.increment(&world("w1"), "ghost", None).unwrap_err();
    assert!(err.is_not_found());
}

// ============================================================================
// Durability
// ============================================================================

#[test]
fn reopened_ledger_continues_where_it_stopped() {
    init_logs();
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("campaign");
    let w = world("w1");

    let last_hash;
    let snapshot_id;
    {
        let db = Chronicle::open(&path).unwrap();
        for i in 0..5 {
            db.events
                .append(&w, EventType::Movement, Some("a"), None, &json!({"to_x": i, "to_y": 0}))
                .unwrap();
        }
        snapshot_id = db.snapshots.create(&w, Some("mid-session".into())).unwrap().id;
        db.rng.get_or_create(&w, "combat", 42).unwrap();
        db.rng.increment(&w, "combat", Some(0.25)).unwrap();
        last_hash = db.events.last(&w).unwrap().unwrap().hash;
    }

    let db = Chronicle::open(&path).unwrap();
    assert_eq!(db.events.count(&w).unwrap(), 5);
    assert_eq!(db.events.last(&w).unwrap().unwrap().hash, last_hash);

    let check = db.events.verify_chain(&w, None, None).unwrap();
    assert!(check.valid);
    assert_eq!(check.verified_count, 5);

    assert!(db.snapshots.verify(&snapshot_id).unwrap());
    let cursor = db.rng.get(&w, "combat").unwrap().unwrap();
    assert_eq!(cursor.call_index, 1);
    assert_eq!(cursor.last_value, Some(0.25));

    // Ids keep counting from where they stopped
    let next = db
        .events
        .append(&w, EventType::System, None, None, &json!({}))
        .unwrap();
    assert_eq!(next.id, 6);
    assert_eq!(next.prev_hash, last_hash);
}

#[test]
fn replay_survives_reopen() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("campaign");
    let w = world("w1");

    let before;
    {
        let db = Chronicle::open(&path).unwrap();
        db.events
            .append(&w, EventType::Movement, Some("a"), None, &json!({"to_x": 5, "to_y": 10}))
            .unwrap();
        before = db
            .replay
            .from_genesis(&w, &ReplayOptions::default())
            .unwrap()
            .final_state
            .to_value()
            .unwrap();
    }

    let db = Chronicle::open(&path).unwrap();
    let after = db
        .replay
        .from_genesis(&w, &ReplayOptions::default())
        .unwrap()
        .final_state
        .to_value()
        .unwrap();
    assert_eq!(before, after);
}
