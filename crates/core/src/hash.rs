//! SHA-256 hash utilities for the event chain.
//!
//! Hashes are lowercase hex strings (64 chars). The per-event hash is
//! computed over a fixed canonical layout so it never depends on how the
//! caller's struct happens to order its fields.

use crate::canonical::canonical_stringify;
use once_cell::sync::Lazy;
use serde_json::json;
use sha2::{Digest, Sha256};

/// Hash seeding the first link of every world's chain.
///
/// SHA-256 of the literal string `"genesis"`, computed once per process.
pub static GENESIS_HASH: Lazy<String> = Lazy::new(|| compute_hash("genesis"));

/// SHA-256 of a string, as lowercase hex.
pub fn compute_hash(data: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data.as_bytes());
    let digest = hasher.finalize();
    let mut out = String::with_capacity(64);
    for byte in digest {
        use std::fmt::Write;
        // writing into a String cannot fail
        let _ = write!(out, "{:02x}", byte);
    }
    out
}

/// The fields hashed into an event's identity.
///
/// `payload` is already the canonical JSON string of the event payload;
/// `timestamp` is the ISO-8601 rendering used on disk.
#[derive(Debug, Clone)]
pub struct EventHashInput<'a> {
    /// Global event id
    pub id: u64,
    /// ISO-8601 capture timestamp
    pub timestamp: &'a str,
    /// Event type tag (e.g. "combat")
    pub event_type: &'a str,
    /// Acting entity, if any
    pub actor_id: Option<&'a str>,
    /// Target entity, if any
    pub target_id: Option<&'a str>,
    /// Canonical JSON payload string
    pub payload: &'a str,
    /// Hash of the predecessor in the same world's chain
    pub prev_hash: &'a str,
}

/// Compute the canonical hash of an event.
///
/// Builds an object with exactly the keys `{actor_id, event_type, id,
/// payload, prev_hash, target_id, timestamp}` (alphabetical under canonical
/// serialization), serializes with no whitespace, and hashes.
pub fn compute_event_hash(input: &EventHashInput<'_>) -> String {
    let canonical = canonical_stringify(&json!({
        "actor_id": input.actor_id,
        "event_type": input.event_type,
        "id": input.id,
        "payload": input.payload,
        "prev_hash": input.prev_hash,
        "target_id": input.target_id,
        "timestamp": input.timestamp,
    }));
    compute_hash(&canonical)
}

/// Recompute and compare in constant time.
///
/// XOR-accumulates over the byte pairs so the comparison does not leak a
/// mismatch position through timing. Length mismatch fails immediately
/// (length is not secret).
pub fn verify_hash(data: &str, expected: &str) -> bool {
    let actual = compute_hash(data);
    if actual.len() != expected.len() {
        return false;
    }
    let mut acc = 0u8;
    for (a, b) in actual.bytes().zip(expected.bytes()) {
        acc |= a ^ b;
    }
    acc == 0
}
