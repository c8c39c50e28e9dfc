//! Core types and primitives for the Chronicle campaign ledger.
//!
//! This crate defines the fundamental vocabulary shared by every layer:
//! - [`types`]: events, snapshots, RNG cursors, filters, and result shapes
//! - [`canonical`]: deterministic JSON encoding (the single definition of
//!   "the same data" used by every hash and checksum in the system)
//! - [`hash`]: SHA-256 helpers, the genesis constant, and the canonical
//!   per-event hash
//! - [`error`]: the core error taxonomy

pub mod canonical;
pub mod error;
pub mod hash;
pub mod types;

pub use error::{Error, Result};
pub use hash::GENESIS_HASH;
pub use types::{
    ChainError, ChainVerification, Event, EventFilter, EventQueryResult, EventType, RngState,
    Snapshot, WorldId, SNAPSHOT_INTERVAL,
};
