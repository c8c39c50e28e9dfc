//! Ledger primitives for Chronicle.
//!
//! Three stateless facades over the storage engine:
//! - [`EventLog`]: append-only, hash-chained domain events with filtered
//!   queries and chain verification
//! - [`SnapshotStore`]: checksummed point-in-time state captures with
//!   nearest-at-or-before lookup and retention cleanup
//! - [`RngStore`]: per-(world, context) deterministic-sequence cursors
//!
//! Each takes its storage handle at construction — no ambient globals.

mod event_log;
mod rng_store;
mod snapshot_store;

pub use event_log::EventLog;
pub use rng_store::RngStore;
pub use snapshot_store::SnapshotStore;
