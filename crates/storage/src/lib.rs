//! Storage engine for the Chronicle ledger.
//!
//! Provides [`Store`]: per-world sharded in-memory tables for events,
//! snapshots, and RNG cursors, optionally backed by an append-only
//! JSON-lines journal that is replayed on open for crash recovery.
//!
//! ## Write model
//!
//! Appends for a given world serialize through that world's chain lock —
//! hash-chaining requires reading the current tail and writing the new row
//! as one unit. Different worlds never contend on a chain lock.

mod journal;
mod store;

pub use store::Store;
