//! # Chronicle
//!
//! Embedded event-sourcing ledger for tabletop campaign state.
//!
//! Chronicle never stores state as truth. Everything that happens in a
//! campaign world is an immutable, hash-chained event; current state is
//! reconstructed on demand by replaying those events through a fold,
//! with checksummed snapshots as pure acceleration and RNG cursors so
//! random streams resume exactly where they stopped.
//!
//! ## Quick Start
//!
//! ```ignore
//! use chronicledb::prelude::*;
//!
//! let db = Chronicle::open("./campaign")?;
//! let world = WorldId::new("world-1");
//!
//! // Record events
//! db.events.append(&world, EventType::Movement,
//!     Some("hero"), None, &json!({"to_x": 5, "to_y": 10}))?;
//!
//! // Verify the chain end to end
//! let check = db.events.verify_chain(&world, None, None)?;
//! assert!(check.valid);
//!
//! // Rebuild state by replay
//! let result = db.replay.from_genesis(&world, &ReplayOptions::default())?;
//! assert_eq!(result.final_state.positions["hero"].x, 5.0);
//! ```
//!
//! ## Primitives
//!
//! - [`Events`] - Append-only hash-chained event log
//! - [`Snapshots`] - Checksummed point-in-time state captures
//! - [`Rng`] - Deterministic RNG cursors per (world, context)
//! - [`Replay`] - State reconstruction, verification, dry runs

#![warn(missing_docs)]

mod database;
mod error;
mod primitives;

pub mod prelude;

// Re-export main entry points
pub use database::{Chronicle, ChronicleBuilder};
pub use error::{Error, Result};

// Re-export primitive handles
pub use primitives::{Events, Replay, Rng, Snapshots};

// Re-export the shared vocabulary
pub use chronicle_core::{
    ChainError, ChainVerification, Event, EventFilter, EventQueryResult, EventType, RngState,
    Snapshot, WorldId, GENESIS_HASH, SNAPSHOT_INTERVAL,
};
pub use chronicle_engine::{
    EventHandler, HandlerRegistry, ReplayOptions, ReplayResult, RngCursor, StateComparison,
    WorldState,
};
