//! Convenient imports for Chronicle.
//!
//! ```ignore
//! use chronicledb::prelude::*;
//!
//! let db = Chronicle::ephemeral();
//! db.events.append(&"world-1".into(), EventType::Combat, None, None, &json!({}))?;
//! ```

// Main entry point
pub use crate::database::{Chronicle, ChronicleBuilder};

// Error handling
pub use crate::error::{Error, Result};

// Primitive handles
pub use crate::primitives::{Events, Replay, Rng, Snapshots};

// Core types
pub use chronicle_core::{
    ChainError, ChainVerification, Event, EventFilter, EventQueryResult, EventType, RngState,
    Snapshot, WorldId, GENESIS_HASH, SNAPSHOT_INTERVAL,
};

// Replay types
pub use chronicle_engine::{
    EventHandler, ReplayOptions, ReplayResult, RngCursor, StateComparison, WorldState,
};

// Re-export serde_json for convenience
pub use serde_json::json;
