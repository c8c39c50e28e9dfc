//! Replay engine for the Chronicle ledger.
//!
//! Reconstructs world state as a pure fold over the event log: starting from
//! a genesis state or a snapshot's stored state, each event is dispatched to
//! a per-type handler that merges it into the state. Hash verification can
//! run alongside the fold, and dry runs validate a range without touching
//! state.

mod handlers;
mod payload;
mod replay;
mod state;

pub use handlers::{EventHandler, HandlerRegistry};
pub use payload::{EventPayload, MovementPayload, QuestPayload, SystemPayload};
pub use replay::{ReplayEngine, ReplayOptions, ReplayResult};
pub use state::{diff_values, EventSummary, Position, RngCursor, StateComparison, WorldState};
