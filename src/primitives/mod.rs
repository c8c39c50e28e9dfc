//! Primitive handles for the unified API.
//!
//! Each handle wraps one primitive over the shared storage engine and
//! exposes it as a field on [`crate::Chronicle`]: `db.events`,
//! `db.snapshots`, `db.rng`, and `db.replay`.

mod events;
mod replay;
mod rng;
mod snapshots;

pub use events::Events;
pub use replay::Replay;
pub use rng::Rng;
pub use snapshots::Snapshots;
