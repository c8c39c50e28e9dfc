//! Main entry point for Chronicle.
//!
//! This module provides the `Chronicle` struct, the primary entry point
//! for all ledger operations.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chronicle_engine::ReplayEngine;
use chronicle_storage::Store;

use crate::error::Result;
use crate::primitives::{Events, Replay, Rng, Snapshots};

/// The Chronicle campaign ledger.
///
/// This is the main entry point for all operations. Create one with
/// [`Chronicle::open`] (journal-backed) or [`Chronicle::ephemeral`]
/// (in-memory, for tests and scratch work).
///
/// # Example
///
/// ```ignore
/// use chronicledb::prelude::*;
///
/// let db = Chronicle::open("./campaign")?;
///
/// // Record what happened
/// db.events.append(&"world-1".into(), EventType::Combat,
///     Some("goblin"), Some("hero"), &json!({"damage": 7}))?;
///
/// // Rebuild state whenever you need it
/// let result = db.replay.from_genesis(&"world-1".into(), &ReplayOptions::default())?;
/// ```
pub struct Chronicle {
    /// Shared storage handle
    inner: Arc<Store>,

    /// Append-only event log with chain verification
    pub events: Events,

    /// Checksummed state snapshots
    pub snapshots: Snapshots,

    /// Deterministic RNG cursors
    pub rng: Rng,

    /// State reconstruction by event replay
    pub replay: Replay,
}

impl Chronicle {
    /// Open a journal-backed ledger at the given directory.
    ///
    /// Creates the directory if needed; replays the journal to rebuild
    /// in-memory state from a previous run.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::builder().path(path).open()
    }

    /// Create an ephemeral ledger with no disk I/O.
    ///
    /// Nothing is journaled; all data is gone when the value drops. Use
    /// for unit tests and throwaway computation.
    pub fn ephemeral() -> Self {
        Self::from_store(Arc::new(Store::ephemeral()))
    }

    /// Create a builder for ledger configuration.
    pub fn builder() -> ChronicleBuilder {
        ChronicleBuilder::new()
    }

    /// The ledger's on-disk directory, or `None` when ephemeral.
    pub fn path(&self) -> Option<&Path> {
        self.inner.dir()
    }

    /// Check if this ledger was created with [`Chronicle::ephemeral`].
    pub fn is_ephemeral(&self) -> bool {
        self.inner.dir().is_none()
    }

    fn from_store(store: Arc<Store>) -> Self {
        let engine = Arc::new(ReplayEngine::new(store.clone()));
        Self {
            events: Events::new(store.clone(), engine.clone()),
            snapshots: Snapshots::new(store.clone(), engine.clone()),
            rng: Rng::new(store.clone()),
            replay: Replay::new(engine),
            inner: store,
        }
    }
}

/// Builder for ledger configuration.
///
/// # Example
///
/// ```ignore
/// let db = Chronicle::builder()
///     .path("./campaign")
///     .open()?;
/// ```
pub struct ChronicleBuilder {
    path: Option<PathBuf>,
}

impl ChronicleBuilder {
    /// Create a new builder with default settings.
    pub fn new() -> Self {
        Self { path: None }
    }

    /// Set the ledger directory path.
    pub fn path(mut self, path: impl AsRef<Path>) -> Self {
        self.path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Open the ledger.
    ///
    /// With a path set this opens (or creates) a journal-backed ledger;
    /// without one it falls back to an ephemeral ledger.
    pub fn open(self) -> Result<Chronicle> {
        let store = match self.path {
            Some(path) => Store::open(path)?,
            None => Store::ephemeral(),
        };
        Ok(Chronicle::from_store(Arc::new(store)))
    }
}

impl Default for ChronicleBuilder {
    fn default() -> Self {
        Self::new()
    }
}
