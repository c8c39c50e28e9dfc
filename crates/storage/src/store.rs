//! Sharded in-memory tables with optional journal backing.
//!
//! Layout mirrors the persisted model: an events table partitioned per world
//! (globally sequential ids, per-world hash chains), a snapshots table with
//! `(world_id, event_id)` as the natural lookup axis, and an RNG-state table
//! keyed by `(world_id, context)`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chronicle_core::{Error, Event, Result, RngState, Snapshot, WorldId, GENESIS_HASH};
use dashmap::DashMap;
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use uuid::Uuid;

use crate::journal::{read_entries, Journal, JournalEntry};

/// One world's chain: ordered events plus the cached tail hash.
struct WorldChain {
    events: BTreeMap<u64, Event>,
    tail_hash: String,
}

impl WorldChain {
    fn new() -> Self {
        Self {
            events: BTreeMap::new(),
            tail_hash: GENESIS_HASH.clone(),
        }
    }
}

/// The Chronicle storage engine.
///
/// Per-world chains live behind their own mutex so appends to one world
/// serialize while other worlds proceed in parallel. Snapshot and RNG tables
/// are independently sharded. When journal-backed, every write is durable
/// before it becomes visible in memory.
pub struct Store {
    chains: DashMap<WorldId, Arc<Mutex<WorldChain>>>,
    /// Global event id -> owning world, for `event_by_id`
    event_worlds: DashMap<u64, WorldId>,
    /// Per-world snapshots ordered by cut-point event id
    snapshots: DashMap<WorldId, BTreeMap<u64, Snapshot>>,
    snapshot_index: DashMap<Uuid, (WorldId, u64)>,
    rng: DashMap<WorldId, FxHashMap<String, RngState>>,
    /// Last assigned global event id
    last_event_id: AtomicU64,
    journal: Option<Journal>,
    dir: Option<PathBuf>,
}

impl Store {
    /// Create an ephemeral store with no disk I/O.
    ///
    /// Nothing survives drop. Intended for tests and throwaway worlds.
    pub fn ephemeral() -> Self {
        Self {
            chains: DashMap::new(),
            event_worlds: DashMap::new(),
            snapshots: DashMap::new(),
            snapshot_index: DashMap::new(),
            rng: DashMap::new(),
            last_event_id: AtomicU64::new(0),
            journal: None,
            dir: None,
        }
    }

    /// Open a journal-backed store in `dir`, recovering any existing state.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir)?;
        let journal_path = dir.join("chronicle.journal");

        let store = Self {
            chains: DashMap::new(),
            event_worlds: DashMap::new(),
            snapshots: DashMap::new(),
            snapshot_index: DashMap::new(),
            rng: DashMap::new(),
            last_event_id: AtomicU64::new(0),
            journal: None,
            dir: Some(dir),
        };

        let entries = read_entries(&journal_path)?;
        let recovered = entries.len();
        for entry in entries {
            store.apply(entry);
        }
        if recovered > 0 {
            tracing::debug!(records = recovered, "recovered journal");
        }

        Ok(Self {
            journal: Some(Journal::open(journal_path)?),
            ..store
        })
    }

    /// Directory backing this store, if journal-backed.
    pub fn dir(&self) -> Option<&Path> {
        self.dir.as_deref()
    }

    /// Apply a journal record to the in-memory tables (recovery path).
    fn apply(&self, entry: JournalEntry) {
        match entry {
            JournalEntry::EventAppended { event } => {
                self.last_event_id.fetch_max(event.id, Ordering::SeqCst);
                self.event_worlds.insert(event.id, event.world_id.clone());
                let chain = self.chain_handle(&event.world_id);
                let mut chain = chain.lock();
                chain.tail_hash = event.hash.clone();
                chain.events.insert(event.id, event);
            }
            JournalEntry::SnapshotPut { snapshot } => self.index_snapshot(snapshot),
            JournalEntry::SnapshotDeleted { id } => {
                self.remove_snapshot(&id);
            }
            JournalEntry::RngUpserted { state } => {
                self.rng
                    .entry(state.world_id.clone())
                    .or_default()
                    .insert(state.context.clone(), state);
            }
            JournalEntry::RngDeleted { world_id, context } => {
                if let Some(mut contexts) = self.rng.get_mut(&world_id) {
                    contexts.remove(&context);
                }
            }
            JournalEntry::RngWorldCleared { world_id } => {
                self.rng.remove(&world_id);
            }
        }
    }

    fn journal_write(&self, entry: &JournalEntry) -> Result<()> {
        match &self.journal {
            Some(journal) => journal.append(entry),
            None => Ok(()),
        }
    }

    fn chain_handle(&self, world_id: &WorldId) -> Arc<Mutex<WorldChain>> {
        self.chains
            .entry(world_id.clone())
            .or_insert_with(|| Arc::new(Mutex::new(WorldChain::new())))
            .clone()
    }

    // =========================================================================
    // Events
    // =========================================================================

    /// Append an event built against the world's current chain tail.
    ///
    /// The builder receives the next global id and the tail hash; id
    /// assignment, hash computation, and the row write happen under the
    /// world's chain lock, so a partial append can never leave a row whose
    /// hash disagrees with its own id.
    pub fn append_event<F>(&self, world_id: &WorldId, build: F) -> Result<Event>
    where
        F: FnOnce(u64, &str) -> Result<Event>,
    {
        let chain = self.chain_handle(world_id);
        let mut chain = chain.lock();

        let id = self.last_event_id.fetch_add(1, Ordering::SeqCst) + 1;
        let event = build(id, &chain.tail_hash)?;
        debug_assert_eq!(event.id, id, "builder must use the assigned id");
        debug_assert_eq!(&event.world_id, world_id);

        // Durable before visible
        self.journal_write(&JournalEntry::EventAppended {
            event: event.clone(),
        })?;

        chain.tail_hash = event.hash.clone();
        chain.events.insert(id, event.clone());
        self.event_worlds.insert(id, world_id.clone());
        Ok(event)
    }

    /// All events of a world in ascending id order.
    pub fn world_events(&self, world_id: &WorldId) -> Vec<Event> {
        match self.chains.get(world_id) {
            Some(chain) => chain.lock().events.values().cloned().collect(),
            None => Vec::new(),
        }
    }

    /// Events of a world with ids in `[from, to]`, ascending.
    pub fn events_in_range(&self, world_id: &WorldId, from: u64, to: u64) -> Vec<Event> {
        match self.chains.get(world_id) {
            Some(chain) => chain.lock().events.range(from..=to).map(|(_, e)| e.clone()).collect(),
            None => Vec::new(),
        }
    }

    /// Look up an event by its global id.
    pub fn event_by_id(&self, id: u64) -> Option<Event> {
        let world_id = self.event_worlds.get(&id)?.clone();
        let chain = self.chains.get(&world_id)?;
        let chain = chain.lock();
        chain.events.get(&id).cloned()
    }

    /// Most recent event of a world, by id.
    pub fn last_event(&self, world_id: &WorldId) -> Option<Event> {
        let chain = self.chains.get(world_id)?;
        let chain = chain.lock();
        chain.events.values().next_back().cloned()
    }

    /// Most recent event of a world with id strictly below `id`.
    pub fn last_event_before(&self, world_id: &WorldId, id: u64) -> Option<Event> {
        let chain = self.chains.get(world_id)?;
        let chain = chain.lock();
        chain.events.range(..id).next_back().map(|(_, e)| e.clone())
    }

    /// Number of events recorded for a world.
    pub fn event_count(&self, world_id: &WorldId) -> u64 {
        match self.chains.get(world_id) {
            Some(chain) => chain.lock().events.len() as u64,
            None => 0,
        }
    }

    /// Replace a stored event in place, bypassing the hash chain.
    ///
    /// This deliberately skips the journal and the tail cache: it exists so
    /// corruption-detection tests and forensic tooling can plant a damaged
    /// row and watch verification catch it. Never call it on a live ledger.
    #[doc(hidden)]
    pub fn overwrite_event(&self, event: Event) -> bool {
        match self.chains.get(&event.world_id) {
            Some(chain) => {
                let mut chain = chain.lock();
                match chain.events.get_mut(&event.id) {
                    Some(slot) => {
                        *slot = event;
                        true
                    }
                    None => false,
                }
            }
            None => false,
        }
    }

    // =========================================================================
    // Snapshots
    // =========================================================================

    fn index_snapshot(&self, snapshot: Snapshot) {
        self.snapshot_index
            .insert(snapshot.id, (snapshot.world_id.clone(), snapshot.event_id));
        self.snapshots
            .entry(snapshot.world_id.clone())
            .or_default()
            .insert(snapshot.event_id, snapshot);
    }

    fn remove_snapshot(&self, id: &Uuid) -> Option<Snapshot> {
        let (world_id, event_id) = self.snapshot_index.remove(id).map(|(_, v)| v)?;
        let mut per_world = self.snapshots.get_mut(&world_id)?;
        // Guard against a same-boundary overwrite having replaced this row
        match per_world.get(&event_id) {
            Some(existing) if existing.id == *id => per_world.remove(&event_id),
            _ => None,
        }
    }

    /// Store a snapshot. A snapshot at the same `(world_id, event_id)`
    /// boundary is overwritten (last writer wins).
    pub fn put_snapshot(&self, snapshot: Snapshot) -> Result<()> {
        self.journal_write(&JournalEntry::SnapshotPut {
            snapshot: snapshot.clone(),
        })?;
        if let Some(previous) = self
            .snapshots
            .get(&snapshot.world_id)
            .and_then(|m| m.get(&snapshot.event_id).map(|s| s.id))
        {
            self.snapshot_index.remove(&previous);
        }
        self.index_snapshot(snapshot);
        Ok(())
    }

    /// Look up a snapshot by id.
    pub fn snapshot_by_id(&self, id: &Uuid) -> Option<Snapshot> {
        let (world_id, event_id) = self.snapshot_index.get(id)?.clone();
        self.snapshots
            .get(&world_id)
            .and_then(|m| m.get(&event_id).cloned())
    }

    /// Snapshots of a world, descending by cut-point event id.
    pub fn snapshots_desc(&self, world_id: &WorldId) -> Vec<Snapshot> {
        match self.snapshots.get(world_id) {
            Some(per_world) => per_world.values().rev().cloned().collect(),
            None => Vec::new(),
        }
    }

    /// Most recent snapshot with `event_id <= at`.
    pub fn nearest_snapshot(&self, world_id: &WorldId, at: u64) -> Option<Snapshot> {
        let per_world = self.snapshots.get(world_id)?;
        per_world.range(..=at).next_back().map(|(_, s)| s.clone())
    }

    /// Delete a snapshot by id. Returns whether it existed.
    pub fn delete_snapshot(&self, id: &Uuid) -> Result<bool> {
        if !self.snapshot_index.contains_key(id) {
            return Ok(false);
        }
        self.journal_write(&JournalEntry::SnapshotDeleted { id: *id })?;
        Ok(self.remove_snapshot(id).is_some())
    }

    // =========================================================================
    // RNG states
    // =========================================================================

    /// Look up the cursor for `(world_id, context)`.
    pub fn rng_get(&self, world_id: &WorldId, context: &str) -> Option<RngState> {
        self.rng
            .get(world_id)
            .and_then(|contexts| contexts.get(context).cloned())
    }

    /// Create or replace a cursor row.
    pub fn rng_upsert(&self, state: RngState) -> Result<()> {
        self.journal_write(&JournalEntry::RngUpserted {
            state: state.clone(),
        })?;
        self.rng
            .entry(state.world_id.clone())
            .or_default()
            .insert(state.context.clone(), state);
        Ok(())
    }

    /// All cursors of a world, ordered by context for stable output.
    pub fn rng_all(&self, world_id: &WorldId) -> Vec<RngState> {
        let mut states: Vec<RngState> = match self.rng.get(world_id) {
            Some(contexts) => contexts.values().cloned().collect(),
            None => Vec::new(),
        };
        states.sort_by(|a, b| a.context.cmp(&b.context));
        states
    }

    /// Atomically mutate an existing cursor row.
    ///
    /// The closure runs under the world's RNG shard lock, so concurrent
    /// increments cannot lose updates. Returns `None` if the context does
    /// not exist (callers decide whether that is a not-found error).
    pub fn rng_update<F>(
        &self,
        world_id: &WorldId,
        context: &str,
        mutate: F,
    ) -> Result<Option<RngState>>
    where
        F: FnOnce(&mut RngState),
    {
        let mut contexts = self.rng.entry(world_id.clone()).or_default();
        let Some(state) = contexts.get_mut(context) else {
            return Ok(None);
        };
        let mut updated = state.clone();
        mutate(&mut updated);
        self.journal_write(&JournalEntry::RngUpserted {
            state: updated.clone(),
        })?;
        *state = updated.clone();
        Ok(Some(updated))
    }

    /// Delete one context. Returns whether it existed.
    pub fn rng_delete(&self, world_id: &WorldId, context: &str) -> Result<bool> {
        let exists = self
            .rng
            .get(world_id)
            .map_or(false, |contexts| contexts.contains_key(context));
        if !exists {
            return Ok(false);
        }
        self.journal_write(&JournalEntry::RngDeleted {
            world_id: world_id.clone(),
            context: context.to_string(),
        })?;
        if let Some(mut contexts) = self.rng.get_mut(world_id) {
            contexts.remove(context);
        }
        Ok(true)
    }

    /// Delete every context of a world. Returns the number removed.
    pub fn rng_clear_world(&self, world_id: &WorldId) -> Result<usize> {
        let count = self.rng.get(world_id).map_or(0, |contexts| contexts.len());
        if count == 0 {
            return Ok(0);
        }
        self.journal_write(&JournalEntry::RngWorldCleared {
            world_id: world_id.clone(),
        })?;
        self.rng.remove(world_id);
        Ok(count)
    }

    /// Atomically replace every cursor of a world with `states`.
    ///
    /// Used when loading a snapshot's embedded RNG states: the clear and the
    /// upserts land in the journal as one contiguous block and the in-memory
    /// map swaps in a single entry write.
    pub fn rng_replace_world(&self, world_id: &WorldId, states: Vec<RngState>) -> Result<()> {
        for state in &states {
            if &state.world_id != world_id {
                return Err(Error::Validation(format!(
                    "RNG state for context '{}' belongs to world {}, not {}",
                    state.context, state.world_id, world_id
                )));
            }
        }
        self.journal_write(&JournalEntry::RngWorldCleared {
            world_id: world_id.clone(),
        })?;
        let mut replacement = FxHashMap::default();
        for state in states {
            self.journal_write(&JournalEntry::RngUpserted {
                state: state.clone(),
            })?;
            replacement.insert(state.context.clone(), state);
        }
        self.rng.insert(world_id.clone(), replacement);
        Ok(())
    }
}
