//! Append-only journal for durability.
//!
//! One JSON object per line. Records are written before the in-memory tables
//! are updated, and replayed in order on open to rebuild state. A torn final
//! line (crash mid-write) is tolerated and dropped; damage anywhere else is
//! corruption and fails recovery.

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use chronicle_core::{Error, Event, Result, RngState, Snapshot, WorldId};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single durable record.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub(crate) enum JournalEntry {
    /// An event was appended to a world's chain
    EventAppended { event: Event },
    /// A snapshot was stored (or overwritten at the same cut point)
    SnapshotPut { snapshot: Snapshot },
    /// A snapshot was removed by retention cleanup
    SnapshotDeleted { id: Uuid },
    /// An RNG cursor was created or updated
    RngUpserted { state: RngState },
    /// An RNG context was removed
    RngDeleted { world_id: WorldId, context: String },
    /// All RNG contexts of a world were removed (bulk restore prologue)
    RngWorldCleared { world_id: WorldId },
}

/// Append-only writer over the journal file.
pub(crate) struct Journal {
    path: PathBuf,
    writer: Mutex<BufWriter<File>>,
}

impl Journal {
    /// Open the journal for appending, creating it if absent.
    pub(crate) fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self {
            path,
            writer: Mutex::new(BufWriter::new(file)),
        })
    }

    /// Append one record and flush it to the OS.
    pub(crate) fn append(&self, entry: &JournalEntry) -> Result<()> {
        let line = serde_json::to_string(entry)?;
        let mut writer = self.writer.lock();
        writer.write_all(line.as_bytes())?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        Ok(())
    }

    /// Path of the underlying file.
    pub(crate) fn path(&self) -> &Path {
        &self.path
    }
}

/// Read every record from an existing journal file.
///
/// A record that fails to parse is accepted only as the final line of the
/// file (a torn tail from a crash mid-append); it is logged and dropped.
/// A bad record with valid records after it means the file was edited or
/// damaged, which is a storage error.
pub(crate) fn read_entries(path: &Path) -> Result<Vec<JournalEntry>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let reader = BufReader::new(File::open(path)?);
    let lines: Vec<String> = reader.lines().collect::<std::io::Result<_>>()?;
    let total = lines.len();

    let mut entries = Vec::with_capacity(total);
    for (index, line) in lines.iter().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<JournalEntry>(line) {
            Ok(entry) => entries.push(entry),
            Err(e) if index + 1 == total => {
                tracing::warn!(
                    path = %path.display(),
                    line = index + 1,
                    error = %e,
                    "dropping torn trailing journal record"
                );
                break;
            }
            Err(e) => {
                return Err(Error::Storage(format!(
                    "corrupt journal record at {}:{}: {e}",
                    path.display(),
                    index + 1
                )));
            }
        }
    }
    Ok(entries)
}
