//! Persisted LP snapshots and the read/write contract the correlator relies on.
//!
//! Snapshots are append-only. Within a (puuid, queue) partition they are
//! ordered by timestamp; equal timestamps keep insertion order.
use crate::config::SnapshotStoreConfig;
use crate::metrics_defs::{SNAPSHOTS_WRITTEN, SNAPSHOT_WRITE_FAILURES};
use parking_lot::{Mutex, RwLock};
use riot_client::types::{LeagueEntry, LeagueStandings, QueueType};
use serde::{Deserialize, Serialize};
use shared::counter;
use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("encode error: {0}")]
    Encode(#[from] serde_json::Error),
}

/// A timestamped read of a player's rank in one ranked queue.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LpSnapshot {
    pub puuid: String,
    pub queue_type: QueueType,
    /// Epoch milliseconds
    pub timestamp: i64,
    pub league_points: i32,
    pub tier: String,
    pub rank: String,
}

impl LpSnapshot {
    pub fn same_division(&self, other: &LpSnapshot) -> bool {
        self.tier == other.tier && self.rank == other.rank
    }
}

/// One snapshot per ranked entry; other queues are skipped.
pub fn snapshots_from_entries(
    puuid: &str,
    entries: &[LeagueEntry],
    timestamp: i64,
) -> Vec<LpSnapshot> {
    entries
        .iter()
        .filter_map(|entry| {
            entry.ranked_queue().map(|queue_type| LpSnapshot {
                puuid: puuid.to_string(),
                queue_type,
                timestamp,
                league_points: entry.league_points,
                tier: entry.tier.clone(),
                rank: entry.rank.clone(),
            })
        })
        .collect()
}

pub trait SnapshotStore: Send + Sync {
    fn append(&self, snapshots: &[LpSnapshot]) -> Result<(), StoreError>;

    /// The snapshot with the greatest timestamp strictly below `timestamp`.
    fn latest_before(
        &self,
        puuid: &str,
        queue: QueueType,
        timestamp: i64,
    ) -> Result<Option<LpSnapshot>, StoreError>;

    /// The snapshot with the smallest timestamp at or above `timestamp`.
    fn earliest_at_or_after(
        &self,
        puuid: &str,
        queue: QueueType,
        timestamp: i64,
    ) -> Result<Option<LpSnapshot>, StoreError>;
}

/// Persists the ranked entries of a fresh upstream read, stamped with the
/// time of that read. Standings served from the cache were recorded when
/// they were fetched and are skipped. Failures are logged and counted,
/// never returned.
pub fn record_standings(store: &dyn SnapshotStore, puuid: &str, standings: &LeagueStandings) {
    if !standings.fresh {
        tracing::debug!(
            puuid,
            fetched_at = standings.fetched_at,
            "League entries served from cache, not recording"
        );
        return;
    }
    let snapshots = snapshots_from_entries(puuid, &standings.entries, standings.fetched_at);
    if snapshots.is_empty() {
        return;
    }

    match store.append(&snapshots) {
        Ok(()) => {
            counter!(SNAPSHOTS_WRITTEN).increment(snapshots.len() as u64);
            tracing::debug!(puuid, count = snapshots.len(), "Saved LP snapshots");
        }
        Err(e) => {
            counter!(SNAPSHOT_WRITE_FAILURES).increment(1);
            tracing::error!(puuid, error = %e, "Failed to save LP snapshots");
        }
    }
}

type Partition = (String, QueueType);

#[derive(Default)]
pub struct InMemorySnapshotStore {
    partitions: RwLock<HashMap<Partition, Vec<LpSnapshot>>>,
}

impl InMemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.partitions.read().values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn insert(&self, snapshots: &[LpSnapshot]) {
        let mut partitions = self.partitions.write();
        for snapshot in snapshots {
            let partition = partitions
                .entry((snapshot.puuid.clone(), snapshot.queue_type))
                .or_default();
            let index = partition.partition_point(|s| s.timestamp <= snapshot.timestamp);
            partition.insert(index, snapshot.clone());
        }
    }

    fn with_partition<T>(
        &self,
        puuid: &str,
        queue: QueueType,
        f: impl FnOnce(&[LpSnapshot]) -> Option<T>,
    ) -> Option<T> {
        let partitions = self.partitions.read();
        partitions
            .get(&(puuid.to_string(), queue))
            .and_then(|partition| f(partition))
    }
}

impl SnapshotStore for InMemorySnapshotStore {
    fn append(&self, snapshots: &[LpSnapshot]) -> Result<(), StoreError> {
        self.insert(snapshots);
        Ok(())
    }

    fn latest_before(
        &self,
        puuid: &str,
        queue: QueueType,
        timestamp: i64,
    ) -> Result<Option<LpSnapshot>, StoreError> {
        Ok(self.with_partition(puuid, queue, |partition| {
            let index = partition.partition_point(|s| s.timestamp < timestamp);
            index.checked_sub(1).map(|i| partition[i].clone())
        }))
    }

    fn earliest_at_or_after(
        &self,
        puuid: &str,
        queue: QueueType,
        timestamp: i64,
    ) -> Result<Option<LpSnapshot>, StoreError> {
        Ok(self.with_partition(puuid, queue, |partition| {
            let index = partition.partition_point(|s| s.timestamp < timestamp);
            partition.get(index).cloned()
        }))
    }
}

/// Line framing for the snapshot log. A write that fails partway leaves an
/// unterminated line; the next write starts on a new line so that only the
/// torn record is lost.
struct LineWriter<W> {
    inner: W,
    torn: bool,
}

impl<W: Write> LineWriter<W> {
    fn new(inner: W, torn: bool) -> Self {
        LineWriter { inner, torn }
    }

    /// Writes newline terminated records.
    fn write_lines(&mut self, buffer: &[u8]) -> io::Result<()> {
        if self.torn {
            self.inner.write_all(b"\n")?;
            self.torn = false;
        }
        let written = self.inner.write_all(buffer).and_then(|()| self.inner.flush());
        if written.is_err() {
            self.torn = true;
        }
        written
    }
}

/// Append-only JSON lines file. The whole log is indexed in memory on open.
pub struct JsonLinesSnapshotStore {
    path: PathBuf,
    index: InMemorySnapshotStore,
    writer: Mutex<LineWriter<File>>,
}

impl JsonLinesSnapshotStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let index = InMemorySnapshotStore::new();
        let mut torn = false;

        match File::open(&path) {
            Ok(file) => {
                let mut reader = BufReader::new(file);
                let mut loaded = Vec::new();
                let mut line = String::new();
                let mut line_number = 0;
                loop {
                    line.clear();
                    if reader.read_line(&mut line)? == 0 {
                        break;
                    }
                    line_number += 1;
                    torn = !line.ends_with('\n');

                    let record = line.trim();
                    if record.is_empty() {
                        continue;
                    }
                    match serde_json::from_str::<LpSnapshot>(record) {
                        Ok(snapshot) => loaded.push(snapshot),
                        Err(e) => tracing::warn!(
                            path = %path.display(),
                            line = line_number,
                            error = %e,
                            "Skipping malformed LP snapshot"
                        ),
                    }
                }
                index.insert(&loaded);
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }

        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        tracing::info!(path = %path.display(), snapshots = index.len(), "Opened LP snapshot log");

        Ok(JsonLinesSnapshotStore {
            path,
            index,
            writer: Mutex::new(LineWriter::new(file, torn)),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SnapshotStore for JsonLinesSnapshotStore {
    fn append(&self, snapshots: &[LpSnapshot]) -> Result<(), StoreError> {
        let mut buffer = Vec::new();
        for snapshot in snapshots {
            serde_json::to_writer(&mut buffer, snapshot)?;
            buffer.push(b'\n');
        }

        self.writer.lock().write_lines(&buffer)?;

        // Only index what reached the log
        self.index.insert(snapshots);
        Ok(())
    }

    fn latest_before(
        &self,
        puuid: &str,
        queue: QueueType,
        timestamp: i64,
    ) -> Result<Option<LpSnapshot>, StoreError> {
        self.index.latest_before(puuid, queue, timestamp)
    }

    fn earliest_at_or_after(
        &self,
        puuid: &str,
        queue: QueueType,
        timestamp: i64,
    ) -> Result<Option<LpSnapshot>, StoreError> {
        self.index.earliest_at_or_after(puuid, queue, timestamp)
    }
}

pub fn open_store(config: &SnapshotStoreConfig) -> Result<Arc<dyn SnapshotStore>, StoreError> {
    match config {
        SnapshotStoreConfig::Memory => {
            tracing::warn!("LP snapshots are kept in memory and lost on restart");
            Ok(Arc::new(InMemorySnapshotStore::new()))
        }
        SnapshotStoreConfig::File { path } => Ok(Arc::new(JsonLinesSnapshotStore::open(path)?)),
    }
}
