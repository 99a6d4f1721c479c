//! Minimal multi-version in-memory posting store.
//!
//! This is the reference backend the core is exercised against in tests,
//! not a deployment target — a production deployment sits behind the same
//! `PostingStore`/`PostingList` traits, backed by a real transactional KV
//! engine (Badger in the system this index's design is descended from).

use crate::error::Result;
use crate::posting::{PostingList, PostingStore};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;
use tracing::debug;

type VersionLog = Vec<(u64, Option<Vec<u8>>)>;

#[derive(Default)]
struct Inner {
    data: HashMap<Vec<u8>, VersionLog>,
}

/// Every key holds an append-only, timestamp-ordered history of values.
/// A `None` entry is a tombstone — used to simulate an externally deleted
/// base vector in dead-edge tests.
#[derive(Clone)]
pub struct MemPostingStore {
    inner: Arc<RwLock<Inner>>,
    clock: Arc<AtomicU64>,
}

impl MemPostingStore {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(Inner::default())),
            clock: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Latest timestamp handed out so far.
    pub fn latest_ts(&self) -> u64 {
        self.clock.load(Ordering::SeqCst)
    }

    /// Open a write transaction. Mutations made through it are invisible
    /// to other transactions and snapshots until `commit`.
    pub fn begin(&self) -> WriteTxn {
        let start_ts = self.latest_ts();
        WriteTxn {
            store: self.clone(),
            start_ts,
            pending: RwLock::new(HashMap::new()),
        }
    }

    /// A read-only view pinned at `ts`.
    pub fn snapshot(&self, ts: u64) -> ReadSnapshot {
        ReadSnapshot {
            store: self.clone(),
            ts,
        }
    }

    /// One-shot write outside any transaction, committed immediately at a
    /// fresh timestamp. Used by callers to seed base vectors (written
    /// outside the index's own mutation path) and by the dead-edge logger,
    /// which always appends through an independent write regardless of
    /// whatever transaction the walk that found the dead neighbor is
    /// running inside.
    pub async fn put(&self, key: &[u8], value: Vec<u8>) -> Result<u64> {
        let mut writes = HashMap::new();
        writes.insert(key.to_vec(), Some(value));
        Ok(self.apply(writes).await)
    }

    /// One-shot tombstone, committed immediately.
    pub async fn delete(&self, key: &[u8]) -> Result<u64> {
        let mut writes = HashMap::new();
        writes.insert(key.to_vec(), None);
        Ok(self.apply(writes).await)
    }

    /// The value committed as of `latest_ts()`.
    pub async fn get_latest(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        Ok(self.committed_value(key, self.latest_ts()).await)
    }

    async fn committed_value(&self, key: &[u8], ts: u64) -> Option<Vec<u8>> {
        let guard = self.inner.read().await;
        let log = guard.data.get(key)?;
        log.iter()
            .rev()
            .find(|(v_ts, _)| *v_ts <= ts)
            .and_then(|(_, v)| v.clone())
    }

    async fn apply(&self, writes: HashMap<Vec<u8>, Option<Vec<u8>>>) -> u64 {
        let commit_ts = self.clock.fetch_add(1, Ordering::SeqCst) + 1;
        let mut guard = self.inner.write().await;
        for (key, value) in writes {
            guard.data.entry(key).or_default().push((commit_ts, value));
        }
        commit_ts
    }
}

impl Default for MemPostingStore {
    fn default() -> Self {
        Self::new()
    }
}

struct CommittedList {
    store: MemPostingStore,
    key: Vec<u8>,
}

#[async_trait]
impl PostingList for CommittedList {
    async fn value(&self, ts: u64) -> Result<Option<Vec<u8>>> {
        Ok(self.store.committed_value(&self.key, ts).await)
    }
}

/// A read-only, snapshot-isolated view pinned at a fixed timestamp.
pub struct ReadSnapshot {
    store: MemPostingStore,
    ts: u64,
}

impl ReadSnapshot {
    pub fn ts(&self) -> u64 {
        self.ts
    }
}

#[async_trait]
impl PostingStore for ReadSnapshot {
    async fn get(&self, key: &[u8]) -> Result<Arc<dyn PostingList>> {
        Ok(Arc::new(CommittedList {
            store: self.store.clone(),
            key: key.to_vec(),
        }))
    }
}

struct PendingList {
    store: MemPostingStore,
    key: Vec<u8>,
    pending: Option<Vec<u8>>,
    tombstoned: bool,
}

#[async_trait]
impl PostingList for PendingList {
    async fn value(&self, ts: u64) -> Result<Option<Vec<u8>>> {
        if self.tombstoned {
            return Ok(None);
        }
        if let Some(v) = &self.pending {
            return Ok(Some(v.clone()));
        }
        Ok(self.store.committed_value(&self.key, ts).await)
    }
}

/// An open write transaction. Reads see this transaction's own buffered
/// writes (read-your-own-writes); nothing is visible to any other reader
/// until `commit`. No write-write conflict detection is performed at
/// commit time: the index's own concurrency model explicitly does not
/// prevent races between concurrent inserters sharing a neighbor's
/// adjacency list, so there is nothing for the store to enforce here
/// either — the last commit wins.
pub struct WriteTxn {
    store: MemPostingStore,
    start_ts: u64,
    pending: RwLock<HashMap<Vec<u8>, Option<Vec<u8>>>>,
}

impl WriteTxn {
    pub fn start_ts(&self) -> u64 {
        self.start_ts
    }

    /// Buffer a SET mutation.
    pub async fn add_mutation(&self, key: &[u8], value: Vec<u8>) -> Result<()> {
        self.pending.write().await.insert(key.to_vec(), Some(value));
        Ok(())
    }

    /// Buffer a tombstone.
    pub async fn add_delete(&self, key: &[u8]) -> Result<()> {
        self.pending.write().await.insert(key.to_vec(), None);
        Ok(())
    }

    /// Apply every buffered write at a fresh commit timestamp.
    pub async fn commit(self) -> Result<u64> {
        let writes = self.pending.into_inner();
        let n = writes.len();
        let ts = self.store.apply(writes).await;
        debug!(commit_ts = ts, mutations = n, "write transaction committed");
        Ok(ts)
    }

    /// Discard every buffered write.
    pub fn rollback(self) {
        debug!(start_ts = self.start_ts, "write transaction rolled back");
    }
}

#[async_trait]
impl PostingStore for WriteTxn {
    async fn get(&self, key: &[u8]) -> Result<Arc<dyn PostingList>> {
        let pending = self.pending.read().await;
        let entry = pending.get(key);
        Ok(Arc::new(PendingList {
            store: self.store.clone(),
            key: key.to_vec(),
            pending: entry.cloned().flatten(),
            tombstoned: matches!(entry, Some(None)),
        }))
    }
}
