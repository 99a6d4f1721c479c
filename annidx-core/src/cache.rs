//! Cache adapter: the capability the graph walk needs from its caller —
//! read a posting list by key, and know the timestamp reads are pinned
//! at — without caring whether it is bound to an open write transaction
//! or a read-only snapshot.

use crate::edges::{encode_edges, parse_edges};
use crate::error::Result;
use crate::keys::{SENTINEL_ENTITY, data_key, dead_attr};
use annidx_store::{MemPostingStore, PostingList, PostingStore, ReadSnapshot, WriteTxn};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::warn;

#[async_trait]
pub trait CacheAdapter: Send + Sync {
    async fn get(&self, key: &[u8]) -> Result<Arc<dyn PostingList>>;
    fn ts(&self) -> u64;

    /// Append `edge` to `predicate`'s dead-node log. Always committed
    /// through an independent, immediate write against the backing store,
    /// regardless of whatever transaction this adapter's own reads are
    /// bound to — mirroring the original's dead-node logger, which opens
    /// its own transaction rather than writing through the walk's.
    /// Best-effort: callers must swallow the error (never abort the walk
    /// over a failed dead-node append).
    async fn record_dead(&self, predicate: &str, edge: u64) -> Result<()>;
}

async fn append_dead(store: &MemPostingStore, predicate: &str, edge: u64) -> Result<()> {
    let key = data_key(&dead_attr(predicate), SENTINEL_ENTITY);
    let existing = store.get_latest(&key).await?;
    let mut dead = match existing {
        Some(bytes) if !bytes.is_empty() => parse_edges(&bytes)?,
        _ => Vec::new(),
    };
    dead.push(edge);
    store.put(&key, encode_edges(&dead)).await?;
    Ok(())
}

/// Swallow a failed dead-node append: it must never abort the walk that
/// triggered it.
pub async fn record_dead_best_effort(cache: &dyn CacheAdapter, predicate: &str, edge: u64) {
    if let Err(err) = cache.record_dead(predicate, edge).await {
        warn!(predicate, edge, error = %err, "failed to record dead neighbor (best-effort)");
    }
}

/// Bound to an open write transaction: reads see the transaction's own
/// pending writes.
pub struct TxnCache<'a> {
    txn: &'a WriteTxn,
    store: MemPostingStore,
}

impl<'a> TxnCache<'a> {
    pub fn new(txn: &'a WriteTxn, store: MemPostingStore) -> Self {
        Self { txn, store }
    }
}

#[async_trait]
impl<'a> CacheAdapter for TxnCache<'a> {
    async fn get(&self, key: &[u8]) -> Result<Arc<dyn PostingList>> {
        Ok(self.txn.get(key).await?)
    }

    fn ts(&self) -> u64 {
        self.txn.start_ts()
    }

    async fn record_dead(&self, predicate: &str, edge: u64) -> Result<()> {
        append_dead(&self.store, predicate, edge).await
    }
}

/// Bound to a read-only snapshot at a fixed timestamp.
pub struct SnapshotCache {
    snapshot: ReadSnapshot,
    store: MemPostingStore,
}

impl SnapshotCache {
    pub fn new(snapshot: ReadSnapshot, store: MemPostingStore) -> Self {
        Self { snapshot, store }
    }
}

#[async_trait]
impl CacheAdapter for SnapshotCache {
    async fn get(&self, key: &[u8]) -> Result<Arc<dyn PostingList>> {
        Ok(self.snapshot.get(key).await?)
    }

    fn ts(&self) -> u64 {
        self.snapshot.ts()
    }

    async fn record_dead(&self, predicate: &str, edge: u64) -> Result<()> {
        append_dead(&self.store, predicate, edge).await
    }
}
