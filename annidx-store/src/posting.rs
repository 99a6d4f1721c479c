use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// A single key's versioned value history, as exposed to a reader pinned
/// at some timestamp.
#[async_trait]
pub trait PostingList: Send + Sync {
    /// The value committed at or before `ts`, or `None` if the key has
    /// never been written (or was last written as a tombstone) by `ts`.
    async fn value(&self, ts: u64) -> Result<Option<Vec<u8>>>;
}

/// A handle onto the backing key/value store, opaque to the core — the
/// index never knows whether it's talking to a write transaction or a
/// read-only snapshot.
#[async_trait]
pub trait PostingStore: Send + Sync {
    async fn get(&self, key: &[u8]) -> Result<Arc<dyn PostingList>>;
}
