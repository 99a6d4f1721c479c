//! Posting-list store abstraction backing the layered ANN index.
//!
//! [`PostingStore`]/[`PostingList`] are the interface the index core
//! consumes. [`MemPostingStore`] is a reference, in-memory, multi-version
//! implementation used to exercise and test it — not a deployment target.
//! A production deployment backs the same traits with a real
//! transactional KV engine.

mod error;
mod mvcc;
mod posting;

pub use error::{Result, StoreError};
pub use mvcc::{MemPostingStore, ReadSnapshot, WriteTxn};
pub use posting::{PostingList, PostingStore};
