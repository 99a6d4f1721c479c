//! A layered approximate-nearest-neighbor index built over a transactional
//! posting-list store.
//!
//! The graph is a multi-layer HNSW structure: each predicate owns a base
//! vector per entity, a per-layer adjacency list, a single entry-point
//! pointer, and a best-effort dead-node log of neighbors whose base
//! vector went missing mid-walk. [`insert`] and [`search`] are the two
//! public entry points, both built on the best-first graph walk in
//! [`layer_search::search_layer`].
//!
//! See `DESIGN.md` in the repository root for the provenance of each part
//! and the resolution of every open design question.

pub mod cache;
pub mod config;
pub mod distance;
pub mod edges;
pub mod error;
pub mod filter;
pub mod heap;
pub mod insert;
pub mod keys;
pub mod layer_search;
pub mod level;
pub mod search;
pub mod wire;

pub use config::IndexConfig;
pub use error::{IndexError, Result};
pub use filter::{AcceptAll, AcceptNone, SearchFilter};
pub use insert::insert;
pub use search::search;
