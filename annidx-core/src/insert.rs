//! Insertion, including the empty-predicate bootstrap path (folded in as
//! one branch rather than a separate entry point).

use crate::cache::{CacheAdapter, TxnCache};
use crate::config::IndexConfig;
use crate::distance::dist;
use crate::edges::{diff, encode_edges, parse_edges};
use crate::error::{IndexError, Result};
use crate::filter::AcceptAll;
use crate::keys::{SENTINEL_ENTITY, data_key, dead_attr, decode_entry, encode_entry, entry_attr, layer_attr};
use crate::layer_search::search_layer;
use crate::level::select_level;
use crate::wire::decode_vector;
use annidx_store::{MemPostingStore, WriteTxn};
use rand::Rng;
use std::collections::HashSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument};

/// Insert `id`/`vec` into `predicate`'s layered graph, through `txn`.
/// The caller owns the transaction's lifecycle (commit/rollback) — the
/// index never manages it.
///
/// `vec` must already be durably written at `(predicate, id)` by the
/// caller (the core never serializes base vectors — see the crate's
/// `wire` module doc comment and spec §1/§3: base-vector encoding is an
/// external collaborator's job). It is accepted here only so the graph
/// walk can compute distances against it without an extra round trip
/// through the store; this function never writes it.
///
/// Returns the visited set from the deepest layer touched, as a coarse
/// lock-set hint for callers layering their own concurrency control on
/// top of the store.
#[instrument(skip(store, txn, vec, rng, cancel), fields(predicate, id))]
#[allow(clippy::too_many_arguments)]
pub async fn insert(
    store: &MemPostingStore,
    txn: &WriteTxn,
    predicate: &str,
    id: u64,
    vec: &[f64],
    config: &IndexConfig,
    rng: &mut impl Rng,
    cancel: &CancellationToken,
) -> Result<HashSet<u64>> {
    let cache = TxnCache::new(txn, store.clone());

    let entry_key = data_key(&entry_attr(predicate), SENTINEL_ENTITY);
    let entry_list = cache.get(&entry_key).await?;
    let existing = entry_list.value(cache.ts()).await?;

    let Some(existing) = existing else {
        debug!("bootstrapping empty predicate");
        return bootstrap(txn, predicate, id, config.max_levels).await;
    };

    let entry = decode_entry(&existing)?;
    if entry == id {
        // Re-inserting the current entry is a no-op: the original only
        // ever writes the entry pointer once, at bootstrap.
        return Ok(HashSet::new());
    }

    let insert_level = select_level(rng, config.max_levels);
    let mut current_entry = entry;
    let mut visited = HashSet::new();

    // Ascend from layer 0 toward `insert_level`, refining the entry point
    // at each layer with ef=1. This is the original's literal control
    // flow, not canonical top-down HNSW descent — see DESIGN.md.
    for level in 0..insert_level {
        if cancel.is_cancelled() {
            return Err(IndexError::Cancelled);
        }
        let (nns, _) =
            search_layer(&cache, true, predicate, level, current_entry, vec, 1, &AcceptAll, cancel).await?;
        current_entry = nns.first().ok_or(IndexError::NotFound)?.id;
    }

    for level in insert_level..config.max_levels {
        if cancel.is_cancelled() {
            return Err(IndexError::Cancelled);
        }
        let (nns, layer_visited) = search_layer(
            &cache,
            true,
            predicate,
            level,
            current_entry,
            vec,
            config.ef_construction,
            &AcceptAll,
            cancel,
        )
        .await?;
        visited = layer_visited;

        let mut outbound = Vec::with_capacity(nns.len());
        for neighbor in &nns {
            link(&cache, txn, predicate, level, neighbor.id, id, vec, config.max_neighbors).await?;
            outbound.push(neighbor.id);
        }

        let attr = layer_attr(predicate, level);
        txn.add_mutation(&data_key(&attr, id), encode_edges(&outbound)).await?;
    }

    Ok(visited)
}

async fn bootstrap(
    txn: &WriteTxn,
    predicate: &str,
    id: u64,
    max_levels: usize,
) -> Result<HashSet<u64>> {
    for level in 0..max_levels {
        let attr = layer_attr(predicate, level);
        txn.add_mutation(&data_key(&attr, id), encode_edges(&[])).await?;
    }
    let entry_key = data_key(&entry_attr(predicate), SENTINEL_ENTITY);
    txn.add_mutation(&entry_key, encode_entry(id)).await?;
    Ok(HashSet::new())
}

/// Link `new_id` into `neighbor_id`'s adjacency at `level`: prune dead
/// entries, add the new edge, and — if `max_neighbors` is set — keep only
/// the `max_neighbors` entries closest to `neighbor_id`'s own vector.
#[allow(clippy::too_many_arguments)]
async fn link(
    cache: &TxnCache<'_>,
    txn: &WriteTxn,
    predicate: &str,
    level: usize,
    neighbor_id: u64,
    new_id: u64,
    new_vec: &[f64],
    max_neighbors: Option<usize>,
) -> Result<()> {
    let attr = layer_attr(predicate, level);
    let key = data_key(&attr, neighbor_id);
    let list = cache.get(&key).await?;
    let raw = list.value(cache.ts()).await?;

    let mut edges = match raw {
        None => Vec::new(),
        Some(bytes) if bytes.is_empty() => Vec::new(),
        Some(bytes) => parse_edges(&bytes)?,
    };

    if !edges.is_empty() {
        let dead_key = data_key(&dead_attr(predicate), SENTINEL_ENTITY);
        let dead_list = cache.get(&dead_key).await?;
        if let Some(dead_raw) = dead_list.value(cache.ts()).await? {
            if !dead_raw.is_empty() {
                edges = diff(&edges, &parse_edges(&dead_raw)?);
            }
        }
    }
    edges.push(new_id);

    if let Some(m) = max_neighbors {
        if edges.len() > m {
            edges = prune_to_closest(cache, predicate, neighbor_id, edges, new_id, new_vec, m).await?;
        }
    }

    txn.add_mutation(&key, encode_edges(&edges)).await?;
    Ok(())
}

/// Keep the `m` entries of `edges` closest to `neighbor_id`'s own vector.
async fn prune_to_closest(
    cache: &TxnCache<'_>,
    predicate: &str,
    neighbor_id: u64,
    edges: Vec<u64>,
    new_id: u64,
    new_vec: &[f64],
    m: usize,
) -> Result<Vec<u64>> {
    let neighbor_vec_key = data_key(predicate, neighbor_id);
    let neighbor_raw = cache
        .get(&neighbor_vec_key)
        .await?
        .value(cache.ts())
        .await?
        .ok_or(IndexError::NotFound)?;
    let neighbor_vec = decode_vector(&neighbor_raw)?;

    let mut scored = Vec::with_capacity(edges.len());
    for edge in edges {
        let edge_vec = if edge == new_id {
            new_vec.to_vec()
        } else {
            let key = data_key(predicate, edge);
            let raw = cache.get(&key).await?.value(cache.ts()).await?.ok_or(IndexError::NotFound)?;
            decode_vector(&raw)?
        };
        scored.push((dist(&neighbor_vec, &edge_vec)?, edge));
    }

    scored.sort_by(|a, b| {
        a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal).then(a.1.cmp(&b.1))
    });
    scored.truncate(m);
    Ok(scored.into_iter().map(|(_, id)| id).collect())
}
