//! Best-first graph walk over a single HNSW layer.

use crate::cache::{CacheAdapter, record_dead_best_effort};
use crate::distance::dist;
use crate::edges::parse_edges;
use crate::error::{IndexError, Result};
use crate::filter::SearchFilter;
use crate::heap::{HeapElement, MinHeap, insort_bounded};
use crate::keys::{data_key, layer_attr};
use crate::wire::decode_vector;
use std::collections::HashSet;
use tokio_util::sync::CancellationToken;
use tracing::trace;

/// Walk `predicate`'s adjacency graph at `level`, starting from
/// `entry_id`, toward `query`, keeping the `ef` closest candidates found
/// (ascending by distance). Returns those candidates plus the full
/// visited set (keyed by entity id alone — distance only matters inside
/// the heap/top-k structures, not for set membership).
///
/// `entry_id` always seeds traversal regardless of `filter`, but only
/// seeds the returned top-k if `filter` admits it — an all-rejecting
/// filter must not smuggle the entry point into the result.
///
/// `is_insert` is accepted for parity with the search this core descends
/// from: a neighbor-vector read failure terminates the walk unconditionally,
/// whether or not this call is part of an insertion (see DESIGN.md).
#[allow(clippy::too_many_arguments)]
pub async fn search_layer(
    cache: &dyn CacheAdapter,
    is_insert: bool,
    predicate: &str,
    level: usize,
    entry_id: u64,
    query: &[f64],
    ef: usize,
    filter: &dyn SearchFilter,
    cancel: &CancellationToken,
) -> Result<(Vec<HeapElement>, HashSet<u64>)> {
    let _ = is_insert;

    let entry_vec = read_vector(cache, predicate, entry_id, cancel).await?;
    let entry_dist = dist(&entry_vec, query)?;
    let entry = HeapElement::new(entry_dist, entry_id);

    // The entry point always seeds traversal (candidates/visited), but it
    // only seeds the returned top-k if the filter actually admits it —
    // otherwise `search(..., AcceptNone)` would smuggle it into the result.
    let mut nns = if filter.accept(query, &entry_vec, entry_id) {
        vec![entry]
    } else {
        Vec::new()
    };
    let mut visited = HashSet::new();
    visited.insert(entry_id);
    let mut candidates = MinHeap::from_vec(vec![entry]);

    let layer_attr_name = layer_attr(predicate, level);

    while let Some(current) = candidates.pop() {
        if cancel.is_cancelled() {
            return Err(IndexError::Cancelled);
        }
        if let Some(farthest) = nns.last() {
            if farthest.distance < current.distance {
                break;
            }
        }

        let adjacency_key = data_key(&layer_attr_name, current.id);
        let list = cache.get(&adjacency_key).await?;
        let raw = list.value(cache.ts()).await?;
        let Some(raw) = raw else { continue };
        if raw.is_empty() {
            continue;
        }
        let neighbors = parse_edges(&raw)?;

        for neighbor_id in neighbors {
            if visited.contains(&neighbor_id) {
                continue;
            }
            let vector_key = data_key(predicate, neighbor_id);
            let vector_list = cache.get(&vector_key).await?;
            let neighbor_vec = match vector_list.value(cache.ts()).await {
                Ok(Some(v)) => decode_vector(&v)?,
                Ok(None) => {
                    record_dead_best_effort(cache, predicate, neighbor_id).await;
                    continue;
                }
                Err(err) => return Err(err.into()),
            };

            visited.insert(neighbor_id);
            let candidate_dist = dist(&neighbor_vec, query)?;
            let improves = nns.len() < ef
                || nns
                    .last()
                    .map(|farthest| candidate_dist < farthest.distance)
                    .unwrap_or(true);

            if improves && filter.accept(query, &neighbor_vec, neighbor_id) {
                let element = HeapElement::new(candidate_dist, neighbor_id);
                candidates.push(element);
                insort_bounded(&mut nns, element);
                if nns.len() > ef {
                    nns.truncate(ef);
                }
            }
        }
    }

    trace!(predicate, level, visited = visited.len(), found = nns.len(), "search_layer done");
    Ok((nns, visited))
}

async fn read_vector(
    cache: &dyn CacheAdapter,
    predicate: &str,
    id: u64,
    cancel: &CancellationToken,
) -> Result<Vec<f64>> {
    if cancel.is_cancelled() {
        return Err(IndexError::Cancelled);
    }
    let key = data_key(predicate, id);
    let list = cache.get(&key).await?;
    let raw = list.value(cache.ts()).await?.ok_or(IndexError::NotFound)?;
    decode_vector(&raw)
}
