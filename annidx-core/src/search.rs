//! Public read path: descend refining the entry point with `ef_search`
//! per layer, then return the final `max_results` at the bottom layer
//! under the caller's filter.

use crate::cache::{CacheAdapter, SnapshotCache};
use crate::error::{IndexError, Result};
use crate::filter::{AcceptAll, SearchFilter};
use crate::keys::{SENTINEL_ENTITY, data_key, decode_entry, entry_attr};
use crate::layer_search::search_layer;
use annidx_store::MemPostingStore;
use tokio_util::sync::CancellationToken;
use tracing::instrument;

#[instrument(skip(store, query, filter, cancel), fields(predicate, read_ts))]
#[allow(clippy::too_many_arguments)]
pub async fn search(
    store: &MemPostingStore,
    predicate: &str,
    query: &[f64],
    max_levels: usize,
    read_ts: u64,
    max_results: usize,
    ef_search: usize,
    filter: &dyn SearchFilter,
    cancel: &CancellationToken,
) -> Result<Vec<u64>> {
    let cache = SnapshotCache::new(store.snapshot(read_ts), store.clone());

    let entry_key = data_key(&entry_attr(predicate), SENTINEL_ENTITY);
    let entry_list = cache.get(&entry_key).await?;
    let raw = entry_list.value(cache.ts()).await?.ok_or(IndexError::NotFound)?;
    let mut entry = decode_entry(&raw)?;

    for level in 0..max_levels.saturating_sub(1) {
        if cancel.is_cancelled() {
            return Err(IndexError::Cancelled);
        }
        let (nns, _) =
            search_layer(&cache, false, predicate, level, entry, query, ef_search, &AcceptAll, cancel).await?;
        entry = nns.first().ok_or(IndexError::NotFound)?.id;
    }

    let (nns, _) = search_layer(
        &cache,
        false,
        predicate,
        max_levels.saturating_sub(1),
        entry,
        query,
        max_results,
        filter,
        cancel,
    )
    .await?;

    Ok(nns.into_iter().map(|e| e.id).collect())
}
