//! End-to-end scenarios against `MemPostingStore`, one per testable
//! property the index is expected to uphold.
//!
//! `insert` never writes the base vector itself (spec §1/§3: that's an
//! external collaborator's job) — every test here writes `(predicate,
//! id)` through `annidx_core::wire` before calling `insert`, the way a
//! real caller would write it through its own scalar-encoding layer.

use annidx_core::filter::{AcceptAll, AcceptNone, SearchFilter};
use annidx_core::keys::{SENTINEL_ENTITY, data_key, dead_attr, entry_attr};
use annidx_core::wire::encode_vector;
use annidx_core::{IndexConfig, insert, search};
use annidx_store::MemPostingStore;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tokio_util::sync::CancellationToken;

fn config() -> IndexConfig {
    IndexConfig {
        max_levels: 3,
        ef_construction: 8,
        ef_search: 8,
        max_neighbors: None,
    }
}

fn vec_at(x: f64) -> Vec<f64> {
    vec![x, 0.0]
}

async fn put_vector(store: &MemPostingStore, predicate: &str, id: u64, v: &[f64]) {
    store
        .put(&data_key(predicate, id), encode_vector(v))
        .await
        .unwrap();
}

#[tokio::test]
async fn first_insert_bootstraps_empty_adjacency_and_entry_pointer() {
    let store = MemPostingStore::new();
    let cfg = config();
    let mut rng = ChaCha8Rng::seed_from_u64(1);
    let cancel = CancellationToken::new();

    put_vector(&store, "p", 42, &vec_at(0.0)).await;
    let txn = store.begin();
    insert(&store, &txn, "p", 42, &vec_at(0.0), &cfg, &mut rng, &cancel)
        .await
        .unwrap();
    txn.commit().await.unwrap();

    for level in 0..cfg.max_levels {
        let attr = annidx_core::keys::layer_attr("p", level);
        let raw = store
            .get_latest(&data_key(&attr, 42))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(raw, b"[]");
    }

    let entry_raw = store
        .get_latest(&data_key(&entry_attr("p"), SENTINEL_ENTITY))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(annidx_core::keys::decode_entry(&entry_raw).unwrap(), 42);
}

#[tokio::test]
async fn reinserting_the_entry_is_a_no_op() {
    let store = MemPostingStore::new();
    let cfg = config();
    let mut rng = ChaCha8Rng::seed_from_u64(1);
    let cancel = CancellationToken::new();

    put_vector(&store, "p", 1, &vec_at(0.0)).await;
    let txn = store.begin();
    insert(&store, &txn, "p", 1, &vec_at(0.0), &cfg, &mut rng, &cancel)
        .await
        .unwrap();
    txn.commit().await.unwrap();

    let ts_before = store.latest_ts();

    let txn = store.begin();
    let visited = insert(&store, &txn, "p", 1, &vec_at(0.0), &cfg, &mut rng, &cancel)
        .await
        .unwrap();
    txn.commit().await.unwrap();

    assert!(visited.is_empty());
    // Re-inserting the entry must not touch the stored bootstrap state.
    assert_eq!(store.latest_ts(), ts_before + 1); // commit still bumps the clock, even with no writes
}

#[tokio::test]
async fn second_insert_links_bidirectionally() {
    let store = MemPostingStore::new();
    let cfg = config();
    let mut rng = ChaCha8Rng::seed_from_u64(3);
    let cancel = CancellationToken::new();

    put_vector(&store, "p", 1, &vec_at(0.0)).await;
    let txn = store.begin();
    insert(&store, &txn, "p", 1, &vec_at(0.0), &cfg, &mut rng, &cancel)
        .await
        .unwrap();
    txn.commit().await.unwrap();

    put_vector(&store, "p", 2, &vec_at(1.0)).await;
    let txn = store.begin();
    insert(&store, &txn, "p", 2, &vec_at(1.0), &cfg, &mut rng, &cancel)
        .await
        .unwrap();
    txn.commit().await.unwrap();

    let attr0 = annidx_core::keys::layer_attr("p", 0);
    let edges_of_1 = annidx_core::edges::parse_edges(
        &store.get_latest(&data_key(&attr0, 1)).await.unwrap().unwrap(),
    )
    .unwrap();
    let edges_of_2 = annidx_core::edges::parse_edges(
        &store.get_latest(&data_key(&attr0, 2)).await.unwrap().unwrap(),
    )
    .unwrap();

    assert!(edges_of_1.contains(&2), "1's adjacency should contain 2");
    assert!(edges_of_2.contains(&1), "2's adjacency should contain 1");
}

#[tokio::test]
async fn search_finds_inserted_vectors() {
    let store = MemPostingStore::new();
    let cfg = config();
    let mut rng = ChaCha8Rng::seed_from_u64(9);
    let cancel = CancellationToken::new();

    for (id, x) in [(1u64, 0.0), (2, 1.0), (3, 2.0), (4, 3.0), (5, 100.0)] {
        put_vector(&store, "p", id, &vec_at(x)).await;
        let txn = store.begin();
        insert(&store, &txn, "p", id, &vec_at(x), &cfg, &mut rng, &cancel)
            .await
            .unwrap();
        txn.commit().await.unwrap();
    }

    let read_ts = store.latest_ts();
    let results = search(
        &store,
        "p",
        &vec_at(0.0),
        cfg.max_levels,
        read_ts,
        3,
        cfg.ef_search,
        &AcceptAll,
        &cancel,
    )
    .await
    .unwrap();

    assert!(!results.is_empty());
    assert!(results.contains(&1), "closest vector should be found: {results:?}");
    assert!(!results.contains(&5), "far-away vector should not make the top 3");
}

#[tokio::test]
async fn filter_suppresses_excluded_candidates() {
    let store = MemPostingStore::new();
    let cfg = config();
    let mut rng = ChaCha8Rng::seed_from_u64(11);
    let cancel = CancellationToken::new();

    for (id, x) in [(1u64, 0.0), (2, 1.0), (3, 2.0)] {
        put_vector(&store, "p", id, &vec_at(x)).await;
        let txn = store.begin();
        insert(&store, &txn, "p", id, &vec_at(x), &cfg, &mut rng, &cancel)
            .await
            .unwrap();
        txn.commit().await.unwrap();
    }

    struct NotId(u64);
    impl SearchFilter for NotId {
        fn accept(&self, _query: &[f64], _candidate_vec: &[f64], candidate_id: u64) -> bool {
            candidate_id != self.0
        }
    }

    let read_ts = store.latest_ts();
    let results = search(
        &store,
        "p",
        &vec_at(0.0),
        cfg.max_levels,
        read_ts,
        3,
        cfg.ef_search,
        &NotId(1),
        &cancel,
    )
    .await
    .unwrap();

    assert!(!results.contains(&1));
}

#[tokio::test]
async fn accept_none_always_returns_empty() {
    let store = MemPostingStore::new();
    let cfg = config();
    let mut rng = ChaCha8Rng::seed_from_u64(11);
    let cancel = CancellationToken::new();

    for (id, x) in [(1u64, 0.0), (2, 1.0), (3, 2.0)] {
        put_vector(&store, "p", id, &vec_at(x)).await;
        let txn = store.begin();
        insert(&store, &txn, "p", id, &vec_at(x), &cfg, &mut rng, &cancel)
            .await
            .unwrap();
        txn.commit().await.unwrap();
    }

    let read_ts = store.latest_ts();
    let results = search(
        &store,
        "p",
        &vec_at(0.0),
        cfg.max_levels,
        read_ts,
        3,
        cfg.ef_search,
        &AcceptNone,
        &cancel,
    )
    .await
    .unwrap();

    assert!(results.is_empty(), "AcceptNone must never admit the entry point either: {results:?}");
}

#[tokio::test]
async fn dead_base_vector_is_logged_and_tolerated() {
    let store = MemPostingStore::new();
    let cfg = config();
    let mut rng = ChaCha8Rng::seed_from_u64(5);
    let cancel = CancellationToken::new();

    for (id, x) in [(1u64, 0.0), (2, 1.0), (3, 2.0), (4, 3.0), (5, 4.0)] {
        put_vector(&store, "p", id, &vec_at(x)).await;
        let txn = store.begin();
        insert(&store, &txn, "p", id, &vec_at(x), &cfg, &mut rng, &cancel)
            .await
            .unwrap();
        txn.commit().await.unwrap();
    }

    // Simulate an externally deleted base vector.
    store.delete(&data_key("p", 3)).await.unwrap();

    let read_ts = store.latest_ts();
    let results = search(
        &store,
        "p",
        &vec_at(0.0),
        cfg.max_levels,
        read_ts,
        5,
        cfg.ef_search,
        &AcceptAll,
        &cancel,
    )
    .await
    .unwrap();

    assert!(!results.contains(&3), "dead entity must never be returned");

    let dead_raw = store
        .get_latest(&data_key(&dead_attr("p"), SENTINEL_ENTITY))
        .await
        .unwrap();
    let dead_raw = dead_raw.expect("dead-node log should exist after encountering a missing vector");
    let dead = annidx_core::edges::parse_edges(&dead_raw).unwrap();
    assert!(dead.contains(&3), "dead log should record entity 3: {dead:?}");
}

#[tokio::test]
async fn max_neighbors_cap_prunes_to_closest() {
    let store = MemPostingStore::new();
    let cfg = IndexConfig {
        max_levels: 1,
        ef_construction: 16,
        ef_search: 16,
        max_neighbors: Some(2),
    };
    let mut rng = ChaCha8Rng::seed_from_u64(13);
    let cancel = CancellationToken::new();

    // All link into the same single layer 0 hub so each neighbor's
    // adjacency grows past the cap and must be pruned.
    for (id, x) in [(1u64, 0.0), (2, 1.0), (3, 2.0), (4, 3.0), (5, 50.0)] {
        put_vector(&store, "p", id, &vec_at(x)).await;
        let txn = store.begin();
        insert(&store, &txn, "p", id, &vec_at(x), &cfg, &mut rng, &cancel)
            .await
            .unwrap();
        txn.commit().await.unwrap();
    }

    let attr0 = annidx_core::keys::layer_attr("p", 0);
    for id in [1u64, 2, 3, 4, 5] {
        if let Some(raw) = store.get_latest(&data_key(&attr0, id)).await.unwrap() {
            let edges = annidx_core::edges::parse_edges(&raw).unwrap();
            assert!(edges.len() <= 2, "entity {id} has {} neighbors, cap is 2", edges.len());
        }
    }
}

#[tokio::test]
async fn cancellation_token_aborts_the_walk() {
    let store = MemPostingStore::new();
    let cfg = config();
    let mut rng = ChaCha8Rng::seed_from_u64(1);
    let cancel = CancellationToken::new();

    put_vector(&store, "p", 1, &vec_at(0.0)).await;
    let txn = store.begin();
    insert(&store, &txn, "p", 1, &vec_at(0.0), &cfg, &mut rng, &cancel)
        .await
        .unwrap();
    txn.commit().await.unwrap();

    cancel.cancel();
    let read_ts = store.latest_ts();
    let result = search(
        &store,
        "p",
        &vec_at(0.0),
        cfg.max_levels,
        read_ts,
        1,
        cfg.ef_search,
        &AcceptAll,
        &cancel,
    )
    .await;

    assert!(matches!(result, Err(annidx_core::IndexError::Cancelled)));
}
