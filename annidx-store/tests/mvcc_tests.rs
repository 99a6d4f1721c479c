use annidx_store::MemPostingStore;

#[tokio::test]
async fn basic_put_get() {
    let store = MemPostingStore::new();
    store.put(b"key", b"value".to_vec()).await.expect("put failed");

    let result = store.get_latest(b"key").await.expect("get failed");
    assert_eq!(result, Some(b"value".to_vec()));
}

#[tokio::test]
async fn get_nonexistent_key() {
    let store = MemPostingStore::new();
    let result = store.get_latest(b"missing").await.expect("get failed");
    assert_eq!(result, None);
}

#[tokio::test]
async fn delete_is_a_tombstone() {
    let store = MemPostingStore::new();
    store.put(b"key", b"value".to_vec()).await.unwrap();
    store.delete(b"key").await.unwrap();

    let result = store.get_latest(b"key").await.unwrap();
    assert_eq!(result, None);
}

#[tokio::test]
async fn snapshot_is_pinned_at_its_timestamp() {
    use annidx_store::{PostingList, PostingStore};

    let store = MemPostingStore::new();
    let ts1 = store.put(b"key", b"v1".to_vec()).await.unwrap();
    let snapshot = store.snapshot(ts1);

    store.put(b"key", b"v2".to_vec()).await.unwrap();

    let list = snapshot.get(b"key").await.unwrap();
    let value = list.value(snapshot.ts()).await.unwrap();
    assert_eq!(value, Some(b"v1".to_vec()));

    let latest = store.get_latest(b"key").await.unwrap();
    assert_eq!(latest, Some(b"v2".to_vec()));
}

#[tokio::test]
async fn write_txn_is_invisible_until_commit() {
    use annidx_store::PostingStore;

    let store = MemPostingStore::new();
    let txn = store.begin();
    txn.add_mutation(b"key", b"value".to_vec()).await.unwrap();

    // Not yet visible outside the transaction.
    assert_eq!(store.get_latest(b"key").await.unwrap(), None);

    txn.commit().await.unwrap();
    assert_eq!(store.get_latest(b"key").await.unwrap(), Some(b"value".to_vec()));
}

#[tokio::test]
async fn write_txn_reads_its_own_pending_writes() {
    use annidx_store::{PostingList, PostingStore};

    let store = MemPostingStore::new();
    let txn = store.begin();
    txn.add_mutation(b"key", b"first".to_vec()).await.unwrap();

    let list = txn.get(b"key").await.unwrap();
    assert_eq!(list.value(txn.start_ts()).await.unwrap(), Some(b"first".to_vec()));

    // A second mutation to the same key within the same transaction
    // overwrites the first, and is itself visible to a further read —
    // this is what lets the dead-node log accumulate multiple entries
    // within one layer search.
    txn.add_mutation(b"key", b"second".to_vec()).await.unwrap();
    let list = txn.get(b"key").await.unwrap();
    assert_eq!(list.value(txn.start_ts()).await.unwrap(), Some(b"second".to_vec()));
}

#[tokio::test]
async fn rollback_discards_pending_writes() {
    let store = MemPostingStore::new();
    let txn = store.begin();
    txn.add_mutation(b"key", b"value".to_vec()).await.unwrap();
    txn.rollback();

    assert_eq!(store.get_latest(b"key").await.unwrap(), None);
}

#[tokio::test]
async fn concurrent_one_shot_writes_all_land() {
    use std::sync::Arc;

    let store = Arc::new(MemPostingStore::new());
    let mut handles = vec![];

    for i in 0..20 {
        let store = store.clone();
        handles.push(tokio::spawn(async move {
            let key = format!("key-{i}");
            store.put(key.as_bytes(), format!("value-{i}").into_bytes()).await.unwrap();
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    for i in 0..20 {
        let key = format!("key-{i}");
        let result = store.get_latest(key.as_bytes()).await.unwrap();
        assert_eq!(result, Some(format!("value-{i}").into_bytes()));
    }
}
