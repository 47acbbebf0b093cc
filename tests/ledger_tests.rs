use futures::future::join_all;
use keydeck::db::Store;
use std::collections::HashSet;

async fn spawn_store() -> Store {
    Store::new("sqlite::memory:")
        .await
        .expect("Failed to open in-memory store")
}

fn batch(lines: &[(&str, &str)]) -> Vec<(String, String)> {
    lines
        .iter()
        .map(|(d, v)| ((*d).to_string(), (*v).to_string()))
        .collect()
}

#[tokio::test]
async fn test_concurrent_claims_hand_out_each_key_once() {
    let store = spawn_store().await;
    let product = store.create_product("Blitz", None).await.unwrap();

    let entries = batch(&[
        ("1d", "K-1"),
        ("1d", "K-2"),
        ("1d", "K-3"),
        ("1d", "K-4"),
        ("1d", "K-5"),
    ]);
    store.insert_key_batch(product.id, &entries).await.unwrap();

    // Twice as many callers as keys; exactly min(N, callers) distinct wins
    let tasks: Vec<_> = (0..10)
        .map(|_| {
            let store = store.clone();
            let pid = product.id;
            tokio::spawn(async move { store.claim_key(pid, None).await.unwrap() })
        })
        .collect();

    let results: Vec<_> = join_all(tasks)
        .await
        .into_iter()
        .map(|r| r.expect("claim task panicked"))
        .collect();

    let winners: Vec<_> = results.iter().flatten().collect();
    let losers = results.iter().filter(|r| r.is_none()).count();

    assert_eq!(winners.len(), 5);
    assert_eq!(losers, 5);

    let distinct: HashSet<i32> = winners.iter().map(|k| k.id).collect();
    assert_eq!(distinct.len(), 5, "a key was handed out twice");

    let stock = store.key_stock(product.id).await.unwrap();
    assert_eq!(stock.available, 0);
    assert_eq!(stock.used, 5);
}

#[tokio::test]
async fn test_claim_on_empty_or_unknown_product_is_not_an_error() {
    let store = spawn_store().await;
    let product = store.create_product("Empty", None).await.unwrap();

    assert!(store.claim_key(product.id, None).await.unwrap().is_none());
    assert!(store.claim_key(987_654, None).await.unwrap().is_none());
}

#[tokio::test]
async fn test_claim_respects_duration_filter() {
    let store = spawn_store().await;
    let product = store.create_product("Tiered", None).await.unwrap();

    let entries = batch(&[("1d", "DAY"), ("7d", "WEEK"), ("lifetime", "LIFE")]);
    store.insert_key_batch(product.id, &entries).await.unwrap();

    let key = store
        .claim_key(product.id, Some("7d"))
        .await
        .unwrap()
        .expect("no 7d key available");
    assert_eq!(key.key_value, "WEEK");
    assert!(key.is_claimed);

    // The 7d tier is exhausted, the others untouched
    assert!(store.claim_key(product.id, Some("7d")).await.unwrap().is_none());
    assert_eq!(store.key_stock(product.id).await.unwrap().available, 2);
}

#[tokio::test]
async fn test_delete_product_cascades_to_keys() {
    let store = spawn_store().await;
    let product = store.create_product("Doomed", None).await.unwrap();

    let entries = batch(&[("1d", "A"), ("1d", "B"), ("1d", "C")]);
    store.insert_key_batch(product.id, &entries).await.unwrap();
    store.claim_key(product.id, None).await.unwrap();

    assert!(store.delete_product(product.id).await.unwrap());

    assert!(store.list_keys(Some(product.id)).await.unwrap().is_empty());
    assert!(store.claim_key(product.id, None).await.unwrap().is_none());
}

#[tokio::test]
async fn test_delete_claimed_removes_exactly_the_claimed_rows() {
    let store = spawn_store().await;
    let product = store.create_product("Sweep", None).await.unwrap();

    let entries: Vec<(String, String)> = (0..6).map(|i| ("1d".to_string(), format!("K-{i}"))).collect();
    store.insert_key_batch(product.id, &entries).await.unwrap();

    for _ in 0..3 {
        store.claim_key(product.id, None).await.unwrap().unwrap();
    }

    let removed = store.delete_claimed_keys(product.id).await.unwrap();
    assert_eq!(removed, 3);

    let remaining = store.list_keys(Some(product.id)).await.unwrap();
    assert_eq!(remaining.len(), 3);
    assert!(remaining.iter().all(|k| !k.is_claimed));
}

#[tokio::test]
async fn test_delete_claimed_racing_claims_stays_consistent() {
    let store = spawn_store().await;
    let product = store.create_product("Contended", None).await.unwrap();

    let entries: Vec<(String, String)> =
        (0..30).map(|i| ("1d".to_string(), format!("K-{i}"))).collect();
    store.insert_key_batch(product.id, &entries).await.unwrap();

    let mut tasks = Vec::new();
    for i in 0..10 {
        let store = store.clone();
        let pid = product.id;
        tasks.push(tokio::spawn(async move {
            let claimed = store.claim_key(pid, None).await.unwrap();
            // Interleave a sweep in the middle of the claim storm
            if i == 5 {
                store.delete_claimed_keys(pid).await.unwrap();
            }
            claimed
        }));
    }

    let results: Vec<_> = join_all(tasks)
        .await
        .into_iter()
        .map(|r| r.expect("task panicked"))
        .collect();

    let claimed_ids: Vec<i32> = results.iter().flatten().map(|k| k.id).collect();
    let distinct: HashSet<i32> = claimed_ids.iter().copied().collect();
    assert_eq!(
        distinct.len(),
        claimed_ids.len(),
        "a key was claimed by two callers"
    );

    // A final sweep leaves no claimed row behind, and every surviving row
    // is unclaimed: nothing escaped, nothing was double-counted.
    store.delete_claimed_keys(product.id).await.unwrap();
    let remaining = store.list_keys(Some(product.id)).await.unwrap();
    assert!(remaining.iter().all(|k| !k.is_claimed));
    assert_eq!(remaining.len(), 30 - claimed_ids.len());
}

#[tokio::test]
async fn test_bulk_delete_skips_unknown_ids() {
    let store = spawn_store().await;
    let product = store.create_product("Picky", None).await.unwrap();

    let entries = batch(&[("1d", "A"), ("1d", "B")]);
    store.insert_key_batch(product.id, &entries).await.unwrap();

    let keys = store.list_keys(Some(product.id)).await.unwrap();
    let removed = store
        .delete_keys_by_ids(&[keys[0].id, 555_555])
        .await
        .unwrap();
    assert_eq!(removed, 1);

    // Deleting the same set again is a quiet no-op
    let removed = store
        .delete_keys_by_ids(&[keys[0].id, 555_555])
        .await
        .unwrap();
    assert_eq!(removed, 0);

    assert_eq!(store.list_keys(Some(product.id)).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_delete_all_keys_for_product() {
    let store = spawn_store().await;
    let keep = store.create_product("Keep", None).await.unwrap();
    let wipe = store.create_product("Wipe", None).await.unwrap();

    store
        .insert_key_batch(keep.id, &batch(&[("1d", "KEEP-1")]))
        .await
        .unwrap();
    store
        .insert_key_batch(wipe.id, &batch(&[("1d", "W-1"), ("7d", "W-2")]))
        .await
        .unwrap();

    let removed = store.delete_all_keys(wipe.id).await.unwrap();
    assert_eq!(removed, 2);

    assert!(store.list_keys(Some(wipe.id)).await.unwrap().is_empty());
    assert_eq!(store.list_keys(Some(keep.id)).await.unwrap().len(), 1);
}
