use crate::error::StateError;
use crate::key::{KeyKind, StateKey};
use crate::store::{StateStore, StoredValue};

/// An expiry far enough in the future that no conformance purge touches it.
const FAR: i64 = 4_102_444_800;

fn token_key(id: &str) -> StateKey {
    StateKey::new(KeyKind::Token, id)
}

fn path_key(id: &str) -> StateKey {
    StateKey::new(KeyKind::Path, id)
}

/// Run the full state store conformance test suite.
///
/// Call this from your backend's test module with a fresh store instance.
///
/// # Errors
///
/// Returns an error if any conformance test fails.
pub async fn run_store_conformance_tests(store: &dyn StateStore) -> Result<(), StateError> {
    test_get_missing(store).await?;
    test_put_and_get(store).await?;
    test_put_overwrites(store).await?;
    test_kinds_are_independent(store).await?;
    test_raise_expiry_creates(store).await?;
    test_raise_expiry_is_monotonic(store).await?;
    test_compare_and_delete(store).await?;
    test_compare_and_delete_stale(store).await?;
    test_scan(store).await?;
    test_purge_expired(store).await?;
    Ok(())
}

async fn test_get_missing(store: &dyn StateStore) -> Result<(), StateError> {
    let val = store.get(&token_key("missing")).await?;
    assert!(val.is_none(), "get on missing key should return None");
    Ok(())
}

async fn test_put_and_get(store: &dyn StateStore) -> Result<(), StateError> {
    let key = token_key("put-get");
    let value = StoredValue::new("hello", FAR);
    store.put(&key, &value).await?;
    assert_eq!(store.get(&key).await?, Some(value));
    Ok(())
}

async fn test_put_overwrites(store: &dyn StateStore) -> Result<(), StateError> {
    let key = token_key("overwrite");
    store.put(&key, &StoredValue::new("first", FAR)).await?;
    store.put(&key, &StoredValue::new("second", FAR + 1)).await?;
    assert_eq!(
        store.get(&key).await?,
        Some(StoredValue::new("second", FAR + 1)),
        "last write should win"
    );
    Ok(())
}

async fn test_kinds_are_independent(store: &dyn StateStore) -> Result<(), StateError> {
    store
        .put(&token_key("shared-id"), &StoredValue::new("token", FAR))
        .await?;
    assert!(
        store.get(&path_key("shared-id")).await?.is_none(),
        "a token entry must not be visible as a path entry"
    );
    Ok(())
}

async fn test_raise_expiry_creates(store: &dyn StateStore) -> Result<(), StateError> {
    let key = path_key("/raise-new");
    let written = store.raise_expiry(&key, FAR).await?;
    assert!(written, "raise_expiry on a missing key should write");
    assert_eq!(store.get(&key).await?, Some(StoredValue::new("", FAR)));
    Ok(())
}

async fn test_raise_expiry_is_monotonic(store: &dyn StateStore) -> Result<(), StateError> {
    let key = path_key("/raise-monotonic");
    store.raise_expiry(&key, FAR + 100).await?;

    let written = store.raise_expiry(&key, FAR + 50).await?;
    assert!(!written, "a lower expiry should not be written");
    let written = store.raise_expiry(&key, FAR + 100).await?;
    assert!(!written, "an equal expiry should not be written");
    assert_eq!(store.get(&key).await?.map(|v| v.expires_at), Some(FAR + 100));

    let written = store.raise_expiry(&key, FAR + 200).await?;
    assert!(written, "a higher expiry should be written");
    assert_eq!(store.get(&key).await?.map(|v| v.expires_at), Some(FAR + 200));

    let existing = token_key("raise-keeps-value");
    store.put(&existing, &StoredValue::new("kept", FAR)).await?;
    store.raise_expiry(&existing, FAR + 1).await?;
    assert_eq!(
        store.get(&existing).await?,
        Some(StoredValue::new("kept", FAR + 1)),
        "raising the expiry should keep the value"
    );
    Ok(())
}

async fn test_compare_and_delete(store: &dyn StateStore) -> Result<(), StateError> {
    let key = token_key("cad");
    let value = StoredValue::new("{\"resource\":\"1\"}", FAR);
    store.put(&key, &value).await?;

    assert!(store.compare_and_delete(&key, &value).await?);
    assert!(store.get(&key).await?.is_none(), "entry should be gone");
    assert!(
        !store.compare_and_delete(&key, &value).await?,
        "second delete of the same entry should fail"
    );
    Ok(())
}

async fn test_compare_and_delete_stale(store: &dyn StateStore) -> Result<(), StateError> {
    let key = token_key("cad-stale");
    let old = StoredValue::new("old", FAR);
    let new = StoredValue::new("new", FAR);
    store.put(&key, &old).await?;
    store.put(&key, &new).await?;

    assert!(
        !store.compare_and_delete(&key, &old).await?,
        "a stale expectation should not delete"
    );
    assert_eq!(store.get(&key).await?, Some(new.clone()));

    let moved = StoredValue::new("new", FAR + 5);
    assert!(
        !store.compare_and_delete(&key, &moved).await?,
        "a differing expiry should not delete"
    );
    assert_eq!(store.get(&key).await?, Some(new));
    Ok(())
}

async fn test_scan(store: &dyn StateStore) -> Result<(), StateError> {
    store
        .put(&token_key("scan-a"), &StoredValue::new("a", FAR))
        .await?;
    store
        .put(&token_key("scan-b"), &StoredValue::new("b", FAR))
        .await?;
    store.raise_expiry(&path_key("/scan"), FAR).await?;

    let tokens = store.scan(&KeyKind::Token).await?;
    assert!(tokens.contains(&("scan-a".to_owned(), StoredValue::new("a", FAR))));
    assert!(tokens.contains(&("scan-b".to_owned(), StoredValue::new("b", FAR))));
    assert!(
        tokens.iter().all(|(id, _)| id != "/scan"),
        "token scan must not return path entries"
    );

    let paths = store.scan(&KeyKind::Path).await?;
    assert!(paths.contains(&("/scan".to_owned(), StoredValue::new("", FAR))));
    Ok(())
}

async fn test_purge_expired(store: &dyn StateStore) -> Result<(), StateError> {
    store
        .put(&token_key("purge-past"), &StoredValue::new("p", 500))
        .await?;
    store
        .put(&token_key("purge-now"), &StoredValue::new("n", 1000))
        .await?;
    store
        .put(&token_key("purge-future"), &StoredValue::new("f", 1500))
        .await?;
    store.raise_expiry(&path_key("/purge"), 1000).await?;

    let removed = store.purge_expired(&KeyKind::Token, 1000).await?;
    assert_eq!(removed, 2, "entries expiring at or before now should go");
    assert!(store.get(&token_key("purge-past")).await?.is_none());
    assert!(store.get(&token_key("purge-now")).await?.is_none());
    assert!(store.get(&token_key("purge-future")).await?.is_some());
    assert!(
        store.get(&path_key("/purge")).await?.is_some(),
        "purging tokens must leave path entries alone"
    );

    let removed = store.purge_expired(&KeyKind::Token, 1000).await?;
    assert_eq!(removed, 0, "purge should be idempotent");

    let removed = store.purge_expired(&KeyKind::Path, 1000).await?;
    assert_eq!(removed, 1);
    assert!(store.get(&path_key("/purge")).await?.is_none());
    Ok(())
}
