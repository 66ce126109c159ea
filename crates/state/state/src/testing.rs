use crate::error::StateError;
use crate::key::{Collection, RecordKey};
use crate::store::{CommitResult, Precondition, RecordStore, WriteOp};

fn user_key(id: &str) -> RecordKey {
    RecordKey::new(Collection::Users, id)
}

fn doc_key(id: &str) -> RecordKey {
    RecordKey::new(Collection::Documents, id)
}

/// Run the full record store conformance test suite.
///
/// Call this from your backend's test module with a fresh store instance.
///
/// # Errors
///
/// Returns an error if any conformance test fails.
pub async fn run_store_conformance_tests(store: &dyn RecordStore) -> Result<(), StateError> {
    test_get_missing(store).await?;
    test_check_and_set_new(store).await?;
    test_check_and_set_existing(store).await?;
    test_delete(store).await?;
    test_scan_is_per_collection(store).await?;
    test_commit_single_record(store).await?;
    test_commit_version_mismatch(store).await?;
    test_commit_multi_record_all_or_nothing(store).await?;
    test_commit_must_not_exist(store).await?;
    test_commit_delete(store).await?;
    Ok(())
}

async fn test_get_missing(store: &dyn RecordStore) -> Result<(), StateError> {
    let val = store.get(&user_key("missing")).await?;
    assert!(val.is_none(), "get on missing key should return None");
    Ok(())
}

async fn test_check_and_set_new(store: &dyn RecordStore) -> Result<(), StateError> {
    let key = user_key("cas-new");
    let created = store.check_and_set(&key, "v1").await?;
    assert!(created, "check_and_set on new key should return true");
    let rec = store.get(&key).await?.expect("record should exist");
    assert_eq!(rec.value, "v1");
    assert_eq!(rec.version, 1, "fresh records start at version 1");
    Ok(())
}

async fn test_check_and_set_existing(store: &dyn RecordStore) -> Result<(), StateError> {
    let key = user_key("cas-existing");
    store.check_and_set(&key, "v1").await?;
    let created = store.check_and_set(&key, "v2").await?;
    assert!(!created, "check_and_set on existing key should return false");
    let rec = store.get(&key).await?.expect("record should exist");
    assert_eq!(rec.value, "v1", "original value should remain");
    Ok(())
}

async fn test_delete(store: &dyn RecordStore) -> Result<(), StateError> {
    let key = user_key("to-delete");
    store.check_and_set(&key, "bye").await?;
    let existed = store.delete(&key).await?;
    assert!(existed, "delete should return true for existing key");
    let val = store.get(&key).await?;
    assert!(val.is_none(), "get after delete should return None");

    let existed = store.delete(&key).await?;
    assert!(!existed, "delete on missing key should return false");
    Ok(())
}

async fn test_scan_is_per_collection(store: &dyn RecordStore) -> Result<(), StateError> {
    store.check_and_set(&user_key("scan-u1"), "u").await?;
    store.check_and_set(&doc_key("scan-d1"), "d").await?;

    let docs = store.scan(Collection::Documents).await?;
    assert!(docs.iter().any(|(id, _)| id == "scan-d1"));
    assert!(
        !docs.iter().any(|(id, _)| id == "scan-u1"),
        "scan must not leak across collections"
    );
    Ok(())
}

async fn test_commit_single_record(store: &dyn RecordStore) -> Result<(), StateError> {
    let key = user_key("commit-1");
    store.check_and_set(&key, "a").await?;
    let rec = store.get(&key).await?.expect("record should exist");

    let result = store
        .commit(
            &[Precondition::at_version(key.clone(), rec.version)],
            &[WriteOp::Put {
                key: key.clone(),
                value: "b".into(),
            }],
        )
        .await?;
    assert_eq!(result, CommitResult::Ok);

    let rec2 = store.get(&key).await?.expect("record should exist");
    assert_eq!(rec2.value, "b");
    assert_eq!(rec2.version, rec.version + 1, "commit bumps the version");
    Ok(())
}

async fn test_commit_version_mismatch(store: &dyn RecordStore) -> Result<(), StateError> {
    let key = user_key("commit-stale");
    store.check_and_set(&key, "a").await?;

    let result = store
        .commit(
            &[Precondition::at_version(key.clone(), 999)],
            &[WriteOp::Put {
                key: key.clone(),
                value: "b".into(),
            }],
        )
        .await?;
    assert!(
        matches!(result, CommitResult::Conflict { .. }),
        "stale version should conflict"
    );
    let rec = store.get(&key).await?.expect("record should exist");
    assert_eq!(rec.value, "a", "conflicted commit must write nothing");
    Ok(())
}

async fn test_commit_multi_record_all_or_nothing(
    store: &dyn RecordStore,
) -> Result<(), StateError> {
    let ka = user_key("multi-a");
    let kb = doc_key("multi-b");
    store.check_and_set(&ka, "a1").await?;
    store.check_and_set(&kb, "b1").await?;
    let va = store.get(&ka).await?.expect("a exists").version;

    // Valid precondition on a, stale on b: neither write may land.
    let result = store
        .commit(
            &[
                Precondition::at_version(ka.clone(), va),
                Precondition::at_version(kb.clone(), 42),
            ],
            &[
                WriteOp::Put {
                    key: ka.clone(),
                    value: "a2".into(),
                },
                WriteOp::Put {
                    key: kb.clone(),
                    value: "b2".into(),
                },
            ],
        )
        .await?;
    assert!(matches!(result, CommitResult::Conflict { .. }));
    assert_eq!(store.get(&ka).await?.expect("a exists").value, "a1");
    assert_eq!(store.get(&kb).await?.expect("b exists").value, "b1");

    // Both fresh: both land.
    let va = store.get(&ka).await?.expect("a exists").version;
    let vb = store.get(&kb).await?.expect("b exists").version;
    let result = store
        .commit(
            &[
                Precondition::at_version(ka.clone(), va),
                Precondition::at_version(kb.clone(), vb),
            ],
            &[
                WriteOp::Put {
                    key: ka.clone(),
                    value: "a2".into(),
                },
                WriteOp::Put {
                    key: kb.clone(),
                    value: "b2".into(),
                },
            ],
        )
        .await?;
    assert_eq!(result, CommitResult::Ok);
    assert_eq!(store.get(&ka).await?.expect("a exists").value, "a2");
    assert_eq!(store.get(&kb).await?.expect("b exists").value, "b2");
    Ok(())
}

async fn test_commit_must_not_exist(store: &dyn RecordStore) -> Result<(), StateError> {
    let key = user_key("commit-absent");

    // Version 0 asserts absence; succeeds on a fresh key.
    let result = store
        .commit(
            &[Precondition::at_version(key.clone(), 0)],
            &[WriteOp::Put {
                key: key.clone(),
                value: "x".into(),
            }],
        )
        .await?;
    assert_eq!(result, CommitResult::Ok);

    // Now the record exists, so the same precondition conflicts.
    let result = store
        .commit(
            &[Precondition::at_version(key.clone(), 0)],
            &[WriteOp::Put {
                key: key.clone(),
                value: "y".into(),
            }],
        )
        .await?;
    assert!(matches!(result, CommitResult::Conflict { .. }));
    Ok(())
}

async fn test_commit_delete(store: &dyn RecordStore) -> Result<(), StateError> {
    let key = doc_key("commit-del");
    store.check_and_set(&key, "gone soon").await?;
    let version = store.get(&key).await?.expect("record exists").version;

    let result = store
        .commit(
            &[Precondition::at_version(key.clone(), version)],
            &[WriteOp::Delete { key: key.clone() }],
        )
        .await?;
    assert_eq!(result, CommitResult::Ok);
    assert!(store.get(&key).await?.is_none());
    Ok(())
}
