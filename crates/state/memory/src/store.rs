use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use campusdocs_state::error::StateError;
use campusdocs_state::key::{Collection, RecordKey};
use campusdocs_state::store::{
    CommitResult, Precondition, RecordStore, VersionedRecord, WriteOp,
};

/// A single entry in the in-memory store.
#[derive(Debug, Clone)]
struct Entry {
    value: String,
    version: u64,
}

/// In-memory [`RecordStore`] backed by a `HashMap` under one mutex.
///
/// A single lock (rather than a sharded map) keeps `commit` trivially
/// atomic across records: precondition checks and writes happen under the
/// same guard, so no concurrent writer can interleave. Critical sections
/// are short; the async trait methods return immediately.
#[derive(Debug, Default)]
pub struct MemoryRecordStore {
    data: Mutex<HashMap<String, Entry>>,
}

impl MemoryRecordStore {
    /// Create a new, empty in-memory record store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Render a [`RecordKey`] into the string used as the map key.
    fn render_key(key: &RecordKey) -> String {
        key.canonical()
    }

    fn guard(&self) -> MutexGuard<'_, HashMap<String, Entry>> {
        // A poisoned lock only means another thread panicked mid-operation;
        // the map itself is still structurally sound.
        self.data.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn get(&self, key: &RecordKey) -> Result<Option<VersionedRecord>, StateError> {
        let data = self.guard();
        Ok(data.get(&Self::render_key(key)).map(|entry| VersionedRecord {
            value: entry.value.clone(),
            version: entry.version,
        }))
    }

    async fn check_and_set(&self, key: &RecordKey, value: &str) -> Result<bool, StateError> {
        let mut data = self.guard();
        match data.entry(Self::render_key(key)) {
            std::collections::hash_map::Entry::Occupied(_) => Ok(false),
            std::collections::hash_map::Entry::Vacant(vacant) => {
                vacant.insert(Entry {
                    value: value.to_owned(),
                    version: 1,
                });
                Ok(true)
            }
        }
    }

    async fn delete(&self, key: &RecordKey) -> Result<bool, StateError> {
        let mut data = self.guard();
        Ok(data.remove(&Self::render_key(key)).is_some())
    }

    async fn scan(
        &self,
        collection: Collection,
    ) -> Result<Vec<(String, VersionedRecord)>, StateError> {
        let prefix = format!("{collection}:");
        let data = self.guard();
        Ok(data
            .iter()
            .filter_map(|(rendered, entry)| {
                rendered.strip_prefix(&prefix).map(|id| {
                    (
                        id.to_owned(),
                        VersionedRecord {
                            value: entry.value.clone(),
                            version: entry.version,
                        },
                    )
                })
            })
            .collect())
    }

    async fn commit(
        &self,
        preconditions: &[Precondition],
        writes: &[WriteOp],
    ) -> Result<CommitResult, StateError> {
        let mut data = self.guard();

        // Validate every precondition before touching anything.
        for pre in preconditions {
            let found_version = data
                .get(&Self::render_key(&pre.key))
                .map_or(0, |entry| entry.version);
            if found_version != pre.expected_version {
                return Ok(CommitResult::Conflict {
                    key: pre.key.clone(),
                    found_version,
                });
            }
        }

        for write in writes {
            match write {
                WriteOp::Put { key, value } => {
                    data.entry(Self::render_key(key))
                        .and_modify(|entry| {
                            value.clone_into(&mut entry.value);
                            entry.version += 1;
                        })
                        .or_insert_with(|| Entry {
                            value: value.clone(),
                            version: 1,
                        });
                }
                WriteOp::Delete { key } => {
                    data.remove(&Self::render_key(key));
                }
            }
        }

        Ok(CommitResult::Ok)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use campusdocs_state::testing::run_store_conformance_tests;

    use super::*;

    #[tokio::test]
    async fn conformance() {
        let store = MemoryRecordStore::new();
        run_store_conformance_tests(&store)
            .await
            .expect("conformance tests should pass");
    }

    #[tokio::test]
    async fn racing_commits_on_one_record_admit_exactly_one_winner() {
        let store = Arc::new(MemoryRecordStore::new());
        let key = RecordKey::new(Collection::Users, "contended");
        store.check_and_set(&key, "0").await.unwrap();
        let version = store.get(&key).await.unwrap().unwrap().version;

        // Both tasks commit against the same read snapshot.
        let mut handles = Vec::new();
        for n in 1..=2 {
            let store = Arc::clone(&store);
            let key = key.clone();
            handles.push(tokio::spawn(async move {
                store
                    .commit(
                        &[Precondition::at_version(key.clone(), version)],
                        &[WriteOp::Put {
                            key,
                            value: n.to_string(),
                        }],
                    )
                    .await
                    .unwrap()
            }));
        }

        let mut ok = 0;
        let mut conflicts = 0;
        for handle in handles {
            match handle.await.unwrap() {
                CommitResult::Ok => ok += 1,
                CommitResult::Conflict { .. } => conflicts += 1,
            }
        }
        assert_eq!(ok, 1, "exactly one stale-snapshot commit may win");
        assert_eq!(conflicts, 1);

        let rec = store.get(&key).await.unwrap().unwrap();
        assert_eq!(rec.version, version + 1, "only the winner bumped the version");
    }
}
