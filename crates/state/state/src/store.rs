use async_trait::async_trait;

use crate::error::StateError;
use crate::key::{Collection, RecordKey};

/// A record value together with its commit version.
///
/// Versions start at 1 on creation and increase by 1 on every committed
/// write. They are the basis of the optimistic-concurrency preconditions
/// in [`RecordStore::commit`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionedRecord {
    pub value: String,
    pub version: u64,
}

/// A version precondition checked at commit time.
///
/// `expected_version == 0` asserts that the record does not exist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Precondition {
    pub key: RecordKey,
    pub expected_version: u64,
}

impl Precondition {
    /// Require `key` to be at `expected_version` when the commit applies.
    #[must_use]
    pub fn at_version(key: RecordKey, expected_version: u64) -> Self {
        Self {
            key,
            expected_version,
        }
    }
}

/// A buffered write applied atomically by [`RecordStore::commit`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOp {
    Put { key: RecordKey, value: String },
    Delete { key: RecordKey },
}

impl WriteOp {
    /// The key this write targets.
    #[must_use]
    pub fn key(&self) -> &RecordKey {
        match self {
            Self::Put { key, .. } | Self::Delete { key } => key,
        }
    }
}

/// Result of an atomic commit attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitResult {
    /// All preconditions held and every write is now visible.
    Ok,
    /// A precondition failed; nothing was written.
    Conflict {
        /// The first key whose version did not match.
        key: RecordKey,
        /// The version found at commit time (0 if the record is absent).
        found_version: u64,
    },
}

/// Trait for the document-database boundary: a record store with
/// versioned reads and an atomic multi-record commit.
///
/// Implementations must be `Send + Sync` and safe for concurrent access.
/// The store does not interpret record values; callers serialize their
/// own payloads.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Get a record with its current version. Returns `None` if absent.
    async fn get(&self, key: &RecordKey) -> Result<Option<VersionedRecord>, StateError>;

    /// Create a record only if it does not already exist.
    /// Returns `true` if the record was newly created, `false` if a record
    /// with this key was already present (in which case nothing is written).
    async fn check_and_set(&self, key: &RecordKey, value: &str) -> Result<bool, StateError>;

    /// Delete a record. Returns `true` if the record existed.
    async fn delete(&self, key: &RecordKey) -> Result<bool, StateError>;

    /// Scan every record in a collection.
    ///
    /// Returns (id, record) pairs in unspecified order. Filtering is the
    /// caller's job; result sets are expected to be small.
    async fn scan(
        &self,
        collection: Collection,
    ) -> Result<Vec<(String, VersionedRecord)>, StateError>;

    /// Atomically apply a set of writes, but only if every precondition's
    /// version still matches. Either all writes commit or none do.
    ///
    /// This is the optimistic transaction primitive: callers read records,
    /// derive new values, then commit with the versions they read. A
    /// conflicting concurrent writer bumps a version and forces this commit
    /// to return [`CommitResult::Conflict`], after which the caller must
    /// re-read and re-evaluate.
    async fn commit(
        &self,
        preconditions: &[Precondition],
        writes: &[WriteOp],
    ) -> Result<CommitResult, StateError>;
}
