use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use dashmap::DashMap;

use campusdocs_blob::error::BlobError;
use campusdocs_blob::store::BlobStore;
use campusdocs_blob::types::{BlobLocator, BlobMetadata};

#[derive(Debug, Clone)]
struct StoredBlob {
    metadata: BlobMetadata,
    data: Bytes,
}

/// In-memory [`BlobStore`] backed by a [`DashMap`].
///
/// Retrieval URLs use a `memory://` scheme carrying the expiry timestamp;
/// they are not resolvable, which is fine for tests and local development
/// where only issuance and lifetime matter.
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    blobs: DashMap<String, StoredBlob>,
}

impl MemoryBlobStore {
    /// Create a new, empty in-memory blob store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of blobs currently stored.
    pub fn len(&self) -> usize {
        self.blobs.len()
    }

    /// Whether the store holds no blobs.
    pub fn is_empty(&self) -> bool {
        self.blobs.is_empty()
    }

    /// Whether a blob exists at `locator`.
    pub fn contains(&self, locator: &BlobLocator) -> bool {
        self.blobs.contains_key(locator.as_str())
    }

    /// The stored bytes for `locator`, or `None` if absent.
    pub fn content(&self, locator: &BlobLocator) -> Option<Bytes> {
        self.blobs.get(locator.as_str()).map(|b| b.data.clone())
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn put(
        &self,
        filename: &str,
        content_type: &str,
        data: Bytes,
    ) -> Result<BlobMetadata, BlobError> {
        let locator = BlobLocator::new(format!("mem-{}", uuid::Uuid::new_v4()));
        let metadata = BlobMetadata {
            locator: locator.clone(),
            filename: filename.to_owned(),
            content_type: content_type.to_owned(),
            size_bytes: data.len() as u64,
            created_at: Utc::now(),
        };
        self.blobs.insert(
            locator.as_str().to_owned(),
            StoredBlob {
                metadata: metadata.clone(),
                data,
            },
        );
        Ok(metadata)
    }

    async fn delete(&self, locator: &BlobLocator) -> Result<bool, BlobError> {
        Ok(self.blobs.remove(locator.as_str()).is_some())
    }

    async fn retrieval_url(
        &self,
        locator: &BlobLocator,
        ttl: Duration,
    ) -> Result<String, BlobError> {
        let Some(blob) = self.blobs.get(locator.as_str()) else {
            return Err(BlobError::NotFound(locator.to_string()));
        };
        let expires_at = Utc::now()
            + chrono::TimeDelta::from_std(ttl)
                .map_err(|e| BlobError::Storage(format!("invalid ttl: {e}")))?;
        Ok(format!(
            "memory://{}/{}?expires={}",
            locator,
            blob.metadata.filename,
            expires_at.timestamp()
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn put_assigns_unique_locators() {
        let store = MemoryBlobStore::new();
        let a = store
            .put("a.pdf", "application/pdf", Bytes::from_static(b"aaa"))
            .await
            .unwrap();
        let b = store
            .put("b.pdf", "application/pdf", Bytes::from_static(b"bbb"))
            .await
            .unwrap();
        assert_ne!(a.locator, b.locator);
        assert_eq!(a.size_bytes, 3);
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn content_returns_stored_bytes_until_deleted() {
        let store = MemoryBlobStore::new();
        let meta = store
            .put("notes.pdf", "application/pdf", Bytes::from_static(b"%PDF-1.4 body"))
            .await
            .unwrap();

        assert_eq!(
            store.content(&meta.locator),
            Some(Bytes::from_static(b"%PDF-1.4 body"))
        );

        store.delete(&meta.locator).await.unwrap();
        assert_eq!(store.content(&meta.locator), None);
    }

    #[tokio::test]
    async fn retrieval_url_carries_locator_and_expiry() {
        let store = MemoryBlobStore::new();
        let meta = store
            .put("exam.pdf", "application/pdf", Bytes::from_static(b"pdf"))
            .await
            .unwrap();

        let url = store
            .retrieval_url(&meta.locator, Duration::from_secs(300))
            .await
            .unwrap();
        assert!(url.starts_with("memory://"));
        assert!(url.contains(meta.locator.as_str()));
        assert!(url.contains("expires="));
    }

    #[tokio::test]
    async fn retrieval_url_for_missing_blob_fails() {
        let store = MemoryBlobStore::new();
        let err = store
            .retrieval_url(&BlobLocator::new("nope"), Duration::from_secs(60))
            .await
            .unwrap_err();
        assert!(matches!(err, BlobError::NotFound(_)));
    }

    #[tokio::test]
    async fn delete_is_idempotent_on_missing() {
        let store = MemoryBlobStore::new();
        let meta = store
            .put("x.pdf", "application/pdf", Bytes::from_static(b"x"))
            .await
            .unwrap();
        assert!(store.delete(&meta.locator).await.unwrap());
        assert!(!store.delete(&meta.locator).await.unwrap());
        assert!(store.is_empty());
    }
}
