use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::BlobError;
use crate::types::{BlobLocator, BlobMetadata};

/// Pluggable blob storage backend for document content.
///
/// Implementors provide the actual storage mechanism (e.g. a cloud bucket,
/// the filesystem, or memory for tests). The platform never serves blob
/// bytes itself; downloads go through time-limited retrieval URLs.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store a blob and return its metadata, including the assigned locator.
    async fn put(
        &self,
        filename: &str,
        content_type: &str,
        data: Bytes,
    ) -> Result<BlobMetadata, BlobError>;

    /// Delete a blob. Returns `true` if the blob existed.
    async fn delete(&self, locator: &BlobLocator) -> Result<bool, BlobError>;

    /// Produce a time-limited retrieval URL for a blob.
    ///
    /// Returns [`BlobError::NotFound`] if no blob exists at `locator`.
    async fn retrieval_url(
        &self,
        locator: &BlobLocator,
        ttl: Duration,
    ) -> Result<String, BlobError>;
}
