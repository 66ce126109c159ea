use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Opaque reference to blob content, independent of any public URL.
///
/// Assigned by the store at `put` time; callers treat it as a handle and
/// never parse it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlobLocator(String);

impl BlobLocator {
    /// Create a locator from a backend-specific handle string.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Return the inner handle as a str slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for BlobLocator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for BlobLocator {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for BlobLocator {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// Metadata for a stored blob.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlobMetadata {
    /// The locator assigned at `put` time.
    pub locator: BlobLocator,
    /// Original filename.
    pub filename: String,
    /// MIME content type (e.g. `"application/pdf"`).
    pub content_type: String,
    /// Size in bytes.
    pub size_bytes: u64,
    /// When the blob was stored.
    pub created_at: DateTime<Utc>,
}
