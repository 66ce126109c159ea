use thiserror::Error;

/// Errors that can occur during blob storage operations.
#[derive(Debug, Error)]
pub enum BlobError {
    /// The requested blob was not found.
    #[error("blob not found: {0}")]
    NotFound(String),

    /// The blob exceeds the maximum allowed size.
    #[error("blob too large: {size} bytes exceeds limit of {limit} bytes")]
    TooLarge {
        /// Actual size.
        size: u64,
        /// Maximum allowed size.
        limit: u64,
    },

    /// The content type is invalid or not allowed.
    #[error("invalid content type: {0}")]
    InvalidContentType(String),

    /// A storage backend error occurred.
    #[error("blob storage error: {0}")]
    Storage(String),
}
