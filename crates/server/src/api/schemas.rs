use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use campusdocs_core::{Document, DocumentStatus, User};

/// Health check response.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// Service status indicator.
    #[schema(example = "ok")]
    pub status: String,
    /// Server version.
    #[schema(example = "0.1.0")]
    pub version: String,
}

/// Request body for completing registration.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RegisterRequest {
    /// Display name shown alongside contributions.
    #[schema(example = "Ada L.")]
    pub display_name: String,
}

/// Response after registration.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RegisterResponse {
    /// The ledger record, freshly created or pre-existing.
    pub user: User,
    /// Whether this call created the record (and granted the bonus).
    #[schema(example = true)]
    pub newly_created: bool,
}

/// A page of documents.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DocumentListResponse {
    /// Matching documents, newest first.
    pub documents: Vec<Document>,
}

/// Response after a successful upload.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UploadResponse {
    /// The registered document, awaiting moderation.
    pub document: Document,
}

/// Response for a paid download.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DownloadResponse {
    /// Short-lived retrieval URL for the file content.
    pub url: String,
    /// Credits charged.
    #[schema(example = 1)]
    pub cost: u64,
    /// Caller's balance after the debit.
    #[schema(example = 2)]
    pub remaining_credits: u64,
}

/// Response after a moderation approval.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApproveResponse {
    /// The document's status after the call.
    pub status: DocumentStatus,
    /// Whether the uploader's reward was granted by this call.
    #[schema(example = true)]
    pub reward_granted: bool,
    /// The uploader's balance after the grant, when one was made.
    #[schema(example = 8)]
    pub uploader_balance: Option<u64>,
}

/// Response after a moderation rejection.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RejectResponse {
    /// Always `rejected`.
    pub status: DocumentStatus,
}

/// Generic error response returned on failures.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Error message.
    #[schema(example = "insufficient balance: have 0, need 1")]
    pub error: String,
}
