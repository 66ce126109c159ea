use thiserror::Error;

use campusdocs_blob::BlobError;
use campusdocs_core::DocumentId;
use campusdocs_state::StateError;

/// Errors surfaced by the credit transaction protocol and its gates.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// A debit precondition failed; nothing was mutated.
    #[error("insufficient balance: have {available}, need {required}")]
    InsufficientBalance { available: u64, required: u64 },

    /// A ledger or registry record was missing at operation time.
    #[error("record not found: {0}")]
    RecordNotFound(String),

    /// Download was requested for a document that is not approved.
    #[error("document not available for download: {0}")]
    NotApproved(DocumentId),

    /// A moderation decision targeted a document that already left `pending`.
    #[error("document already processed: {0}")]
    AlreadyProcessed(DocumentId),

    /// The optimistic retry budget was exhausted; the caller may retry the
    /// whole user action.
    #[error("transaction conflict: gave up after {attempts} attempts")]
    Conflict { attempts: u32 },

    /// The registry entry was deleted but the backing blob was not; the
    /// orphaned content is accepted as a known limitation.
    #[error("storage inconsistency: blob {locator} orphaned after registry delete: {reason}")]
    StorageInconsistency { locator: String, reason: String },

    #[error("state error: {0}")]
    State(#[from] StateError),

    #[error("blob error: {0}")]
    Blob(#[from] BlobError),

    #[error("serialization error: {0}")]
    Serialization(String),
}
