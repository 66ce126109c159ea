use std::sync::Arc;

use tracing::{debug, error, info};

use campusdocs_blob::{BlobLocator, BlobStore};
use campusdocs_core::{Document, DocumentId, DocumentStatus};
use campusdocs_state::CommitResult;

use crate::error::LedgerError;
use crate::protocol::{ApprovalOutcome, CreditProtocol};

/// Moderation entry points: the pending queue and the two decisions.
///
/// Approval delegates to the credit protocol so the uploader's reward is
/// never decoupled from the status flip. Rejection deletes the registry
/// entry and then the stored file, in that order.
pub struct ModerationGate {
    protocol: Arc<CreditProtocol>,
    blobs: Arc<dyn BlobStore>,
}

impl ModerationGate {
    pub fn new(protocol: Arc<CreditProtocol>, blobs: Arc<dyn BlobStore>) -> Self {
        Self { protocol, blobs }
    }

    /// Documents awaiting a decision, newest first.
    pub async fn queue(&self) -> Result<Vec<Document>, LedgerError> {
        self.protocol.registry().list_pending().await
    }

    /// Approve a pending document, granting the uploader's reward in the
    /// same atomic unit. Re-approving is a benign no-op.
    pub async fn approve(&self, id: &DocumentId) -> Result<ApprovalOutcome, LedgerError> {
        let outcome = self.protocol.grant_on_approval(id).await?;
        if let ApprovalOutcome::Approved { reward_granted, .. } = &outcome {
            info!(document = %id, reward_granted, "document approved");
        }
        Ok(outcome)
    }

    /// Reject a pending document: the registry entry is removed first, then
    /// the stored file. If the blob delete fails the entry is not
    /// resurrected; the orphaned blob is reported and left behind.
    ///
    /// The removal is conditioned on the version of the `pending` read, so
    /// a reject racing an approval cannot delete the approved document; it
    /// re-reads, observes the terminal status and refuses.
    pub async fn reject(&self, id: &DocumentId) -> Result<(), LedgerError> {
        let max_attempts = self.protocol.config().max_txn_attempts;

        for attempt in 1..=max_attempts {
            let (doc, version) = self.protocol.registry().get_versioned(id).await?;
            if doc.status != DocumentStatus::Pending {
                return Err(LedgerError::AlreadyProcessed(id.clone()));
            }

            match self.protocol.registry().remove_at(id, version).await? {
                CommitResult::Ok => {
                    info!(document = %id, uploader = %doc.uploader_id, "document rejected");

                    let locator = BlobLocator::new(doc.storage_locator);
                    if let Err(e) = self.blobs.delete(&locator).await {
                        error!(document = %id, locator = %locator, error = %e, "blob delete failed after rejection");
                        return Err(LedgerError::StorageInconsistency {
                            locator: locator.to_string(),
                            reason: e.to_string(),
                        });
                    }
                    return Ok(());
                }
                CommitResult::Conflict { .. } => {
                    debug!(document = %id, attempt, "reject commit conflicted, retrying");
                }
            }
        }

        Err(LedgerError::Conflict {
            attempts: max_attempts,
        })
    }
}
