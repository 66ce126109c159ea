use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use campusdocs_blob::{BlobLocator, BlobStore};
use campusdocs_core::{DocumentId, DocumentStatus, UserId};

use crate::error::LedgerError;
use crate::protocol::CreditProtocol;

/// A paid-for download: the retrieval URL plus the debit that bought it.
#[derive(Debug, Clone)]
pub struct DownloadGrant {
    pub url: String,
    pub cost: u64,
    pub remaining_credits: u64,
}

/// Download entry point: charges the requester, then issues a short-lived
/// retrieval URL for the stored file.
///
/// The debit and the URL issuance are not one atomic unit. A URL failure
/// after a committed debit loses the credit; this gap is accepted because
/// the memory and object-store backends only fail there on misuse.
pub struct DownloadGate {
    protocol: Arc<CreditProtocol>,
    blobs: Arc<dyn BlobStore>,
    url_ttl: Duration,
}

impl DownloadGate {
    pub fn new(protocol: Arc<CreditProtocol>, blobs: Arc<dyn BlobStore>, url_ttl: Duration) -> Self {
        Self {
            protocol,
            blobs,
            url_ttl,
        }
    }

    /// Charge `user_id` the document's cost and return the retrieval URL.
    ///
    /// Only approved documents are downloadable; the sufficiency check runs
    /// inside the debit's atomic unit, so a failed debit leaves the balance
    /// untouched and no URL is issued.
    pub async fn download(
        &self,
        user_id: &UserId,
        document_id: &DocumentId,
    ) -> Result<DownloadGrant, LedgerError> {
        let doc = self.protocol.registry().get(document_id).await?;
        if doc.status != DocumentStatus::Approved {
            return Err(LedgerError::NotApproved(document_id.clone()));
        }

        let debit = self
            .protocol
            .debit_on_download(user_id, doc.credits_cost)
            .await?;

        let locator = BlobLocator::new(doc.storage_locator);
        let url = self.blobs.retrieval_url(&locator, self.url_ttl).await?;
        debug!(user = %user_id, document = %document_id, cost = debit.cost, "download granted");

        Ok(DownloadGrant {
            url,
            cost: debit.cost,
            remaining_credits: debit.remaining,
        })
    }
}
