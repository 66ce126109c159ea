use std::sync::Arc;

use chrono::Utc;

use campusdocs_core::{Document, DocumentFilter, DocumentId, DocumentStatus, NewDocument};
use campusdocs_state::{Collection, CommitResult, Precondition, RecordStore, StateError, WriteOp};

use crate::codec;
use crate::error::LedgerError;
use crate::users::CoupledWrite;

/// The document registry: metadata and lifecycle status for submissions.
///
/// Status transitions never happen here on their own; approval goes through
/// the credit protocol's atomic unit (via [`stage_status`](Self::stage_status))
/// so the credit grant cannot decouple from the status flip.
pub struct DocumentRegistry {
    store: Arc<dyn RecordStore>,
    default_cost: u64,
}

impl DocumentRegistry {
    pub fn new(store: Arc<dyn RecordStore>, default_cost: u64) -> Self {
        Self {
            store,
            default_cost: default_cost.max(1),
        }
    }

    /// Register a new submission. Status is forced to `pending` and the
    /// per-download cost defaults when absent (and is floored at 1).
    pub async fn create(&self, new_doc: NewDocument) -> Result<Document, LedgerError> {
        let doc = Document {
            id: DocumentId::generate(),
            title: new_doc.title,
            faculty: new_doc.faculty,
            subject: new_doc.subject,
            year: new_doc.year,
            kind: new_doc.kind,
            uploader_id: new_doc.uploader_id,
            credits_cost: new_doc.credits_cost.unwrap_or(self.default_cost).max(1),
            status: DocumentStatus::Pending,
            storage_locator: new_doc.storage_locator,
            created_at: Utc::now(),
        };
        let created = self
            .store
            .check_and_set(&codec::document_key(&doc.id), &codec::encode(&doc)?)
            .await?;
        if !created {
            // A v4 UUID collision; not worth a retry loop.
            return Err(LedgerError::State(StateError::Backend(format!(
                "document id collision: {}",
                doc.id
            ))));
        }
        Ok(doc)
    }

    /// Fetch a document, or `None` if absent.
    pub async fn try_get(&self, id: &DocumentId) -> Result<Option<Document>, LedgerError> {
        match self.store.get(&codec::document_key(id)).await? {
            Some(record) => Ok(Some(codec::decode(&record.value)?)),
            None => Ok(None),
        }
    }

    /// Fetch a document, failing if absent.
    pub async fn get(&self, id: &DocumentId) -> Result<Document, LedgerError> {
        self.try_get(id)
            .await?
            .ok_or_else(|| LedgerError::RecordNotFound(format!("document {id}")))
    }

    /// Fetch a document together with its record version, for staging a
    /// status transition into an atomic unit.
    pub async fn get_versioned(&self, id: &DocumentId) -> Result<(Document, u64), LedgerError> {
        let record = self
            .store
            .get(&codec::document_key(id))
            .await?
            .ok_or_else(|| LedgerError::RecordNotFound(format!("document {id}")))?;
        Ok((codec::decode(&record.value)?, record.version))
    }

    /// All approved documents matching the filter. The predicate is
    /// evaluated here over a full collection scan; result sets are small
    /// and there is no pagination.
    pub async fn list_approved(
        &self,
        filter: &DocumentFilter,
    ) -> Result<Vec<Document>, LedgerError> {
        self.list_with_status(DocumentStatus::Approved, Some(filter))
            .await
    }

    /// All documents awaiting moderation.
    pub async fn list_pending(&self) -> Result<Vec<Document>, LedgerError> {
        self.list_with_status(DocumentStatus::Pending, None).await
    }

    async fn list_with_status(
        &self,
        status: DocumentStatus,
        filter: Option<&DocumentFilter>,
    ) -> Result<Vec<Document>, LedgerError> {
        let records = self.store.scan(Collection::Documents).await?;
        let mut docs = Vec::new();
        for (_, record) in records {
            let doc: Document = codec::decode(&record.value)?;
            if doc.status == status && filter.is_none_or(|f| f.matches(&doc)) {
                docs.push(doc);
            }
        }
        // Scan order is unspecified; newest submissions first.
        docs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(docs)
    }

    /// Stage a status transition as a coupled write for the protocol's
    /// atomic unit. Returns the transitioned document and the write op
    /// carrying the version precondition from the caller's read.
    pub(crate) fn stage_status(
        doc: &Document,
        version: u64,
        status: DocumentStatus,
    ) -> Result<(Document, CoupledWrite), LedgerError> {
        let mut updated = doc.clone();
        updated.status = status;
        let key = codec::document_key(&doc.id);
        let value = codec::encode(&updated)?;
        Ok((
            updated,
            CoupledWrite {
                precondition: Precondition::at_version(key.clone(), version),
                write: WriteOp::Put { key, value },
            },
        ))
    }

    /// Remove a registry entry, conditioned on the version from the
    /// caller's read. Used only by the rejection path: the precondition
    /// keeps a stale reject from deleting a document a concurrent
    /// approval has already committed.
    pub(crate) async fn remove_at(
        &self,
        id: &DocumentId,
        version: u64,
    ) -> Result<CommitResult, LedgerError> {
        let key = codec::document_key(id);
        Ok(self
            .store
            .commit(
                &[Precondition::at_version(key.clone(), version)],
                &[WriteOp::Delete { key }],
            )
            .await?)
    }
}
