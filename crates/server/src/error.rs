use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use campusdocs_blob::BlobError;
use campusdocs_ledger::LedgerError;

/// Errors that can occur when running the campusdocs server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// A configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// An I/O error (e.g. binding the listener).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// A ledger-level error surfaced through the API.
    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),

    /// A blob-store error surfaced through the API (upload path).
    #[error("blob error: {0}")]
    Blob(#[from] BlobError),

    /// The request body or parameters were malformed.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Authentication failed (missing or invalid credentials).
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Caller lacks permission for the requested operation.
    #[error("forbidden: {0}")]
    Forbidden(String),
}

fn ledger_status(err: &LedgerError) -> StatusCode {
    match err {
        LedgerError::InsufficientBalance { .. } => StatusCode::PAYMENT_REQUIRED,
        LedgerError::RecordNotFound(_) => StatusCode::NOT_FOUND,
        LedgerError::NotApproved(_) => StatusCode::FORBIDDEN,
        LedgerError::AlreadyProcessed(_) | LedgerError::Conflict { .. } => StatusCode::CONFLICT,
        LedgerError::Blob(e) => blob_status(e),
        LedgerError::StorageInconsistency { .. }
        | LedgerError::State(_)
        | LedgerError::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn blob_status(err: &BlobError) -> StatusCode {
    match err {
        BlobError::NotFound(_) => StatusCode::NOT_FOUND,
        BlobError::TooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
        BlobError::InvalidContentType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
        BlobError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            Self::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg.clone()),
            Self::Forbidden(msg) => (StatusCode::FORBIDDEN, msg.clone()),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            Self::Config(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
            Self::Io(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
            Self::Ledger(e) => (ledger_status(e), e.to_string()),
            Self::Blob(e) => (blob_status(e), e.to_string()),
        };

        if status.is_server_error() {
            tracing::error!(%status, error = %self, "request failed");
        }

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use campusdocs_core::DocumentId;

    use super::*;

    #[test]
    fn insufficient_balance_is_payment_required() {
        let err = ServerError::Ledger(LedgerError::InsufficientBalance {
            available: 0,
            required: 1,
        });
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::PAYMENT_REQUIRED);
    }

    #[test]
    fn conflict_and_already_processed_map_to_409() {
        let conflict = ServerError::Ledger(LedgerError::Conflict { attempts: 5 });
        assert_eq!(conflict.into_response().status(), StatusCode::CONFLICT);

        let processed =
            ServerError::Ledger(LedgerError::AlreadyProcessed(DocumentId::new("d1")));
        assert_eq!(processed.into_response().status(), StatusCode::CONFLICT);
    }

    #[test]
    fn upload_rejections_use_specific_statuses() {
        let too_large = ServerError::Blob(BlobError::TooLarge {
            size: 10,
            limit: 5,
        });
        assert_eq!(
            too_large.into_response().status(),
            StatusCode::PAYLOAD_TOO_LARGE
        );

        let bad_type = ServerError::Blob(BlobError::InvalidContentType("text/html".to_owned()));
        assert_eq!(
            bad_type.into_response().status(),
            StatusCode::UNSUPPORTED_MEDIA_TYPE
        );
    }
}
