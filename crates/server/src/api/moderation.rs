use axum::Json;
use axum::extract::{Extension, Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;

use campusdocs_core::{DocumentId, DocumentStatus, Role};
use campusdocs_ledger::ApprovalOutcome;

use crate::auth::Identity;
use crate::error::ServerError;

use super::AppState;
use super::schemas::{ApproveResponse, DocumentListResponse, RejectResponse};

/// The caller's role is read from their ledger record on every request, so
/// revoking moderator status takes immediate effect.
async fn require_moderator(state: &AppState, identity: &Identity) -> Result<(), ServerError> {
    let user = state
        .protocol
        .users()
        .try_get(&identity.user_id)
        .await?
        .ok_or_else(|| ServerError::Forbidden("caller is not registered".to_owned()))?;
    if user.role != Role::Moderator {
        return Err(ServerError::Forbidden(
            "moderator role required".to_owned(),
        ));
    }
    Ok(())
}

/// `GET /v1/moderation/queue` -- documents awaiting a decision.
#[utoipa::path(
    get,
    path = "/v1/moderation/queue",
    tag = "Moderation",
    summary = "Pending queue",
    description = "Returns documents awaiting moderation, newest first.",
    responses(
        (status = 200, description = "Pending documents", body = DocumentListResponse),
        (status = 403, description = "Caller is not a moderator", body = super::schemas::ErrorResponse)
    )
)]
pub async fn queue(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> Result<impl IntoResponse, ServerError> {
    require_moderator(&state, &identity).await?;
    let documents = state.moderation.queue().await?;
    Ok((StatusCode::OK, Json(DocumentListResponse { documents })))
}

/// `POST /v1/moderation/{id}/approve` -- approve a pending document.
#[utoipa::path(
    post,
    path = "/v1/moderation/{id}/approve",
    tag = "Moderation",
    summary = "Approve a document",
    description = "Flips the document to approved and credits the uploader's \
                   reward in one atomic unit. Approving an already-processed \
                   document is a no-op that reports the current status.",
    params(("id" = String, Path, description = "Document id")),
    responses(
        (status = 200, description = "Decision recorded", body = ApproveResponse),
        (status = 403, description = "Caller is not a moderator", body = super::schemas::ErrorResponse),
        (status = 404, description = "No such document", body = super::schemas::ErrorResponse)
    )
)]
pub async fn approve(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ServerError> {
    require_moderator(&state, &identity).await?;
    let outcome = state.moderation.approve(&DocumentId::new(id)).await?;

    let body = match outcome {
        ApprovalOutcome::Approved {
            reward_granted,
            uploader_balance,
        } => ApproveResponse {
            status: DocumentStatus::Approved,
            reward_granted,
            uploader_balance,
        },
        ApprovalOutcome::AlreadyProcessed { status } => ApproveResponse {
            status,
            reward_granted: false,
            uploader_balance: None,
        },
    };
    Ok((StatusCode::OK, Json(body)))
}

/// `POST /v1/moderation/{id}/reject` -- reject a pending document.
#[utoipa::path(
    post,
    path = "/v1/moderation/{id}/reject",
    tag = "Moderation",
    summary = "Reject a document",
    description = "Removes the registry entry and deletes the stored file. No \
                   credits move. Rejecting an already-processed document fails \
                   with a conflict.",
    params(("id" = String, Path, description = "Document id")),
    responses(
        (status = 200, description = "Document rejected and removed", body = RejectResponse),
        (status = 403, description = "Caller is not a moderator", body = super::schemas::ErrorResponse),
        (status = 404, description = "No such document", body = super::schemas::ErrorResponse),
        (status = 409, description = "Document already processed", body = super::schemas::ErrorResponse)
    )
)]
pub async fn reject(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ServerError> {
    require_moderator(&state, &identity).await?;
    state.moderation.reject(&DocumentId::new(id)).await?;
    Ok((
        StatusCode::OK,
        Json(RejectResponse {
            status: DocumentStatus::Rejected,
        }),
    ))
}
