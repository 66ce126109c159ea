use axum::Json;
use axum::extract::{Extension, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;

use campusdocs_core::Role;
use campusdocs_ledger::NewUser;

use crate::auth::Identity;
use crate::error::ServerError;

use super::AppState;
use super::schemas::{RegisterRequest, RegisterResponse};

/// `POST /v1/register` -- create the caller's ledger record with the
/// welcome bonus.
#[utoipa::path(
    post,
    path = "/v1/register",
    tag = "Users",
    summary = "Complete registration",
    description = "Creates the caller's ledger record and grants the welcome \
                   bonus. Idempotent: repeat calls return the existing record \
                   without granting again.",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Record created, bonus granted", body = RegisterResponse),
        (status = 200, description = "Record already existed", body = RegisterResponse),
        (status = 401, description = "Missing or invalid token", body = super::schemas::ErrorResponse)
    )
)]
pub async fn register(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(request): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ServerError> {
    let outcome = state
        .protocol
        .grant_on_registration(NewUser {
            id: identity.user_id,
            email: identity.email,
            display_name: request.display_name,
            role: Role::Member,
        })
        .await?;

    let status = if outcome.newly_created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    let body = RegisterResponse {
        user: outcome.user,
        newly_created: outcome.newly_created,
    };
    Ok((status, Json(body)))
}

/// `GET /v1/me` -- the caller's ledger record.
#[utoipa::path(
    get,
    path = "/v1/me",
    tag = "Users",
    summary = "Current user",
    description = "Returns the caller's ledger record, including the current \
                   credit balance.",
    responses(
        (status = 200, description = "The caller's record", body = campusdocs_core::User),
        (status = 404, description = "Caller has not registered", body = super::schemas::ErrorResponse)
    )
)]
pub async fn me(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> Result<impl IntoResponse, ServerError> {
    let user = state.protocol.users().get(&identity.user_id).await?;
    Ok((StatusCode::OK, Json(user)))
}
