pub mod documents;
pub mod health;
pub mod moderation;
pub mod openapi;
pub mod schemas;
pub mod users;

use std::sync::Arc;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use campusdocs_blob::BlobStore;
use campusdocs_ledger::{CreditProtocol, DownloadGate, ModerationGate};

use crate::auth::JwtManager;
use crate::auth::middleware::AuthLayer;

use self::openapi::ApiDoc;

/// Upload acceptance policy, from configuration.
#[derive(Debug, Clone)]
pub struct UploadPolicy {
    /// Maximum accepted file size in bytes.
    pub max_bytes: u64,
    /// Accepted MIME types.
    pub allowed_content_types: Vec<String>,
}

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// The credit transaction protocol (ledger and registry access).
    pub protocol: Arc<CreditProtocol>,
    /// Moderation queue and decisions.
    pub moderation: Arc<ModerationGate>,
    /// Paid download gate.
    pub downloads: Arc<DownloadGate>,
    /// Blob store for uploads.
    pub blobs: Arc<dyn BlobStore>,
    /// Upload acceptance policy.
    pub upload: Arc<UploadPolicy>,
    /// Token issuance and validation.
    pub jwt: Arc<JwtManager>,
}

/// Build the Axum router with all API routes, middleware, and Swagger UI.
pub fn router(state: AppState) -> Router {
    let public = Router::new().route("/health", get(health::health));

    // Multipart parsing needs headroom beyond the file size cap.
    let body_limit = usize::try_from(state.upload.max_bytes)
        .unwrap_or(usize::MAX)
        .saturating_add(64 * 1024);

    let protected = Router::new()
        // Users
        .route("/v1/register", post(users::register))
        .route("/v1/me", get(users::me))
        // Documents
        .route(
            "/v1/documents",
            get(documents::list).post(documents::upload),
        )
        .route("/v1/documents/{id}/download", post(documents::download))
        // Moderation
        .route("/v1/moderation/queue", get(moderation::queue))
        .route("/v1/moderation/{id}/approve", post(moderation::approve))
        .route("/v1/moderation/{id}/reject", post(moderation::reject))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(AuthLayer::new(Arc::clone(&state.jwt)));

    Router::new()
        .merge(public)
        .merge(protected)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
