use campusdocs_core::{Document, DocumentStatus, Role, User};

use super::schemas::{
    ApproveResponse, DocumentListResponse, DownloadResponse, ErrorResponse, HealthResponse,
    RegisterRequest, RegisterResponse, RejectResponse, UploadResponse,
};

#[derive(utoipa::OpenApi)]
#[openapi(
    info(
        title = "CampusDocs API",
        version = "0.1.0",
        description = "HTTP API for the CampusDocs document-sharing platform. \
                       Students upload course documents, moderators review \
                       them, and approved documents are downloaded by \
                       spending credits.",
        license(name = "Apache-2.0")
    ),
    tags(
        (name = "Health", description = "Service health"),
        (name = "Users", description = "Registration and the caller's ledger record"),
        (name = "Documents", description = "Upload, browse, and paid download"),
        (name = "Moderation", description = "Pending queue and approve/reject decisions")
    ),
    paths(
        super::health::health,
        super::users::register,
        super::users::me,
        super::documents::upload,
        super::documents::list,
        super::documents::download,
        super::moderation::queue,
        super::moderation::approve,
        super::moderation::reject,
    ),
    components(schemas(
        User, Role, Document, DocumentStatus,
        HealthResponse, RegisterRequest, RegisterResponse,
        DocumentListResponse, UploadResponse, DownloadResponse,
        ApproveResponse, RejectResponse,
        ErrorResponse,
    ))
)]
pub struct ApiDoc;
