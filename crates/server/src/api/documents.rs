use axum::Json;
use axum::extract::{Extension, Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use bytes::Bytes;
use tracing::warn;

use campusdocs_blob::BlobError;
use campusdocs_core::{DocumentFilter, DocumentId, NewDocument};

use crate::auth::Identity;
use crate::error::ServerError;

use super::AppState;
use super::schemas::{DocumentListResponse, DownloadResponse, UploadResponse};

struct UploadForm {
    title: String,
    faculty: String,
    subject: String,
    year: i32,
    kind: String,
    credits_cost: Option<u64>,
    filename: String,
    content_type: String,
    data: Bytes,
}

async fn parse_upload(mut multipart: Multipart) -> Result<UploadForm, ServerError> {
    let mut title = None;
    let mut faculty = None;
    let mut subject = None;
    let mut year = None;
    let mut kind = None;
    let mut credits_cost = None;
    let mut file = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ServerError::BadRequest(format!("malformed multipart body: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_owned();
        match name.as_str() {
            "title" => title = Some(read_text(field, &name).await?),
            "faculty" => faculty = Some(read_text(field, &name).await?),
            "subject" => subject = Some(read_text(field, &name).await?),
            "kind" => kind = Some(read_text(field, &name).await?),
            "year" => {
                let raw = read_text(field, &name).await?;
                year = Some(raw.parse::<i32>().map_err(|_| {
                    ServerError::BadRequest(format!("invalid year: {raw}"))
                })?);
            }
            "credits_cost" => {
                let raw = read_text(field, &name).await?;
                credits_cost = Some(raw.parse::<u64>().map_err(|_| {
                    ServerError::BadRequest(format!("invalid credits_cost: {raw}"))
                })?);
            }
            "file" => {
                let filename = field.file_name().unwrap_or("document.pdf").to_owned();
                let content_type = field.content_type().unwrap_or_default().to_owned();
                let data = field.bytes().await.map_err(|e| {
                    ServerError::BadRequest(format!("failed to read file field: {e}"))
                })?;
                file = Some((filename, content_type, data));
            }
            _ => {}
        }
    }

    let (filename, content_type, data) =
        file.ok_or_else(|| ServerError::BadRequest("missing file field".to_owned()))?;

    Ok(UploadForm {
        title: require(title, "title")?,
        faculty: require(faculty, "faculty")?,
        subject: require(subject, "subject")?,
        year: require(year, "year")?,
        kind: require(kind, "kind")?,
        credits_cost,
        filename,
        content_type,
        data,
    })
}

async fn read_text(
    field: axum::extract::multipart::Field<'_>,
    name: &str,
) -> Result<String, ServerError> {
    field
        .text()
        .await
        .map_err(|e| ServerError::BadRequest(format!("failed to read field {name}: {e}")))
}

fn require<T>(value: Option<T>, name: &str) -> Result<T, ServerError> {
    value.ok_or_else(|| ServerError::BadRequest(format!("missing field: {name}")))
}

/// `POST /v1/documents` -- upload a document for moderation.
#[utoipa::path(
    post,
    path = "/v1/documents",
    tag = "Documents",
    summary = "Upload a document",
    description = "Stores the file and registers a pending submission. \
                   Multipart form fields: title, faculty, subject, year, kind, \
                   optional credits_cost, and the file itself.",
    responses(
        (status = 201, description = "Submission registered, awaiting moderation", body = UploadResponse),
        (status = 413, description = "File exceeds the size limit", body = super::schemas::ErrorResponse),
        (status = 415, description = "Content type not accepted", body = super::schemas::ErrorResponse)
    )
)]
pub async fn upload(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    multipart: Multipart,
) -> Result<impl IntoResponse, ServerError> {
    let form = parse_upload(multipart).await?;

    if !state
        .upload
        .allowed_content_types
        .iter()
        .any(|ct| ct.eq_ignore_ascii_case(&form.content_type))
    {
        return Err(ServerError::Blob(BlobError::InvalidContentType(
            form.content_type,
        )));
    }
    let size = form.data.len() as u64;
    if size > state.upload.max_bytes {
        return Err(ServerError::Blob(BlobError::TooLarge {
            size,
            limit: state.upload.max_bytes,
        }));
    }

    let metadata = state
        .blobs
        .put(&form.filename, &form.content_type, form.data)
        .await?;

    let created = state
        .protocol
        .registry()
        .create(NewDocument {
            title: form.title,
            faculty: form.faculty,
            subject: form.subject,
            year: form.year,
            kind: form.kind,
            uploader_id: identity.user_id,
            credits_cost: form.credits_cost,
            storage_locator: metadata.locator.to_string(),
        })
        .await;

    let document = match created {
        Ok(document) => document,
        Err(e) => {
            // Best-effort cleanup so a failed registration doesn't strand
            // the uploaded blob.
            if let Err(del) = state.blobs.delete(&metadata.locator).await {
                warn!(locator = %metadata.locator, error = %del, "orphaned blob after failed registration");
            }
            return Err(e.into());
        }
    };

    Ok((StatusCode::CREATED, Json(UploadResponse { document })))
}

/// `GET /v1/documents` -- browse approved documents.
#[utoipa::path(
    get,
    path = "/v1/documents",
    tag = "Documents",
    summary = "List approved documents",
    description = "Returns approved documents, newest first. Faculty and year \
                   filter exactly; subject is a substring match.",
    params(DocumentFilter),
    responses(
        (status = 200, description = "Matching documents", body = DocumentListResponse)
    )
)]
pub async fn list(
    State(state): State<AppState>,
    Query(filter): Query<DocumentFilter>,
) -> Result<impl IntoResponse, ServerError> {
    let documents = state.protocol.registry().list_approved(&filter).await?;
    Ok((StatusCode::OK, Json(DocumentListResponse { documents })))
}

/// `POST /v1/documents/{id}/download` -- pay for and download a document.
#[utoipa::path(
    post,
    path = "/v1/documents/{id}/download",
    tag = "Documents",
    summary = "Download a document",
    description = "Debits the document's cost from the caller's balance and \
                   returns a short-lived retrieval URL. The balance check and \
                   the debit are one atomic unit.",
    params(("id" = String, Path, description = "Document id")),
    responses(
        (status = 200, description = "Debit committed, URL issued", body = DownloadResponse),
        (status = 402, description = "Insufficient credits", body = super::schemas::ErrorResponse),
        (status = 403, description = "Document is not approved", body = super::schemas::ErrorResponse),
        (status = 404, description = "No such document", body = super::schemas::ErrorResponse)
    )
)]
pub async fn download(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ServerError> {
    let grant = state
        .downloads
        .download(&identity.user_id, &DocumentId::new(id))
        .await?;
    Ok((
        StatusCode::OK,
        Json(DownloadResponse {
            url: grant.url,
            cost: grant.cost,
            remaining_credits: grant.remaining_credits,
        }),
    ))
}
