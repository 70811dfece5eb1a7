use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        Extension, Multipart, Path, State,
    },
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use serde_json::{json, Value};
use tracing::debug;

use crate::api::format::FileMetadataView;
use crate::app::AppState;
use crate::database::models::FilePayload;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser, Capability};
use crate::services::uploads::{mime_for_extension, UPLOAD_FIELDS};
use crate::services::UploadCategory;

use super::parse_id;

/// First non-empty file part of a multipart body
struct Upload {
    filename: String,
    data: Vec<u8>,
}

fn multipart_error(err: MultipartError) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::payload_too_large(err.body_text())
    } else {
        ApiError::bad_request(err.body_text())
    }
}

async fn read_upload(multipart: Result<Multipart, MultipartRejection>) -> Result<Upload, ApiError> {
    let mut multipart = multipart.map_err(|e| ApiError::bad_request(e.body_text()))?;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or_default().to_string();
        if !UPLOAD_FIELDS.contains(&name.as_str()) {
            return Err(ApiError::validation_error(
                format!("Unexpected form field '{}'", name),
                None,
            ));
        }

        let filename = field.file_name().unwrap_or_default().to_string();
        let data = field.bytes().await.map_err(multipart_error)?;
        if data.is_empty() {
            debug!("Skipping empty upload part '{}'", name);
            continue;
        }

        return Ok(Upload {
            filename,
            data: data.to_vec(),
        });
    }

    Err(ApiError::validation_error("Empty request", None))
}

async fn upload(
    state: AppState,
    group: String,
    category: UploadCategory,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<FileMetadataView> {
    let upload = read_upload(multipart).await?;
    let extension = state
        .uploads
        .validate(category, &upload.filename, upload.data.len())?;

    let file = state
        .files
        .add(
            &group,
            FilePayload {
                extension,
                data: upload.data,
            },
            &state.cancel_token(),
        )
        .await?;
    Ok(ApiResponse::created(FileMetadataView::from(&file)))
}

/// Raw bytes with the content type derived from the stored extension. A file
/// whose extension is outside `category` is reported as missing.
async fn serve(state: AppState, raw_id: String, category: UploadCategory) -> Result<Response, ApiError> {
    let id = parse_id(&raw_id)?;
    let file = state.files.get_by_id(id, &state.cancel_token()).await?;

    if !state.uploads.accepts(category, &file.payload.extension) {
        return Err(ApiError::not_found(format!("Not found: file {}", id)));
    }

    let content_type = mime_for_extension(&file.payload.extension);
    Ok(([(header::CONTENT_TYPE, content_type)], file.payload.data).into_response())
}

/// GET /api/groups/:group/files - File metadata (no bytes) for a group
pub async fn group_get(
    State(state): State<AppState>,
    Path(group): Path<String>,
    Extension(auth_user): Extension<AuthUser>,
) -> ApiResult<Vec<FileMetadataView>> {
    auth_user.require(Capability::Read)?;

    let files = state.files.get_by_group(&group, &state.cancel_token()).await?;
    Ok(ApiResponse::success(files.iter().map(FileMetadataView::from).collect()))
}

/// POST /api/groups/:group/documents - multipart upload of a document
pub async fn document_post(
    State(state): State<AppState>,
    Path(group): Path<String>,
    Extension(auth_user): Extension<AuthUser>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<FileMetadataView> {
    auth_user.require(Capability::Write)?;
    upload(state, group, UploadCategory::Document, multipart).await
}

/// POST /api/groups/:group/images - multipart upload of an image
pub async fn image_post(
    State(state): State<AppState>,
    Path(group): Path<String>,
    Extension(auth_user): Extension<AuthUser>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<FileMetadataView> {
    auth_user.require(Capability::Write)?;
    upload(state, group, UploadCategory::Image, multipart).await
}

/// GET /api/documents/:id
pub async fn document_get(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Extension(auth_user): Extension<AuthUser>,
) -> Result<Response, ApiError> {
    auth_user.require(Capability::Read)?;
    serve(state, id, UploadCategory::Document).await
}

/// GET /api/images/:id
pub async fn image_get(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Extension(auth_user): Extension<AuthUser>,
) -> Result<Response, ApiError> {
    auth_user.require(Capability::Read)?;
    serve(state, id, UploadCategory::Image).await
}

/// PUT /api/files/:id - Replace bytes and extension of an existing file
pub async fn record_put(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Extension(auth_user): Extension<AuthUser>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<FileMetadataView> {
    auth_user.require(Capability::Write)?;
    let id = parse_id(&id)?;

    let upload = read_upload(multipart).await?;
    let extension = state.uploads.validate_any(&upload.filename, upload.data.len())?;

    let file = state
        .files
        .update_by_id(
            id,
            FilePayload {
                extension,
                data: upload.data,
            },
            &state.cancel_token(),
        )
        .await?;
    Ok(ApiResponse::success(FileMetadataView::from(&file)))
}

/// DELETE /api/files/:id - Succeeds whether or not the file existed
pub async fn record_delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Extension(auth_user): Extension<AuthUser>,
) -> ApiResult<Value> {
    auth_user.require(Capability::Write)?;
    let id = parse_id(&id)?;

    state.files.delete_by_id(id, &state.cancel_token()).await?;
    Ok(ApiResponse::success(json!({ "id": id, "deleted": true })))
}
