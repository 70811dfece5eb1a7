use axum::{
    extract::{rejection::JsonRejection, Extension, Path, State},
    Json,
};
use serde_json::{json, Value};

use crate::api::format::JsonDocumentView;
use crate::app::AppState;
use crate::database::models::JsonPayload;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser, Capability};

use super::parse_id;

fn payload_from(body: Result<Json<Value>, JsonRejection>) -> Result<JsonPayload, ApiError> {
    let Json(value) = body.map_err(|e| ApiError::invalid_json(e.body_text()))?;
    Ok(JsonPayload(value.to_string()))
}

/// GET /api/groups/:group/json - All JSON documents in a group
pub async fn group_get(
    State(state): State<AppState>,
    Path(group): Path<String>,
    Extension(auth_user): Extension<AuthUser>,
) -> ApiResult<Vec<JsonDocumentView>> {
    auth_user.require(Capability::Read)?;

    let docs = state.json.get_by_group(&group, &state.cancel_token()).await?;
    Ok(ApiResponse::success(docs.iter().map(JsonDocumentView::from).collect()))
}

/// POST /api/groups/:group/json - Store any JSON value as a new document
pub async fn group_post(
    State(state): State<AppState>,
    Path(group): Path<String>,
    Extension(auth_user): Extension<AuthUser>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<JsonDocumentView> {
    auth_user.require(Capability::Write)?;
    let payload = payload_from(body)?;

    let doc = state.json.add(&group, payload, &state.cancel_token()).await?;
    Ok(ApiResponse::created(JsonDocumentView::from(&doc)))
}

/// GET /api/json/:id
pub async fn record_get(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Extension(auth_user): Extension<AuthUser>,
) -> ApiResult<JsonDocumentView> {
    auth_user.require(Capability::Read)?;
    let id = parse_id(&id)?;

    let doc = state.json.get_by_id(id, &state.cancel_token()).await?;
    Ok(ApiResponse::success(JsonDocumentView::from(&doc)))
}

/// PUT /api/json/:id - Replace the document body; 404 if it does not exist
pub async fn record_put(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Extension(auth_user): Extension<AuthUser>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<JsonDocumentView> {
    auth_user.require(Capability::Write)?;
    let id = parse_id(&id)?;
    let payload = payload_from(body)?;

    let doc = state.json.update_by_id(id, payload, &state.cancel_token()).await?;
    Ok(ApiResponse::success(JsonDocumentView::from(&doc)))
}

/// DELETE /api/json/:id - Succeeds whether or not the document existed
pub async fn record_delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Extension(auth_user): Extension<AuthUser>,
) -> ApiResult<Value> {
    auth_user.require(Capability::Write)?;
    let id = parse_id(&id)?;

    state.json.delete_by_id(id, &state.cancel_token()).await?;
    Ok(ApiResponse::success(json!({ "id": id, "deleted": true })))
}
