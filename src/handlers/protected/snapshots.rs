use axum::{
    extract::{rejection::JsonRejection, Extension, State},
    Json,
};

use crate::app::AppState;
use crate::database::models::{NewSnapshot, Snapshot};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser, Capability};

/// GET /api/snapshots
pub async fn list(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> ApiResult<Vec<Snapshot>> {
    auth_user.require(Capability::Read)?;

    let snapshots = state.snapshots.list(&state.cancel_token()).await?;
    Ok(ApiResponse::success(snapshots))
}

/// POST /api/snapshots - `{ "base64_snapshot": "...", "time_stamp": "..." }`
pub async fn create(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    body: Result<Json<NewSnapshot>, JsonRejection>,
) -> ApiResult<Snapshot> {
    auth_user.require(Capability::Write)?;
    let Json(snapshot) = body.map_err(|e| ApiError::invalid_json(e.body_text()))?;

    let stored = state.snapshots.record(snapshot, &state.cancel_token()).await?;
    Ok(ApiResponse::created(stored))
}
