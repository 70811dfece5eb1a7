// handlers/public/auth/login.rs - POST /auth/login handler

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};

use crate::app::AppState;
use crate::auth::{LoginRequest, LoginResponse};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};

/// POST /auth/login - Authenticate user and receive JWT token
///
/// Expected Input:
/// ```json
/// { "username": "admin", "password": "secret" }
/// ```
/// `email` is accepted as an alias for `username`.
///
/// Expected Output (Success):
/// ```json
/// {
///   "success": true,
///   "data": {
///     "token": "eyJhbGciOiJIUzI1NiI...",
///     "token_type": "Bearer",
///     "expires_in": 3600,
///     "expires_at": "2025-01-01T01:00:00Z",
///     "username": "admin",
///     "roles": ["Admin"]
///   }
/// }
/// ```
///
/// Errors: 400 for malformed or too-short credentials, 401 for a wrong
/// username/password pair.
pub async fn login_post(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<LoginResponse> {
    let Json(request) = payload.map_err(|e| ApiError::invalid_json(e.body_text()))?;

    let response = state.auth.login(&request).await?;
    Ok(ApiResponse::success(response))
}
