use axum::extract::Extension;

use crate::middleware::{ApiResponse, ApiResult, AuthUser, Capability};

/// GET /api/auth/whoami - Get current authenticated user details
///
/// Expected Output:
/// ```json
/// {
///   "success": true,
///   "data": {
///     "username": "admin",
///     "roles": ["Admin"],
///     "expires_at": 1735693200,
///     "can_write": true
///   }
/// }
/// ```
pub async fn whoami(Extension(auth_user): Extension<AuthUser>) -> ApiResult<serde_json::Value> {
    auth_user.require(Capability::Read)?;

    Ok(ApiResponse::success(serde_json::json!({
        "username": auth_user.username,
        "roles": auth_user.roles,
        "expires_at": auth_user.expires_at,
        "can_write": auth_user.can(Capability::Write),
    })))
}
