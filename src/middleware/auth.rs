use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use serde::Serialize;

use crate::app::AppState;
use crate::auth::Claims;
use crate::error::ApiError;
use crate::types::Role;

/// What a request is allowed to do with content
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    Read,
    Write,
}

impl Capability {
    fn granted_to(self, role: Role) -> bool {
        match (self, role) {
            (_, Role::Admin) => true,
            (Capability::Read, Role::Web) => true,
            (Capability::Write, Role::Web) => false,
        }
    }
}

/// Authenticated user context extracted from JWT
#[derive(Clone, Debug, Serialize)]
pub struct AuthUser {
    pub username: String,
    pub roles: Vec<Role>,
    pub expires_at: i64,
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        Self {
            username: claims.sub,
            roles: claims.roles,
            expires_at: claims.exp,
        }
    }
}

impl AuthUser {
    pub fn can(&self, capability: Capability) -> bool {
        self.roles.iter().any(|role| capability.granted_to(*role))
    }

    /// Called at the top of every protected handler before any store access
    pub fn require(&self, capability: Capability) -> Result<(), ApiError> {
        if self.can(capability) {
            Ok(())
        } else {
            tracing::debug!("User '{}' lacks {:?} capability", self.username, capability);
            Err(ApiError::forbidden(format!(
                "{} access required",
                match capability {
                    Capability::Read => "Read",
                    Capability::Write => "Write",
                }
            )))
        }
    }
}

/// JWT authentication middleware that validates tokens and extracts user context
pub async fn jwt_auth_middleware(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_jwt_from_headers(&headers).map_err(ApiError::unauthorized)?;
    let claims = state.auth.authenticate(&token)?;

    request.extensions_mut().insert(AuthUser::from(claims));

    Ok(next.run(request).await)
}

/// Extract JWT token from Authorization header
fn extract_jwt_from_headers(headers: &HeaderMap) -> Result<String, String> {
    let auth_header = headers
        .get(axum::http::header::AUTHORIZATION)
        .ok_or_else(|| "Missing Authorization header".to_string())?;

    let auth_str = auth_header
        .to_str()
        .map_err(|_| "Invalid Authorization header format".to_string())?;

    if let Some(token) = auth_str.strip_prefix("Bearer ") {
        if token.trim().is_empty() {
            return Err("Empty JWT token".to_string());
        }
        Ok(token.trim().to_string())
    } else {
        Err("Authorization header must use Bearer token format".to_string())
    }
}
