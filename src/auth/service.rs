use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::password::{hash_password, verify_password};
use crate::auth::{AuthError, Claims, TokenIssuer};
use crate::database::models::content::timestamp;
use crate::database::models::User;
use crate::database::{DatabaseError, UserRepository};
use crate::types::Role;

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    #[serde(default, alias = "email")]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

impl LoginRequest {
    pub fn validate(&self) -> Result<(), AuthError> {
        validate_credentials(&self.username, &self.password)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub token_type: &'static str,
    pub expires_in: i64,
    pub expires_at: DateTime<Utc>,
    pub username: String,
    pub roles: Vec<Role>,
}

fn validate_credentials(username: &str, password: &str) -> Result<(), AuthError> {
    if username.trim().chars().count() <= 1 {
        return Err(AuthError::InvalidRequest(
            "username must be at least 2 characters".to_string(),
        ));
    }
    if password.chars().count() <= 4 {
        return Err(AuthError::InvalidRequest(
            "password must be at least 5 characters".to_string(),
        ));
    }
    Ok(())
}

/// Credential checks against the user store plus token issuing
#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserRepository>,
    tokens: TokenIssuer,
}

impl AuthService {
    pub fn new(users: Arc<dyn UserRepository>, tokens: TokenIssuer) -> Self {
        Self { users, tokens }
    }

    pub async fn login(&self, request: &LoginRequest) -> Result<LoginResponse, AuthError> {
        request.validate()?;
        let username = request.username.trim();

        let user = match self.users.find_user(username).await? {
            Some(user) if verify_password(&request.password, &user.password_hash) => user,
            _ => {
                warn!("Failed login for '{}'", username);
                return Err(AuthError::InvalidCredentials);
            }
        };

        let issued = self.tokens.issue(&user.username, &user.roles)?;
        info!("Issued token for '{}' (expires {})", user.username, issued.expires_at);

        Ok(LoginResponse {
            token: issued.token,
            token_type: "Bearer",
            expires_in: issued.expires_in,
            expires_at: issued.expires_at,
            username: user.username,
            roles: user.roles,
        })
    }

    pub fn authenticate(&self, token: &str) -> Result<Claims, AuthError> {
        self.tokens.validate(token)
    }

    pub async fn register_user(
        &self,
        username: &str,
        password: &str,
        roles: Vec<Role>,
    ) -> Result<User, AuthError> {
        validate_credentials(username, password)?;
        let user = User {
            id: Uuid::new_v4(),
            username: username.trim().to_string(),
            password_hash: hash_password(password),
            roles,
            created_at: timestamp(),
        };

        match self.users.create_user(&user).await {
            Ok(()) => {
                info!("Registered user '{}' with roles {:?}", user.username, user.roles);
                Ok(user)
            }
            Err(DatabaseError::Conflict(_)) => Err(AuthError::UserExists(user.username)),
            Err(e) => Err(e.into()),
        }
    }

    /// Create the user unless one with that name exists. Returns true if created.
    pub async fn ensure_user(
        &self,
        username: &str,
        password: &str,
        roles: Vec<Role>,
    ) -> Result<bool, AuthError> {
        if self.users.find_user(username.trim()).await?.is_some() {
            return Ok(false);
        }
        match self.register_user(username, password, roles).await {
            Ok(_) => Ok(true),
            Err(AuthError::UserExists(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    pub async fn list_users(&self) -> Result<Vec<User>, AuthError> {
        Ok(self.users.list_users().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::JwtSettings;
    use crate::config::AppConfig;
    use crate::database::memory::MemoryUsers;

    fn service() -> AuthService {
        let config = AppConfig::in_memory();
        let tokens = TokenIssuer::new(JwtSettings::from_config(&config.security)).unwrap();
        AuthService::new(Arc::new(MemoryUsers::new()), tokens)
    }

    fn login(username: &str, password: &str) -> LoginRequest {
        LoginRequest { username: username.into(), password: password.into() }
    }

    #[tokio::test]
    async fn login_issues_token_with_roles() {
        let auth = service();
        auth.register_user("admin", "adminpass", vec![Role::Admin]).await.unwrap();

        let response = auth.login(&login("admin", "adminpass")).await.unwrap();
        let claims = auth.authenticate(&response.token).unwrap();
        assert_eq!(claims.sub, "admin");
        assert_eq!(claims.roles, vec![Role::Admin]);
        assert_eq!(response.token_type, "Bearer");
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_user_look_the_same() {
        let auth = service();
        auth.register_user("admin", "adminpass", vec![Role::Admin]).await.unwrap();

        let wrong = auth.login(&login("admin", "nottheone")).await.unwrap_err();
        let unknown = auth.login(&login("ghost", "whatever")).await.unwrap_err();
        assert!(matches!(wrong, AuthError::InvalidCredentials));
        assert!(matches!(unknown, AuthError::InvalidCredentials));
    }

    #[tokio::test]
    async fn short_credentials_are_rejected() {
        let auth = service();
        assert!(matches!(
            auth.login(&login("a", "longenough")).await,
            Err(AuthError::InvalidRequest(_))
        ));
        assert!(matches!(
            auth.login(&login("admin", "1234")).await,
            Err(AuthError::InvalidRequest(_))
        ));
    }

    #[tokio::test]
    async fn ensure_user_is_idempotent() {
        let auth = service();
        assert!(auth.ensure_user("viewer", "viewerpass", vec![Role::Web]).await.unwrap());
        assert!(!auth.ensure_user("viewer", "other-pass", vec![Role::Admin]).await.unwrap());

        let users = auth.list_users().await.unwrap();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].roles, vec![Role::Web]);
    }

    #[test]
    fn login_accepts_email_alias() {
        let req: LoginRequest =
            serde_json::from_str(r#"{"email":"admin","password":"adminpass"}"#).unwrap();
        assert_eq!(req.username, "admin");
    }
}
