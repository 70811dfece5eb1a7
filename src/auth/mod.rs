pub mod password;
pub mod service;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::SecurityConfig;
use crate::types::Role;

pub use service::{AuthService, LoginRequest, LoginResponse};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Username
    pub sub: String,
    pub jti: String,
    pub roles: Vec<Role>,
    pub iss: String,
    pub aud: String,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("{0}")]
    InvalidRequest(String),

    #[error("User '{0}' already exists")]
    UserExists(String),

    #[error("JWT secret not configured")]
    InvalidSecret,

    #[error("JWT generation error: {0}")]
    TokenGeneration(String),

    #[error("Invalid JWT token: {0}")]
    InvalidToken(String),

    #[error("User store error: {0}")]
    Store(#[from] crate::database::DatabaseError),
}

/// Signing parameters, built once from config and handed to whoever needs them
#[derive(Debug, Clone)]
pub struct JwtSettings {
    pub issuer: String,
    pub audience: String,
    pub secret: String,
    pub expiry: Duration,
}

impl JwtSettings {
    pub fn from_config(security: &SecurityConfig) -> Self {
        Self {
            issuer: security.jwt_issuer.clone(),
            audience: security.jwt_audience.clone(),
            secret: security.jwt_secret.clone(),
            expiry: Duration::seconds(security.jwt_expiry_secs as i64),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct IssuedToken {
    pub token: String,
    pub expires_in: i64,
    pub expires_at: DateTime<Utc>,
}

/// Issues and checks HS256 tokens. Expiry is enforced with no clock leeway.
#[derive(Clone)]
pub struct TokenIssuer {
    settings: JwtSettings,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl TokenIssuer {
    pub fn new(settings: JwtSettings) -> Result<Self, AuthError> {
        if settings.secret.is_empty() {
            return Err(AuthError::InvalidSecret);
        }

        Ok(Self {
            encoding_key: EncodingKey::from_secret(settings.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(settings.secret.as_bytes()),
            settings,
        })
    }

    pub fn issue(&self, username: &str, roles: &[Role]) -> Result<IssuedToken, AuthError> {
        let now = Utc::now();
        let expires_at = now + self.settings.expiry;
        let claims = Claims {
            sub: username.to_string(),
            jti: Uuid::new_v4().to_string(),
            roles: roles.to_vec(),
            iss: self.settings.issuer.clone(),
            aud: self.settings.audience.clone(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AuthError::TokenGeneration(e.to_string()))?;

        Ok(IssuedToken {
            token,
            expires_in: self.settings.expiry.num_seconds(),
            expires_at,
        })
    }

    pub fn validate(&self, token: &str) -> Result<Claims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_issuer(&[&self.settings.issuer]);
        validation.set_audience(&[&self.settings.audience]);

        let data = decode::<Claims>(token, &self.decoding_key, &validation)
            .map_err(|e| AuthError::InvalidToken(e.to_string()))?;
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(secret: &str, expiry_secs: i64) -> JwtSettings {
        JwtSettings {
            issuer: "espra-api".into(),
            audience: "espra-clients".into(),
            secret: secret.into(),
            expiry: Duration::seconds(expiry_secs),
        }
    }

    #[test]
    fn issued_token_validates() {
        let issuer = TokenIssuer::new(settings("s3cret", 60)).unwrap();
        let issued = issuer.issue("alice", &[Role::Admin]).unwrap();

        let claims = issuer.validate(&issued.token).unwrap();
        assert_eq!(claims.sub, "alice");
        assert_eq!(claims.roles, vec![Role::Admin]);
        assert_eq!(issued.expires_in, 60);
    }

    #[test]
    fn empty_secret_is_rejected() {
        assert!(matches!(TokenIssuer::new(settings("", 60)), Err(AuthError::InvalidSecret)));
    }

    #[test]
    fn token_from_other_secret_fails() {
        let a = TokenIssuer::new(settings("one", 60)).unwrap();
        let b = TokenIssuer::new(settings("two", 60)).unwrap();
        let issued = a.issue("alice", &[Role::Web]).unwrap();
        assert!(matches!(b.validate(&issued.token), Err(AuthError::InvalidToken(_))));
    }

    #[test]
    fn expired_token_fails() {
        let issuer = TokenIssuer::new(settings("s3cret", -10)).unwrap();
        let issued = issuer.issue("alice", &[Role::Web]).unwrap();
        assert!(issuer.validate(&issued.token).is_err());
    }

    #[test]
    fn wrong_audience_fails() {
        let issuer = TokenIssuer::new(settings("s3cret", 60)).unwrap();
        let mut other = settings("s3cret", 60);
        other.audience = "someone-else".into();
        let token = TokenIssuer::new(other).unwrap().issue("alice", &[Role::Web]).unwrap();
        assert!(issuer.validate(&token.token).is_err());
    }
}
