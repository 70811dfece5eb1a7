use std::time::Duration;

use sqlx::{postgres::PgPoolOptions, PgPool};
use thiserror::Error;
use tracing::info;

use crate::config::DatabaseConfig;
use crate::database::schema;

/// Errors from the persistent store
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Missing configuration: {0}")]
    ConfigMissing(&'static str),

    #[error("Invalid database URL")]
    InvalidDatabaseUrl,

    #[error("Invalid database name: {0}")]
    InvalidDatabaseName(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Corrupt record: {0}")]
    Decode(String),

    #[error(transparent)]
    Sqlx(sqlx::Error),
}

impl From<sqlx::Error> for DatabaseError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Io(e) => DatabaseError::Unavailable(e.to_string()),
            sqlx::Error::PoolTimedOut => DatabaseError::Unavailable("connection pool timed out".to_string()),
            sqlx::Error::PoolClosed => DatabaseError::Unavailable("connection pool closed".to_string()),
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                DatabaseError::Conflict(db.message().to_string())
            }
            other => DatabaseError::Sqlx(other),
        }
    }
}

/// Connection setup, schema bootstrap and health checks for the postgres backend
pub struct DatabaseManager;

impl DatabaseManager {
    /// Open a pool for the configured database
    pub async fn connect(config: &DatabaseConfig) -> Result<PgPool, DatabaseError> {
        let connection_string = Self::build_connection_string(config)?;

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout))
            .connect(&connection_string)
            .await?;

        info!("Created database pool ({} max connections)", config.max_connections);
        Ok(pool)
    }

    /// Create tables and indexes if they do not exist yet
    pub async fn ensure_schema(pool: &PgPool) -> Result<(), DatabaseError> {
        for statement in schema::STATEMENTS {
            sqlx::query(statement).execute(pool).await?;
        }
        info!("Database schema ready ({} statements)", schema::STATEMENTS.len());
        Ok(())
    }

    /// Pings the pool to ensure connectivity
    pub async fn health_check(pool: &PgPool) -> Result<(), DatabaseError> {
        sqlx::query("SELECT 1").execute(pool).await?;
        Ok(())
    }

    fn build_connection_string(config: &DatabaseConfig) -> Result<String, DatabaseError> {
        let base = config
            .url
            .as_deref()
            .ok_or(DatabaseError::ConfigMissing("DATABASE_URL"))?;

        let mut url = url::Url::parse(base).map_err(|_| DatabaseError::InvalidDatabaseUrl)?;

        if let Some(name) = config.name.as_deref() {
            if !Self::is_valid_db_name(name) {
                return Err(DatabaseError::InvalidDatabaseName(name.to_string()));
            }
            // Replace the path to the database name (ensure leading slash)
            url.set_path(&format!("/{}", name));
        }

        Ok(url.into())
    }

    /// Database names are limited to [a-zA-Z0-9_] and must not start with a digit
    fn is_valid_db_name(name: &str) -> bool {
        !name.is_empty()
            && !name.starts_with(|c: char| c.is_ascii_digit())
            && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
    }
}
