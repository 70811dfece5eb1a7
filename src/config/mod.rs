use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub storage: StorageBackend,
    pub database: DatabaseConfig,
    pub api: ApiConfig,
    pub security: SecurityConfig,
    pub uploads: UploadConfig,
    pub group_index: GroupIndexConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

/// Where content, group records and users are persisted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Postgres,
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Base connection URL, taken from DATABASE_URL
    pub url: Option<String>,
    /// Overrides the database name in `url` when set
    pub name: Option<String>,
    pub max_connections: u32,
    pub connection_timeout: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub port: u16,
    pub enable_request_logging: bool,
    pub max_request_size_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub enable_cors: bool,
    pub cors_origins: Vec<String>,
    pub jwt_issuer: String,
    pub jwt_audience: String,
    #[serde(skip_serializing)]
    pub jwt_secret: String,
    pub jwt_expiry_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    pub image_extensions: Vec<String>,
    pub document_extensions: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupIndexConfig {
    /// Conditional-write attempts before a membership update gives up
    pub max_attempts: u32,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        if let Ok(v) = env::var("STORAGE_BACKEND") {
            match v.to_ascii_lowercase().as_str() {
                "memory" => self.storage = StorageBackend::Memory,
                "postgres" | "postgresql" => self.storage = StorageBackend::Postgres,
                other => tracing::warn!("Ignoring unknown STORAGE_BACKEND '{}'", other),
            }
        }

        // Database overrides
        if let Ok(v) = env::var("DATABASE_URL") {
            self.database.url = Some(v);
        }
        if let Ok(v) = env::var("DATABASE_NAME") {
            self.database.name = Some(v);
        }
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout = v.parse().unwrap_or(self.database.connection_timeout);
        }

        // API overrides
        if let Some(v) = env::var("ESPRA_API_PORT").ok().or_else(|| env::var("PORT").ok()) {
            self.api.port = v.parse().unwrap_or(self.api.port);
        }
        if let Ok(v) = env::var("API_ENABLE_REQUEST_LOGGING") {
            self.api.enable_request_logging = v.parse().unwrap_or(self.api.enable_request_logging);
        }
        if let Ok(v) = env::var("API_MAX_REQUEST_SIZE_BYTES") {
            self.api.max_request_size_bytes = v.parse().unwrap_or(self.api.max_request_size_bytes);
        }

        // Security overrides
        if let Ok(v) = env::var("SECURITY_ENABLE_CORS") {
            self.security.enable_cors = v.parse().unwrap_or(self.security.enable_cors);
        }
        if let Ok(v) = env::var("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = split_list(&v);
        }
        if let Ok(v) = env::var("JWT_ISSUER") {
            self.security.jwt_issuer = v;
        }
        if let Ok(v) = env::var("JWT_AUDIENCE") {
            self.security.jwt_audience = v;
        }
        if let Ok(v) = env::var("JWT_SECRET") {
            self.security.jwt_secret = v;
        }
        if let Ok(v) = env::var("JWT_EXPIRY_SECS") {
            self.security.jwt_expiry_secs = v.parse().unwrap_or(self.security.jwt_expiry_secs);
        }

        // Upload allow-lists
        if let Ok(v) = env::var("UPLOAD_IMAGE_EXTENSIONS") {
            self.uploads.image_extensions = normalize_extensions(split_list(&v));
        }
        if let Ok(v) = env::var("UPLOAD_DOCUMENT_EXTENSIONS") {
            self.uploads.document_extensions = normalize_extensions(split_list(&v));
        }

        if let Ok(v) = env::var("GROUP_INDEX_MAX_ATTEMPTS") {
            self.group_index.max_attempts = v.parse().unwrap_or(self.group_index.max_attempts);
        }

        self
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            storage: StorageBackend::Postgres,
            database: DatabaseConfig {
                url: None,
                name: None,
                max_connections: 10,
                connection_timeout: 30,
            },
            api: ApiConfig {
                port: 3000,
                enable_request_logging: true,
                max_request_size_bytes: 10 * 1024 * 1024, // 10MB
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["http://localhost:3000".to_string(), "http://localhost:5173".to_string()],
                jwt_issuer: "espra-api".to_string(),
                jwt_audience: "espra-clients".to_string(),
                jwt_secret: "development-secret-change-me".to_string(),
                jwt_expiry_secs: 60 * 60,
            },
            uploads: UploadConfig::default(),
            group_index: GroupIndexConfig { max_attempts: 16 },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            storage: StorageBackend::Postgres,
            database: DatabaseConfig {
                url: None,
                name: None,
                max_connections: 20,
                connection_timeout: 10,
            },
            api: ApiConfig {
                port: 3000,
                enable_request_logging: true,
                max_request_size_bytes: 5 * 1024 * 1024, // 5MB
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["https://staging.example.com".to_string()],
                jwt_issuer: "espra-api".to_string(),
                jwt_audience: "espra-clients".to_string(),
                jwt_secret: String::new(),
                jwt_expiry_secs: 15 * 60,
            },
            uploads: UploadConfig::default(),
            group_index: GroupIndexConfig { max_attempts: 16 },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            storage: StorageBackend::Postgres,
            database: DatabaseConfig {
                url: None,
                name: None,
                max_connections: 50,
                connection_timeout: 5,
            },
            api: ApiConfig {
                port: 3000,
                enable_request_logging: false,
                max_request_size_bytes: 2 * 1024 * 1024, // 2MB
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["https://app.example.com".to_string()],
                jwt_issuer: "espra-api".to_string(),
                jwt_audience: "espra-clients".to_string(),
                jwt_secret: String::new(),
                jwt_expiry_secs: 5 * 60,
            },
            uploads: UploadConfig::default(),
            group_index: GroupIndexConfig { max_attempts: 32 },
        }
    }

    /// Development defaults backed by the in-memory store
    pub fn in_memory() -> Self {
        Self {
            storage: StorageBackend::Memory,
            ..Self::development()
        }
    }
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            image_extensions: vec![".png".to_string(), ".jpg".to_string(), ".jpeg".to_string()],
            document_extensions: vec![".txt".to_string()],
        }
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Lowercase and ensure a leading dot, so ".PNG", "png" and ".png" compare equal
pub fn normalize_extensions(list: Vec<String>) -> Vec<String> {
    list.into_iter()
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            if ext.starts_with('.') { ext } else { format!(".{}", ext) }
        })
        .collect()
}
