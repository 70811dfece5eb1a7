pub mod manager;
pub mod memory;
pub mod models;
pub mod postgres;
pub mod repository;
pub mod schema;

use std::sync::Arc;

use sqlx::PgPool;
use tracing::info;

use crate::config::{AppConfig, StorageBackend};
use crate::database::models::{FilePayload, JsonPayload};

pub use manager::{DatabaseError, DatabaseManager};
pub use repository::{
    ContentRepository, GroupRepository, SnapshotRepository, StoreHealth, UserRepository,
};

/// Every store the API talks to, behind trait objects so the backend is
/// picked once at start-up.
#[derive(Clone)]
pub struct Stores {
    pub json: Arc<dyn ContentRepository<JsonPayload>>,
    pub files: Arc<dyn ContentRepository<FilePayload>>,
    pub groups: Arc<dyn GroupRepository>,
    pub users: Arc<dyn UserRepository>,
    pub snapshots: Arc<dyn SnapshotRepository>,
    pub health: Arc<dyn StoreHealth>,
}

impl Stores {
    pub fn memory() -> Self {
        Self {
            json: Arc::new(memory::MemoryCollection::<JsonPayload>::new()),
            files: Arc::new(memory::MemoryCollection::<FilePayload>::new()),
            groups: Arc::new(memory::MemoryGroups::new()),
            users: Arc::new(memory::MemoryUsers::new()),
            snapshots: Arc::new(memory::MemorySnapshots::new()),
            health: Arc::new(memory::MemoryHealth),
        }
    }

    pub fn postgres(pool: PgPool) -> Self {
        let store = Arc::new(postgres::PgStore::new(pool));
        Self {
            json: store.clone(),
            files: store.clone(),
            groups: store.clone(),
            users: store.clone(),
            snapshots: store.clone(),
            health: store,
        }
    }

    /// Build the configured backend. Postgres gets its schema applied first.
    pub async fn connect(config: &AppConfig) -> Result<Self, DatabaseError> {
        match config.storage {
            StorageBackend::Memory => {
                info!("Using in-memory storage backend");
                Ok(Self::memory())
            }
            StorageBackend::Postgres => {
                let pool = DatabaseManager::connect(&config.database).await?;
                DatabaseManager::ensure_schema(&pool).await?;
                info!("Using postgres storage backend");
                Ok(Self::postgres(pool))
            }
        }
    }
}
