use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::database::models::{ContentItem, GroupInfo, NewSnapshot, Payload, Snapshot, User};
use crate::types::ContentKind;

/// One logical collection of content items (JSON documents or files)
#[async_trait]
pub trait ContentRepository<P: Payload>: Send + Sync {
    async fn insert(&self, item: &ContentItem<P>) -> Result<(), DatabaseError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<ContentItem<P>>, DatabaseError>;

    async fn find_by_group(&self, group_id: &str) -> Result<Vec<ContentItem<P>>, DatabaseError>;

    /// Overwrite payload and `last_modified`. Returns false when no record matched.
    async fn update_payload(
        &self,
        id: Uuid,
        payload: &P,
        last_modified: DateTime<Utc>,
    ) -> Result<bool, DatabaseError>;

    /// Returns true if a record was removed
    async fn delete_by_id(&self, id: Uuid) -> Result<bool, DatabaseError>;
}

/// Group membership records, keyed by group name
#[async_trait]
pub trait GroupRepository: Send + Sync {
    async fn find_group(&self, group_name: &str) -> Result<Option<GroupInfo>, DatabaseError>;

    /// Fails with `DatabaseError::Conflict` if the group name is taken
    async fn create_group(&self, group: &GroupInfo) -> Result<(), DatabaseError>;

    /// Replace one membership list wholesale, only if the stored version still
    /// equals `expected_version`. Bumps the version on success; returns false
    /// when the record changed underneath (or vanished).
    async fn replace_members(
        &self,
        group_name: &str,
        kind: ContentKind,
        ids: &[Uuid],
        expected_version: i64,
    ) -> Result<bool, DatabaseError>;
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_user(&self, username: &str) -> Result<Option<User>, DatabaseError>;

    /// Fails with `DatabaseError::Conflict` if the username is taken
    async fn create_user(&self, user: &User) -> Result<(), DatabaseError>;

    async fn list_users(&self) -> Result<Vec<User>, DatabaseError>;
}

#[async_trait]
pub trait SnapshotRepository: Send + Sync {
    async fn add_snapshot(&self, snapshot: &NewSnapshot) -> Result<Snapshot, DatabaseError>;

    async fn list_snapshots(&self) -> Result<Vec<Snapshot>, DatabaseError>;
}

#[async_trait]
pub trait StoreHealth: Send + Sync {
    async fn ping(&self) -> Result<(), DatabaseError>;
}
