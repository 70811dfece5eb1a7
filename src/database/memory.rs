use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::database::models::content::timestamp;
use crate::database::models::{ContentItem, GroupInfo, NewSnapshot, Payload, Snapshot, User};
use crate::database::repository::{
    ContentRepository, GroupRepository, SnapshotRepository, StoreHealth, UserRepository,
};
use crate::types::ContentKind;

/// Process-local collection of content items. Used by tests and `STORAGE_BACKEND=memory`.
pub struct MemoryCollection<P> {
    items: Arc<RwLock<HashMap<Uuid, ContentItem<P>>>>,
}

impl<P> MemoryCollection<P> {
    pub fn new() -> Self {
        Self {
            items: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl<P> Default for MemoryCollection<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P> Clone for MemoryCollection<P> {
    fn clone(&self) -> Self {
        Self {
            items: Arc::clone(&self.items),
        }
    }
}

#[async_trait]
impl<P: Payload> ContentRepository<P> for MemoryCollection<P> {
    async fn insert(&self, item: &ContentItem<P>) -> Result<(), DatabaseError> {
        let mut items = self.items.write().await;
        if items.contains_key(&item.id) {
            return Err(DatabaseError::Conflict(format!("duplicate id {}", item.id)));
        }
        items.insert(item.id, item.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<ContentItem<P>>, DatabaseError> {
        Ok(self.items.read().await.get(&id).cloned())
    }

    async fn find_by_group(&self, group_id: &str) -> Result<Vec<ContentItem<P>>, DatabaseError> {
        let items = self.items.read().await;
        let mut found: Vec<ContentItem<P>> = items
            .values()
            .filter(|item| item.group_id == group_id)
            .cloned()
            .collect();
        found.sort_by_key(|item| item.date_added);
        Ok(found)
    }

    async fn update_payload(
        &self,
        id: Uuid,
        payload: &P,
        last_modified: DateTime<Utc>,
    ) -> Result<bool, DatabaseError> {
        let mut items = self.items.write().await;
        match items.get_mut(&id) {
            Some(item) => {
                item.payload = payload.clone();
                item.last_modified = last_modified;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_by_id(&self, id: Uuid) -> Result<bool, DatabaseError> {
        Ok(self.items.write().await.remove(&id).is_some())
    }
}

#[derive(Clone, Default)]
pub struct MemoryGroups {
    groups: Arc<RwLock<HashMap<String, GroupInfo>>>,
}

impl MemoryGroups {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl GroupRepository for MemoryGroups {
    async fn find_group(&self, group_name: &str) -> Result<Option<GroupInfo>, DatabaseError> {
        Ok(self.groups.read().await.get(group_name).cloned())
    }

    async fn create_group(&self, group: &GroupInfo) -> Result<(), DatabaseError> {
        let mut groups = self.groups.write().await;
        if groups.contains_key(&group.group_name) {
            return Err(DatabaseError::Conflict(format!(
                "group '{}' already exists",
                group.group_name
            )));
        }
        groups.insert(group.group_name.clone(), group.clone());
        Ok(())
    }

    async fn replace_members(
        &self,
        group_name: &str,
        kind: ContentKind,
        ids: &[Uuid],
        expected_version: i64,
    ) -> Result<bool, DatabaseError> {
        let mut groups = self.groups.write().await;
        match groups.get_mut(group_name) {
            Some(group) if group.version == expected_version => {
                *group.members_mut(kind) = ids.to_vec();
                group.version += 1;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[derive(Clone, Default)]
pub struct MemoryUsers {
    users: Arc<RwLock<HashMap<String, User>>>,
}

impl MemoryUsers {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for MemoryUsers {
    async fn find_user(&self, username: &str) -> Result<Option<User>, DatabaseError> {
        Ok(self.users.read().await.get(username).cloned())
    }

    async fn create_user(&self, user: &User) -> Result<(), DatabaseError> {
        let mut users = self.users.write().await;
        if users.contains_key(&user.username) {
            return Err(DatabaseError::Conflict(format!(
                "user '{}' already exists",
                user.username
            )));
        }
        users.insert(user.username.clone(), user.clone());
        Ok(())
    }

    async fn list_users(&self) -> Result<Vec<User>, DatabaseError> {
        let mut users: Vec<User> = self.users.read().await.values().cloned().collect();
        users.sort_by(|a, b| a.username.cmp(&b.username));
        Ok(users)
    }
}

#[derive(Clone, Default)]
pub struct MemorySnapshots {
    snapshots: Arc<RwLock<Vec<Snapshot>>>,
    next_id: Arc<AtomicI64>,
}

impl MemorySnapshots {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SnapshotRepository for MemorySnapshots {
    async fn add_snapshot(&self, snapshot: &NewSnapshot) -> Result<Snapshot, DatabaseError> {
        let stored = Snapshot {
            id: self.next_id.fetch_add(1, Ordering::SeqCst) + 1,
            base64_snapshot: snapshot.base64_snapshot.clone(),
            time_stamp: snapshot.time_stamp.clone(),
            created_at: timestamp(),
        };
        self.snapshots.write().await.push(stored.clone());
        Ok(stored)
    }

    async fn list_snapshots(&self) -> Result<Vec<Snapshot>, DatabaseError> {
        Ok(self.snapshots.read().await.clone())
    }
}

/// The memory backend is always reachable
pub struct MemoryHealth;

#[async_trait]
impl StoreHealth for MemoryHealth {
    async fn ping(&self) -> Result<(), DatabaseError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::JsonPayload;

    #[tokio::test]
    async fn replace_members_rejects_stale_version() {
        let groups = MemoryGroups::new();
        groups.create_group(&GroupInfo::new("g")).await.unwrap();
        let id = Uuid::new_v4();

        assert!(groups.replace_members("g", ContentKind::Json, &[id], 0).await.unwrap());
        assert!(!groups.replace_members("g", ContentKind::Json, &[], 0).await.unwrap());

        let info = groups.find_group("g").await.unwrap().unwrap();
        assert_eq!(info.json_ids, vec![id]);
        assert_eq!(info.version, 1);
    }

    #[tokio::test]
    async fn duplicate_group_is_a_conflict() {
        let groups = MemoryGroups::new();
        groups.create_group(&GroupInfo::new("g")).await.unwrap();
        let err = groups.create_group(&GroupInfo::new("g")).await.unwrap_err();
        assert!(matches!(err, DatabaseError::Conflict(_)));
    }

    #[tokio::test]
    async fn collection_filters_by_group() {
        let docs: MemoryCollection<JsonPayload> = MemoryCollection::new();
        let a = ContentItem::new("a", JsonPayload("{}".into()));
        let b = ContentItem::new("b", JsonPayload("[]".into()));
        docs.insert(&a).await.unwrap();
        docs.insert(&b).await.unwrap();

        let found = docs.find_by_group("a").await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, a.id);
        assert!(docs.delete_by_id(a.id).await.unwrap());
        assert!(!docs.delete_by_id(a.id).await.unwrap());
    }

    #[tokio::test]
    async fn snapshot_ids_increase() {
        let snaps = MemorySnapshots::new();
        let new = NewSnapshot {
            base64_snapshot: "aGk=".into(),
            time_stamp: "2024-01-01T00:00:00Z".into(),
        };
        let first = snaps.add_snapshot(&new).await.unwrap();
        let second = snaps.add_snapshot(&new).await.unwrap();
        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);
        assert_eq!(snaps.list_snapshots().await.unwrap().len(), 2);
    }
}
