use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::database::models::content::timestamp;
use crate::database::models::{ContentItem, FilePayload, GroupInfo, JsonPayload, Payload};
use crate::database::ContentRepository;
use crate::services::group_index::GroupIndex;
use crate::services::{cancellable, ContentError};

/// CRUD over one collection of group-scoped content. Adds and deletes are
/// mirrored into the group index after the item itself is written.
pub struct ContentStore<P: Payload> {
    items: Arc<dyn ContentRepository<P>>,
    index: Arc<GroupIndex>,
}

pub type JsonService = ContentStore<JsonPayload>;
pub type FileService = ContentStore<FilePayload>;

impl<P: Payload> Clone for ContentStore<P> {
    fn clone(&self) -> Self {
        Self {
            items: Arc::clone(&self.items),
            index: Arc::clone(&self.index),
        }
    }
}

impl<P: Payload> ContentStore<P> {
    pub fn new(items: Arc<dyn ContentRepository<P>>, index: Arc<GroupIndex>) -> Self {
        Self { items, index }
    }

    /// Store a new item under `group` and index it.
    ///
    /// The two writes are sequential. If indexing fails the item stays stored
    /// but unlisted and the error is returned.
    pub async fn add(
        &self,
        group: &str,
        payload: P,
        cancel: &CancellationToken,
    ) -> Result<ContentItem<P>, ContentError> {
        // Stored verbatim; reads look the label up exactly as given
        if group.trim().is_empty() {
            return Err(ContentError::Validation("group must not be empty".to_string()));
        }

        let item = ContentItem::new(group, payload);
        cancellable(cancel, self.items.insert(&item)).await?;

        if let Err(e) = self.index.add_member(group, item.id, P::KIND, cancel).await {
            error!(
                "Stored {} {} in group '{}' but could not index it: {}",
                P::KIND, item.id, group, e
            );
            return Err(e);
        }

        info!("Added {} {} to group '{}'", P::KIND, item.id, group);
        Ok(item)
    }

    pub async fn get_by_id(
        &self,
        id: Uuid,
        cancel: &CancellationToken,
    ) -> Result<ContentItem<P>, ContentError> {
        cancellable(cancel, self.items.find_by_id(id))
            .await?
            .ok_or_else(|| ContentError::NotFound(format!("{} {}", P::KIND, id)))
    }

    pub async fn get_by_group(
        &self,
        group: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<ContentItem<P>>, ContentError> {
        cancellable(cancel, self.items.find_by_group(group)).await
    }

    /// Replace the payload of an existing item. Identity, group and
    /// `date_added` are untouched; `last_modified` moves forward.
    pub async fn update_by_id(
        &self,
        id: Uuid,
        payload: P,
        cancel: &CancellationToken,
    ) -> Result<ContentItem<P>, ContentError> {
        let updated = cancellable(cancel, self.items.update_payload(id, &payload, timestamp())).await?;
        if !updated {
            return Err(ContentError::NotFound(format!("{} {}", P::KIND, id)));
        }

        debug!("Updated {} {}", P::KIND, id);
        self.get_by_id(id, cancel).await
    }

    /// Delete an item and unlist it. Deleting an unknown id succeeds without
    /// touching anything.
    pub async fn delete_by_id(&self, id: Uuid, cancel: &CancellationToken) -> Result<(), ContentError> {
        let existing = match cancellable(cancel, self.items.find_by_id(id)).await? {
            Some(item) => item,
            None => {
                debug!("Delete of unknown {} {} ignored", P::KIND, id);
                return Ok(());
            }
        };

        // A concurrent delete already removed it and owns the index update
        if !cancellable(cancel, self.items.delete_by_id(id)).await? {
            return Ok(());
        }

        match self
            .index
            .remove_member(&existing.group_id, id, P::KIND, cancel)
            .await
        {
            Ok(()) => {
                info!("Deleted {} {} from group '{}'", P::KIND, id, existing.group_id);
                Ok(())
            }
            Err(ContentError::NotFound(_)) => {
                warn!(
                    "Deleted {} {} but group '{}' has no index record",
                    P::KIND, id, existing.group_id
                );
                Ok(())
            }
            Err(e) => {
                error!(
                    "Deleted {} {} but could not unlist it from group '{}': {}",
                    P::KIND, id, existing.group_id, e
                );
                Err(e)
            }
        }
    }

    pub async fn group_info(
        &self,
        group: &str,
        cancel: &CancellationToken,
    ) -> Result<GroupInfo, ContentError> {
        self.index.get_info(group, cancel).await
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use async_trait::async_trait;

    use super::*;
    use crate::database::manager::DatabaseError;
    use crate::database::memory::{MemoryCollection, MemoryGroups};
    use crate::database::GroupRepository;
    use crate::types::ContentKind;

    struct Fixture {
        json: JsonService,
        files: FileService,
        index: Arc<GroupIndex>,
    }

    fn fixture(max_attempts: u32) -> Fixture {
        let index = Arc::new(GroupIndex::new(Arc::new(MemoryGroups::new()), max_attempts));
        Fixture {
            json: ContentStore::new(Arc::new(MemoryCollection::new()), Arc::clone(&index)),
            files: ContentStore::new(Arc::new(MemoryCollection::new()), Arc::clone(&index)),
            index,
        }
    }

    fn json(raw: &str) -> JsonPayload {
        JsonPayload(raw.to_string())
    }

    async fn assert_index_matches_store(f: &Fixture, group: &str) {
        let cancel = CancellationToken::new();
        let info = f.index.get_info(group, &cancel).await.unwrap();

        let stored_json: HashSet<Uuid> = f
            .json
            .get_by_group(group, &cancel)
            .await
            .unwrap()
            .iter()
            .map(|i| i.id)
            .collect();
        let stored_files: HashSet<Uuid> = f
            .files
            .get_by_group(group, &cancel)
            .await
            .unwrap()
            .iter()
            .map(|i| i.id)
            .collect();

        assert_eq!(info.json_ids.len(), stored_json.len());
        assert_eq!(info.json_ids.iter().copied().collect::<HashSet<_>>(), stored_json);
        assert_eq!(info.file_ids.len(), stored_files.len());
        assert_eq!(info.file_ids.iter().copied().collect::<HashSet<_>>(), stored_files);
    }

    #[tokio::test]
    async fn added_json_is_listed_in_group() {
        let f = fixture(16);
        let cancel = CancellationToken::new();

        f.json.add("test", json(r#"{"name":"TestObject"}"#), &cancel).await.unwrap();

        let items = f.json.get_by_group("test", &cancel).await.unwrap();
        assert_eq!(items.len(), 1);
        let value: serde_json::Value = serde_json::from_str(&items[0].payload.0).unwrap();
        assert_eq!(value, serde_json::json!({"name": "TestObject"}));
        assert_index_matches_store(&f, "test").await;
    }

    #[tokio::test]
    async fn add_then_delete_leaves_group_empty() {
        let f = fixture(16);
        let cancel = CancellationToken::new();

        let item = f.json.add("test", json(r#"{"a":1}"#), &cancel).await.unwrap();
        f.json.delete_by_id(item.id, &cancel).await.unwrap();

        assert!(f.json.get_by_group("test", &cancel).await.unwrap().is_empty());
        let info = f.json.group_info("test", &cancel).await.unwrap();
        assert!(info.json_ids.is_empty());
    }

    #[tokio::test]
    async fn get_returns_what_was_added() {
        let f = fixture(16);
        let cancel = CancellationToken::new();
        let payload = FilePayload {
            extension: ".png".to_string(),
            data: vec![0x89, 0x50, 0x4e, 0x47],
        };

        let added = f.files.add("pics", payload.clone(), &cancel).await.unwrap();
        let fetched = f.files.get_by_id(added.id, &cancel).await.unwrap();

        assert_eq!(fetched.payload, payload);
        assert_eq!(fetched.group_id, "pics");
        assert_index_matches_store(&f, "pics").await;
    }

    #[tokio::test]
    async fn unknown_id_is_not_found() {
        let f = fixture(16);
        let cancel = CancellationToken::new();
        let err = f.json.get_by_id(Uuid::new_v4(), &cancel).await.unwrap_err();
        assert!(matches!(err, ContentError::NotFound(_)));

        let err = f
            .json
            .update_by_id(Uuid::new_v4(), json("{}"), &cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, ContentError::NotFound(_)));
    }

    #[tokio::test]
    async fn delete_of_unknown_id_changes_nothing() {
        let f = fixture(16);
        let cancel = CancellationToken::new();
        let kept = f.json.add("g", json("1"), &cancel).await.unwrap();
        let before = f.index.get_info("g", &cancel).await.unwrap();

        f.json.delete_by_id(Uuid::new_v4(), &cancel).await.unwrap();

        let after = f.index.get_info("g", &cancel).await.unwrap();
        assert_eq!(before, after);
        assert!(f.json.get_by_id(kept.id, &cancel).await.is_ok());
    }

    #[tokio::test]
    async fn update_preserves_identity() {
        let f = fixture(16);
        let cancel = CancellationToken::new();
        let original = f.json.add("g", json(r#"{"v":1}"#), &cancel).await.unwrap();

        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        let updated = f
            .json
            .update_by_id(original.id, json(r#"{"v":2}"#), &cancel)
            .await
            .unwrap();

        assert_eq!(updated.id, original.id);
        assert_eq!(updated.group_id, original.group_id);
        assert_eq!(updated.date_added, original.date_added);
        assert_eq!(updated.payload, json(r#"{"v":2}"#));
        assert!(updated.last_modified > original.last_modified);
    }

    #[tokio::test]
    async fn kinds_use_separate_lists() {
        let f = fixture(16);
        let cancel = CancellationToken::new();
        let doc = f.json.add("mixed", json("{}"), &cancel).await.unwrap();
        let file = f
            .files
            .add(
                "mixed",
                FilePayload { extension: ".txt".into(), data: b"hi".to_vec() },
                &cancel,
            )
            .await
            .unwrap();

        let info = f.index.get_info("mixed", &cancel).await.unwrap();
        assert_eq!(info.json_ids, vec![doc.id]);
        assert_eq!(info.file_ids, vec![file.id]);
        assert_index_matches_store(&f, "mixed").await;
    }

    #[tokio::test]
    async fn blank_group_is_rejected() {
        let f = fixture(16);
        let err = f
            .json
            .add("  ", json("{}"), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ContentError::Validation(_)));
    }

    #[tokio::test]
    async fn group_label_is_kept_verbatim() {
        let f = fixture(16);
        let cancel = CancellationToken::new();

        let doc = f.json.add(" padded ", json("{}"), &cancel).await.unwrap();
        let fetched = f.json.get_by_id(doc.id, &cancel).await.unwrap();
        assert_eq!(fetched.group_id, " padded ");

        let listed = f.json.get_by_group(" padded ", &cancel).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert!(f.json.get_by_group("padded", &cancel).await.unwrap().is_empty());
        assert_index_matches_store(&f, " padded ").await;
    }

    #[tokio::test]
    async fn cancelled_add_writes_nothing() {
        let f = fixture(16);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = f.json.add("g", json("{}"), &cancel).await.unwrap_err();
        assert!(matches!(err, ContentError::Cancelled));

        let fresh = CancellationToken::new();
        assert!(f.json.get_by_group("g", &fresh).await.unwrap().is_empty());
        assert!(f.index.get_info("g", &fresh).await.is_err());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn two_concurrent_adds_are_both_indexed() {
        let f = fixture(64);
        let cancel = CancellationToken::new();

        let (a, b) = tokio::join!(
            f.json.add("pair", json(r#"{"n":"A"}"#), &cancel),
            f.json.add("pair", json(r#"{"n":"B"}"#), &cancel),
        );
        let (a, b) = (a.unwrap(), b.unwrap());

        let info = f.index.get_info("pair", &cancel).await.unwrap();
        assert!(info.json_ids.contains(&a.id));
        assert!(info.json_ids.contains(&b.id));
        assert_index_matches_store(&f, "pair").await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn many_concurrent_adds_and_deletes_keep_index_consistent() {
        let f = fixture(1024);
        let mut handles = Vec::new();
        for n in 0..50 {
            let json_store = f.json.clone();
            handles.push(tokio::spawn(async move {
                let cancel = CancellationToken::new();
                let item = json_store
                    .add("busy", JsonPayload(format!("{{\"n\":{}}}", n)), &cancel)
                    .await?;
                if n % 3 == 0 {
                    json_store.delete_by_id(item.id, &cancel).await?;
                }
                Ok::<_, ContentError>(())
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let cancel = CancellationToken::new();
        let stored = f.json.get_by_group("busy", &cancel).await.unwrap();
        assert_eq!(stored.len(), 50 - 17);
        assert_index_matches_store(&f, "busy").await;
    }

    /// Group store whose conditional writes always lose
    struct AlwaysStale(MemoryGroups);

    #[async_trait]
    impl GroupRepository for AlwaysStale {
        async fn find_group(&self, group_name: &str) -> Result<Option<GroupInfo>, DatabaseError> {
            self.0.find_group(group_name).await
        }

        async fn create_group(&self, group: &GroupInfo) -> Result<(), DatabaseError> {
            self.0.create_group(group).await
        }

        async fn replace_members(
            &self,
            _group_name: &str,
            _kind: ContentKind,
            _ids: &[Uuid],
            _expected_version: i64,
        ) -> Result<bool, DatabaseError> {
            Ok(false)
        }
    }

    #[tokio::test]
    async fn exhausted_retries_surface_conflict_and_leave_item_stored() {
        let groups = MemoryGroups::new();
        groups.create_group(&GroupInfo::new("hot")).await.unwrap();
        let index = Arc::new(GroupIndex::new(Arc::new(AlwaysStale(groups)), 3));
        let items = Arc::new(MemoryCollection::<JsonPayload>::new());
        let store = ContentStore::new(items.clone(), index);
        let cancel = CancellationToken::new();

        let err = store.add("hot", json("{}"), &cancel).await.unwrap_err();
        assert!(matches!(err, ContentError::IndexConflict { attempts: 3, .. }));

        // The item write is not rolled back
        assert_eq!(store.get_by_group("hot", &cancel).await.unwrap().len(), 1);
    }
}
