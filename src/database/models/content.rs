use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::ContentKind;

/// Payload carried by a content item. The kind decides which group
/// membership list the item is indexed under.
pub trait Payload: Clone + std::fmt::Debug + Send + Sync + 'static {
    const KIND: ContentKind;
}

/// Serialized JSON document, opaque to the store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JsonPayload(pub String);

impl Payload for JsonPayload {
    const KIND: ContentKind = ContentKind::Json;
}

/// Binary file plus its extension tag (lowercase, leading dot)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePayload {
    pub extension: String,
    pub data: Vec<u8>,
}

impl Payload for FilePayload {
    const KIND: ContentKind = ContentKind::File;
}

#[derive(Debug, Clone, PartialEq)]
pub struct ContentItem<P> {
    pub id: Uuid,
    pub group_id: String,
    pub payload: P,
    pub date_added: DateTime<Utc>,
    pub last_modified: DateTime<Utc>,
}

impl<P: Payload> ContentItem<P> {
    /// New item with a fresh id and both timestamps set to now
    pub fn new(group_id: impl Into<String>, payload: P) -> Self {
        let now = timestamp();
        Self {
            id: Uuid::new_v4(),
            group_id: group_id.into(),
            payload,
            date_added: now,
            last_modified: now,
        }
    }
}

pub type JsonDocument = ContentItem<JsonPayload>;
pub type FileDocument = ContentItem<FilePayload>;

/// Current time truncated to microseconds, the precision postgres keeps,
/// so stored and in-memory timestamps compare equal.
pub fn timestamp() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}
