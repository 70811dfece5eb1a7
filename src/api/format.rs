use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use crate::database::models::{FileDocument, GroupInfo, JsonDocument};
use crate::services::uploads::mime_for_extension;

/// Public shape of a stored JSON document. The stored string is re-parsed so
/// clients get structured data back; anything that no longer parses is
/// returned as a plain string.
#[derive(Debug, Clone, Serialize)]
pub struct JsonDocumentView {
    pub id: Uuid,
    pub group_id: String,
    pub data: Value,
    pub date_added: DateTime<Utc>,
    pub last_modified: DateTime<Utc>,
}

impl From<&JsonDocument> for JsonDocumentView {
    fn from(doc: &JsonDocument) -> Self {
        let data = serde_json::from_str(&doc.payload.0)
            .unwrap_or_else(|_| Value::String(doc.payload.0.clone()));
        Self {
            id: doc.id,
            group_id: doc.group_id.clone(),
            data,
            date_added: doc.date_added,
            last_modified: doc.last_modified,
        }
    }
}

/// File record without its bytes
#[derive(Debug, Clone, Serialize)]
pub struct FileMetadataView {
    pub id: Uuid,
    pub group_id: String,
    pub extension: String,
    pub content_type: String,
    pub size: usize,
    pub date_added: DateTime<Utc>,
    pub last_modified: DateTime<Utc>,
}

impl From<&FileDocument> for FileMetadataView {
    fn from(file: &FileDocument) -> Self {
        Self {
            id: file.id,
            group_id: file.group_id.clone(),
            extension: file.payload.extension.clone(),
            content_type: mime_for_extension(&file.payload.extension),
            size: file.payload.data.len(),
            date_added: file.date_added,
            last_modified: file.last_modified,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct GroupInfoView {
    pub id: Uuid,
    pub group_name: String,
    pub json_ids: Vec<Uuid>,
    pub file_ids: Vec<Uuid>,
}

impl From<GroupInfo> for GroupInfoView {
    fn from(info: GroupInfo) -> Self {
        Self {
            id: info.id,
            group_name: info.group_name,
            json_ids: info.json_ids,
            file_ids: info.file_ids,
        }
    }
}
