use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::ContentKind;

/// Membership record for one group: which JSON documents and files belong to it.
///
/// `version` increases on every write and guards the whole-list replace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupInfo {
    pub id: Uuid,
    pub group_name: String,
    pub json_ids: Vec<Uuid>,
    pub file_ids: Vec<Uuid>,
    pub version: i64,
}

impl GroupInfo {
    pub fn new(group_name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            group_name: group_name.into(),
            json_ids: Vec::new(),
            file_ids: Vec::new(),
            version: 0,
        }
    }

    pub fn members(&self, kind: ContentKind) -> &[Uuid] {
        match kind {
            ContentKind::Json => &self.json_ids,
            ContentKind::File => &self.file_ids,
        }
    }

    pub fn members_mut(&mut self, kind: ContentKind) -> &mut Vec<Uuid> {
        match kind {
            ContentKind::Json => &mut self.json_ids,
            ContentKind::File => &mut self.file_ids,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.json_ids.is_empty() && self.file_ids.is_empty()
    }
}
