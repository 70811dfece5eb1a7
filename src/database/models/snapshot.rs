use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Camera snapshot posted by an IoT device
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub id: i64,
    pub base64_snapshot: String,
    pub time_stamp: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewSnapshot {
    #[serde(default)]
    pub base64_snapshot: String,
    #[serde(default)]
    pub time_stamp: String,
}

impl NewSnapshot {
    pub fn is_valid(&self) -> bool {
        !self.time_stamp.trim().is_empty()
    }
}
