use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::database::models::{NewSnapshot, Snapshot};
use crate::database::SnapshotRepository;
use crate::services::{cancellable, ContentError};

/// Ingest and listing of device camera snapshots. Snapshots are not group-scoped.
#[derive(Clone)]
pub struct SnapshotService {
    snapshots: Arc<dyn SnapshotRepository>,
}

impl SnapshotService {
    pub fn new(snapshots: Arc<dyn SnapshotRepository>) -> Self {
        Self { snapshots }
    }

    pub async fn record(
        &self,
        snapshot: NewSnapshot,
        cancel: &CancellationToken,
    ) -> Result<Snapshot, ContentError> {
        if !snapshot.is_valid() {
            return Err(ContentError::Validation("time_stamp is required".to_string()));
        }

        let stored = cancellable(cancel, self.snapshots.add_snapshot(&snapshot)).await?;
        info!("Recorded snapshot {} taken at {}", stored.id, stored.time_stamp);
        Ok(stored)
    }

    pub async fn list(&self, cancel: &CancellationToken) -> Result<Vec<Snapshot>, ContentError> {
        cancellable(cancel, self.snapshots.list_snapshots()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::memory::MemorySnapshots;

    #[tokio::test]
    async fn rejects_snapshot_without_timestamp() {
        let service = SnapshotService::new(Arc::new(MemorySnapshots::new()));
        let err = service
            .record(
                NewSnapshot { base64_snapshot: "aGk=".into(), time_stamp: " ".into() },
                &CancellationToken::new(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ContentError::Validation(_)));
    }

    #[tokio::test]
    async fn lists_recorded_snapshots() {
        let service = SnapshotService::new(Arc::new(MemorySnapshots::new()));
        let cancel = CancellationToken::new();
        service
            .record(
                NewSnapshot { base64_snapshot: "aGk=".into(), time_stamp: "12:00".into() },
                &cancel,
            )
            .await
            .unwrap();

        let all = service.list(&cancel).await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].time_stamp, "12:00");
    }
}
