pub mod content_store;
pub mod group_index;
pub mod snapshots;
pub mod uploads;

use std::future::Future;

use tokio_util::sync::CancellationToken;

use crate::database::DatabaseError;

pub use content_store::{ContentStore, FileService, JsonService};
pub use group_index::GroupIndex;
pub use snapshots::SnapshotService;
pub use uploads::{UploadCategory, UploadPolicy};

/// Outcome of a content or group-index operation that did not succeed
#[derive(Debug, thiserror::Error)]
pub enum ContentError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Group '{group}' changed concurrently {attempts} times; membership update abandoned")]
    IndexConflict { group: String, attempts: u32 },

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Store error: {0}")]
    Store(DatabaseError),
}

impl From<DatabaseError> for ContentError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::Unavailable(msg) => ContentError::StoreUnavailable(msg),
            other => ContentError::Store(other),
        }
    }
}

/// Run one storage step unless `cancel` fires first.
///
/// A token that is already cancelled never polls `fut`, so nothing is written.
pub async fn cancellable<T, F>(cancel: &CancellationToken, fut: F) -> Result<T, ContentError>
where
    F: Future<Output = Result<T, DatabaseError>>,
{
    if cancel.is_cancelled() {
        return Err(ContentError::Cancelled);
    }

    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(ContentError::Cancelled),
        result = fut => result.map_err(ContentError::from),
    }
}
