use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::database::models::GroupInfo;
use crate::database::{DatabaseError, GroupRepository};
use crate::services::{cancellable, ContentError};
use crate::types::ContentKind;

/// Keeps each group's JSON and file membership lists in step with the content stores.
///
/// Every write replaces a whole list, but only if the record's version is still
/// the one that was read. A writer that loses the race re-reads and tries again,
/// so concurrent adds and removes on one group never overwrite each other.
pub struct GroupIndex {
    groups: Arc<dyn GroupRepository>,
    max_attempts: u32,
}

impl GroupIndex {
    pub fn new(groups: Arc<dyn GroupRepository>, max_attempts: u32) -> Self {
        Self {
            groups,
            max_attempts: max_attempts.max(1),
        }
    }

    /// Record `id` under `group`, creating the group on first use.
    /// An id that is already listed is left alone.
    pub async fn add_member(
        &self,
        group: &str,
        id: Uuid,
        kind: ContentKind,
        cancel: &CancellationToken,
    ) -> Result<(), ContentError> {
        for attempt in 1..=self.max_attempts {
            match cancellable(cancel, self.groups.find_group(group)).await? {
                None => {
                    let mut info = GroupInfo::new(group);
                    info.members_mut(kind).push(id);

                    match cancellable(cancel, self.groups.create_group(&info)).await {
                        Ok(()) => {
                            debug!("Created group '{}' with first {} member {}", group, kind, id);
                            return Ok(());
                        }
                        // Someone else created it first; go round and append instead
                        Err(ContentError::Store(DatabaseError::Conflict(_))) => {
                            debug!("Group '{}' created concurrently (attempt {})", group, attempt);
                        }
                        Err(e) => return Err(e),
                    }
                }
                Some(info) => {
                    let mut members = info.members(kind).to_vec();
                    if members.contains(&id) {
                        return Ok(());
                    }
                    members.push(id);

                    let written = cancellable(
                        cancel,
                        self.groups.replace_members(group, kind, &members, info.version),
                    )
                    .await?;
                    if written {
                        return Ok(());
                    }
                    debug!("Stale version {} for group '{}' (attempt {})", info.version, group, attempt);
                }
            }
            tokio::task::yield_now().await;
        }

        warn!("Giving up adding {} {} to group '{}' after {} attempts", kind, id, group, self.max_attempts);
        Err(ContentError::IndexConflict {
            group: group.to_string(),
            attempts: self.max_attempts,
        })
    }

    /// Drop `id` from the group's `kind` list. Fails with NotFound when the
    /// group was never created; an id that is not listed is a no-op.
    pub async fn remove_member(
        &self,
        group: &str,
        id: Uuid,
        kind: ContentKind,
        cancel: &CancellationToken,
    ) -> Result<(), ContentError> {
        for attempt in 1..=self.max_attempts {
            let info = cancellable(cancel, self.groups.find_group(group))
                .await?
                .ok_or_else(|| ContentError::NotFound(format!("group '{}'", group)))?;

            let members = info.members(kind);
            if !members.contains(&id) {
                return Ok(());
            }
            let remaining: Vec<Uuid> = members.iter().copied().filter(|m| *m != id).collect();

            let written = cancellable(
                cancel,
                self.groups.replace_members(group, kind, &remaining, info.version),
            )
            .await?;
            if written {
                return Ok(());
            }
            debug!("Stale version {} for group '{}' (attempt {})", info.version, group, attempt);
            tokio::task::yield_now().await;
        }

        warn!("Giving up removing {} {} from group '{}' after {} attempts", kind, id, group, self.max_attempts);
        Err(ContentError::IndexConflict {
            group: group.to_string(),
            attempts: self.max_attempts,
        })
    }

    pub async fn get_info(
        &self,
        group: &str,
        cancel: &CancellationToken,
    ) -> Result<GroupInfo, ContentError> {
        cancellable(cancel, self.groups.find_group(group))
            .await?
            .ok_or_else(|| ContentError::NotFound(format!("group '{}'", group)))
    }
}
