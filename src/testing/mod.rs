use std::collections::HashSet;

use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::app::AppState;
use crate::config::AppConfig;
use crate::database::models::User;
use crate::database::Stores;
use crate::types::Role;

/// Application state over fresh in-memory stores, for unit tests
pub struct TestContext {
    pub state: AppState,
    pub cancel: CancellationToken,
}

impl TestContext {
    pub fn new() -> anyhow::Result<Self> {
        let state = AppState::new(AppConfig::in_memory(), Stores::memory())
            .map_err(|e| anyhow::anyhow!("Failed to build test state: {}", e))?;
        let cancel = state.cancel_token();
        Ok(Self { state, cancel })
    }

    pub async fn create_user(&self, username: &str, password: &str, roles: Vec<Role>) -> anyhow::Result<User> {
        self.state
            .auth
            .register_user(username, password, roles)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to create test user: {}", e))
    }

    /// Unique group name so tests never share membership records
    pub fn unique_group(&self, prefix: &str) -> String {
        format!("{}_{}", prefix, Uuid::new_v4().simple())
    }

    /// Fails unless the group's membership lists match the stored items exactly
    pub async fn assert_index_consistent(&self, group: &str) -> anyhow::Result<()> {
        let info = self
            .state
            .json
            .group_info(group, &self.cancel)
            .await
            .map_err(|e| anyhow::anyhow!("{}", e))?;

        let json: HashSet<Uuid> = self
            .state
            .json
            .get_by_group(group, &self.cancel)
            .await
            .map_err(|e| anyhow::anyhow!("{}", e))?
            .iter()
            .map(|d| d.id)
            .collect();
        let files: HashSet<Uuid> = self
            .state
            .files
            .get_by_group(group, &self.cancel)
            .await
            .map_err(|e| anyhow::anyhow!("{}", e))?
            .iter()
            .map(|f| f.id)
            .collect();

        anyhow::ensure!(
            info.json_ids.len() == json.len() && info.json_ids.iter().all(|id| json.contains(id)),
            "json index {:?} does not match stored {:?}",
            info.json_ids,
            json
        );
        anyhow::ensure!(
            info.file_ids.len() == files.len() && info.file_ids.iter().all(|id| files.contains(id)),
            "file index {:?} does not match stored {:?}",
            info.file_ids,
            files
        );
        Ok(())
    }
}
