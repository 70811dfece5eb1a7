use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{postgres::PgRow, PgPool, Row};
use uuid::Uuid;

use crate::database::manager::{DatabaseError, DatabaseManager};
use crate::database::models::{
    FileDocument, FilePayload, GroupInfo, JsonDocument, JsonPayload, NewSnapshot, Snapshot, User,
};
use crate::database::repository::{
    ContentRepository, GroupRepository, SnapshotRepository, StoreHealth, UserRepository,
};
use crate::types::{ContentKind, Role};

/// PostgreSQL-backed implementation of every store trait
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn json_from_row(row: &PgRow) -> Result<JsonDocument, DatabaseError> {
    Ok(JsonDocument {
        id: row.try_get("id")?,
        group_id: row.try_get("group_id")?,
        payload: JsonPayload(row.try_get("data")?),
        date_added: row.try_get("date_added")?,
        last_modified: row.try_get("last_modified")?,
    })
}

fn file_from_row(row: &PgRow) -> Result<FileDocument, DatabaseError> {
    Ok(FileDocument {
        id: row.try_get("id")?,
        group_id: row.try_get("group_id")?,
        payload: FilePayload {
            extension: row.try_get("extension")?,
            data: row.try_get("data")?,
        },
        date_added: row.try_get("date_added")?,
        last_modified: row.try_get("last_modified")?,
    })
}

fn group_from_row(row: &PgRow) -> Result<GroupInfo, DatabaseError> {
    Ok(GroupInfo {
        id: row.try_get("id")?,
        group_name: row.try_get("group_name")?,
        json_ids: row.try_get("json_ids")?,
        file_ids: row.try_get("file_ids")?,
        version: row.try_get("version")?,
    })
}

fn user_from_row(row: &PgRow) -> Result<User, DatabaseError> {
    let raw_roles: Vec<String> = row.try_get("roles")?;
    let roles = raw_roles
        .iter()
        .map(|r| r.parse::<Role>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(DatabaseError::Decode)?;

    Ok(User {
        id: row.try_get("id")?,
        username: row.try_get("username")?,
        password_hash: row.try_get("password_hash")?,
        roles,
        created_at: row.try_get("created_at")?,
    })
}

fn snapshot_from_row(row: &PgRow) -> Result<Snapshot, DatabaseError> {
    Ok(Snapshot {
        id: row.try_get("id")?,
        base64_snapshot: row.try_get("base64_snapshot")?,
        time_stamp: row.try_get("time_stamp")?,
        created_at: row.try_get("created_at")?,
    })
}

#[async_trait]
impl ContentRepository<JsonPayload> for PgStore {
    async fn insert(&self, item: &JsonDocument) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            INSERT INTO json_documents (id, group_id, data, date_added, last_modified)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(item.id)
        .bind(&item.group_id)
        .bind(&item.payload.0)
        .bind(item.date_added)
        .bind(item.last_modified)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<JsonDocument>, DatabaseError> {
        let row = sqlx::query(
            "SELECT id, group_id, data, date_added, last_modified FROM json_documents WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(json_from_row).transpose()
    }

    async fn find_by_group(&self, group_id: &str) -> Result<Vec<JsonDocument>, DatabaseError> {
        let rows = sqlx::query(
            r#"
            SELECT id, group_id, data, date_added, last_modified
            FROM json_documents
            WHERE group_id = $1
            ORDER BY date_added
            "#,
        )
        .bind(group_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(json_from_row).collect()
    }

    async fn update_payload(
        &self,
        id: Uuid,
        payload: &JsonPayload,
        last_modified: DateTime<Utc>,
    ) -> Result<bool, DatabaseError> {
        let result = sqlx::query("UPDATE json_documents SET data = $1, last_modified = $2 WHERE id = $3")
            .bind(&payload.0)
            .bind(last_modified)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_by_id(&self, id: Uuid) -> Result<bool, DatabaseError> {
        let result = sqlx::query("DELETE FROM json_documents WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl ContentRepository<FilePayload> for PgStore {
    async fn insert(&self, item: &FileDocument) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            INSERT INTO file_documents (id, group_id, extension, data, date_added, last_modified)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(item.id)
        .bind(&item.group_id)
        .bind(&item.payload.extension)
        .bind(&item.payload.data)
        .bind(item.date_added)
        .bind(item.last_modified)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<FileDocument>, DatabaseError> {
        let row = sqlx::query(
            r#"
            SELECT id, group_id, extension, data, date_added, last_modified
            FROM file_documents
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(file_from_row).transpose()
    }

    async fn find_by_group(&self, group_id: &str) -> Result<Vec<FileDocument>, DatabaseError> {
        let rows = sqlx::query(
            r#"
            SELECT id, group_id, extension, data, date_added, last_modified
            FROM file_documents
            WHERE group_id = $1
            ORDER BY date_added
            "#,
        )
        .bind(group_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(file_from_row).collect()
    }

    async fn update_payload(
        &self,
        id: Uuid,
        payload: &FilePayload,
        last_modified: DateTime<Utc>,
    ) -> Result<bool, DatabaseError> {
        let result = sqlx::query(
            "UPDATE file_documents SET extension = $1, data = $2, last_modified = $3 WHERE id = $4",
        )
        .bind(&payload.extension)
        .bind(&payload.data)
        .bind(last_modified)
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_by_id(&self, id: Uuid) -> Result<bool, DatabaseError> {
        let result = sqlx::query("DELETE FROM file_documents WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl GroupRepository for PgStore {
    async fn find_group(&self, group_name: &str) -> Result<Option<GroupInfo>, DatabaseError> {
        let row = sqlx::query(
            "SELECT id, group_name, json_ids, file_ids, version FROM group_info WHERE group_name = $1",
        )
        .bind(group_name)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(group_from_row).transpose()
    }

    async fn create_group(&self, group: &GroupInfo) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            INSERT INTO group_info (id, group_name, json_ids, file_ids, version)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(group.id)
        .bind(&group.group_name)
        .bind(&group.json_ids)
        .bind(&group.file_ids)
        .bind(group.version)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn replace_members(
        &self,
        group_name: &str,
        kind: ContentKind,
        ids: &[Uuid],
        expected_version: i64,
    ) -> Result<bool, DatabaseError> {
        let column = match kind {
            ContentKind::Json => "json_ids",
            ContentKind::File => "file_ids",
        };
        let sql = format!(
            "UPDATE group_info SET {} = $1, version = version + 1 WHERE group_name = $2 AND version = $3",
            column
        );

        let result = sqlx::query(&sql)
            .bind(ids)
            .bind(group_name)
            .bind(expected_version)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() == 1)
    }
}

#[async_trait]
impl UserRepository for PgStore {
    async fn find_user(&self, username: &str) -> Result<Option<User>, DatabaseError> {
        let row = sqlx::query(
            "SELECT id, username, password_hash, roles, created_at FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(user_from_row).transpose()
    }

    async fn create_user(&self, user: &User) -> Result<(), DatabaseError> {
        let roles: Vec<&str> = user.roles.iter().map(Role::as_str).collect();
        sqlx::query(
            r#"
            INSERT INTO users (id, username, password_hash, roles, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(user.id)
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(&roles)
        .bind(user.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn list_users(&self) -> Result<Vec<User>, DatabaseError> {
        let rows = sqlx::query(
            "SELECT id, username, password_hash, roles, created_at FROM users ORDER BY username",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(user_from_row).collect()
    }
}

#[async_trait]
impl SnapshotRepository for PgStore {
    async fn add_snapshot(&self, snapshot: &NewSnapshot) -> Result<Snapshot, DatabaseError> {
        let row = sqlx::query(
            r#"
            INSERT INTO esp32_snapshots (base64_snapshot, time_stamp)
            VALUES ($1, $2)
            RETURNING id, base64_snapshot, time_stamp, created_at
            "#,
        )
        .bind(&snapshot.base64_snapshot)
        .bind(&snapshot.time_stamp)
        .fetch_one(&self.pool)
        .await?;

        snapshot_from_row(&row)
    }

    async fn list_snapshots(&self) -> Result<Vec<Snapshot>, DatabaseError> {
        let rows = sqlx::query(
            "SELECT id, base64_snapshot, time_stamp, created_at FROM esp32_snapshots ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(snapshot_from_row).collect()
    }
}

#[async_trait]
impl StoreHealth for PgStore {
    async fn ping(&self) -> Result<(), DatabaseError> {
        DatabaseManager::health_check(&self.pool).await
    }
}
