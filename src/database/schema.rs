/// Idempotent DDL run at start-up and by `espra migrate`
pub const STATEMENTS: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS json_documents (
        id UUID PRIMARY KEY,
        group_id TEXT NOT NULL,
        data TEXT NOT NULL,
        date_added TIMESTAMPTZ NOT NULL,
        last_modified TIMESTAMPTZ NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS json_documents_group_id_idx ON json_documents (group_id)",
    r#"
    CREATE TABLE IF NOT EXISTS file_documents (
        id UUID PRIMARY KEY,
        group_id TEXT NOT NULL,
        extension TEXT NOT NULL,
        data BYTEA NOT NULL,
        date_added TIMESTAMPTZ NOT NULL,
        last_modified TIMESTAMPTZ NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS file_documents_group_id_idx ON file_documents (group_id)",
    r#"
    CREATE TABLE IF NOT EXISTS group_info (
        id UUID PRIMARY KEY,
        group_name TEXT NOT NULL UNIQUE,
        json_ids UUID[] NOT NULL DEFAULT '{}',
        file_ids UUID[] NOT NULL DEFAULT '{}',
        version BIGINT NOT NULL DEFAULT 0
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id UUID PRIMARY KEY,
        username TEXT NOT NULL UNIQUE,
        password_hash TEXT NOT NULL,
        roles TEXT[] NOT NULL DEFAULT '{}',
        created_at TIMESTAMPTZ NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS esp32_snapshots (
        id BIGSERIAL PRIMARY KEY,
        base64_snapshot TEXT NOT NULL,
        time_stamp TEXT NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
];
