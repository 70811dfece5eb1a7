use serde_json::json;

use crate::cli::utils::report_success;
use crate::cli::OutputFormat;
use crate::config::{AppConfig, StorageBackend};
use crate::database::{schema, DatabaseManager};

pub async fn handle(config: AppConfig, output_format: OutputFormat) -> anyhow::Result<()> {
    if config.storage == StorageBackend::Memory {
        return report_success(
            &output_format,
            "In-memory backend selected, nothing to migrate",
            None,
        );
    }

    let pool = DatabaseManager::connect(&config.database).await?;
    DatabaseManager::ensure_schema(&pool).await?;

    report_success(
        &output_format,
        "Database schema is up to date",
        Some(json!({ "statements": schema::STATEMENTS.len() })),
    )
}
