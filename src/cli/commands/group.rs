use clap::Subcommand;
use serde_json::json;
use tokio_util::sync::CancellationToken;

use crate::cli::utils::print_json;
use crate::cli::{connect_state, OutputFormat};
use crate::config::AppConfig;

#[derive(Subcommand)]
pub enum GroupCommands {
    #[command(about = "Show the JSON and file ids listed for a group")]
    Show {
        #[arg(help = "Group name")]
        name: String,
    },
}

pub async fn handle(cmd: GroupCommands, config: AppConfig, output_format: OutputFormat) -> anyhow::Result<()> {
    let state = connect_state(config).await?;

    match cmd {
        GroupCommands::Show { name } => {
            let info = state
                .json
                .group_info(&name, &CancellationToken::new())
                .await
                .map_err(|e| anyhow::anyhow!("{}", e))?;

            match output_format {
                OutputFormat::Json => {
                    print_json(&json!({
                        "group": info.group_name,
                        "id": info.id,
                        "json_ids": info.json_ids,
                        "file_ids": info.file_ids,
                        "version": info.version,
                    }))?;
                }
                OutputFormat::Text => {
                    println!("Group: {} ({})", info.group_name, info.id);
                    println!("Version: {}", info.version);
                    println!("JSON documents ({}):", info.json_ids.len());
                    for id in &info.json_ids {
                        println!("  {}", id);
                    }
                    println!("Files ({}):", info.file_ids.len());
                    for id in &info.file_ids {
                        println!("  {}", id);
                    }
                }
            }
            Ok(())
        }
    }
}
