pub mod commands;
pub mod utils;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

use crate::app::AppState;
use crate::config::AppConfig;
use crate::database::Stores;

#[derive(Parser)]
#[command(name = "espra")]
#[command(about = "Espra CLI - administration for the Espra content storage API")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in human-readable text format")]
    pub text: bool,

    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Create database tables and indexes")]
    Migrate,

    #[command(about = "User account management")]
    User {
        #[command(subcommand)]
        cmd: commands::user::UserCommands,
    },

    #[command(about = "Inspect group membership records")]
    Group {
        #[command(subcommand)]
        cmd: commands::group::GroupCommands,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

/// Application state over the configured backend, the same way the server builds it
pub(crate) async fn connect_state(config: AppConfig) -> anyhow::Result<AppState> {
    let stores = Stores::connect(&config)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to open store: {}", e))?;
    AppState::new(config, stores)
        .map_err(|e| anyhow::anyhow!("Failed to initialise auth (is JWT_SECRET set?): {}", e))
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);
    let config = AppConfig::from_env();

    match cli.command {
        Commands::Migrate => commands::migrate::handle(config, output_format).await,
        Commands::User { cmd } => commands::user::handle(cmd, config, output_format).await,
        Commands::Group { cmd } => commands::group::handle(cmd, config, output_format).await,
    }
}
