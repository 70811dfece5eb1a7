use clap::Subcommand;
use serde_json::json;

use crate::cli::utils::{print_json, report_empty, report_success};
use crate::cli::{connect_state, OutputFormat};
use crate::config::AppConfig;
use crate::types::Role;

#[derive(Subcommand)]
pub enum UserCommands {
    #[command(about = "Create a user")]
    Add {
        #[arg(help = "Username")]
        username: String,

        #[arg(help = "Password (at least 5 characters)")]
        password: String,

        #[arg(long = "role", help = "Role to grant: admin or web (repeatable, default web)")]
        roles: Vec<Role>,
    },

    #[command(about = "List users")]
    List,
}

pub async fn handle(cmd: UserCommands, config: AppConfig, output_format: OutputFormat) -> anyhow::Result<()> {
    let state = connect_state(config).await?;

    match cmd {
        UserCommands::Add { username, password, mut roles } => {
            if roles.is_empty() {
                roles.push(Role::Web);
            }
            roles.dedup();

            let user = state
                .auth
                .register_user(&username, &password, roles)
                .await
                .map_err(|e| anyhow::anyhow!("{}", e))?;

            report_success(
                &output_format,
                &format!("User '{}' created", user.username),
                Some(json!({ "user": user })),
            )
        }
        UserCommands::List => {
            let users = state.auth.list_users().await.map_err(|e| anyhow::anyhow!("{}", e))?;
            if users.is_empty() {
                return report_empty(&output_format, "users", "No users");
            }

            match output_format {
                OutputFormat::Json => {
                    print_json(&json!({ "users": users }))?;
                }
                OutputFormat::Text => {
                    println!("{:<24} {:<16} {}", "USERNAME", "ROLES", "CREATED");
                    println!("{}", "-".repeat(60));
                    for user in &users {
                        let roles: Vec<&str> = user.roles.iter().map(Role::as_str).collect();
                        println!(
                            "{:<24} {:<16} {}",
                            user.username,
                            roles.join(","),
                            user.created_at.format("%Y-%m-%d %H:%M")
                        );
                    }
                }
            }
            Ok(())
        }
    }
}
