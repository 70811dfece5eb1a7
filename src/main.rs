use std::net::SocketAddr;

use anyhow::Context;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use espra_api::app::{router, AppState};
use espra_api::config::AppConfig;
use espra_api::database::Stores;
use espra_api::types::Role;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = AppConfig::from_env();
    info!(
        "Starting Espra API in {:?} mode ({:?} storage)",
        config.environment, config.storage
    );

    let stores = Stores::connect(&config).await.context("failed to open store")?;
    let state = AppState::new(config.clone(), stores).context("failed to initialise authentication")?;
    bootstrap_admin(&state).await?;

    let bind_addr = SocketAddr::from(([0, 0, 0, 0], config.api.port));
    let listener = tokio::net::TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    info!("Espra API listening on http://{}", bind_addr);

    let shutdown_state = state.clone();
    axum::serve(listener, router(state))
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            // In-flight store operations observe this through their request tokens
            shutdown_state.shutdown();
        })
        .await
        .context("server error")?;

    info!("Espra API stopped");
    Ok(())
}

/// Seed an admin account from BOOTSTRAP_ADMIN_USERNAME / BOOTSTRAP_ADMIN_PASSWORD
async fn bootstrap_admin(state: &AppState) -> anyhow::Result<()> {
    let (Ok(username), Ok(password)) = (
        std::env::var("BOOTSTRAP_ADMIN_USERNAME"),
        std::env::var("BOOTSTRAP_ADMIN_PASSWORD"),
    ) else {
        return Ok(());
    };

    let created = state
        .auth
        .ensure_user(&username, &password, vec![Role::Admin])
        .await
        .context("failed to create bootstrap admin")?;
    if created {
        info!("Created bootstrap admin '{}'", username);
    }
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            info!("Received SIGTERM signal");
        },
    }
}
