#![allow(dead_code)]

use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use reqwest::StatusCode;
use serde_json::{json, Value};

use espra_api::config::AppConfig;
use espra_api::database::Stores;
use espra_api::types::Role;
use espra_api::{router, AppState};

pub const ADMIN: (&str, &str) = ("admin", "adminpass");
pub const VIEWER: (&str, &str) = ("viewer", "viewerpass");

/// Real router over in-memory stores, served on a free local port for the
/// lifetime of the calling test's runtime.
pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    pub client: reqwest::Client,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let deadline = Instant::now() + timeout;
        loop {
            if Instant::now() > deadline {
                break;
            }
            if let Ok(resp) = self.client.get(self.url("/health")).send().await {
                if resp.status() == StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }

    /// POST /auth/login and return the bearer token
    pub async fn login(&self, username: &str, password: &str) -> Result<String> {
        let res = self
            .client
            .post(self.url("/auth/login"))
            .json(&json!({ "username": username, "password": password }))
            .send()
            .await?;
        anyhow::ensure!(res.status() == StatusCode::OK, "login failed: {}", res.status());

        let body: Value = res.json().await?;
        body["data"]["token"]
            .as_str()
            .map(str::to_string)
            .context("login response has no token")
    }

    pub async fn admin_token(&self) -> Result<String> {
        self.login(ADMIN.0, ADMIN.1).await
    }

    pub async fn viewer_token(&self) -> Result<String> {
        self.login(VIEWER.0, VIEWER.1).await
    }
}

pub async fn spawn_server() -> Result<TestServer> {
    let port = portpicker::pick_unused_port().context("failed to pick free port")?;

    let mut config = AppConfig::in_memory();
    config.api.port = port;
    config.api.enable_request_logging = false;
    config.group_index.max_attempts = 64;

    let state = AppState::new(config, Stores::memory())?;
    state
        .auth
        .register_user(ADMIN.0, ADMIN.1, vec![Role::Admin])
        .await?;
    state
        .auth
        .register_user(VIEWER.0, VIEWER.1, vec![Role::Web])
        .await?;

    let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
        .await
        .context("failed to bind test port")?;
    let app = router(state);
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    let server = TestServer {
        port,
        base_url: format!("http://127.0.0.1:{}", port),
        client: reqwest::Client::new(),
    };
    server.wait_ready(Duration::from_secs(5)).await?;
    Ok(server)
}

/// Unique group name per test
pub fn group(prefix: &str) -> String {
    format!("{}-{}", prefix, uuid::Uuid::new_v4().simple())
}
