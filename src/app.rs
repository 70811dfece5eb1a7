use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, State},
    http::{HeaderValue, StatusCode},
    middleware::from_fn_with_state,
    response::{IntoResponse, Json},
    routing::{get, post, put},
    Router,
};
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::auth::{AuthError, AuthService, JwtSettings, TokenIssuer};
use crate::config::AppConfig;
use crate::database::Stores;
use crate::handlers;
use crate::middleware::jwt_auth_middleware;
use crate::services::{ContentStore, GroupIndex, SnapshotService, UploadPolicy};

/// Everything a handler needs, built once at start-up
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub json: crate::services::JsonService,
    pub files: crate::services::FileService,
    pub snapshots: SnapshotService,
    pub auth: AuthService,
    pub uploads: Arc<UploadPolicy>,
    pub stores: Stores,
    shutdown: CancellationToken,
}

impl AppState {
    pub fn new(config: AppConfig, stores: Stores) -> Result<Self, AuthError> {
        let tokens = TokenIssuer::new(JwtSettings::from_config(&config.security))?;
        let index = Arc::new(GroupIndex::new(
            stores.groups.clone(),
            config.group_index.max_attempts,
        ));

        Ok(Self {
            json: ContentStore::new(stores.json.clone(), Arc::clone(&index)),
            files: ContentStore::new(stores.files.clone(), index),
            snapshots: SnapshotService::new(stores.snapshots.clone()),
            auth: AuthService::new(stores.users.clone(), tokens),
            uploads: Arc::new(UploadPolicy::from_config(&config.uploads)),
            config: Arc::new(config),
            stores,
            shutdown: CancellationToken::new(),
        })
    }

    /// Token for one request; fires when the server starts shutting down
    pub fn cancel_token(&self) -> CancellationToken {
        self.shutdown.child_token()
    }

    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }
}

pub fn router(state: AppState) -> Router {
    let protected = Router::new()
        .merge(auth_routes())
        .merge(group_routes())
        .merge(json_routes())
        .merge(file_routes())
        .merge(snapshot_routes())
        .route_layer(from_fn_with_state(state.clone(), jwt_auth_middleware));

    let mut app = Router::new()
        // Public
        .route("/", get(root))
        .route("/health", get(health))
        .route("/auth/login", post(handlers::public::auth::login_post))
        // Protected API
        .merge(protected)
        .layer(DefaultBodyLimit::max(state.config.api.max_request_size_bytes));

    if state.config.security.enable_cors {
        app = app.layer(cors_layer(&state.config.security.cors_origins));
    }
    if state.config.api.enable_request_logging {
        app = app.layer(TraceLayer::new_for_http());
    }

    app.with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|o| o == "*") {
        return CorsLayer::permissive();
    }
    let origins: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();
    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(tower_http::cors::Any)
        .allow_headers(tower_http::cors::Any)
}

fn auth_routes() -> Router<AppState> {
    use handlers::protected::auth;

    Router::new().route("/api/auth/whoami", get(auth::whoami))
}

fn group_routes() -> Router<AppState> {
    use handlers::protected::{files, groups, json};

    Router::new()
        .route("/api/groups/:group", get(groups::get))
        .route("/api/groups/:group/json", get(json::group_get).post(json::group_post))
        .route("/api/groups/:group/files", get(files::group_get))
        .route("/api/groups/:group/documents", post(files::document_post))
        .route("/api/groups/:group/images", post(files::image_post))
}

fn json_routes() -> Router<AppState> {
    use handlers::protected::json;

    Router::new().route(
        "/api/json/:id",
        get(json::record_get).put(json::record_put).delete(json::record_delete),
    )
}

fn file_routes() -> Router<AppState> {
    use handlers::protected::files;

    Router::new()
        .route("/api/documents/:id", get(files::document_get))
        .route("/api/images/:id", get(files::image_get))
        .route("/api/files/:id", put(files::record_put).delete(files::record_delete))
}

fn snapshot_routes() -> Router<AppState> {
    use handlers::protected::snapshots;

    Router::new().route("/api/snapshots", get(snapshots::list).post(snapshots::create))
}

async fn root() -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    Json(json!({
        "success": true,
        "data": {
            "name": "Espra API",
            "version": version,
            "description": "Group-scoped storage for JSON documents, files and device snapshots",
            "endpoints": {
                "public_auth": "/auth/login (public - token acquisition)",
                "auth": "/api/auth/whoami (protected)",
                "groups": "/api/groups/:group[/json|/files|/documents|/images] (protected)",
                "json": "/api/json/:id (protected)",
                "files": "/api/documents/:id, /api/images/:id, /api/files/:id (protected)",
                "snapshots": "/api/snapshots (protected)",
            }
        }
    }))
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    match state.stores.health.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "database": "ok"
                }
            })),
        ),
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "success": false,
                "error": "database unavailable",
                "data": {
                    "status": "degraded",
                    "timestamp": now,
                    "database_error": e.to_string()
                }
            })),
        ),
    }
}

#[cfg(test)]
mod tests {
    use crate::database::models::{FilePayload, JsonPayload};
    use crate::services::ContentError;
    use crate::testing::TestContext;
    use crate::types::Role;

    #[tokio::test]
    async fn json_and_files_share_one_group_record() {
        let ctx = TestContext::new().unwrap();
        let group = ctx.unique_group("shared");

        let doc = ctx
            .state
            .json
            .add(&group, JsonPayload(r#"{"k":"v"}"#.into()), &ctx.cancel)
            .await
            .unwrap();
        let file = ctx
            .state
            .files
            .add(&group, FilePayload { extension: ".txt".into(), data: b"hello".to_vec() }, &ctx.cancel)
            .await
            .unwrap();

        let info = ctx.state.files.group_info(&group, &ctx.cancel).await.unwrap();
        assert_eq!(info.json_ids, vec![doc.id]);
        assert_eq!(info.file_ids, vec![file.id]);
        ctx.assert_index_consistent(&group).await.unwrap();
    }

    #[tokio::test]
    async fn shutdown_cancels_request_tokens() {
        let ctx = TestContext::new().unwrap();
        let group = ctx.unique_group("shutdown");
        ctx.state.shutdown();

        let err = ctx
            .state
            .json
            .add(&group, JsonPayload("{}".into()), &ctx.state.cancel_token())
            .await
            .unwrap_err();
        assert!(matches!(err, ContentError::Cancelled));
    }

    #[tokio::test]
    async fn seeded_user_can_log_in() {
        let ctx = TestContext::new().unwrap();
        ctx.create_user("viewer", "viewerpass", vec![Role::Web]).await.unwrap();

        let response = ctx
            .state
            .auth
            .login(&crate::auth::LoginRequest {
                username: "viewer".into(),
                password: "viewerpass".into(),
            })
            .await
            .unwrap();
        assert_eq!(response.roles, vec![Role::Web]);
    }
}
