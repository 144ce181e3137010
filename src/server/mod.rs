//! HTTP surface: docs CRUD, search, import, and the upstream relays

mod docs;
mod relay;


use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::config::AppConfig;
use crate::docs::DocsService;
use crate::error::AppResult;
use crate::protocol::HealthResponse;
use crate::relay::ai::AiRelay;
use crate::relay::gitlab::GitLabClient;
use crate::relay::build_http_client;

/// Request bodies may carry a full file plus JSON escaping overhead.
const BODY_LIMIT_HEADROOM: u64 = 1024 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub docs: Arc<DocsService>,
    pub gitlab: GitLabClient,
    pub ai: AiRelay,
    pub dev_mode: bool,
}

impl AppState {
    pub fn new(config: &AppConfig) -> Self {
        let http = build_http_client(config.upstream_timeout());
        Self {
            docs: Arc::new(DocsService::new(config.docs_config())),
            gitlab: GitLabClient::new(http.clone(), &config.gitlab_api, &config.gitlab_ref),
            ai: AiRelay::new(http, &config.backend_url),
            dev_mode: config.dev,
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    let body_limit = (state.docs.config().max_write_size + BODY_LIMIT_HEADROOM) as usize;

    Router::new()
        .route("/files", get(docs::list_files))
        .route("/content", get(docs::read_content))
        .route("/save", put(docs::save))
        .route("/create", post(docs::create))
        .route("/delete", delete(docs::delete))
        .route("/search", get(docs::search))
        .route("/import-gitlab", post(docs::import_gitlab))
        .route("/gitlab/files", post(relay::gitlab_files))
        .route("/gitlab/file-content", post(relay::gitlab_file_content))
        .route("/ai/chat", post(relay::ai_chat))
        .route("/healthz", get(health))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        service: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Trimmed non-empty value of a required field
pub(crate) fn required(value: Option<String>, message: &str) -> AppResult<String> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| crate::error::AppError::validation(message))
}

/// Serve until Ctrl+C or SIGTERM
pub async fn run(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let state = AppState::new(&config);
    let docs_root = state.docs.config().root.clone();
    if !docs_root.exists() {
        tracing::warn!(
            "Docs root {} does not exist yet; it will be created on first write",
            docs_root.display()
        );
    }

    let listener = TcpListener::bind(config.bind_target()).await?;
    tracing::info!(
        "docdesk listening on http://{} (docs root: {})",
        listener.local_addr()?,
        docs_root.display()
    );

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("docdesk stopped");
    Ok(())
}

#[cfg(unix)]
async fn shutdown_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigterm = match signal(SignalKind::terminate()) {
        Ok(sigterm) => sigterm,
        Err(e) => {
            tracing::warn!(
                "Failed to set up SIGTERM handler: {:?}. Only Ctrl+C will work for shutdown.",
                e
            );
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutting down (Ctrl+C)");
            return;
        }
    };

    tokio::select! {
        _ = tokio::signal::ctrl_c() => tracing::info!("Shutting down (Ctrl+C)"),
        _ = sigterm.recv() => tracing::info!("Shutting down (SIGTERM)"),
    }
}

#[cfg(not(unix))]
async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("Shutting down (Ctrl+C)");
}
