// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! HTTP server for the viewer with live reload support.
//!
//! Two routes:
//!
//! - `GET /?filePath=...&data=...` renders a template into the viewer shell.
//!   The response is always `200`; failures show up in the error box.
//! - `GET /ws` upgrades to the live reload channel.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::{
    extract::{Query, State, WebSocketUpgrade},
    response::{Html, IntoResponse},
    routing::get,
    Router,
};
use serde::Deserialize;
use template_viewer::{clean_path, render, EngineKind, EngineOptions, RenderError};
use tower_http::trace::TraceLayer;
use tracing::{debug, warn};

use super::livereload::handle_websocket;
use super::shell::{render_page, DEFAULT_SHELL};
use crate::config::Config;
use crate::watcher::WatchRegistry;

/// Shared application state for the viewer server.
pub struct AppState {
    /// Engine every render uses. Fixed at startup.
    pub engine: EngineKind,
    /// Options handed to each fresh adapter.
    pub options: EngineOptions,
    /// External viewer shell, read on every request.
    pub shell_path: Option<PathBuf>,
    /// Files under observation for live reload.
    pub registry: Arc<WatchRegistry>,
}

impl AppState {
    /// Builds the state from configuration.
    pub fn new(config: &Config, registry: Arc<WatchRegistry>) -> Self {
        Self {
            engine: config.engine.engine_kind(),
            options: config.engine.options(),
            shell_path: config.viewer.shell.clone(),
            registry,
        }
    }

    /// Registers `path` for live reload. Failures are logged and ignored.
    async fn watch(&self, path: &Path) {
        let registry = Arc::clone(&self.registry);
        let owned = path.to_path_buf();
        let result = tokio::task::spawn_blocking(move || registry.watch(owned)).await;
        match result {
            Ok(Ok(true)) => debug!(path = %path.display(), "registered for live reload"),
            Ok(Ok(false)) => {}
            Ok(Err(err)) => warn!("live reload disabled for {}: {}", path.display(), err),
            Err(err) => warn!("live reload disabled for {}: {}", path.display(), err),
        }
    }

    /// Loads the shell, falling back to the built-in one with an error.
    async fn shell(&self) -> (String, Option<String>) {
        let Some(path) = &self.shell_path else {
            return (DEFAULT_SHELL.to_string(), None);
        };

        self.watch(path).await;
        match tokio::fs::read_to_string(path).await {
            Ok(shell) => (shell, None),
            Err(err) => (
                DEFAULT_SHELL.to_string(),
                Some(format!("read viewer shell {}: {}", path.display(), err)),
            ),
        }
    }
}

/// Query parameters of the render route.
#[derive(Debug, Default, Deserialize)]
pub struct ViewQuery {
    /// Template file to render.
    #[serde(rename = "filePath")]
    pub file_path: Option<String>,
    /// JSON object used as the render context.
    pub data: Option<String>,
}

/// Builds the router with both routes.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(render_handler))
        .route("/ws", get(livereload_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Binds `addr` and serves until `shutdown` resolves.
pub async fn create_server<F>(addr: &str, state: Arc<AppState>, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await?;

    Ok(())
}

async fn livereload_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let events = state.registry.events();
    ws.on_upgrade(move |socket| handle_websocket(socket, events))
}

async fn render_handler(
    State(state): State<Arc<AppState>>,
    query: Option<Query<ViewQuery>>,
) -> Html<String> {
    let query = query.map(|Query(q)| q).unwrap_or_default();

    let (shell, shell_error) = state.shell().await;
    if let Some(message) = shell_error {
        return Html(render_page(&shell, Some(&message), ""));
    }

    match render_view(&state, &query).await {
        Ok(output) => Html(render_page(&shell, None, &output)),
        Err(err) => {
            debug!(stage = %err.stage(), "render failed: {}", err);
            Html(render_page(&shell, Some(&err.to_string()), ""))
        }
    }
}

async fn render_view(state: &AppState, query: &ViewQuery) -> Result<String, RenderError> {
    let file_path = query
        .file_path
        .as_deref()
        .ok_or(RenderError::MissingParam("filePath"))?;
    let data = query
        .data
        .as_deref()
        .ok_or(RenderError::MissingParam("data"))?;

    state.watch(Path::new(clean_path(file_path))).await;
    render(state.engine.adapter(&state.options), file_path, data).await
}
