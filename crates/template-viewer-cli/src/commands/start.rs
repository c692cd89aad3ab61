// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! Viewer server command with live reload support.

use console::style;
use std::sync::Arc;
use tokio::signal;
use tracing::{info, warn};

use crate::config::Config;
use crate::server::http::{create_server, AppState};
use crate::watcher::{log_activity, WatchRegistry};

/// Runs the viewer server until Ctrl+C.
pub async fn run(config: Config, quiet: bool) -> anyhow::Result<()> {
    let registry = Arc::new(WatchRegistry::new(config.watch.debounce())?);
    tokio::spawn(log_activity(registry.events(), registry.errors()));

    let state = Arc::new(AppState::new(&config, registry.clone()));
    let addr = format!("{}:{}", config.server.host, config.server.port);

    if !quiet {
        println!(
            "{} {}",
            style("Engine:").cyan(),
            style(state.engine).dim()
        );
        if let Some(shell) = &state.shell_path {
            println!(
                "{} {}",
                style("Shell:").cyan(),
                style(shell.display()).dim()
            );
        }
        println!(
            "{} {}",
            style("Listening on:").cyan(),
            style(format!("http://{}", addr)).green().bold()
        );
        println!();
    }
    info!(%addr, engine = %state.engine, "starting viewer");

    create_server(&addr, state, shutdown_signal(registry)).await
}

/// Resolves on Ctrl+C after closing the registry, which ends every
/// live reload subscription.
async fn shutdown_signal(registry: Arc<WatchRegistry>) {
    if let Err(err) = signal::ctrl_c().await {
        warn!("cannot listen for Ctrl+C: {}", err);
        std::future::pending::<()>().await;
    }
    info!("shutting down");
    let _ = tokio::task::spawn_blocking(move || registry.close()).await;
}
