// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use template_viewer_cli::commands;
use template_viewer_cli::config::Config;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "template-viewer")]
#[command(author = "Maravilla Labs")]
#[command(version)]
#[command(about = "Render a template against JSON in the browser, reloading on change", long_about = None)]
struct Cli {
    /// Log level: error, warn, info, debug, trace
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Quiet mode: no startup banner
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Configuration file (default: template-viewer.toml if present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the viewer server with live reload
    Start {
        /// Template engine: empty for the default engine, or `liquid`
        #[arg(short, long)]
        engine: Option<String>,
        /// Port to run the server on [default: 8080]
        #[arg(short, long)]
        port: Option<u16>,
        /// Host to bind to [default: 0.0.0.0]
        #[arg(long)]
        host: Option<String>,
        /// HTML shell to frame output in (default: built-in shell)
        #[arg(long)]
        viewer: Option<PathBuf>,
        /// Fail on undefined variables in the default engine
        #[arg(long)]
        strict: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing with the specified log level
    let filter = EnvFilter::try_new(&cli.log_level)
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .init();

    let mut config = Config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Start {
            engine,
            port,
            host,
            viewer,
            strict,
        } => {
            if let Some(engine) = engine {
                config.engine.kind = engine;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            if let Some(host) = host {
                config.server.host = host;
            }
            if viewer.is_some() {
                config.viewer.shell = viewer;
            }
            config.engine.strict |= strict;

            commands::start::run(config, cli.quiet).await
        }
    }
}
