// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

// Warn on missing documentation for public items
#![warn(missing_docs)]

//! Template viewer CLI library.
//!
//! Serves a browser page that renders a template file against JSON data and
//! reloads itself whenever the file changes on disk.
//!
//! # Usage
//!
//! ```bash
//! template-viewer start                      # default engine on 0.0.0.0:8080
//! template-viewer start --engine liquid      # render with liquid
//! ```
//!
//! Then open `http://localhost:8080/?filePath=page.html&data={}`.
//!
//! # Configuration
//!
//! Optional settings live in `template-viewer.toml` in the working directory.

/// CLI commands.
pub mod commands;
/// Viewer configuration from `template-viewer.toml`.
pub mod config;
/// HTTP server and live reload.
pub mod server;
/// File system watching for live reload.
pub mod watcher;
