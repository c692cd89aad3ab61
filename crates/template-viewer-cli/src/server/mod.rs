// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! Viewer server components.
//!
//! # Components
//!
//! - `http`: render and live reload routes using Axum
//! - `livereload`: WebSocket fan-out of change events
//! - `shell`: the HTML page rendered output is framed in

/// HTTP server implementation using Axum.
pub mod http;
/// Live reload WebSocket handler.
pub mod livereload;
/// Viewer shell filling and error box formatting.
pub mod shell;
