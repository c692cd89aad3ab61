// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

// Warn on missing documentation for public items
#![warn(missing_docs)]

//! # template-viewer
//!
//! Engine adapters and the render pipeline behind the live template viewer.
//!
//! Two engines are supported behind the [`TemplateAdapter`] trait:
//!
//! - the default engine (minijinja), which compiles up front and can render
//!   a single named block,
//! - liquid, which parses and renders in one pass.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use template_viewer::{render, EngineKind, EngineOptions};
//!
//! let adapter = EngineKind::Default.adapter(&EngineOptions::default());
//! let html = render(adapter, "page.html", r#"{"title":"Hello"}"#).await?;
//! ```

/// Engine adapters and the render context.
pub mod engine;
/// Error types and pipeline stages.
pub mod error;
/// File-to-output render pipeline.
pub mod render;

pub use engine::{
    decode_context, EngineKind, EngineOptions, JinjaAdapter, LiquidAdapter, RenderContext,
    TemplateAdapter,
};
pub use error::{EngineError, RenderError, Stage};
pub use render::{clean_path, render, ENTRY_BLOCK};
