// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! Uniform adapter over the supported template engines.
//!
//! Both engines are driven through the same three calls:
//!
//! 1. [`TemplateAdapter::parse`] stores or compiles a source text,
//! 2. [`TemplateAdapter::lookup`] optionally narrows rendering to a named block,
//! 3. [`TemplateAdapter::execute`] renders against a [`RenderContext`].
//!
//! The engines differ in where the real work happens. [`JinjaAdapter`]
//! compiles on `parse` and can address named blocks. [`LiquidAdapter`] only
//! keeps the text on `parse` and compiles as part of `execute`, so its syntax
//! errors show up at execute time.
//!
//! # Example
//!
//! ```rust,ignore
//! use template_viewer::{EngineKind, EngineOptions};
//!
//! let mut adapter = EngineKind::Liquid.adapter(&EngineOptions::default());
//! adapter.parse("Hello {{ name }}")?;
//! let adapter = adapter.lookup("content");
//! let context = template_viewer::decode_context(r#"{"name":"Ada"}"#)?;
//! assert_eq!(adapter.execute(&context)?, "Hello Ada");
//! ```

use std::fmt;

use crate::error::Result;

mod jinja;
mod liquid;

pub use self::jinja::JinjaAdapter;
pub use self::liquid::LiquidAdapter;

/// Template input decoded from the request's JSON payload.
pub type RenderContext = serde_json::Map<String, serde_json::Value>;

/// Decodes a JSON object into a [`RenderContext`].
///
/// Anything other than a JSON object is rejected.
pub fn decode_context(raw: &str) -> std::result::Result<RenderContext, serde_json::Error> {
    serde_json::from_str(raw)
}

/// Common contract for the template engines.
pub trait TemplateAdapter: Send {
    /// Compiles or stores `source`, replacing whatever was parsed before.
    fn parse(&mut self, source: &str) -> Result<()>;

    /// Narrows rendering to the block called `name`.
    ///
    /// Returns the adapter unchanged when the block does not exist or the
    /// engine has no notion of named blocks.
    fn lookup(self: Box<Self>, name: &str) -> Box<dyn TemplateAdapter>;

    /// Renders the parsed template against `context`.
    fn execute(&self, context: &RenderContext) -> Result<String>;
}

/// Engine behavior switches shared by all adapters.
#[derive(Debug, Clone, Default)]
pub struct EngineOptions {
    /// Fail on undefined variables instead of rendering them empty.
    ///
    /// Liquid is always strict; this only affects the default engine.
    pub strict: bool,
}

/// Which engine the server renders with. Fixed for the process lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EngineKind {
    /// minijinja: compiled templates with named blocks.
    #[default]
    Default,
    /// liquid: parse and render in one pass.
    Liquid,
}

impl EngineKind {
    /// Resolves an engine name. Only `liquid` selects the liquid engine,
    /// any other value selects the default engine.
    pub fn from_name(name: &str) -> Self {
        if name.trim().eq_ignore_ascii_case("liquid") {
            EngineKind::Liquid
        } else {
            EngineKind::Default
        }
    }

    /// Canonical name of the engine.
    pub fn as_str(&self) -> &'static str {
        match self {
            EngineKind::Default => "default",
            EngineKind::Liquid => "liquid",
        }
    }

    /// Builds a fresh adapter with no parsed state.
    pub fn adapter(&self, options: &EngineOptions) -> Box<dyn TemplateAdapter> {
        match self {
            EngineKind::Default => Box::new(JinjaAdapter::new(options.strict)),
            EngineKind::Liquid => Box::new(LiquidAdapter::new()),
        }
    }
}

impl fmt::Display for EngineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
