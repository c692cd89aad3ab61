// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! Error types for the template viewer.
//!
//! Two layers of errors exist:
//!
//! - [`EngineError`]: failures reported by a concrete template engine
//!   while parsing or executing.
//! - [`RenderError`]: failures of the render pipeline, each tagged with the
//!   [`Stage`] that produced it so the viewer can display where things broke.
//!
//! Every variant is recoverable. The viewer shows the message inline and
//! keeps serving requests.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Error produced by an engine adapter.
#[derive(Error, Debug)]
pub enum EngineError {
    /// Reported by the minijinja engine.
    #[error("{0}")]
    Jinja(#[from] minijinja::Error),

    /// Reported by the liquid engine.
    #[error("{0}")]
    Liquid(#[from] liquid::Error),

    /// `execute` was called before any source was parsed.
    #[error("no template has been parsed")]
    NothingParsed,
}

/// The pipeline stage at which a render failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Request validation, before the pipeline starts.
    Request,
    /// Reading the template file.
    Read,
    /// Decoding the JSON payload.
    Unmarshal,
    /// Compiling the template source.
    Parse,
    /// Rendering against the context.
    Execute,
}

impl Stage {
    /// Short tag used in messages and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Request => "request",
            Stage::Read => "read",
            Stage::Unmarshal => "unmarshal",
            Stage::Parse => "parse",
            Stage::Execute => "execute",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned by [`render`](crate::render::render).
#[derive(Error, Debug)]
pub enum RenderError {
    /// A required query parameter was not supplied.
    #[error("please provide {0} in query params")]
    MissingParam(&'static str),

    /// The template file could not be read.
    #[error("read file: {path}: {source}")]
    Read {
        /// Path as it was requested.
        path: PathBuf,
        /// Underlying IO failure.
        source: std::io::Error,
    },

    /// The data payload is not a JSON object.
    #[error("unmarshal: {0}")]
    Unmarshal(#[from] serde_json::Error),

    /// The engine rejected the template source.
    #[error("parse: {0}")]
    Parse(#[source] EngineError),

    /// The engine failed while rendering.
    #[error("execute: {0}")]
    Execute(#[source] EngineError),
}

impl RenderError {
    /// The stage this error belongs to.
    pub fn stage(&self) -> Stage {
        match self {
            RenderError::MissingParam(_) => Stage::Request,
            RenderError::Read { .. } => Stage::Read,
            RenderError::Unmarshal(_) => Stage::Unmarshal,
            RenderError::Parse(_) => Stage::Parse,
            RenderError::Execute(_) => Stage::Execute,
        }
    }
}

/// Convenience type alias for engine results.
pub type Result<T> = std::result::Result<T, EngineError>;
