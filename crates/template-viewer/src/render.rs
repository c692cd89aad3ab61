// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! The render pipeline: read, decode, parse, look up, execute.
//!
//! Nothing is cached. Every call re-reads the file and re-parses it so the
//! output always matches what is on disk.

use std::path::Path;

use tracing::debug;

use crate::engine::{decode_context, TemplateAdapter};
use crate::error::RenderError;

/// Block rendered in place of the whole template when the source defines it.
pub const ENTRY_BLOCK: &str = "content";

/// Strips whitespace and surrounding double quotes from a user-supplied path.
pub fn clean_path(raw: &str) -> &str {
    raw.trim().trim_matches('"')
}

/// Renders the template at `file_path` against the JSON object in `raw_json`.
///
/// The adapter should be freshly built for this call. Each stage reports
/// its own [`RenderError`] variant.
pub async fn render(
    mut adapter: Box<dyn TemplateAdapter>,
    file_path: &str,
    raw_json: &str,
) -> Result<String, RenderError> {
    let path = Path::new(clean_path(file_path));

    let source = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| RenderError::Read {
            path: path.to_path_buf(),
            source,
        })?;

    let context = decode_context(raw_json)?;

    adapter.parse(&source).map_err(RenderError::Parse)?;
    let adapter = adapter.lookup(ENTRY_BLOCK);

    let output = adapter.execute(&context).map_err(RenderError::Execute)?;
    debug!(path = %path.display(), bytes = output.len(), "rendered template");
    Ok(output)
}
