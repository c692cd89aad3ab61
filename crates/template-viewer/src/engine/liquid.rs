// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! Adapter for the liquid engine.
//!
//! Liquid has no named sub-templates, so `parse` only keeps the text and
//! `execute` does the parse and the render together.

use ::liquid::ParserBuilder;

use super::{RenderContext, TemplateAdapter};
use crate::error::{EngineError, Result};

/// Single-pass adapter. Lookup is a no-op.
#[derive(Debug, Default)]
pub struct LiquidAdapter {
    source: Option<String>,
}

impl LiquidAdapter {
    /// Creates an adapter with nothing parsed yet.
    pub fn new() -> Self {
        Self::default()
    }
}

impl TemplateAdapter for LiquidAdapter {
    fn parse(&mut self, source: &str) -> Result<()> {
        self.source = Some(source.to_string());
        Ok(())
    }

    fn lookup(self: Box<Self>, _name: &str) -> Box<dyn TemplateAdapter> {
        self
    }

    fn execute(&self, context: &RenderContext) -> Result<String> {
        let source = self.source.as_deref().ok_or(EngineError::NothingParsed)?;

        let template = ParserBuilder::with_stdlib().build()?.parse(source)?;
        let globals = ::liquid::to_object(context)?;
        Ok(template.render(&globals)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::decode_context;

    #[test]
    fn test_renders_variables_and_filters() {
        let mut adapter = LiquidAdapter::new();
        adapter
            .parse("{{ Name | upcase }} has {{ langs | size }} langs")
            .unwrap();
        let context = decode_context(r#"{"Name":"Ada","langs":["a","b"]}"#).unwrap();
        assert_eq!(adapter.execute(&context).unwrap(), "ADA has 2 langs");
    }

    #[test]
    fn test_syntax_error_surfaces_at_execute() {
        let mut adapter = LiquidAdapter::new();
        assert!(adapter.parse("{{ Name").is_ok());
        assert!(adapter.execute(&RenderContext::new()).is_err());
    }

    #[test]
    fn test_parse_replaces_previous_source() {
        let mut adapter = LiquidAdapter::new();
        adapter.parse("one").unwrap();
        adapter.parse("two").unwrap();
        assert_eq!(adapter.execute(&RenderContext::new()).unwrap(), "two");
    }

    #[test]
    fn test_undefined_variable_is_an_error() {
        let mut adapter = LiquidAdapter::new();
        adapter.parse("{{ missing }}").unwrap();
        assert!(adapter.execute(&RenderContext::new()).is_err());
    }

    #[test]
    fn test_execute_without_parse() {
        let adapter = LiquidAdapter::new();
        assert!(matches!(
            adapter.execute(&RenderContext::new()),
            Err(EngineError::NothingParsed)
        ));
    }
}
