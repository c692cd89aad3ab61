// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! Adapter for the default engine, backed by minijinja.
//!
//! The source is compiled into a fresh [`Environment`] on every parse.
//! Blocks declared with `{% block name %}` can be selected with
//! [`TemplateAdapter::lookup`] and rendered on their own.

use lazy_static::lazy_static;
use minijinja::{AutoEscape, Environment, ErrorKind, UndefinedBehavior};
use regex::Regex;
use tracing::debug;

use super::{RenderContext, TemplateAdapter};
use crate::error::{EngineError, Result};

/// Name the parsed source is registered under.
const TEMPLATE_NAME: &str = "live_template";

lazy_static! {
    static ref BLOCK_TAG: Regex =
        Regex::new(r"\{%[-+~]?\s*block\s+([A-Za-z_][A-Za-z0-9_]*)").expect("valid block regex");
}

/// Compile-then-execute adapter with named block lookup.
pub struct JinjaAdapter {
    env: Environment<'static>,
    strict: bool,
    parsed: bool,
    /// Blocks declared in the current source.
    blocks: Vec<String>,
    /// Block selected through `lookup`, if any.
    entry: Option<String>,
}

impl JinjaAdapter {
    /// Creates an adapter with nothing parsed yet.
    pub fn new(strict: bool) -> Self {
        Self {
            env: environment(strict),
            strict,
            parsed: false,
            blocks: Vec::new(),
            entry: None,
        }
    }
}

fn environment(strict: bool) -> Environment<'static> {
    let mut env = Environment::new();
    env.set_auto_escape_callback(|_| AutoEscape::Html);
    env.set_undefined_behavior(if strict {
        UndefinedBehavior::Strict
    } else {
        UndefinedBehavior::Lenient
    });
    env
}

fn block_names(source: &str) -> Vec<String> {
    BLOCK_TAG
        .captures_iter(source)
        .map(|caps| caps[1].to_string())
        .collect()
}

impl TemplateAdapter for JinjaAdapter {
    fn parse(&mut self, source: &str) -> Result<()> {
        // Start over so a failed parse never leaves the previous template behind.
        self.env = environment(self.strict);
        self.parsed = false;
        self.blocks.clear();
        self.entry = None;

        self.env.add_template_owned(TEMPLATE_NAME, source.to_owned())?;
        self.blocks = block_names(source);
        self.parsed = true;
        Ok(())
    }

    fn lookup(mut self: Box<Self>, name: &str) -> Box<dyn TemplateAdapter> {
        if self.blocks.iter().any(|block| block == name) {
            self.entry = Some(name.to_string());
        }
        self
    }

    fn execute(&self, context: &RenderContext) -> Result<String> {
        if !self.parsed {
            return Err(EngineError::NothingParsed);
        }
        let template = self.env.get_template(TEMPLATE_NAME)?;

        let Some(block) = &self.entry else {
            return Ok(template.render(context)?);
        };

        let mut state = template.eval_to_state(context)?;
        match state.render_block(block) {
            Err(err) if err.kind() == ErrorKind::UnknownBlock => {
                debug!(block = %block, "block vanished at render time, rendering whole template");
                Ok(template.render(context)?)
            }
            result => Ok(result?),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::decode_context;

    fn context(raw: &str) -> RenderContext {
        decode_context(raw).unwrap()
    }

    #[test]
    fn test_lookup_renders_only_the_content_block() {
        let mut adapter = Box::new(JinjaAdapter::new(false));
        adapter
            .parse("<header>{{ title }}</header>{% block content %}<p>{{ body }}</p>{% endblock %}<footer/>")
            .unwrap();

        let adapter = adapter.lookup("content");
        let out = adapter
            .execute(&context(r#"{"title":"T","body":"hello"}"#))
            .unwrap();
        assert_eq!(out, "<p>hello</p>");
    }

    #[test]
    fn test_lookup_of_missing_block_keeps_whole_template() {
        let mut adapter = Box::new(JinjaAdapter::new(false));
        adapter.parse("Hello {{ name }}!").unwrap();

        let adapter = adapter.lookup("content");
        assert_eq!(adapter.execute(&context(r#"{"name":"Ada"}"#)).unwrap(), "Hello Ada!");
    }

    #[test]
    fn test_block_with_whitespace_control_is_found() {
        let mut adapter = JinjaAdapter::new(false);
        adapter
            .parse("x{%- block content -%} inner {%- endblock -%}y")
            .unwrap();
        assert_eq!(adapter.blocks, vec!["content".to_string()]);
    }

    #[test]
    fn test_parse_error_is_reported_and_clears_state() {
        let mut adapter = JinjaAdapter::new(false);
        adapter.parse("first").unwrap();
        assert!(adapter.parse("{{ name").is_err());
        assert!(matches!(
            adapter.execute(&RenderContext::new()),
            Err(EngineError::NothingParsed)
        ));
    }

    #[test]
    fn test_reparse_replaces_previous_blocks() {
        let mut adapter = JinjaAdapter::new(false);
        adapter
            .parse("{% block content %}old{% endblock %}")
            .unwrap();
        adapter.parse("new").unwrap();

        let adapter = Box::new(adapter).lookup("content");
        assert_eq!(adapter.execute(&RenderContext::new()).unwrap(), "new");
    }

    #[test]
    fn test_values_are_html_escaped() {
        let mut adapter = JinjaAdapter::new(false);
        adapter.parse("<b>{{ v }}</b>").unwrap();
        let out = adapter.execute(&context(r#"{"v":"<i>&"}"#)).unwrap();
        assert_eq!(out, "<b>&lt;i&gt;&amp;</b>");
    }

    #[test]
    fn test_strict_mode_rejects_undefined_variables() {
        let mut lenient = JinjaAdapter::new(false);
        lenient.parse("[{{ missing }}]").unwrap();
        assert_eq!(lenient.execute(&RenderContext::new()).unwrap(), "[]");

        let mut strict = JinjaAdapter::new(true);
        strict.parse("[{{ missing }}]").unwrap();
        assert!(strict.execute(&RenderContext::new()).is_err());
    }
}
