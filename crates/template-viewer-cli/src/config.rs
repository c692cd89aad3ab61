// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! Viewer configuration.
//!
//! Configuration is loaded from `template-viewer.toml` in the working
//! directory when present. Command-line flags override file values.
//!
//! # Example Configuration
//!
//! ```toml
//! [server]
//! host = "127.0.0.1"
//! port = 8080
//!
//! [engine]
//! kind = "liquid"
//! strict = false
//!
//! [viewer]
//! shell = "template_viewer.html"
//!
//! [watch]
//! debounce_ms = 100
//! ```

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use template_viewer::{EngineKind, EngineOptions};

/// Default configuration file name.
pub const CONFIG_FILE: &str = "template-viewer.toml";

/// Main configuration structure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Listener settings.
    #[serde(default)]
    pub server: ServerConfig,
    /// Template engine settings.
    #[serde(default)]
    pub engine: EngineConfig,
    /// Viewer shell settings.
    #[serde(default)]
    pub viewer: ViewerConfig,
    /// File watching settings.
    #[serde(default)]
    pub watch: WatchConfig,
}

/// Listener settings.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to (default: "0.0.0.0").
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to bind to (default: 8080).
    #[serde(default = "default_port")]
    pub port: u16,
}

/// Template engine settings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EngineConfig {
    /// Engine name: `liquid`, anything else selects the default engine.
    #[serde(default)]
    pub kind: String,
    /// Fail on undefined variables in the default engine.
    #[serde(default)]
    pub strict: bool,
}

/// Viewer shell settings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ViewerConfig {
    /// HTML shell read on every request. The built-in shell is used when unset.
    #[serde(default)]
    pub shell: Option<PathBuf>,
}

/// File watching settings.
#[derive(Debug, Clone, Deserialize)]
pub struct WatchConfig {
    /// Window in which bursts of notifier events are merged (default: 100).
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

/// Shortest debounce window. The notifier polls at a quarter of the window,
/// and a zero window would make it spin.
pub const MIN_DEBOUNCE_MS: u64 = 10;

fn default_debounce_ms() -> u64 {
    100
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
        }
    }
}

impl EngineConfig {
    /// The engine selected by `kind`.
    pub fn engine_kind(&self) -> EngineKind {
        EngineKind::from_name(&self.kind)
    }

    /// Options passed to every adapter.
    pub fn options(&self) -> EngineOptions {
        EngineOptions {
            strict: self.strict,
        }
    }
}

impl WatchConfig {
    /// Debounce window as a duration, never shorter than [`MIN_DEBOUNCE_MS`].
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms.max(MIN_DEBOUNCE_MS))
    }
}

impl Config {
    /// Loads configuration.
    ///
    /// With an explicit `path` the file must exist. Without one,
    /// `template-viewer.toml` is read if present, otherwise defaults are used.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let config_path = match path {
            Some(path) => path,
            None => {
                let default_path = Path::new(CONFIG_FILE);
                if !default_path.exists() {
                    return Ok(Config::default());
                }
                default_path
            }
        };

        let content = fs::read_to_string(config_path)?;
        Self::from_toml(&content)
    }

    /// Parses configuration from TOML text.
    pub fn from_toml(content: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(content)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::from_toml("").unwrap();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.engine.engine_kind(), EngineKind::Default);
        assert!(config.viewer.shell.is_none());
        assert_eq!(config.watch.debounce(), Duration::from_millis(100));
    }

    #[test]
    fn test_partial_file() {
        let config = Config::from_toml(
            r#"
[server]
port = 9000

[engine]
kind = "liquid"

[viewer]
shell = "shell.html"
"#,
        )
        .unwrap();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.engine.engine_kind(), EngineKind::Liquid);
        assert_eq!(config.viewer.shell, Some(PathBuf::from("shell.html")));
    }

    #[test]
    fn test_explicit_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Config::load(Some(&dir.path().join("absent.toml"))).is_err());
    }

    #[test]
    fn test_zero_debounce_is_clamped() {
        let config = Config::from_toml("[watch]\ndebounce_ms = 0").unwrap();
        assert_eq!(config.watch.debounce_ms, 0);
        assert_eq!(config.watch.debounce(), Duration::from_millis(MIN_DEBOUNCE_MS));

        let config = Config::from_toml("[watch]\ndebounce_ms = 250").unwrap();
        assert_eq!(config.watch.debounce(), Duration::from_millis(250));
    }

    #[test]
    fn test_invalid_toml_is_an_error() {
        assert!(Config::from_toml("[server]\nport = \"high\"").is_err());
    }
}
