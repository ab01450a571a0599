//! Board manifest access.
//!
//! Board manifests are JSON documents with nested sections addressed by
//! dotted keys (`build.mcu`, `espidf.custom_sdkconfig`). Values the
//! manifest does not pin fall back to defaults at the accessor level,
//! so a missing board file behaves like an empty manifest.

use std::path::Path;

use anyhow::{Context, Result};
use serde_json::Value;

/// MCU assumed when the board manifest does not name one.
pub const DEFAULT_MCU: &str = "esp32";

/// A parsed board manifest.
#[derive(Debug, Clone)]
pub struct BoardConfig {
    manifest: Value,
}

impl BoardConfig {
    /// Load a board manifest from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = crate::util::fs::read_to_string(path)?;
        let manifest: Value = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse board manifest {}", path.display()))?;
        Ok(BoardConfig { manifest })
    }

    /// An empty manifest; every accessor reports its default.
    pub fn empty() -> Self {
        BoardConfig {
            manifest: Value::Object(Default::default()),
        }
    }

    /// Look up a value by dotted key, e.g. `build.mcu`.
    pub fn get(&self, key: &str) -> Option<&Value> {
        let mut current = &self.manifest;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    /// Look up a string value by dotted key.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    /// The target microcontroller identifier.
    pub fn mcu(&self) -> &str {
        self.get_str("build.mcu").unwrap_or(DEFAULT_MCU)
    }

    /// Board-supplied custom sdkconfig lines, if any.
    ///
    /// The manifest may carry the value as a string or as an array of
    /// lines; arrays are joined with newlines.
    pub fn custom_sdkconfig(&self) -> Option<String> {
        match self.get("espidf.custom_sdkconfig")? {
            Value::String(s) => Some(s.clone()),
            Value::Array(lines) => {
                let joined = lines
                    .iter()
                    .map(|v| match v {
                        Value::String(s) => s.clone(),
                        other => other.to_string(),
                    })
                    .collect::<Vec<_>>()
                    .join("\n");
                Some(joined)
            }
            Value::Null => None,
            other => Some(other.to_string()),
        }
    }

    /// Preprocessor defines from `build.extra_flags`.
    ///
    /// The flags value may be a string or an array of strings; tokens
    /// are split on whitespace and `-D` prefixes stripped. A define of
    /// the form `NAME=value` keeps its value here.
    pub fn defines(&self) -> Vec<String> {
        let mut defines = Vec::new();
        let mut collect = |flags: &str| {
            for token in flags.split_whitespace() {
                if let Some(define) = token.strip_prefix("-D") {
                    if !define.is_empty() {
                        defines.push(define.to_string());
                    }
                }
            }
        };

        match self.get("build.extra_flags") {
            Some(Value::String(s)) => collect(s),
            Some(Value::Array(items)) => {
                for item in items {
                    if let Value::String(s) = item {
                        collect(s);
                    }
                }
            }
            _ => {}
        }

        defines
    }

    /// Check whether `build.extra_flags` carries the given define.
    pub fn has_define(&self, name: &str) -> bool {
        self.defines()
            .iter()
            .any(|d| d.split('=').next() == Some(name))
    }
}
