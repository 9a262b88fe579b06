//! Runner configuration: adapter registry and run defaults.
//!
//! ```toml
//! default_timeout_ms = 1800000
//! echo_output = true
//!
//! [adapters.claude]
//! argv = ["claude", "-p", "--dangerously-skip-permissions"]
//! stdin = true
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::models::adapter::AdapterDescriptor;
use crate::models::run::RunOptions;
use crate::runner::codec::MAX_LINE_BYTES;
use crate::{AppError, Result};

fn default_true() -> bool {
    true
}

fn default_max_line_bytes() -> usize {
    MAX_LINE_BYTES
}

/// Configuration parsed from `agents.toml`.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct RunnerConfig {
    /// Timeout applied to runs built from this config; 0 means unbounded.
    #[serde(default)]
    pub default_timeout_ms: u64,
    /// Whether monitored runs echo raw agent output.
    #[serde(default = "default_true")]
    pub echo_output: bool,
    /// Maximum accepted output line length in bytes.
    #[serde(default = "default_max_line_bytes")]
    pub max_line_bytes: usize,
    /// Adapters keyed by name.
    #[serde(default)]
    pub adapters: BTreeMap<String, AdapterDescriptor>,
}

impl RunnerConfig {
    /// Load and validate configuration from a TOML file path.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the file cannot be read or contains
    /// invalid TOML, or if validation fails.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .map_err(|err| AppError::Config(format!("failed to read config: {err}")))?;
        Self::from_toml_str(&raw)
    }

    /// Parse configuration from a TOML string and fill adapter names.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if parsing or validation fails.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let mut config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Look up an adapter by name.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if no adapter has that name.
    pub fn adapter(&self, name: &str) -> Result<&AdapterDescriptor> {
        self.adapters.get(name).ok_or_else(|| {
            let known: Vec<&str> = self.adapters.keys().map(String::as_str).collect();
            AppError::Config(format!(
                "unknown adapter `{name}` (configured: {})",
                known.join(", ")
            ))
        })
    }

    /// Runner options for `prompt` with this config's defaults applied.
    #[must_use]
    pub fn run_options<'a>(&self, prompt: impl Into<String>) -> RunOptions<'a> {
        RunOptions::new(prompt)
            .timeout_ms(self.default_timeout_ms)
            .max_line_bytes(self.max_line_bytes)
    }

    fn validate(&mut self) -> Result<()> {
        if self.max_line_bytes == 0 {
            return Err(AppError::Config(
                "max_line_bytes must be greater than zero".into(),
            ));
        }

        for (name, adapter) in &mut self.adapters {
            name.clone_into(&mut adapter.name);
            adapter.validate()?;
        }

        Ok(())
    }
}
