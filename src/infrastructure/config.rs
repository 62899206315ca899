//! Analysis configuration.
//!
//! Loaded from a TOML file; every key is optional and CLI flags override
//! what the file sets.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalysisConfig {
    /// Names with this prefix are ignored by the class-usage pass.
    pub private_prefix: String,
    /// Also resolve calls nested inside call arguments.
    pub resolve_nested_calls: bool,
    /// Rayon worker count; `None` reserves half of the cores.
    pub workers: Option<usize>,
    /// Run per-function passes on the rayon pool.
    pub parallel: bool,
    pub render: RenderConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RenderConfig {
    /// Include `Class.method` nodes in the function graph.
    pub methods: bool,
    /// File prefix for rendered graphs.
    pub basename: String,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            private_prefix: "_".to_string(),
            resolve_nested_calls: false,
            workers: None,
            parallel: true,
            render: RenderConfig::default(),
        }
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            methods: false,
            basename: "callorder".to_string(),
        }
    }
}

impl AnalysisConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).context("Invalid analysis config")
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Cannot read config {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("Failed to parse config {}", path.display()))
    }
}
