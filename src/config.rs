//! Engine configuration loading.
//!
//! Defaults for render depth and sort strategy. Per-invocation
//! [`RenderParams`](crate::render::RenderParams) always win; the config only
//! seeds them, it is never consulted as ambient state during a traversal.

use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

use crate::render::{DEFAULT_MAX_DEPTH, RenderParams};
use crate::sort::SortStrategy;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Engine defaults.
#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    /// Depth at which rendering truncates instead of recursing.
    #[serde(default = "default_max_depth")]
    pub max_depth: u32,
    /// Sort strategy used when the caller does not pass one.
    #[serde(default)]
    pub sort: SortStrategy,
}

fn default_max_depth() -> u32 {
    DEFAULT_MAX_DEPTH
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            sort: SortStrategy::default(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Render parameters seeded from these defaults.
    pub fn render_params(&self) -> RenderParams {
        RenderParams {
            max_depth: self.max_depth,
            strategy: self.sort,
        }
    }
}
