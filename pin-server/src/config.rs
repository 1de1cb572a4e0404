//! Server configuration, loaded from JSON

use pin_common::InjectPoint;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InlineConfig {
    /// Callees at or below this size are always worth inlining
    pub size_threshold: usize,
    /// Rounds before giving up on reaching a fixed point
    pub max_iterations: usize,
    /// A caller may not grow past this size
    pub max_caller_size: usize,
}

impl Default for InlineConfig {
    fn default() -> Self {
        Self { size_threshold: 40, max_iterations: 8, max_caller_size: 2000 }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub inline: InlineConfig,
    /// Where the inlining pass is bound
    pub inline_point: InjectPoint,
    /// Wall-clock budget the host gives each Invoke
    pub invoke_budget_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            inline: InlineConfig::default(),
            inline_point: InjectPoint::BeforeIpa,
            invoke_budget_ms: 30_000,
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid config: {0}")]
    Parse(#[from] serde_json::Error),
}

impl ServerConfig {
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        Self::from_json(&std::fs::read_to_string(path)?)
    }
}
