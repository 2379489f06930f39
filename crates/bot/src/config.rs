//! Bot configuration
//!
//! Loaded from a TOML file; every field has a default so a missing file
//! still yields a runnable local setup.

use std::path::{Path, PathBuf};

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BotConfig {
    /// Gateway endpoint the bot connects to
    pub gateway_addr: String,
    /// Token presented during gateway registration
    pub auth_token: String,
    /// Explicit database path; platform data dir when unset
    pub database_path: Option<PathBuf>,
    /// Schedule applied to teams registered without one
    pub default_schedule: String,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            gateway_addr: "127.0.0.1:7600".to_string(),
            auth_token: String::new(),
            database_path: None,
            default_schedule: "1;05:00,4;05:00".to_string(),
        }
    }
}

/// Error type for config loading
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {0}: {1}")]
    Read(PathBuf, #[source] std::io::Error),

    #[error("Failed to parse config file {0}: {1}")]
    Parse(PathBuf, #[source] toml::de::Error),
}

impl BotConfig {
    /// Load from `path`, falling back to defaults when the file is absent.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Read(path.to_path_buf(), e))?;
        toml::from_str(&raw).map_err(|e| ConfigError::Parse(path.to_path_buf(), e))
    }
}
