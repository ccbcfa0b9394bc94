use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{MtcError, MtcResult};

/// Top-level configuration (loaded from mtcrypt.toml)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MtcConfig {
    pub logging: LoggingConfig,
}

impl MtcConfig {
    /// Parse a configuration from TOML text. Missing keys take their defaults.
    pub fn from_toml_str(content: &str) -> MtcResult<Self> {
        toml::from_str(content).map_err(|e| MtcError::Config(format!("parsing config: {e}")))
    }

    /// Load a configuration file, falling back to defaults when it does not exist.
    pub fn load(path: &Path) -> MtcResult<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&content)
            .map_err(|e| MtcError::Config(format!("{}: {e}", path.display())))?;
        tracing::debug!(path = %path.display(), "loaded config");
        Ok(config)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// EnvFilter directive (default: info). `RUST_LOG` takes precedence.
    pub level: String,
    /// Output format: "text" or "json"
    pub format: LogFormat,
    /// Append logs to this file instead of stderr
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: LogFormat::Text,
            file: None,
        }
    }
}

impl LoggingConfig {
    /// Map an integer verbosity (0 = fatal .. 5 = verbose) onto a filter level.
    ///
    /// Fatal has no separate level and shares "error". Anything above 5 is
    /// treated as verbose.
    pub fn verbosity_to_level(verbosity: i32) -> MtcResult<&'static str> {
        match verbosity {
            v if v < 0 => Err(MtcError::Config(format!(
                "log verbosity can't be negative: {v}"
            ))),
            0 | 1 => Ok("error"),
            2 => Ok("warn"),
            3 => Ok("info"),
            4 => Ok("debug"),
            _ => Ok("trace"),
        }
    }
}
