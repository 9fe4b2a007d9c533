use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{FcryptError, FcryptResult};

/// Top-level configuration (loaded from config.toml)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FcryptConfig {
    pub io: IoConfig,
    pub log: LogConfig,
    pub ui: UiConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IoConfig {
    /// Read/write buffer size in bytes (default: 65536)
    pub buffer_size: usize,
    /// fsync the output file before reporting success (default: false)
    pub sync_output: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Log level (default: warn)
    pub level: String,
    /// Log format: "json" or "text"
    pub format: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    /// Show a progress bar on stderr (default: false)
    pub progress: bool,
    /// Only show progress for files at least this large (default: 8 MiB)
    pub progress_min_bytes: u64,
}

impl Default for IoConfig {
    fn default() -> Self {
        Self {
            buffer_size: 64 * 1024,
            sync_output: false,
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "warn".into(),
            format: "text".into(),
        }
    }
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            progress: false,
            progress_min_bytes: 8 * 1024 * 1024,
        }
    }
}

impl FcryptConfig {
    /// Parse a TOML document; absent keys fall back to defaults.
    pub fn from_toml_str(content: &str) -> FcryptResult<Self> {
        let config: FcryptConfig =
            toml::from_str(content).map_err(|e| FcryptError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path`. Returns `Ok(None)` when the file does not exist.
    pub fn load(path: &Path) -> FcryptResult<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(path)
            .map_err(|e| FcryptError::Config(format!("reading {}: {e}", path.display())))?;
        Self::from_toml_str(&content)
            .map(Some)
            .map_err(|e| match e {
                FcryptError::Config(msg) => {
                    FcryptError::Config(format!("parsing {}: {msg}", path.display()))
                }
                other => other,
            })
    }

    pub fn validate(&self) -> FcryptResult<()> {
        if self.io.buffer_size == 0 {
            return Err(FcryptError::Config("io.buffer_size must be non-zero".into()));
        }
        match self.log.format.as_str() {
            "json" | "text" => Ok(()),
            other => Err(FcryptError::Config(format!(
                "log.format must be \"json\" or \"text\", got {other:?}"
            ))),
        }
    }
}
