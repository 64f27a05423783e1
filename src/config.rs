//! Persisted editor configuration, consumed (never written) by the core.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{runtime::handle::RuntimeConfig, timecode::FRAME_RATE};

/// Failures raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file could not be read.
    #[error("config io: {0}")]
    Io(#[from] std::io::Error),
    /// Config text was not valid JSON for this version.
    #[error("config parse: {0}")]
    Parse(#[from] serde_json::Error),
    /// Config declared a frame rate the codec cannot honor.
    #[error("unsupported frame rate {found}, codec is fixed at {FRAME_RATE} fps")]
    UnsupportedFrameRate {
        /// Declared frame rate.
        found: u64,
    },
}

/// Versioned configuration file contents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditorConfigV1 {
    /// Trim offset in milliseconds, subtracted from every incoming video
    /// position before encoding.
    #[serde(default)]
    pub trim_ms: u64,
    /// Declared frame rate; only [`FRAME_RATE`] is accepted.
    #[serde(default = "default_frame_rate")]
    pub frame_rate: u64,
}

fn default_frame_rate() -> u64 {
    FRAME_RATE
}

impl Default for EditorConfigV1 {
    fn default() -> Self {
        Self {
            trim_ms: 0,
            frame_rate: FRAME_RATE,
        }
    }
}

impl EditorConfigV1 {
    /// Reads and validates a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// Parses and validates JSON config text.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        if config.frame_rate != FRAME_RATE {
            return Err(ConfigError::UnsupportedFrameRate {
                found: config.frame_rate,
            });
        }
        Ok(config)
    }

    /// Runtime configuration carrying this file's trim offset.
    pub fn runtime_config(&self) -> RuntimeConfig {
        RuntimeConfig {
            trim_ms: self.trim_ms,
            ..RuntimeConfig::default()
        }
    }
}
