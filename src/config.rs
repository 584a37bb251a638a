// Player configuration - Tunable constants, loadable from RON or JSON

use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("RON error: {0}")]
    Ron(String),

    #[error("Unsupported config format: {0}")]
    UnsupportedFormat(String),

    #[error("Invalid config value: {0}")]
    InvalidValue(String),
}

/// Player settings
///
/// `bar_end_margin` and `merge_window` were tuned by ear; they are exposed
/// here rather than hard-coded so they can be adjusted per kit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Initial sample rate in Hz
    pub sample_rate: f64,

    /// Capacity of the transport command queue
    pub command_capacity: usize,

    /// Quarter-notes before the end of a bar that count as "late in the bar"
    pub bar_end_margin: f64,

    /// Same-pitch hits closer than this (in quarter-notes) are merged
    pub merge_window: f64,

    /// Reserved slots for deferred note events
    pub max_pending_events: usize,

    /// Reserved slots for merge tracking
    pub max_merge_entries: usize,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48000.0,
            command_capacity: 32,
            bar_end_margin: 0.7,
            merge_window: 0.05,
            max_pending_events: 256,
            max_merge_entries: 128,
        }
    }
}

impl PlayerConfig {
    /// Read a config file (.ron or .json) and validate it
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let extension = path
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or("")
            .to_lowercase();
        let text = std::fs::read_to_string(path)?;

        let config: Self = match extension.as_str() {
            "json" => serde_json::from_str(&text)?,
            "ron" => ron::from_str(&text)
                .map_err(|e| ConfigError::Ron(format!("Failed to parse RON: {}", e)))?,
            _ => return Err(ConfigError::UnsupportedFormat(extension)),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.sample_rate.is_finite() && self.sample_rate > 0.0) {
            return Err(ConfigError::InvalidValue(format!(
                "sample_rate must be positive, got {}",
                self.sample_rate
            )));
        }
        if self.command_capacity == 0 {
            return Err(ConfigError::InvalidValue(
                "command_capacity must be at least 1".to_string(),
            ));
        }
        if self.max_pending_events < 2 {
            return Err(ConfigError::InvalidValue(
                "max_pending_events must hold at least one note-on/off pair".to_string(),
            ));
        }
        if !(self.bar_end_margin.is_finite() && self.bar_end_margin >= 0.0) {
            return Err(ConfigError::InvalidValue(format!(
                "bar_end_margin must be >= 0, got {}",
                self.bar_end_margin
            )));
        }
        if !(self.merge_window.is_finite() && self.merge_window >= 0.0) {
            return Err(ConfigError::InvalidValue(format!(
                "merge_window must be >= 0, got {}",
                self.merge_window
            )));
        }
        Ok(())
    }
}
