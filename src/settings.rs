//! Table settings
//!
//! Loaded from an optional JSON file; missing fields take their defaults.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::CHANNEL_SEGMENTS;

/// Errors from loading or validating settings
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read settings from {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed settings JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid settings: {0}")]
    Invalid(String),
}

/// Table settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Canvas width in table units
    pub table_width: f32,
    /// Canvas height in table units (y grows downward)
    pub table_height: f32,
    /// Seed for particle jitter and launch spin
    pub seed: u64,
    /// Bezier samples along the launch channel
    pub channel_segments: usize,
    /// Record launch/drop diagnostics from the first frame
    pub debug: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            table_width: 600.0,
            table_height: 800.0,
            seed: 0x5EED,
            channel_segments: CHANNEL_SEGMENTS,
            debug: false,
        }
    }
}

impl Settings {
    /// Parse and validate a JSON document
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let settings: Self = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load from a JSON file
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let settings = Self::from_json(&json)?;
        log::info!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Load from a JSON file, falling back to defaults on any error
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        match Self::load_from(path) {
            Ok(settings) => settings,
            Err(err) => {
                log::warn!("{err}; using default settings");
                Self::default()
            }
        }
    }

    /// Reject values the simulation cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.table_width.is_finite() && self.table_width > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "table_width must be positive, got {}",
                self.table_width
            )));
        }
        if !(self.table_height.is_finite() && self.table_height > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "table_height must be positive, got {}",
                self.table_height
            )));
        }
        if self.channel_segments == 0 {
            return Err(ConfigError::Invalid("channel_segments must be at least 1".into()));
        }
        Ok(())
    }
}
