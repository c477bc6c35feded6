#![forbid(unsafe_code)]

//! Visualizer configuration, loadable from TOML or JSON.
//!
//! ```toml
//! # lzviz.toml
//! speed = 4
//! auto_play = true
//! endpoint = "http://localhost:5000"
//!
//! [audio]
//! backend = "synth"
//! master_gain = 0.5
//!
//! [encoder]
//! min_match = 4
//! ```
//!
//! Every section and field is optional; `VisualizerConfig::default()`
//! reproduces the classic visualizer.

use std::path::Path;

use lzviz_audio::AudioConfig;
use lzviz_encoder::EncoderConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::clock::Speed;
use crate::diagnostics::DiagnosticConfig;
use crate::session::SessionOptions;

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VisualizerConfig {
    /// Initial speed control value.
    pub speed: Speed,
    /// Start playing as soon as a result is applied.
    pub auto_play: bool,
    pub audio: AudioConfig,
    /// Used by the local transport.
    pub encoder: EncoderConfig,
    /// Base URL of a remote compression service. `None` compresses locally.
    pub endpoint: Option<String>,
    pub diagnostics: DiagnosticConfig,
}

/// Errors that can occur when loading a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("validation errors: {}", .0.join("; "))]
    Validation(Vec<String>),
}

impl VisualizerConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&content)
    }

    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(s)?)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&content)
    }

    /// Load by extension (`.json` is JSON, anything else TOML) and validate.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        let config = if is_json {
            Self::from_json_file(path)?
        } else {
            Self::from_toml_file(path)?
        };
        let errors = config.validate();
        if errors.is_empty() {
            Ok(config)
        } else {
            Err(ConfigError::Validation(errors))
        }
    }

    /// Human-readable problems; empty when the config is usable.
    ///
    /// Speed is range-checked during deserialization and never appears here.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = self.audio.validate();
        errors.extend(self.encoder.validate());
        if let Some(endpoint) = &self.endpoint {
            if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
                errors.push(format!("endpoint must be an http(s) URL, got {endpoint:?}"));
            }
        }
        if self.diagnostics.enabled && self.diagnostics.max_entries == 0 {
            errors.push("diagnostics.max_entries must be > 0 when enabled".into());
        }
        errors
    }

    #[must_use]
    pub const fn session_options(&self) -> SessionOptions {
        SessionOptions {
            speed: self.speed,
            auto_play: self.auto_play,
        }
    }
}
