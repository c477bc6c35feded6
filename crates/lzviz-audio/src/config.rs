#![forbid(unsafe_code)]

//! Audio settings.

use serde::{Deserialize, Serialize};

/// Which backend turns cues into sound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// Pre-recorded clips.
    #[default]
    Sample,
    /// Oscillator tones rendered on the fly.
    Synth,
    /// Drop every cue.
    Muted,
}

impl BackendKind {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Sample => "sample",
            Self::Synth => "synth",
            Self::Muted => "muted",
        }
    }
}

/// `[audio]` section of the visualizer config.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    pub backend: BackendKind,
    /// Start with sound on. Can be toggled at runtime.
    pub enabled: bool,
    /// Final gain applied by the synthesizer, in `[0, 1]`.
    pub master_gain: f32,
}

impl AudioConfig {
    pub const DEFAULT_MASTER_GAIN: f32 = 0.7;

    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if !(0.0..=1.0).contains(&self.master_gain) {
            errors.push(format!(
                "audio.master_gain must be in [0, 1], got {}",
                self.master_gain
            ));
        }
        errors
    }
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::default(),
            enabled: true,
            master_gain: Self::DEFAULT_MASTER_GAIN,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        assert!(AudioConfig::default().validate().is_empty());
    }

    #[test]
    fn gain_out_of_range_is_reported() {
        let config = AudioConfig {
            master_gain: 1.5,
            ..AudioConfig::default()
        };
        assert!(config.validate()[0].contains("audio.master_gain"));
    }

    #[test]
    fn backend_parses_from_snake_case() {
        let config: AudioConfig = serde_json::from_str(r#"{"backend": "synth"}"#).unwrap();
        assert_eq!(config.backend, BackendKind::Synth);
        assert!(config.enabled);
    }
}
