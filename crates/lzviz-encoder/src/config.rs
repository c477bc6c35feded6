#![forbid(unsafe_code)]

//! Encoder tunables.

use serde::{Deserialize, Serialize};

/// Matcher parameters.
///
/// Defaults reproduce the classic visualizer: a 255-byte look-back window,
/// matches capped at 255 bytes, and only matches of 3 bytes or more emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncoderConfig {
    /// How many bytes behind the current position a match may start.
    pub window_size: usize,
    /// Longest match the matcher will extend to.
    pub max_match: usize,
    /// Shortest match worth emitting instead of a literal.
    pub min_match: usize,
}

impl EncoderConfig {
    pub const DEFAULT_WINDOW_SIZE: usize = 255;
    pub const DEFAULT_MAX_MATCH: usize = 255;
    pub const DEFAULT_MIN_MATCH: usize = 3;

    /// Human-readable problems; empty when the config is usable.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if self.window_size == 0 {
            errors.push("encoder.window_size must be > 0".into());
        }
        if self.max_match == 0 {
            errors.push("encoder.max_match must be > 0".into());
        }
        if self.min_match == 0 {
            errors.push("encoder.min_match must be > 0".into());
        }
        if self.min_match > self.max_match {
            errors.push(format!(
                "encoder.min_match ({}) must not exceed encoder.max_match ({})",
                self.min_match, self.max_match
            ));
        }
        errors
    }
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            window_size: Self::DEFAULT_WINDOW_SIZE,
            max_match: Self::DEFAULT_MAX_MATCH,
            min_match: Self::DEFAULT_MIN_MATCH,
        }
    }
}
