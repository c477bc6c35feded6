#![forbid(unsafe_code)]

//! JSON contract of the compression endpoint.
//!
//! Field names follow the endpoint exactly (`window_start`, `matches`,
//! `best_match_start`, ...). The flat [`WireStep`] record is converted into
//! the tagged domain [`Step`] by [`WireStep::into_step`], which is where a
//! malformed record is rejected.

use serde::{Deserialize, Serialize};

use crate::step::{Action, Candidate, OutputSymbol, Step};
use crate::step_log::StepLogError;

/// Body of a `/compress` request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompressRequest {
    pub data: String,
}

/// Body of a `/compress` response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompressResponse {
    pub original_data: Vec<u8>,
    pub compressed_data: Vec<OutputSymbol>,
    pub steps: Vec<WireStep>,
    /// Display value only; never interpreted by the playback core.
    pub compression_ratio: f64,
}

impl CompressResponse {
    /// Parse a response body.
    pub fn from_json_str(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

/// Body of a `/decompress` request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecompressRequest {
    pub compressed_data: Vec<OutputSymbol>,
}

/// Body of a `/decompress` response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecompressResponse {
    pub decompressed_data: Vec<u8>,
}

/// Action tag of a wire step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WireAction {
    Literal,
    Match,
}

/// One step as the endpoint serializes it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireStep {
    pub position: usize,
    pub window_start: usize,
    #[serde(default)]
    pub current_byte: Option<u8>,
    #[serde(default)]
    pub matches: Vec<Candidate>,
    pub action: WireAction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub literal_value: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub match_offset: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub match_length: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub best_match_start: Option<usize>,
}

impl WireStep {
    /// Convert into a domain step; `index` is only used for error reporting.
    pub fn into_step(self, index: usize) -> Result<Step, StepLogError> {
        let missing = |field: &'static str| StepLogError::MissingField { index, field };
        let action = match self.action {
            WireAction::Literal => Action::Literal {
                value: self.literal_value.ok_or_else(|| missing("literal_value"))?,
            },
            WireAction::Match => {
                let offset = self.match_offset.ok_or_else(|| missing("match_offset"))?;
                let length = self.match_length.ok_or_else(|| missing("match_length"))?;
                let match_start = match self.best_match_start {
                    Some(start) => start,
                    None => self
                        .position
                        .checked_sub(offset)
                        .ok_or_else(|| missing("best_match_start"))?,
                };
                Action::Match {
                    offset,
                    length,
                    match_start,
                }
            }
        };
        Ok(Step {
            position: self.position,
            window_start: self.window_start,
            action,
            candidates: self.matches,
        })
    }

    /// Build the wire form of `step`; `current_byte` comes from the input.
    #[must_use]
    pub fn from_step(step: &Step, current_byte: Option<u8>) -> Self {
        let mut wire = Self {
            position: step.position,
            window_start: step.window_start,
            current_byte,
            matches: step.candidates.clone(),
            action: WireAction::Literal,
            literal_value: None,
            match_offset: None,
            match_length: None,
            best_match_start: None,
        };
        match step.action {
            Action::Literal { value } => {
                wire.literal_value = Some(value);
            }
            Action::Match {
                offset,
                length,
                match_start,
            } => {
                wire.action = WireAction::Match;
                wire.match_offset = Some(offset);
                wire.match_length = Some(length);
                wire.best_match_start = Some(match_start);
            }
        }
        wire
    }
}
