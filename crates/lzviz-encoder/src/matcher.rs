#![forbid(unsafe_code)]

//! Greedy step-recording matcher.
//!
//! At every position the matcher scans the whole window, left to right, and
//! extends each candidate as far as the bytes agree. The comparison may run
//! past the current position, so a candidate can overlap the bytes it is
//! about to produce. The longest candidate wins; on a tie the earliest start
//! is kept.
//!
//! Every window start that matches at least one byte is recorded, whether or
//! not it wins. That list is what the visualizer shows as "candidates".

use lzviz_core::{Candidate, OutputSymbol, Step, StepLog, StepLogError};
use thiserror::Error;
use tracing::{debug, trace};

use crate::config::EncoderConfig;

/// Rejected encoder configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid encoder config: {}", .problems.join("; "))]
pub struct InvalidConfig {
    pub problems: Vec<String>,
}

/// Result of encoding one input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Encoding {
    pub steps: Vec<Step>,
    pub symbols: Vec<OutputSymbol>,
}

impl Encoding {
    /// Validate the steps against `input` and wrap them in a [`StepLog`].
    pub fn into_log(self, input: &[u8]) -> Result<StepLog, StepLogError> {
        StepLog::new(input.to_vec(), self.steps)
    }
}

/// Greedy LZ77/LZ4-style encoder.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Encoder {
    config: EncoderConfig,
}

impl Encoder {
    pub fn new(config: EncoderConfig) -> Result<Self, InvalidConfig> {
        let problems = config.validate();
        if problems.is_empty() {
            Ok(Self { config })
        } else {
            Err(InvalidConfig { problems })
        }
    }

    #[must_use]
    pub const fn config(&self) -> &EncoderConfig {
        &self.config
    }

    /// Candidates for a match at `position`, in window order.
    #[must_use]
    pub fn candidates_at(&self, data: &[u8], position: usize) -> Vec<Candidate> {
        let window_start = position.saturating_sub(self.config.window_size);
        (window_start..position)
            .filter_map(|start| {
                let length = self.extend(data, start, position);
                (length > 0).then(|| Candidate {
                    start,
                    length,
                    matched_bytes: data[position..position + length].to_vec(),
                })
            })
            .collect()
    }

    fn extend(&self, data: &[u8], start: usize, position: usize) -> usize {
        let mut length = 0;
        while length < self.config.max_match
            && position + length < data.len()
            && data[start + length] == data[position + length]
        {
            length += 1;
        }
        length
    }

    /// Encode `data`, recording every decision.
    #[must_use]
    pub fn encode(&self, data: &[u8]) -> Encoding {
        let mut steps = Vec::new();
        let mut position = 0;

        while position < data.len() {
            let window_start = position.saturating_sub(self.config.window_size);
            let candidates = self.candidates_at(data, position);

            // Strictly longer wins, so ties keep the earliest start.
            let best = candidates
                .iter()
                .fold(None::<&Candidate>, |best, c| match best {
                    Some(b) if b.length >= c.length => Some(b),
                    _ => Some(c),
                })
                .map(|c| (c.start, c.length));

            let step = match best {
                Some((start, length)) if length >= self.config.min_match => {
                    trace!(position, start, length, "match");
                    Step::matched(position, window_start, start, length, candidates)
                }
                _ => {
                    let mut step = Step::literal(position, window_start, data[position]);
                    step.candidates = candidates;
                    step
                }
            };
            position += step.consumed();
            steps.push(step);
        }

        let symbols: Vec<OutputSymbol> = steps.iter().map(Step::symbol).collect();
        debug!(
            input_len = data.len(),
            steps = steps.len(),
            matches = symbols
                .iter()
                .filter(|s| matches!(s, OutputSymbol::Match { .. }))
                .count(),
            "encoded input"
        );
        Encoding { steps, symbols }
    }
}
