#![forbid(unsafe_code)]

//! The immutable step log a replay is driven from.
//!
//! # Invariants
//!
//! A [`StepLog`] can only be obtained through [`StepLog::new`] (or
//! [`StepLog::from_response`]), which enforces:
//!
//! 1. `window_start <= position < original.len()` for every step.
//! 2. Positions are strictly increasing and contiguous: each step starts
//!    where the previous one stopped consuming input, the first at 0.
//! 3. A match has `length >= 1`, `match_start < position` and
//!    `offset == position - match_start`. The copy range may overlap the
//!    current position.
//! 4. A match with a non-empty candidate list chose one of its candidates.
//! 5. Expanding every step's symbol reproduces `original` exactly.
//!
//! Literal steps may carry candidates (short matches below the emission
//! threshold); the action tag, not the candidate list, decides the kind.

use thiserror::Error;

use crate::expand::{ExpandError, expand_symbols};
use crate::step::{Action, OutputSymbol, Step};
use crate::wire::{CompressResponse, WireStep};

/// Why a step log was refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StepLogError {
    #[error("step {index}: missing field `{field}`")]
    MissingField { index: usize, field: &'static str },

    #[error("step {index}: window start {window_start} is past position {position}")]
    WindowAfterPosition {
        index: usize,
        window_start: usize,
        position: usize,
    },

    #[error("step {index}: position {position} is outside the {len}-byte input")]
    PositionOutOfBounds {
        index: usize,
        position: usize,
        len: usize,
    },

    #[error("step {index}: position {position} does not follow previous position {previous}")]
    PositionNotIncreasing {
        index: usize,
        previous: usize,
        position: usize,
    },

    #[error("step {index}: expected position {expected}, found {position}")]
    Gap {
        index: usize,
        expected: usize,
        position: usize,
    },

    #[error("step {index}: match length must be at least 1")]
    EmptyMatch { index: usize },

    #[error("step {index}: match start {match_start} is not behind position {position}")]
    MatchNotBehind {
        index: usize,
        match_start: usize,
        position: usize,
    },

    #[error("step {index}: offset {offset} disagrees with position - match start = {expected}")]
    OffsetMismatch {
        index: usize,
        offset: usize,
        expected: usize,
    },

    #[error("step {index}: chosen match start {match_start} is not among the candidates")]
    ChosenCandidateMissing { index: usize, match_start: usize },

    #[error("step {index}: match of length {length} at {position} runs past the {len}-byte input")]
    MatchPastEnd {
        index: usize,
        position: usize,
        length: usize,
        len: usize,
    },

    #[error("steps cover {covered} of {len} input bytes")]
    Truncated { covered: usize, len: usize },

    #[error("compressed symbol {index} disagrees with its step")]
    SymbolMismatch { index: usize },

    #[error("response lists {symbols} symbols for {steps} steps")]
    SymbolCountMismatch { symbols: usize, steps: usize },

    #[error("reconstruction failed: {0}")]
    Expand(#[from] ExpandError),

    #[error("reconstruction differs from the input at byte {at}")]
    RoundTripMismatch { at: usize },
}

/// Ordered, validated record of every encoder decision plus the input bytes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StepLog {
    original: Vec<u8>,
    steps: Vec<Step>,
}

impl StepLog {
    /// Validate and assemble a step log.
    pub fn new(original: Vec<u8>, steps: Vec<Step>) -> Result<Self, StepLogError> {
        let log = Self { original, steps };
        log.validate()?;
        Ok(log)
    }

    /// The log with no input and no steps.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a log from an endpoint response.
    ///
    /// `compressed_data` must agree with the steps when present.
    pub fn from_response(response: &CompressResponse) -> Result<Self, StepLogError> {
        let steps = response
            .steps
            .iter()
            .cloned()
            .enumerate()
            .map(|(index, wire)| wire.into_step(index))
            .collect::<Result<Vec<_>, _>>()?;

        if !response.compressed_data.is_empty() {
            if response.compressed_data.len() != steps.len() {
                return Err(StepLogError::SymbolCountMismatch {
                    symbols: response.compressed_data.len(),
                    steps: steps.len(),
                });
            }
            if let Some(index) = steps
                .iter()
                .zip(&response.compressed_data)
                .position(|(step, symbol)| step.symbol() != *symbol)
            {
                return Err(StepLogError::SymbolMismatch { index });
            }
        }

        Self::new(response.original_data.clone(), steps)
    }

    /// Wire form of every step.
    #[must_use]
    pub fn wire_steps(&self) -> Vec<WireStep> {
        self.steps
            .iter()
            .map(|step| WireStep::from_step(step, self.original.get(step.position).copied()))
            .collect()
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    #[inline]
    #[must_use]
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    #[inline]
    #[must_use]
    pub fn step(&self, index: usize) -> Option<&Step> {
        self.steps.get(index)
    }

    /// The input bytes the steps were recorded against.
    #[inline]
    #[must_use]
    pub fn original(&self) -> &[u8] {
        &self.original
    }

    /// Every step's symbol, in order.
    #[must_use]
    pub fn symbols(&self) -> Vec<OutputSymbol> {
        self.steps.iter().map(Step::symbol).collect()
    }

    /// Symbols of steps `0..=index`.
    #[must_use]
    pub fn symbols_through(&self, index: usize) -> Vec<OutputSymbol> {
        let end = index.saturating_add(1).min(self.steps.len());
        self.steps[..end].iter().map(Step::symbol).collect()
    }

    /// Expand all symbols back into bytes.
    pub fn reconstruct(&self) -> Result<Vec<u8>, ExpandError> {
        expand_symbols(&self.symbols())
    }

    fn validate(&self) -> Result<(), StepLogError> {
        let len = self.original.len();
        let mut expected = 0usize;
        let mut previous: Option<usize> = None;

        for (index, step) in self.steps.iter().enumerate() {
            let position = step.position;
            if step.window_start > position {
                return Err(StepLogError::WindowAfterPosition {
                    index,
                    window_start: step.window_start,
                    position,
                });
            }
            if position >= len {
                return Err(StepLogError::PositionOutOfBounds {
                    index,
                    position,
                    len,
                });
            }
            if let Some(previous) = previous.filter(|&previous| position <= previous) {
                return Err(StepLogError::PositionNotIncreasing {
                    index,
                    previous,
                    position,
                });
            }
            if position != expected {
                return Err(StepLogError::Gap {
                    index,
                    expected,
                    position,
                });
            }

            if let Action::Match {
                offset,
                length,
                match_start,
            } = step.action
            {
                if length == 0 {
                    return Err(StepLogError::EmptyMatch { index });
                }
                if length > len - position {
                    return Err(StepLogError::MatchPastEnd {
                        index,
                        position,
                        length,
                        len,
                    });
                }
                if match_start >= position {
                    return Err(StepLogError::MatchNotBehind {
                        index,
                        match_start,
                        position,
                    });
                }
                if offset != position - match_start {
                    return Err(StepLogError::OffsetMismatch {
                        index,
                        offset,
                        expected: position - match_start,
                    });
                }
                if !step.candidates.is_empty()
                    && !step.candidates.iter().any(|c| c.start == match_start)
                {
                    return Err(StepLogError::ChosenCandidateMissing { index, match_start });
                }
            }

            previous = Some(position);
            // Cannot overflow: position < len and consumed <= len - position.
            expected = position + step.consumed();
        }

        if expected != len {
            return Err(StepLogError::Truncated {
                covered: expected.min(len),
                len,
            });
        }

        let rebuilt = self.reconstruct()?;
        if let Some(at) = first_difference(&rebuilt, &self.original) {
            return Err(StepLogError::RoundTripMismatch { at });
        }
        Ok(())
    }
}

fn first_difference(a: &[u8], b: &[u8]) -> Option<usize> {
    a.iter()
        .zip(b)
        .position(|(x, y)| x != y)
        .or_else(|| (a.len() != b.len()).then(|| a.len().min(b.len())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::step::Candidate;

    /// `abcdecdec`: five literals, then an overlapping match at 5 copying
    /// four bytes from 2.
    fn overlapping_log() -> StepLog {
        let original = b"abcdecdec".to_vec();
        let mut steps: Vec<Step> = (0..5).map(|i| Step::literal(i, 0, original[i])).collect();
        steps.push(Step::matched(
            5,
            0,
            2,
            4,
            vec![Candidate {
                start: 2,
                length: 4,
                matched_bytes: b"cdec".to_vec(),
            }],
        ));
        StepLog::new(original, steps).unwrap()
    }

    #[test]
    fn empty_log_is_valid() {
        let log = StepLog::new(Vec::new(), Vec::new()).unwrap();
        assert!(log.is_empty());
        assert_eq!(log, StepLog::empty());
    }

    #[test]
    fn overlapping_match_is_accepted_and_round_trips() {
        let log = overlapping_log();
        assert_eq!(log.len(), 6);
        assert_eq!(log.reconstruct().unwrap(), log.original());
    }

    #[test]
    fn symbols_through_is_a_prefix() {
        let log = overlapping_log();
        assert_eq!(log.symbols_through(0).len(), 1);
        assert_eq!(log.symbols_through(5), log.symbols());
        assert_eq!(log.symbols_through(99), log.symbols());
    }

    #[test]
    fn window_after_position_is_rejected() {
        let err = StepLog::new(b"A".to_vec(), vec![Step::literal(0, 1, b'A')]).unwrap_err();
        assert!(matches!(err, StepLogError::WindowAfterPosition { index: 0, .. }));
    }

    #[test]
    fn non_increasing_positions_are_rejected() {
        let steps = vec![Step::literal(0, 0, b'A'), Step::literal(0, 0, b'A')];
        let err = StepLog::new(b"AA".to_vec(), steps).unwrap_err();
        assert!(matches!(
            err,
            StepLogError::PositionNotIncreasing { index: 1, .. }
        ));
    }

    #[test]
    fn skipped_bytes_are_rejected() {
        let steps = vec![Step::literal(0, 0, b'A'), Step::literal(2, 0, b'C')];
        let err = StepLog::new(b"ABC".to_vec(), steps).unwrap_err();
        assert_eq!(
            err,
            StepLogError::Gap {
                index: 1,
                expected: 1,
                position: 2
            }
        );
    }

    #[test]
    fn missing_tail_is_rejected() {
        let err = StepLog::new(b"AB".to_vec(), vec![Step::literal(0, 0, b'A')]).unwrap_err();
        assert_eq!(err, StepLogError::Truncated { covered: 1, len: 2 });
    }

    #[test]
    fn match_running_past_the_input_is_rejected() {
        let steps = vec![
            Step::literal(0, 0, b'A'),
            Step::matched(1, 0, 0, usize::MAX, vec![]),
        ];
        let err = StepLog::new(b"AA".to_vec(), steps).unwrap_err();
        assert_eq!(
            err,
            StepLogError::MatchPastEnd {
                index: 1,
                position: 1,
                length: usize::MAX,
                len: 2
            }
        );

        let steps = vec![Step::literal(0, 0, b'A'), Step::matched(1, 0, 0, 2, vec![])];
        let err = StepLog::new(b"AA".to_vec(), steps).unwrap_err();
        assert!(matches!(err, StepLogError::MatchPastEnd { length: 2, .. }));
    }

    #[test]
    fn forward_match_is_rejected() {
        let steps = vec![Step::literal(0, 0, b'A'), Step::matched(1, 0, 1, 1, vec![])];
        let err = StepLog::new(b"AA".to_vec(), steps).unwrap_err();
        assert!(matches!(err, StepLogError::MatchNotBehind { index: 1, .. }));
    }

    #[test]
    fn wrong_offset_is_rejected() {
        let mut step = Step::matched(1, 0, 0, 1, vec![]);
        step.action = Action::Match {
            offset: 2,
            length: 1,
            match_start: 0,
        };
        let err = StepLog::new(b"AA".to_vec(), vec![Step::literal(0, 0, b'A'), step]).unwrap_err();
        assert_eq!(
            err,
            StepLogError::OffsetMismatch {
                index: 1,
                offset: 2,
                expected: 1
            }
        );
    }

    #[test]
    fn chosen_candidate_must_be_listed() {
        let candidate = Candidate {
            start: 0,
            length: 1,
            matched_bytes: vec![b'A'],
        };
        let steps = vec![
            Step::literal(0, 0, b'A'),
            Step::literal(1, 0, b'A'),
            Step::matched(2, 0, 1, 1, vec![candidate]),
        ];
        let err = StepLog::new(b"AAA".to_vec(), steps).unwrap_err();
        assert_eq!(
            err,
            StepLogError::ChosenCandidateMissing {
                index: 2,
                match_start: 1
            }
        );
    }

    #[test]
    fn wrong_literal_fails_round_trip() {
        let err = StepLog::new(b"A".to_vec(), vec![Step::literal(0, 0, b'B')]).unwrap_err();
        assert_eq!(err, StepLogError::RoundTripMismatch { at: 0 });
    }

    #[test]
    fn response_symbols_must_agree() {
        let log = overlapping_log();
        let mut symbols = log.symbols();
        symbols[0] = OutputSymbol::Literal { value: b'z' };
        let response = CompressResponse {
            original_data: log.original().to_vec(),
            compressed_data: symbols,
            steps: log.wire_steps(),
            compression_ratio: 1.0,
        };
        assert_eq!(
            StepLog::from_response(&response),
            Err(StepLogError::SymbolMismatch { index: 0 })
        );
    }

    #[test]
    fn response_round_trips_through_wire_steps() {
        let log = overlapping_log();
        let response = CompressResponse {
            original_data: log.original().to_vec(),
            compressed_data: log.symbols(),
            steps: log.wire_steps(),
            compression_ratio: 1.0,
        };
        assert_eq!(StepLog::from_response(&response).unwrap(), log);
    }
}
