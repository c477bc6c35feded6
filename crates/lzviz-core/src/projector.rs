#![forbid(unsafe_code)]

//! Step projector: `(StepLog, cursor) -> ViewModel`.
//!
//! [`project`] is a pure function. It keeps no state between calls and
//! rebuilds the cumulative output from the log on every call, so jumping the
//! cursor by any distance yields the same view as walking there one step at a
//! time.
//!
//! # Highlight rules
//!
//! For the step under the cursor:
//! - `[window_start, position)` is in the window and `position` is current.
//! - A literal marks `position` as the emitted literal.
//! - A match marks `[match_start, match_start + length)` as the copy source
//!   and `[position, position + length)` as the copy destination, both
//!   clipped to the input length. When the copy overlaps itself the two
//!   ranges share bytes; nothing is trimmed to keep them disjoint.

use std::fmt;
use std::ops::Range;

use bitflags::bitflags;
use serde::Serialize;

use crate::step::{Action, OutputSymbol, Step};
use crate::step_log::StepLog;

bitflags! {
    /// Per-byte highlight classes.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ByteMarks: u8 {
        const IN_WINDOW = 0b0000_0001;
        const CURRENT   = 0b0000_0010;
        const SOURCE    = 0b0000_0100;
        const COPIED    = 0b0000_1000;
        const LITERAL   = 0b0001_0000;
    }
}

/// Highlighted ranges over the input bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WindowHighlight {
    /// Bytes eligible as match sources: `[window_start, position)`.
    pub window: Range<usize>,
    /// Byte being processed.
    pub current: usize,
    /// Set when the step emitted a literal.
    pub literal: Option<usize>,
    /// Source of the chosen match, clipped to the input.
    pub source: Option<Range<usize>>,
    /// Bytes produced by the chosen match, clipped to the input.
    pub copied: Option<Range<usize>>,
}

impl WindowHighlight {
    fn for_step(step: &Step, input_len: usize) -> Self {
        let mut highlight = Self {
            window: step.window_start..step.position,
            current: step.position,
            literal: None,
            source: None,
            copied: None,
        };
        match step.action {
            Action::Literal { .. } => highlight.literal = Some(step.position),
            Action::Match {
                length,
                match_start,
                ..
            } => {
                highlight.source = clip(match_start, length, input_len);
                highlight.copied = clip(step.position, length, input_len);
            }
        }
        highlight
    }

    /// Marks for every one of `len` input bytes.
    #[must_use]
    pub fn marks(&self, len: usize) -> Vec<ByteMarks> {
        let mut marks = vec![ByteMarks::empty(); len];
        let mut apply = |range: Range<usize>, mark: ByteMarks| {
            let end = range.end.min(len);
            for slot in marks.iter_mut().take(end).skip(range.start) {
                slot.insert(mark);
            }
        };
        apply(self.window.clone(), ByteMarks::IN_WINDOW);
        apply(self.current..self.current + 1, ByteMarks::CURRENT);
        if let Some(at) = self.literal {
            apply(at..at + 1, ByteMarks::LITERAL);
        }
        if let Some(source) = self.source.clone() {
            apply(source, ByteMarks::SOURCE);
        }
        if let Some(copied) = self.copied.clone() {
            apply(copied, ByteMarks::COPIED);
        }
        marks
    }
}

fn clip(start: usize, length: usize, len: usize) -> Option<Range<usize>> {
    let end = start.saturating_add(length).min(len);
    (start < end).then_some(start..end)
}

/// A candidate as listed in the view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CandidateView {
    pub start: usize,
    pub length: usize,
    pub matched_bytes: Vec<u8>,
    /// Whether this candidate is the one the encoder used.
    pub chosen: bool,
}

/// Explanatory text for the current position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Explanation {
    Initial,
    Literal {
        value: u8,
    },
    Match {
        offset: usize,
        length: usize,
        /// `length - 2`: a reference is assumed to cost two bytes. Display
        /// heuristic only, negative for single-byte matches.
        savings: isize,
    },
}

impl fmt::Display for Explanation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::Initial => write!(
                f,
                "Starting compression. The algorithm will process each byte of input data."
            ),
            Self::Literal { value } => {
                write!(
                    f,
                    "No significant match found, so storing the literal byte {value} "
                )?;
                if is_printable(value) {
                    write!(f, "('{}').", char::from(value))
                } else {
                    write!(f, "(non-printable).")
                }
            }
            Self::Match {
                offset,
                length,
                savings,
            } => write!(
                f,
                "Found a match of length {length} at offset {offset}. \
                 Instead of storing {length} individual bytes, we store a reference \
                 ({offset}, {length}). This saves {savings} bytes of space \
                 (assuming references use 2 bytes)."
            ),
        }
    }
}

/// Printable ASCII, rendered as a character rather than a number.
#[inline]
#[must_use]
pub const fn is_printable(byte: u8) -> bool {
    matches!(byte, 32..=126)
}

/// How far the replay has progressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Progress {
    /// Steps shown so far (`cursor + 1`).
    pub completed: usize,
    pub total: usize,
}

impl Progress {
    /// Completion in percent; 0 for an empty log.
    #[must_use]
    pub fn percent(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.completed as f64 * 100.0 / self.total as f64
        }
    }
}

impl fmt::Display for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.completed, self.total)
    }
}

/// Rendering-agnostic description of one cursor position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ViewModel {
    pub cursor: isize,
    /// `None` before the first step.
    pub window: Option<WindowHighlight>,
    /// `None` before the first step; empty for literal steps.
    pub candidates: Option<Vec<CandidateView>>,
    pub cumulative_output: Vec<OutputSymbol>,
    pub explanation: Explanation,
    pub progress: Progress,
}

impl ViewModel {
    /// Per-byte marks over the whole input (all empty before the first step).
    #[must_use]
    pub fn byte_marks(&self, input_len: usize) -> Vec<ByteMarks> {
        match &self.window {
            Some(window) => window.marks(input_len),
            None => vec![ByteMarks::empty(); input_len],
        }
    }
}

/// Project the log at `cursor`.
///
/// A cursor outside `[-1, len - 1]` is treated as the nearest bound.
#[must_use]
pub fn project(log: &StepLog, cursor: isize) -> ViewModel {
    let total = log.len();
    let index = usize::try_from(cursor)
        .ok()
        .filter(|_| total > 0)
        .map(|i| i.min(total - 1));

    let Some(index) = index else {
        return ViewModel {
            cursor: -1,
            window: None,
            candidates: None,
            cumulative_output: Vec::new(),
            explanation: Explanation::Initial,
            progress: Progress { completed: 0, total },
        };
    };

    let step = &log.steps()[index];
    let (candidates, explanation) = match step.action {
        Action::Literal { value } => (Vec::new(), Explanation::Literal { value }),
        Action::Match {
            offset,
            length,
            match_start,
        } => {
            let listed = step
                .candidates
                .iter()
                .map(|c| CandidateView {
                    start: c.start,
                    length: c.length,
                    matched_bytes: c.matched_bytes.clone(),
                    chosen: c.start == match_start,
                })
                .collect();
            let savings = isize::try_from(length).unwrap_or(isize::MAX) - 2;
            (
                listed,
                Explanation::Match {
                    offset,
                    length,
                    savings,
                },
            )
        }
    };

    ViewModel {
        cursor: isize::try_from(index).unwrap_or(isize::MAX),
        window: Some(WindowHighlight::for_step(step, log.original().len())),
        candidates: Some(candidates),
        cumulative_output: log.symbols_through(index),
        explanation,
        progress: Progress {
            completed: index + 1,
            total,
        },
    }
}
