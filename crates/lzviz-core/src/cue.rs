#![forbid(unsafe_code)]

//! Feedback cues emitted on cursor transitions.
//!
//! A cue is a discrete, backend-neutral event. The core decides *which* cue a
//! transition produces; what it sounds like (or whether it sounds at all) is
//! up to the [`CueSink`] the session was built with.

use serde::Serialize;

use crate::step::Action;
use crate::step_log::StepLog;

/// Matches strictly longer than this are "good" matches.
pub const GOOD_MATCH_THRESHOLD: usize = 8;

/// One feedback event.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Cue {
    /// Generic navigation (backward steps, returning to the start).
    Step,
    /// The cursor landed on a literal step.
    Literal,
    /// The cursor landed on a match step.
    Match { length: usize },
    /// A compression result was applied.
    Success { ratio: f64 },
    /// Playback was reset.
    Reset,
}

impl Cue {
    /// Stable short name, used in logs and exports.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Step => "step",
            Self::Literal => "literal",
            Self::Match { .. } => "match",
            Self::Success { .. } => "success",
            Self::Reset => "reset",
        }
    }

    #[must_use]
    pub const fn is_good_match(&self) -> bool {
        matches!(self, Self::Match { length } if *length > GOOD_MATCH_THRESHOLD)
    }
}

/// Anything that can play cues.
pub trait CueSink {
    fn play(&mut self, cue: Cue);
}

/// Drops every cue.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullCueSink;

impl CueSink for NullCueSink {
    fn play(&mut self, _cue: Cue) {}
}

/// Records cues in order; handy for hosts that drain them in batches.
impl CueSink for Vec<Cue> {
    fn play(&mut self, cue: Cue) {
        self.push(cue);
    }
}

impl<S: CueSink + ?Sized> CueSink for Box<S> {
    fn play(&mut self, cue: Cue) {
        (**self).play(cue);
    }
}

/// Cue for a cursor transition `from -> to`.
///
/// Landing on a step going forward (or by seek) announces that step's
/// action. Moving backward, or landing on the initial position, is a plain
/// [`Cue::Step`]. Returns `None` when nothing moved.
#[must_use]
pub fn cue_for_transition(log: &StepLog, from: isize, to: isize) -> Option<Cue> {
    if from == to {
        return None;
    }
    if to < from {
        return Some(Cue::Step);
    }
    let step = usize::try_from(to).ok().and_then(|i| log.step(i))?;
    Some(match step.action {
        Action::Literal { .. } => Cue::Literal,
        Action::Match { length, .. } => Cue::Match { length },
    })
}
