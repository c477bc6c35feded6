#![forbid(unsafe_code)]

//! Playback cursor: the one integer a replay mutates.
//!
//! # Invariants
//!
//! 1. `-1 <= position <= len - 1` at all times (`-1` when the log is empty).
//! 2. `-1` means "before any step"; it is the initial and reset state.
//! 3. A rejected move never changes the position.
//! 4. Moving past the last step is reported as [`CursorMove::PastEnd`] so a
//!    running clock can stop itself; it is not an error.

use serde::Serialize;

/// Direction of a single step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

impl Direction {
    #[inline]
    #[must_use]
    pub const fn delta(self) -> isize {
        match self {
            Self::Forward => 1,
            Self::Backward => -1,
        }
    }
}

/// Result of asking the cursor to move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CursorMove {
    /// The position changed.
    Moved { from: isize, to: isize },
    /// The target equals the current position.
    Unchanged,
    /// The target lies before the initial position.
    BeforeStart,
    /// The target lies after the last step (natural end of playback).
    PastEnd,
}

impl CursorMove {
    #[inline]
    #[must_use]
    pub const fn moved(self) -> bool {
        matches!(self, Self::Moved { .. })
    }
}

/// Index into a step log with a distinguished "before first step" value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaybackCursor {
    position: isize,
    len: usize,
}

impl PlaybackCursor {
    /// Position before any step.
    pub const INITIAL: isize = -1;

    /// Cursor over a log of `len` steps, at [`Self::INITIAL`].
    #[must_use]
    pub const fn new(len: usize) -> Self {
        Self {
            position: Self::INITIAL,
            len,
        }
    }

    #[inline]
    #[must_use]
    pub const fn position(&self) -> isize {
        self.position
    }

    /// Current step index, `None` before the first step.
    #[inline]
    #[must_use]
    pub fn index(&self) -> Option<usize> {
        usize::try_from(self.position).ok()
    }

    /// Number of steps in the underlying log.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    #[must_use]
    pub const fn at_start(&self) -> bool {
        self.position == Self::INITIAL
    }

    /// Whether the cursor sits on the last real step.
    #[inline]
    #[must_use]
    pub fn at_last(&self) -> bool {
        self.position == self.last()
    }

    /// Whether a backward step would be accepted.
    #[inline]
    #[must_use]
    pub const fn can_step_back(&self) -> bool {
        self.position > Self::INITIAL
    }

    /// Whether a forward step would be accepted.
    #[inline]
    #[must_use]
    pub fn can_step_forward(&self) -> bool {
        self.position < self.last()
    }

    /// Last valid position (`-1` for an empty log).
    #[inline]
    #[must_use]
    pub fn last(&self) -> isize {
        isize::try_from(self.len).map_or(isize::MAX, |len| len - 1)
    }

    /// Move one step.
    pub fn step_by(&mut self, direction: Direction) -> CursorMove {
        let next = self.position.saturating_add(direction.delta());
        self.move_to(next)
    }

    /// Jump directly to `target`, rejecting out-of-range targets.
    pub fn seek(&mut self, target: isize) -> CursorMove {
        if target == self.position {
            return CursorMove::Unchanged;
        }
        self.move_to(target)
    }

    /// Return to [`Self::INITIAL`]. Always legal.
    pub fn reset(&mut self) -> CursorMove {
        let from = self.position;
        self.position = Self::INITIAL;
        if from == Self::INITIAL {
            CursorMove::Unchanged
        } else {
            CursorMove::Moved {
                from,
                to: Self::INITIAL,
            }
        }
    }

    fn move_to(&mut self, next: isize) -> CursorMove {
        if next < Self::INITIAL {
            return CursorMove::BeforeStart;
        }
        if next > self.last() {
            return CursorMove::PastEnd;
        }
        let from = self.position;
        self.position = next;
        CursorMove::Moved { from, to: next }
    }
}
