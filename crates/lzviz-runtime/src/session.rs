#![forbid(unsafe_code)]

//! Playback session: the one owner of step log, cursor and clock.
//!
//! # Submission protocol
//!
//! Compression is two-phase so that it can complete asynchronously:
//!
//! 1. [`Session::begin_submit`] rejects blank input, stops playback, and
//!    issues a fresh [`Ticket`] whose generation supersedes every earlier
//!    one.
//! 2. [`Session::complete_submit`] applies the result only if its
//!    generation is still the pending one. Anything else is a
//!    [`SessionError::StaleResponse`] and changes nothing.
//!
//! A failed request (transport error or invalid log) clears the pending
//! token and leaves the previous log, cursor and clock untouched.
//!
//! # Invariants
//!
//! 1. The step log is replaced atomically; cursor and clock are reset with it.
//! 2. Playback stops only when a forward step is attempted from the last
//!    step; landing on it leaves the clock running for one more tick.
//! 3. Every method either fully applies or leaves the session unchanged.

use lzviz_core::{
    CompressResponse, Cue, CursorMove, Direction, PlaybackCursor, StepLog, ViewModel,
    cue_for_transition, project,
};
use serde::Serialize;
use tracing::{debug, info, warn};
use web_time::Duration;

use crate::clock::{AnimationClock, Speed};
use crate::error::{Generation, Result, SessionError, TransportError};

/// Proof that a submission was accepted; hand it back with the result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ticket {
    pub generation: Generation,
    /// Text to send to the compression endpoint.
    pub data: String,
}

/// What a session operation changed.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Update {
    /// Cursor moved or the log was replaced: the view model is out of date.
    pub view_changed: bool,
    /// Play state, speed or button enablement may have changed.
    pub controls_changed: bool,
    /// Feedback for the transition, if any.
    pub cue: Option<Cue>,
}

impl Update {
    const NONE: Self = Self {
        view_changed: false,
        controls_changed: false,
        cue: None,
    };

    #[must_use]
    pub const fn is_noop(&self) -> bool {
        !self.view_changed && !self.controls_changed && self.cue.is_none()
    }
}

/// Button enablement and playback status for the front end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Controls {
    pub can_step_back: bool,
    pub can_step_forward: bool,
    /// Play/pause is meaningful only with a log loaded.
    pub can_toggle_play: bool,
    pub playing: bool,
    /// A compression request is in flight.
    pub submitting: bool,
    pub speed: u32,
    pub interval_ms: u64,
    pub cursor: isize,
    pub total_steps: usize,
}

/// Session construction options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SessionOptions {
    pub speed: Speed,
    /// Start playing as soon as a result is applied.
    pub auto_play: bool,
}

/// Owner of the step log, cursor and animation clock.
#[derive(Debug, Clone)]
pub struct Session {
    log: StepLog,
    cursor: PlaybackCursor,
    clock: AnimationClock,
    speed: Speed,
    auto_play: bool,
    compression_ratio: Option<f64>,
    last_issued: Generation,
    pending: Option<Generation>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(SessionOptions::default())
    }
}

impl Session {
    #[must_use]
    pub fn new(options: SessionOptions) -> Self {
        Self {
            log: StepLog::empty(),
            cursor: PlaybackCursor::new(0),
            clock: AnimationClock::new(options.speed.interval()),
            speed: options.speed,
            auto_play: options.auto_play,
            compression_ratio: None,
            last_issued: 0,
            pending: None,
        }
    }

    // ── Submission ──────────────────────────────────────────────────────

    /// Accept `input` for compression and invalidate older submissions.
    pub fn begin_submit(&mut self, input: &str) -> Result<Ticket> {
        if input.trim().is_empty() {
            debug!("blank submission rejected");
            return Err(SessionError::EmptyInput);
        }
        self.clock.stop();
        self.last_issued += 1;
        self.pending = Some(self.last_issued);
        info!(
            generation = self.last_issued,
            bytes = input.len(),
            "compression submitted"
        );
        Ok(Ticket {
            generation: self.last_issued,
            data: input.to_string(),
        })
    }

    /// Apply (or discard) the result for `generation`.
    pub fn complete_submit(
        &mut self,
        generation: Generation,
        result: std::result::Result<CompressResponse, TransportError>,
    ) -> Result<Update> {
        if self.pending != Some(generation) {
            debug!(
                generation,
                pending = ?self.pending,
                "discarding stale compression response"
            );
            return Err(SessionError::StaleResponse {
                expected: self.pending,
                got: generation,
            });
        }
        self.pending = None;

        let response = result.map_err(|error| {
            warn!(generation, %error, "compression request failed");
            SessionError::Transport(error)
        })?;
        let log = StepLog::from_response(&response).map_err(|error| {
            warn!(generation, %error, "compression response rejected");
            SessionError::InvalidLog(error)
        })?;

        info!(
            generation,
            steps = log.len(),
            ratio = response.compression_ratio,
            "compression applied"
        );
        self.cursor = PlaybackCursor::new(log.len());
        self.log = log;
        self.compression_ratio = Some(response.compression_ratio);
        self.clock.stop();
        if self.auto_play && self.cursor.can_step_forward() {
            self.clock.start();
        }
        Ok(Update {
            view_changed: true,
            controls_changed: true,
            cue: Some(Cue::Success {
                ratio: response.compression_ratio,
            }),
        })
    }

    /// Run both phases against a synchronous transport.
    pub fn submit_with(
        &mut self,
        input: &str,
        transport: &impl crate::transport::CompressionTransport,
    ) -> Result<Update> {
        let ticket = self.begin_submit(input)?;
        let result = transport.compress(&ticket.data);
        self.complete_submit(ticket.generation, result)
    }

    // ── Navigation ──────────────────────────────────────────────────────

    pub fn step_forward(&mut self) -> Update {
        self.step(Direction::Forward)
    }

    pub fn step_back(&mut self) -> Update {
        self.step(Direction::Backward)
    }

    fn step(&mut self, direction: Direction) -> Update {
        let outcome = self.cursor.step_by(direction);
        self.after_move(outcome)
    }

    /// Jump to `target`; out-of-range targets are ignored.
    pub fn seek(&mut self, target: isize) -> Update {
        let outcome = self.cursor.seek(target);
        self.after_move(outcome)
    }

    pub fn go_to_start(&mut self) -> Update {
        self.seek(PlaybackCursor::INITIAL)
    }

    pub fn go_to_end(&mut self) -> Update {
        let last = self.cursor.last();
        self.seek(last)
    }

    fn after_move(&mut self, outcome: CursorMove) -> Update {
        match outcome {
            CursorMove::Moved { from, to } => {
                debug!(from, to, "cursor moved");
                Update {
                    view_changed: true,
                    controls_changed: true,
                    cue: cue_for_transition(&self.log, from, to),
                }
            }
            CursorMove::PastEnd => {
                let stopped = self.clock.stop();
                if stopped {
                    debug!(cursor = self.cursor.position(), "playback reached the end");
                }
                Update {
                    controls_changed: stopped,
                    ..Update::NONE
                }
            }
            CursorMove::BeforeStart | CursorMove::Unchanged => Update::NONE,
        }
    }

    /// Back to before the first step; keeps the log, stops playback.
    ///
    /// Always emits [`Cue::Reset`], even when nothing moved.
    pub fn reset(&mut self) -> Update {
        let moved = self.cursor.reset().moved();
        let stopped = self.clock.stop();
        debug!(moved, stopped, "reset");
        Update {
            view_changed: moved,
            controls_changed: moved || stopped,
            cue: Some(Cue::Reset),
        }
    }

    // ── Playback ────────────────────────────────────────────────────────

    /// Pause if playing; otherwise play, unless already on the last step.
    pub fn toggle_play(&mut self) -> Update {
        if self.clock.stop() {
            debug!(cursor = self.cursor.position(), "paused");
            return Update {
                controls_changed: true,
                ..Update::NONE
            };
        }
        if !self.cursor.can_step_forward() {
            debug!("play ignored at the last step");
            return Update::NONE;
        }
        self.clock.start();
        debug!(
            cursor = self.cursor.position(),
            interval_ms = self.clock.interval().as_millis() as u64,
            "playing"
        );
        Update {
            controls_changed: true,
            ..Update::NONE
        }
    }

    /// Change the speed control; a running clock picks it up immediately.
    pub fn set_speed(&mut self, value: u32) -> Result<Update> {
        let speed = Speed::new(value).ok_or(SessionError::InvalidSpeed { value })?;
        if speed == self.speed {
            return Ok(Update::NONE);
        }
        self.speed = speed;
        self.clock.reconfigure(speed.interval());
        debug!(speed = value, running = self.clock.is_running(), "speed changed");
        Ok(Update {
            controls_changed: true,
            ..Update::NONE
        })
    }

    pub fn set_auto_play(&mut self, auto_play: bool) {
        self.auto_play = auto_play;
    }

    /// Let `dt` pass on the clock and apply every tick that fell due.
    pub fn advance_time(&mut self, dt: Duration) -> Vec<Update> {
        let due = self.clock.advance(dt);
        let mut updates = Vec::new();
        for _ in 0..due {
            if !self.clock.is_running() {
                break;
            }
            updates.push(self.step_forward());
        }
        updates
    }

    /// Apply one tick from a real-time ticker started at `epoch`.
    pub fn tick(&mut self, epoch: u64) -> Update {
        if !self.clock.accepts(epoch) {
            debug!(epoch, live = self.clock.epoch(), "dropping tick from stale schedule");
            return Update::NONE;
        }
        self.step_forward()
    }

    // ── Queries ─────────────────────────────────────────────────────────

    #[must_use]
    pub fn view(&self) -> ViewModel {
        project(&self.log, self.cursor.position())
    }

    #[must_use]
    pub fn controls(&self) -> Controls {
        Controls {
            can_step_back: self.cursor.can_step_back(),
            can_step_forward: self.cursor.can_step_forward(),
            can_toggle_play: !self.log.is_empty(),
            playing: self.clock.is_running(),
            submitting: self.pending.is_some(),
            speed: self.speed.get(),
            interval_ms: self.speed.interval().as_millis() as u64,
            cursor: self.cursor.position(),
            total_steps: self.log.len(),
        }
    }

    #[must_use]
    pub fn log(&self) -> &StepLog {
        &self.log
    }

    #[must_use]
    pub fn cursor(&self) -> &PlaybackCursor {
        &self.cursor
    }

    #[must_use]
    pub fn clock(&self) -> &AnimationClock {
        &self.clock
    }

    #[must_use]
    pub const fn speed(&self) -> Speed {
        self.speed
    }

    #[must_use]
    pub const fn is_playing(&self) -> bool {
        self.clock.is_running()
    }

    /// Ratio reported with the applied result.
    #[must_use]
    pub const fn compression_ratio(&self) -> Option<f64> {
        self.compression_ratio
    }

    /// Generation awaiting a result, if any.
    #[must_use]
    pub const fn pending(&self) -> Option<Generation> {
        self.pending
    }
}
