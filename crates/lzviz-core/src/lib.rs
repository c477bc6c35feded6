#![forbid(unsafe_code)]

//! Core: step log, playback cursor, and view-model projection.
//!
//! # Role in lzviz
//! `lzviz-core` is the leaf of the workspace. It owns the immutable record of
//! what the encoder decided at every position ([`StepLog`]), the single
//! integer that says how far the replay has progressed ([`PlaybackCursor`]),
//! and the pure function that turns both into something a front end can draw
//! ([`project`]).
//!
//! # Primary responsibilities
//! - **Wire contract**: the JSON shapes exchanged with the compression
//!   endpoint ([`wire`]).
//! - **Validation**: every invariant a step log must satisfy before a replay
//!   may start, including byte-exact reconstruction.
//! - **Projection**: window highlighting, candidate listing, cumulative
//!   output and explanation text for any cursor position.
//! - **Cues**: the discrete feedback event attached to each transition.
//!
//! # How it fits in the system
//! `lzviz-encoder` produces step logs, `lzviz-runtime` owns the session that
//! moves the cursor on user and timer commands, and front ends (`lzviz-web`,
//! the `lzviz` CLI) render the [`ViewModel`]. Nothing in this crate performs
//! I/O or keeps mutable state beyond the cursor.

pub mod cue;
pub mod cursor;
pub mod expand;
pub mod projector;
pub mod step;
pub mod step_log;
pub mod wire;

pub use cue::{Cue, CueSink, GOOD_MATCH_THRESHOLD, NullCueSink, cue_for_transition};
pub use cursor::{CursorMove, Direction, PlaybackCursor};
pub use expand::{ExpandError, MAX_OUTPUT_LEN, expand_symbols};
pub use projector::{
    ByteMarks, CandidateView, Explanation, Progress, ViewModel, WindowHighlight, project,
};
pub use step::{Action, Candidate, OutputSymbol, Step};
pub use step_log::{StepLog, StepLogError};
pub use wire::{
    CompressRequest, CompressResponse, DecompressRequest, DecompressResponse, WireAction,
    WireStep,
};
