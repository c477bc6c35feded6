#![forbid(unsafe_code)]

//! Audio feedback for cursor transitions.
//!
//! Two interchangeable backends implement [`CueSink`](lzviz_core::CueSink):
//!
//! - [`SampleBackend`] plays pre-recorded clips supplied by the host.
//! - [`SynthBackend`] renders oscillator tones to PCM.
//!
//! [`AudioOutput`] picks one according to [`AudioConfig`] and adds the
//! user-facing on/off switch. The playback core never learns which backend
//! is active.

pub mod config;
pub mod output;
pub mod sample;
pub mod synth;

pub use config::{AudioConfig, BackendKind};
pub use output::AudioOutput;
pub use sample::{Clip, ClipBank, ClipError, ClipId, ClipPlayer, SampleBackend, decode_data_url};
pub use synth::{Envelope, PcmSink, Sweep, SynthBackend, Tone, Waveform, render, tones_for};
