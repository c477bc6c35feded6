#![forbid(unsafe_code)]

//! The single audio capability a session talks to.

use lzviz_core::{Cue, CueSink};
use tracing::debug;

use crate::config::{AudioConfig, BackendKind};
use crate::sample::{ClipBank, ClipPlayer, SampleBackend};
use crate::synth::{PcmSink, SynthBackend};

/// Configured backend plus the user's on/off switch.
///
/// Whatever backend is inside, callers only see [`CueSink`].
pub struct AudioOutput {
    kind: BackendKind,
    backend: Option<Box<dyn CueSink>>,
    enabled: bool,
}

impl AudioOutput {
    /// Output that never makes a sound.
    #[must_use]
    pub fn muted() -> Self {
        Self {
            kind: BackendKind::Muted,
            backend: None,
            enabled: false,
        }
    }

    /// Clip backend.
    pub fn sample(bank: ClipBank, player: impl ClipPlayer + 'static, enabled: bool) -> Self {
        Self {
            kind: BackendKind::Sample,
            backend: Some(Box::new(SampleBackend::new(bank, player))),
            enabled,
        }
    }

    /// Synth backend at `master_gain`.
    pub fn synth(sink: impl PcmSink + 'static, master_gain: f32, enabled: bool) -> Self {
        Self {
            kind: BackendKind::Synth,
            backend: Some(Box::new(SynthBackend::new(sink, master_gain))),
            enabled,
        }
    }

    /// Build the backend `config` asks for from the host's devices.
    pub fn from_config(
        config: &AudioConfig,
        clips: impl FnOnce() -> (ClipBank, Box<dyn ClipPlayer>),
        pcm: impl FnOnce() -> Box<dyn PcmSink>,
    ) -> Self {
        let output = match config.backend {
            BackendKind::Muted => Self::muted(),
            BackendKind::Sample => {
                let (bank, player) = clips();
                Self::sample(bank, player, config.enabled)
            }
            BackendKind::Synth => Self::synth(pcm(), config.master_gain, config.enabled),
        };
        debug!(
            backend = output.kind.label(),
            enabled = output.enabled,
            "audio output ready"
        );
        output
    }

    #[must_use]
    pub const fn kind(&self) -> BackendKind {
        self.kind
    }

    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Switch sound on or off. A muted output stays off.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled && self.backend.is_some();
    }

    /// Flip the switch; returns the new state.
    pub fn toggle(&mut self) -> bool {
        self.set_enabled(!self.enabled);
        self.enabled
    }
}

impl std::fmt::Debug for AudioOutput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioOutput")
            .field("kind", &self.kind)
            .field("enabled", &self.enabled)
            .finish()
    }
}

impl CueSink for AudioOutput {
    fn play(&mut self, cue: Cue) {
        if !self.enabled {
            return;
        }
        if let Some(backend) = self.backend.as_mut() {
            backend.play(cue);
        }
    }
}
