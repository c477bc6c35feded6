#![forbid(unsafe_code)]

//! Platform-independent runner core wrapping a [`Controller`].
//!
//! This module contains the logic shared between the wasm-bindgen exports
//! and the native test harness. No JS/WASM types here.

use core::time::Duration;

use lzviz_audio::{AudioConfig, BackendKind, ClipId, render, tones_for};
use lzviz_core::{CompressResponse, Cue, CueSink, ViewModel};
use lzviz_runtime::{
    Command, Controller, Controls, LocalTransport, PresentationAdapter, SessionError,
    TransportError, VisualizerConfig,
};
use serde::Serialize;

/// Sample rate used when the host does not specify one.
pub const DEFAULT_SAMPLE_RATE: u32 = 44_100;

/// Records whether anything needs redrawing and which errors to show.
#[derive(Debug, Default)]
pub struct FramePresenter {
    dirty: bool,
    errors: Vec<String>,
}

impl PresentationAdapter for FramePresenter {
    fn render(&mut self, _view: &ViewModel, _controls: &Controls) {
        self.dirty = true;
    }

    fn update_controls(&mut self, _controls: &Controls) {
        self.dirty = true;
    }

    fn report_error(&mut self, error: &SessionError) {
        self.errors.push(error.to_string());
    }
}

/// Cues waiting for the host to play them.
#[derive(Debug, Default)]
pub struct CueQueue {
    pending: Vec<Cue>,
    enabled: bool,
}

impl CueSink for CueQueue {
    fn play(&mut self, cue: Cue) {
        if self.enabled {
            self.pending.push(cue);
        }
    }
}

/// One drained cue with the clip a sample-based host should play.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CueEvent {
    #[serde(flatten)]
    pub cue: Cue,
    pub clip: &'static str,
    pub volume: f32,
}

impl From<Cue> for CueEvent {
    fn from(cue: Cue) -> Self {
        let clip = ClipId::for_cue(cue);
        Self {
            cue,
            clip: clip.name(),
            volume: clip.volume(),
        }
    }
}

/// Platform-independent visualizer runner.
pub struct RunnerCore {
    controller: Controller<FramePresenter, CueQueue>,
    transport: LocalTransport,
    audio: AudioConfig,
}

#[cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]
impl RunnerCore {
    pub fn new() -> Self {
        Self::build(VisualizerConfig::default(), LocalTransport::default())
    }

    /// Build from a JSON config; unknown keys are ignored, bad values are
    /// reported.
    pub fn from_config_json(json: &str) -> Result<Self, String> {
        let config = VisualizerConfig::from_json_str(json).map_err(|e| e.to_string())?;
        let errors = config.validate();
        if !errors.is_empty() {
            return Err(errors.join("; "));
        }
        Self::with_config(config)
    }

    /// Build from a parsed config. Fails if the encoder settings are invalid.
    pub fn with_config(config: VisualizerConfig) -> Result<Self, String> {
        let transport = LocalTransport::new(config.encoder).map_err(|e| e.to_string())?;
        Ok(Self::build(config, transport))
    }

    fn build(config: VisualizerConfig, transport: LocalTransport) -> Self {
        let sink = CueQueue {
            pending: Vec::new(),
            enabled: config.audio.enabled && config.audio.backend != BackendKind::Muted,
        };
        let mut controller = Controller::from_config(&config, FramePresenter::default(), sink);
        controller.present();
        Self {
            controller,
            transport,
            audio: config.audio,
        }
    }

    // ── Submission ──────────────────────────────────────────────────────

    /// Compress with the in-module encoder.
    pub fn submit(&mut self, input: &str) -> Result<(), String> {
        self.controller
            .submit_with(input, &self.transport)
            .map_err(|e| e.to_string())
    }

    /// Start a submission the host will send itself. Returns the generation
    /// to pass back with the response.
    pub fn begin_submit(&mut self, input: &str) -> Result<u64, String> {
        self.controller
            .begin_submit(input)
            .map(|ticket| ticket.generation)
            .map_err(|e| e.to_string())
    }

    /// Deliver the endpoint's JSON body. Stale generations are dropped
    /// silently.
    pub fn complete_submit_json(&mut self, generation: u64, body: &str) -> Result<(), String> {
        let result = serde_json::from_str::<CompressResponse>(body)
            .map_err(|e| TransportError::Decode(e.to_string()));
        self.controller
            .complete_submit(generation, result)
            .map_err(|e| e.to_string())
    }

    /// Report that the host's request failed.
    pub fn fail_submit(&mut self, generation: u64, message: &str) -> Result<(), String> {
        let result = Err(TransportError::Unavailable(message.to_owned()));
        self.controller
            .complete_submit(generation, result)
            .map_err(|e| e.to_string())
    }

    // ── Commands ────────────────────────────────────────────────────────

    /// Run a command. Only an invalid speed can fail.
    pub fn command(&mut self, command: Command) -> bool {
        self.controller.handle(command).is_ok()
    }

    pub fn step_forward(&mut self) {
        self.command(Command::StepForward);
    }

    pub fn step_back(&mut self) {
        self.command(Command::StepBack);
    }

    pub fn toggle_play(&mut self) {
        self.command(Command::TogglePlay);
    }

    pub fn reset(&mut self) {
        self.command(Command::Reset);
    }

    pub fn seek(&mut self, target: i32) {
        self.command(Command::Seek(target as isize));
    }

    pub fn go_to_start(&mut self) {
        self.command(Command::GoToStart);
    }

    pub fn go_to_end(&mut self) {
        self.command(Command::GoToEnd);
    }

    pub fn set_speed(&mut self, value: u32) -> bool {
        self.command(Command::SetSpeed(value))
    }

    /// Advance the clock by `dt_ms` milliseconds of host time.
    pub fn advance_time_ms(&mut self, dt_ms: f64) {
        // Be robust to host-provided non-finite/negative deltas.
        if !dt_ms.is_finite() || dt_ms <= 0.0 {
            return;
        }
        let dt = Duration::from_secs_f64(dt_ms.min(60_000.0) / 1000.0);
        self.command(Command::AdvanceTime(dt));
    }

    pub fn set_audio_enabled(&mut self, enabled: bool) {
        self.controller.sink_mut().enabled = enabled && self.audio.backend != BackendKind::Muted;
        if !enabled {
            self.controller.sink_mut().pending.clear();
        }
    }

    // ── Exports ─────────────────────────────────────────────────────────

    /// Whether anything changed since the last call.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.controller.presenter_mut().dirty)
    }

    pub fn view(&self) -> ViewModel {
        self.controller.session().view()
    }

    pub fn view_json(&self) -> String {
        serde_json::to_string(&self.view()).unwrap_or_default()
    }

    pub fn controls(&self) -> Controls {
        self.controller.session().controls()
    }

    pub fn controls_json(&self) -> String {
        serde_json::to_string(&self.controls()).unwrap_or_default()
    }

    /// Bytes of the input behind the current log, for drawing the byte row.
    pub fn input_bytes(&self) -> Vec<u8> {
        self.controller.session().log().original().to_vec()
    }

    pub fn backend(&self) -> BackendKind {
        self.audio.backend
    }

    fn drain_cues(&mut self) -> Vec<Cue> {
        std::mem::take(&mut self.controller.sink_mut().pending)
    }

    /// Drain queued cues as clip events. Empty unless the sample backend is
    /// configured.
    pub fn take_cues(&mut self) -> Vec<CueEvent> {
        let cues = self.drain_cues();
        if self.audio.backend != BackendKind::Sample {
            return Vec::new();
        }
        cues.into_iter().map(CueEvent::from).collect()
    }

    pub fn take_cues_json(&mut self) -> String {
        serde_json::to_string(&self.take_cues()).unwrap_or_default()
    }

    /// Drain queued cues and render them as one mono PCM buffer. Empty
    /// unless the synthesized backend is configured.
    pub fn take_cue_pcm(&mut self, sample_rate: u32) -> Vec<f32> {
        let cues = self.drain_cues();
        if self.audio.backend != BackendKind::Synth {
            return Vec::new();
        }
        let sample_rate = if sample_rate == 0 {
            DEFAULT_SAMPLE_RATE
        } else {
            sample_rate
        };
        let tones: Vec<_> = cues.into_iter().flat_map(tones_for).collect();
        render(&tones, sample_rate, self.audio.master_gain)
    }

    pub fn take_errors(&mut self) -> Vec<String> {
        std::mem::take(&mut self.controller.presenter_mut().errors)
    }

    pub fn diagnostics_jsonl(&self) -> String {
        self.controller.diagnostics().to_jsonl()
    }

    pub fn is_playing(&self) -> bool {
        self.controller.session().is_playing()
    }
}

impl Default for RunnerCore {
    fn default() -> Self {
        Self::new()
    }
}
