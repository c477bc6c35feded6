#![forbid(unsafe_code)]

//! `wasm-bindgen` exports for the VisualizerRunner.
//!
//! This module wraps [`super::runner_core::RunnerCore`] with JS-friendly types.
//! Only compiled on `wasm32` targets.

use js_sys::{Array, Float32Array, Reflect, Uint8Array};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;

use super::runner_core::RunnerCore;

fn console_error(msg: &str) {
    let global = js_sys::global();
    let Ok(console) = Reflect::get(&global, &"console".into()) else {
        return;
    };
    let Ok(error) = Reflect::get(&console, &"error".into()) else {
        return;
    };
    let Ok(error_fn) = error.dyn_into::<js_sys::Function>() else {
        return;
    };
    let _ = error_fn.call1(&console, &JsValue::from_str(msg));
}

fn install_panic_hook() {
    use std::sync::Once;

    static ONCE: Once = Once::new();
    ONCE.call_once(|| {
        std::panic::set_hook(Box::new(|info| {
            let msg = if let Some(loc) = info.location() {
                format!(
                    "panic at {}:{}:{}: {info}",
                    loc.file(),
                    loc.line(),
                    loc.column()
                )
            } else {
                format!("panic: {info}")
            };
            console_error(&msg);
        }));
    });
}

fn parse_json(json: &str) -> JsValue {
    js_sys::JSON::parse(json).unwrap_or(JsValue::NULL)
}

fn to_js_error(message: String) -> JsValue {
    JsValue::from_str(&message)
}

/// LZ4 step visualizer runner.
///
/// Host-driven: JavaScript owns the animation loop, forwarding button
/// presses and advancing time each frame.
#[wasm_bindgen]
pub struct VisualizerRunner {
    inner: RunnerCore,
}

#[wasm_bindgen(start)]
pub fn wasm_start() {
    install_panic_hook();
}

#[wasm_bindgen]
impl VisualizerRunner {
    /// Create a runner with the default configuration.
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        install_panic_hook();
        Self {
            inner: RunnerCore::new(),
        }
    }

    /// Create a runner from a JSON config object (same keys as `lzviz.toml`).
    #[wasm_bindgen(js_name = withConfig)]
    pub fn with_config(json: &str) -> Result<VisualizerRunner, JsValue> {
        install_panic_hook();
        RunnerCore::from_config_json(json)
            .map(|inner| Self { inner })
            .map_err(to_js_error)
    }

    /// Compress `input` inside the module. Throws on blank input.
    pub fn submit(&mut self, input: &str) -> Result<(), JsValue> {
        self.inner.submit(input).map_err(to_js_error)
    }

    /// Start a host-side request. Returns the generation to hand back.
    #[wasm_bindgen(js_name = beginSubmit)]
    pub fn begin_submit(&mut self, input: &str) -> Result<f64, JsValue> {
        self.inner
            .begin_submit(input)
            .map(|generation| generation as f64)
            .map_err(to_js_error)
    }

    /// Deliver the `/compress` response body for `generation`.
    #[wasm_bindgen(js_name = completeSubmit)]
    pub fn complete_submit(&mut self, generation: f64, body: &str) -> Result<(), JsValue> {
        self.inner
            .complete_submit_json(generation as u64, body)
            .map_err(to_js_error)
    }

    /// Report that the request for `generation` failed.
    #[wasm_bindgen(js_name = failSubmit)]
    pub fn fail_submit(&mut self, generation: f64, message: &str) -> Result<(), JsValue> {
        self.inner
            .fail_submit(generation as u64, message)
            .map_err(to_js_error)
    }

    #[wasm_bindgen(js_name = stepForward)]
    pub fn step_forward(&mut self) {
        self.inner.step_forward();
    }

    #[wasm_bindgen(js_name = stepBack)]
    pub fn step_back(&mut self) {
        self.inner.step_back();
    }

    #[wasm_bindgen(js_name = togglePlay)]
    pub fn toggle_play(&mut self) {
        self.inner.toggle_play();
    }

    pub fn reset(&mut self) {
        self.inner.reset();
    }

    pub fn seek(&mut self, target: i32) {
        self.inner.seek(target);
    }

    #[wasm_bindgen(js_name = goToStart)]
    pub fn go_to_start(&mut self) {
        self.inner.go_to_start();
    }

    #[wasm_bindgen(js_name = goToEnd)]
    pub fn go_to_end(&mut self) {
        self.inner.go_to_end();
    }

    /// Set the speed control (1-10). Returns `false` if out of range.
    #[wasm_bindgen(js_name = setSpeed)]
    pub fn set_speed(&mut self, value: u32) -> bool {
        self.inner.set_speed(value)
    }

    /// Advance the playback clock by `dt_ms` milliseconds.
    #[wasm_bindgen(js_name = advanceTime)]
    pub fn advance_time(&mut self, dt_ms: f64) {
        self.inner.advance_time_ms(dt_ms);
    }

    #[wasm_bindgen(js_name = setAudioEnabled)]
    pub fn set_audio_enabled(&mut self, enabled: bool) {
        self.inner.set_audio_enabled(enabled);
    }

    /// Whether state changed since the last call.
    #[wasm_bindgen(js_name = takeDirty)]
    pub fn take_dirty(&mut self) -> bool {
        self.inner.take_dirty()
    }

    /// Current view model as a plain object.
    pub fn view(&self) -> JsValue {
        parse_json(&self.inner.view_json())
    }

    /// `{ can_step_back, can_step_forward, can_toggle_play, playing, ... }`.
    pub fn controls(&self) -> JsValue {
        parse_json(&self.inner.controls_json())
    }

    /// Drain queued cues. Returns `Array<{ kind, clip, volume, ... }>`, empty
    /// unless `audio.backend` is `sample`.
    #[wasm_bindgen(js_name = takeCues)]
    pub fn take_cues(&mut self) -> JsValue {
        parse_json(&self.inner.take_cues_json())
    }

    /// Drain queued cues rendered as mono PCM at `sample_rate`, empty unless
    /// `audio.backend` is `synth`.
    #[wasm_bindgen(js_name = takeCuePcm)]
    pub fn take_cue_pcm(&mut self, sample_rate: u32) -> Float32Array {
        Float32Array::from(self.inner.take_cue_pcm(sample_rate).as_slice())
    }

    /// Input bytes of the loaded log; indices match the view's byte marks.
    #[wasm_bindgen(js_name = inputBytes)]
    pub fn input_bytes(&self) -> Uint8Array {
        Uint8Array::from(self.inner.input_bytes().as_slice())
    }

    /// `"sample"`, `"synth"` or `"muted"`.
    #[wasm_bindgen(js_name = audioBackend)]
    pub fn audio_backend(&self) -> String {
        self.inner.backend().label().to_owned()
    }

    /// Drain user-facing error messages. Returns `Array<string>`.
    #[wasm_bindgen(js_name = takeErrors)]
    pub fn take_errors(&mut self) -> Array {
        let arr = Array::new();
        for error in self.inner.take_errors() {
            arr.push(&JsValue::from_str(&error));
        }
        arr
    }

    /// Diagnostic log as JSONL.
    #[wasm_bindgen(js_name = diagnosticsJsonl)]
    pub fn diagnostics_jsonl(&self) -> String {
        self.inner.diagnostics_jsonl()
    }

    #[wasm_bindgen(js_name = isPlaying)]
    pub fn is_playing(&self) -> bool {
        self.inner.is_playing()
    }
}

impl Default for VisualizerRunner {
    fn default() -> Self {
        Self::new()
    }
}
