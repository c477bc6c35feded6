#![forbid(unsafe_code)]

//! Oscillator backend.
//!
//! Each cue becomes one or more [`Tone`]s: a waveform, a frequency sweep and
//! a gain envelope. Tones are rendered to mono `f32` PCM and handed to a
//! [`PcmSink`].
//!
//! # Envelope
//!
//! Gain rises linearly from 0 to `peak` over `attack`, then falls
//! exponentially to [`Envelope::FLOOR`] at `duration`. Rendering stops at
//! `duration`.

use std::f32::consts::TAU;

use lzviz_core::{Cue, CueSink};
use tracing::trace;

/// Oscillator shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Waveform {
    Sine,
    Square,
    Triangle,
    Sawtooth,
}

impl Waveform {
    /// Sample at `phase` in cycles, `[0, 1)`.
    #[must_use]
    pub fn sample(self, phase: f32) -> f32 {
        match self {
            Self::Sine => (phase * TAU).sin(),
            Self::Square => {
                if phase < 0.5 {
                    1.0
                } else {
                    -1.0
                }
            }
            Self::Triangle => 1.0 - 4.0 * (phase - 0.5).abs(),
            Self::Sawtooth => 2.0 * phase - 1.0,
        }
    }
}

/// Frequency over the life of a tone.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Sweep {
    Constant(f32),
    /// Linear ramp `from -> to` over `over` seconds, then hold.
    Linear { from: f32, to: f32, over: f32 },
    /// Exponential ramp `from -> to` over `over` seconds, then hold.
    Exponential { from: f32, to: f32, over: f32 },
}

impl Sweep {
    /// Frequency in Hz at `t` seconds.
    #[must_use]
    pub fn at(&self, t: f32) -> f32 {
        match *self {
            Self::Constant(hz) => hz,
            Self::Linear { from, to, over } => {
                let k = progress(t, over);
                from + (to - from) * k
            }
            Self::Exponential { from, to, over } => {
                let k = progress(t, over);
                from * (to / from).powf(k)
            }
        }
    }
}

fn progress(t: f32, over: f32) -> f32 {
    if over <= 0.0 {
        1.0
    } else {
        (t / over).clamp(0.0, 1.0)
    }
}

/// Gain envelope.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Envelope {
    pub attack: f32,
    pub peak: f32,
    pub duration: f32,
}

impl Envelope {
    /// Gain the exponential release decays to.
    pub const FLOOR: f32 = 0.001;

    /// Gain at `t` seconds.
    #[must_use]
    pub fn gain(&self, t: f32) -> f32 {
        if t <= 0.0 || t >= self.duration {
            return 0.0;
        }
        if t < self.attack {
            return self.peak * t / self.attack;
        }
        let release = self.duration - self.attack;
        if release <= 0.0 || self.peak <= Self::FLOOR {
            return self.peak;
        }
        let k = (t - self.attack) / release;
        self.peak * (Self::FLOOR / self.peak).powf(k)
    }
}

/// One oscillator voice.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tone {
    pub waveform: Waveform,
    pub sweep: Sweep,
    pub envelope: Envelope,
}

/// Pitch of a match tone: rises with length, bounded to `[300, 2000]` Hz.
#[must_use]
pub fn match_pitch(length: usize) -> f32 {
    let length = length.min(1_000) as f32;
    (300.0 + length * 50.0).clamp(300.0, 2000.0)
}

/// Tones announcing `cue`.
#[must_use]
pub fn tones_for(cue: Cue) -> Vec<Tone> {
    match cue {
        Cue::Literal => vec![Tone {
            waveform: Waveform::Sine,
            sweep: Sweep::Constant(600.0),
            envelope: Envelope {
                attack: 0.01,
                peak: 0.2,
                duration: 0.1,
            },
        }],
        Cue::Step => vec![Tone {
            waveform: Waveform::Square,
            sweep: Sweep::Constant(450.0),
            envelope: Envelope {
                attack: 0.01,
                peak: 1.0,
                duration: 0.12,
            },
        }],
        Cue::Match { length } => {
            let pitch = match_pitch(length);
            vec![Tone {
                waveform: Waveform::Triangle,
                sweep: Sweep::Linear {
                    from: pitch - 100.0,
                    to: pitch,
                    over: 0.1,
                },
                envelope: Envelope {
                    attack: 0.02,
                    peak: 0.4,
                    duration: 0.2,
                },
            }]
        }
        Cue::Reset => vec![Tone {
            waveform: Waveform::Sawtooth,
            sweep: Sweep::Exponential {
                from: 300.0,
                to: 50.0,
                over: 0.3,
            },
            envelope: Envelope {
                attack: 0.02,
                peak: 0.4,
                duration: 0.3,
            },
        }],
        Cue::Success { ratio } => {
            let base = 440.0 + ratio as f32 * 100.0;
            // Major triad: root, major third, perfect fifth.
            [1.0, 1.25, 1.5]
                .into_iter()
                .map(|mult| Tone {
                    waveform: Waveform::Sine,
                    sweep: Sweep::Constant(base * mult),
                    envelope: Envelope {
                        attack: 0.02,
                        peak: 0.25,
                        duration: 0.5,
                    },
                })
                .collect()
        }
    }
}

/// Mix `tones` into mono PCM at `sample_rate`, scaled by `master_gain`.
#[must_use]
pub fn render(tones: &[Tone], sample_rate: u32, master_gain: f32) -> Vec<f32> {
    let duration = tones
        .iter()
        .map(|t| t.envelope.duration)
        .fold(0.0f32, f32::max);
    let frames = (duration * sample_rate as f32).ceil() as usize;
    let dt = 1.0 / sample_rate as f32;
    let mut out = vec![0.0f32; frames];

    for tone in tones {
        let mut phase = 0.0f32;
        for (i, slot) in out.iter_mut().enumerate() {
            let t = i as f32 * dt;
            if t >= tone.envelope.duration {
                break;
            }
            *slot += tone.waveform.sample(phase) * tone.envelope.gain(t) * master_gain;
            phase = (phase + tone.sweep.at(t) * dt).fract();
        }
    }
    out
}

/// Host capability that plays PCM buffers.
pub trait PcmSink {
    fn submit(&mut self, samples: &[f32], sample_rate: u32);
}

impl<S: PcmSink + ?Sized> PcmSink for Box<S> {
    fn submit(&mut self, samples: &[f32], sample_rate: u32) {
        (**self).submit(samples, sample_rate);
    }
}

/// Cue sink rendering synthesized tones.
#[derive(Debug)]
pub struct SynthBackend<S> {
    sink: S,
    sample_rate: u32,
    master_gain: f32,
}

impl<S: PcmSink> SynthBackend<S> {
    pub const DEFAULT_SAMPLE_RATE: u32 = 44_100;

    pub fn new(sink: S, master_gain: f32) -> Self {
        Self {
            sink,
            sample_rate: Self::DEFAULT_SAMPLE_RATE,
            master_gain,
        }
    }

    #[must_use]
    pub fn with_sample_rate(mut self, sample_rate: u32) -> Self {
        self.sample_rate = sample_rate.max(1);
        self
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }
}

impl<S: PcmSink> CueSink for SynthBackend<S> {
    fn play(&mut self, cue: Cue) {
        let tones = tones_for(cue);
        let samples = render(&tones, self.sample_rate, self.master_gain);
        trace!(cue = cue.label(), frames = samples.len(), "synth render");
        self.sink.submit(&samples, self.sample_rate);
    }
}
