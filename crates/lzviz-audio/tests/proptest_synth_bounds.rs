//! Property-based tests for the synthesizer.
//!
//! 1. **Bounded output**: a rendered cue never exceeds the sum of its tone
//!    peaks times the master gain.
//! 2. **Silence at the edges**: the first sample of every render is zero.
//! 3. **Match pitch**: always within `[300, 2000]` Hz for any length.

use lzviz_audio::{render, synth::match_pitch, tones_for};
use lzviz_core::Cue;
use proptest::prelude::*;

// ── Strategies ──────────────────────────────────────────────────────────

fn cue_strategy() -> impl Strategy<Value = Cue> {
    prop_oneof![
        Just(Cue::Step),
        Just(Cue::Literal),
        Just(Cue::Reset),
        (1usize..300).prop_map(|length| Cue::Match { length }),
        (0.0f64..8.0).prop_map(|ratio| Cue::Success { ratio }),
    ]
}

// ── Properties ──────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn render_is_bounded(cue in cue_strategy(), gain in 0.0f32..=1.0, rate in 4_000u32..16_000) {
        let tones = tones_for(cue);
        let limit: f32 = tones.iter().map(|t| t.envelope.peak).sum::<f32>() * gain + 1e-4;
        let samples = render(&tones, rate, gain);
        prop_assert!(!samples.is_empty());
        prop_assert_eq!(samples[0], 0.0);
        for s in samples {
            prop_assert!(s.abs() <= limit, "{} > {}", s, limit);
        }
    }

    #[test]
    fn match_pitch_stays_in_band(length in any::<usize>()) {
        let pitch = match_pitch(length);
        prop_assert!((300.0..=2000.0).contains(&pitch));
    }
}
