//! Property-based tests for the encoder.
//!
//! 1. **Valid logs**: every encoding passes step-log validation, which
//!    includes byte-exact reconstruction.
//! 2. **Greedy choice**: a match step picks the longest candidate, and the
//!    earliest among equals.
//! 3. **Thresholds**: no emitted match is shorter than `min_match` or longer
//!    than `max_match`, and no match reaches outside the window.
//! 4. **Decoder agreement**: `/decompress` of the compressed symbols returns
//!    the original input.

use lzviz_core::{Action, DecompressRequest, StepLog};
use lzviz_encoder::{Encoder, EncoderConfig, compress_response, decompress_response};
use proptest::prelude::*;

// ── Strategies ──────────────────────────────────────────────────────────

/// Small alphabets make matches frequent.
fn input_strategy() -> impl Strategy<Value = Vec<u8>> {
    prop_oneof![
        prop::collection::vec(b'a'..=b'c', 0..200),
        prop::collection::vec(any::<u8>(), 0..64),
    ]
}

fn config_strategy() -> impl Strategy<Value = EncoderConfig> {
    (1usize..300, 1usize..20, 1usize..6).prop_map(|(window_size, max_match, min_match)| {
        EncoderConfig {
            window_size,
            max_match: max_match.max(min_match),
            min_match,
        }
    })
}

// ── Properties ──────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn encodings_always_validate(data in input_strategy(), config in config_strategy()) {
        let encoder = Encoder::new(config).unwrap();
        let log = encoder.encode(&data).into_log(&data);
        prop_assert!(log.is_ok(), "{:?}", log.err());
    }

    #[test]
    fn match_steps_are_greedy(data in input_strategy()) {
        let encoding = Encoder::default().encode(&data);
        for step in &encoding.steps {
            if let Action::Match { length, match_start, .. } = step.action {
                let longest = step.candidates.iter().map(|c| c.length).max().unwrap();
                prop_assert_eq!(length, longest);
                let first = step.candidates.iter().find(|c| c.length == longest).unwrap();
                prop_assert_eq!(first.start, match_start);
            }
        }
    }

    #[test]
    fn matches_respect_config(data in input_strategy(), config in config_strategy()) {
        let encoding = Encoder::new(config).unwrap().encode(&data);
        for step in &encoding.steps {
            if let Action::Match { offset, length, .. } = step.action {
                prop_assert!(length >= config.min_match);
                prop_assert!(length <= config.max_match);
                prop_assert!(offset <= config.window_size);
            }
        }
    }

    #[test]
    fn decompress_endpoint_restores_input(data in input_strategy()) {
        let response = compress_response(&Encoder::default(), &data);
        prop_assert!(StepLog::from_response(&response).is_ok());
        let request = DecompressRequest { compressed_data: response.compressed_data };
        let body = decompress_response(&request).unwrap();
        prop_assert_eq!(body.decompressed_data, data);
    }
}
