#![forbid(unsafe_code)]

//! Endpoint bodies built from an encoding.

use lzviz_core::{
    CompressResponse, DecompressRequest, DecompressResponse, ExpandError, OutputSymbol, WireStep,
    expand_symbols,
};

use crate::matcher::Encoder;

/// Display ratio reported with a compression result.
///
/// `input_len / (Σ weight + symbol_count)`, where a match weighs its length
/// and a literal weighs one. It is an opaque number for presentation; no
/// playback logic reads it. An empty input reports `0.0`.
#[must_use]
pub fn compression_ratio(input_len: usize, symbols: &[OutputSymbol]) -> f64 {
    let weight: usize = symbols
        .iter()
        .map(|symbol| match symbol {
            OutputSymbol::Literal { .. } => 1,
            OutputSymbol::Match { length, .. } => *length,
        })
        .sum();
    let denominator = weight + symbols.len();
    if denominator == 0 {
        0.0
    } else {
        input_len as f64 / denominator as f64
    }
}

/// Body of a `/compress` response for `data`.
#[must_use]
pub fn compress_response(encoder: &Encoder, data: &[u8]) -> CompressResponse {
    let encoding = encoder.encode(data);
    let steps = encoding
        .steps
        .iter()
        .map(|step| WireStep::from_step(step, data.get(step.position).copied()))
        .collect();
    let compression_ratio = compression_ratio(data.len(), &encoding.symbols);
    CompressResponse {
        original_data: data.to_vec(),
        compressed_data: encoding.symbols,
        steps,
        compression_ratio,
    }
}

/// Body of a `/decompress` response.
pub fn decompress_response(request: &DecompressRequest) -> Result<DecompressResponse, ExpandError> {
    Ok(DecompressResponse {
        decompressed_data: expand_symbols(&request.compressed_data)?,
    })
}
