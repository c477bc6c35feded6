#![forbid(unsafe_code)]

//! Access to the compression endpoint.
//!
//! A [`CompressionTransport`] turns input text into a [`CompressResponse`].
//! [`LocalTransport`] calls the in-process encoder; the CLI adds an HTTP
//! transport and the web runner lets the host page `fetch` and feed the
//! result back through the session's two-phase submit.

use lzviz_core::{CompressResponse, DecompressRequest, DecompressResponse, OutputSymbol};
use lzviz_encoder::{Encoder, EncoderConfig, compress_response, decompress_response};
use tracing::debug;

use crate::error::TransportError;

/// The `/compress` and `/decompress` operations.
pub trait CompressionTransport {
    fn compress(&self, data: &str) -> Result<CompressResponse, TransportError>;

    fn decompress(&self, symbols: &[OutputSymbol]) -> Result<DecompressResponse, TransportError>;
}

impl<T: CompressionTransport + ?Sized> CompressionTransport for &T {
    fn compress(&self, data: &str) -> Result<CompressResponse, TransportError> {
        (**self).compress(data)
    }

    fn decompress(&self, symbols: &[OutputSymbol]) -> Result<DecompressResponse, TransportError> {
        (**self).decompress(symbols)
    }
}

impl<T: CompressionTransport + ?Sized> CompressionTransport for Box<T> {
    fn compress(&self, data: &str) -> Result<CompressResponse, TransportError> {
        (**self).compress(data)
    }

    fn decompress(&self, symbols: &[OutputSymbol]) -> Result<DecompressResponse, TransportError> {
        (**self).decompress(symbols)
    }
}

/// In-process encoder. Input text is encoded as UTF-8.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalTransport {
    encoder: Encoder,
}

impl LocalTransport {
    pub fn new(config: EncoderConfig) -> Result<Self, TransportError> {
        let encoder = Encoder::new(config).map_err(|e| TransportError::Encoder(e.to_string()))?;
        Ok(Self { encoder })
    }
}

impl CompressionTransport for LocalTransport {
    fn compress(&self, data: &str) -> Result<CompressResponse, TransportError> {
        let response = compress_response(&self.encoder, data.as_bytes());
        debug!(
            bytes = data.len(),
            steps = response.steps.len(),
            "local compress"
        );
        Ok(response)
    }

    fn decompress(&self, symbols: &[OutputSymbol]) -> Result<DecompressResponse, TransportError> {
        let request = DecompressRequest {
            compressed_data: symbols.to_vec(),
        };
        decompress_response(&request).map_err(|e| TransportError::Encoder(e.to_string()))
    }
}

/// Transport that always fails; stands in for an unreachable endpoint.
#[derive(Debug, Clone, Default)]
pub struct OfflineTransport;

impl CompressionTransport for OfflineTransport {
    fn compress(&self, _data: &str) -> Result<CompressResponse, TransportError> {
        Err(TransportError::Unavailable("offline".into()))
    }

    fn decompress(&self, _symbols: &[OutputSymbol]) -> Result<DecompressResponse, TransportError> {
        Err(TransportError::Unavailable("offline".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_transport_round_trips() {
        let transport = LocalTransport::default();
        let response = transport.compress("abcabcabc").unwrap();
        let body = transport.decompress(&response.compressed_data).unwrap();
        assert_eq!(body.decompressed_data, b"abcabcabc");
    }

    #[test]
    fn local_transport_encodes_utf8() {
        let response = LocalTransport::default().compress("é").unwrap();
        assert_eq!(response.original_data, vec![0xc3, 0xa9]);
    }

    #[test]
    fn invalid_encoder_config_is_a_transport_error() {
        let err = LocalTransport::new(EncoderConfig {
            min_match: 0,
            ..EncoderConfig::default()
        })
        .unwrap_err();
        assert!(matches!(err, TransportError::Encoder(_)));
    }

    #[test]
    fn offline_transport_fails() {
        assert!(OfflineTransport.compress("x").is_err());
    }
}
