//! Remote compression endpoint over HTTP.

use std::time::Duration;

use lzviz_core::{
    CompressRequest, CompressResponse, DecompressRequest, DecompressResponse, OutputSymbol,
};
use lzviz_runtime::{CompressionTransport, TransportError};
use reqwest::blocking::Client;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::Result;

/// `POST {base}/compress` and `POST {base}/decompress` with JSON bodies.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    base: String,
}

impl HttpTransport {
    pub fn new(base: &str) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(2))
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            client,
            base: base.trim_end_matches('/').to_string(),
        })
    }

    #[must_use]
    pub fn base(&self) -> &str {
        &self.base
    }

    fn post<B: Serialize, R: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> std::result::Result<R, TransportError> {
        let url = format!("{}/{path}", self.base);
        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .map_err(|e| TransportError::Unavailable(e.to_string()))?;
        let status = response.status();
        let text = response
            .text()
            .map_err(|e| TransportError::Unavailable(e.to_string()))?;
        debug!(%url, status = status.as_u16(), bytes = text.len(), "endpoint response");
        if !status.is_success() {
            return Err(TransportError::Status {
                status: status.as_u16(),
                body: text,
            });
        }
        serde_json::from_str(&text).map_err(|e| TransportError::Decode(e.to_string()))
    }
}

impl CompressionTransport for HttpTransport {
    fn compress(&self, data: &str) -> std::result::Result<CompressResponse, TransportError> {
        self.post(
            "compress",
            &CompressRequest {
                data: data.to_string(),
            },
        )
    }

    fn decompress(
        &self,
        symbols: &[OutputSymbol],
    ) -> std::result::Result<DecompressResponse, TransportError> {
        self.post(
            "decompress",
            &DecompressRequest {
                compressed_data: symbols.to_vec(),
            },
        )
    }
}
