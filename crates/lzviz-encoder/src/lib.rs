#![forbid(unsafe_code)]

//! Step-recording encoder.
//!
//! The encoder behind the `/compress` and `/decompress` endpoints. It is a
//! greedy LZ77/LZ4-style matcher that, besides the compressed symbols, keeps
//! a [`Step`](lzviz_core::Step) for every decision so the visualizer can
//! replay it.
//!
//! ```
//! use lzviz_encoder::{Encoder, compress_response};
//!
//! let response = compress_response(&Encoder::default(), b"abcabcabc");
//! assert_eq!(response.steps.len(), 4);
//! ```

pub mod config;
pub mod matcher;
pub mod response;

pub use config::EncoderConfig;
pub use matcher::{Encoder, Encoding, InvalidConfig};
pub use response::{compress_response, compression_ratio, decompress_response};
