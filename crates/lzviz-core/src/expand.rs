#![forbid(unsafe_code)]

//! Symbol stream expansion (decompression).
//!
//! Matches are expanded one byte at a time, so a back-reference whose length
//! exceeds its offset repeats the bytes it has just produced. This is the
//! run-length behaviour of LZ77-family codecs and is always legal here.
//!
//! Streams whose declared output exceeds [`MAX_OUTPUT_LEN`] are rejected
//! before anything is allocated.

use thiserror::Error;

use crate::step::OutputSymbol;

/// Failure while expanding a symbol stream.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExpandError {
    /// A match with offset zero would copy from the byte being written.
    #[error("symbol {index}: match offset must be at least 1")]
    ZeroOffset { index: usize },

    /// A match reaching before the start of the output.
    #[error("symbol {index}: offset {offset} exceeds the {available} bytes produced so far")]
    OffsetOutOfRange {
        index: usize,
        offset: usize,
        available: usize,
    },

    /// The symbols would produce more than [`MAX_OUTPUT_LEN`] bytes.
    #[error("symbol {index}: output would exceed {limit} bytes")]
    OutputTooLarge { index: usize, limit: usize },
}

/// Largest output [`expand_symbols`] will produce.
pub const MAX_OUTPUT_LEN: usize = 64 * 1024 * 1024;

/// Expand a symbol stream back into bytes.
pub fn expand_symbols(symbols: &[OutputSymbol]) -> Result<Vec<u8>, ExpandError> {
    let mut capacity = 0usize;
    for (index, symbol) in symbols.iter().enumerate() {
        capacity = capacity
            .checked_add(symbol.emitted_len())
            .filter(|&total| total <= MAX_OUTPUT_LEN)
            .ok_or(ExpandError::OutputTooLarge {
                index,
                limit: MAX_OUTPUT_LEN,
            })?;
    }
    let mut out = Vec::with_capacity(capacity);
    for (index, symbol) in symbols.iter().enumerate() {
        match *symbol {
            OutputSymbol::Literal { value } => out.push(value),
            OutputSymbol::Match { offset, length } => {
                if offset == 0 {
                    return Err(ExpandError::ZeroOffset { index });
                }
                if offset > out.len() {
                    return Err(ExpandError::OffsetOutOfRange {
                        index,
                        offset,
                        available: out.len(),
                    });
                }
                let start = out.len() - offset;
                for k in 0..length {
                    let byte = out[start + k];
                    out.push(byte);
                }
            }
        }
    }
    Ok(out)
}
