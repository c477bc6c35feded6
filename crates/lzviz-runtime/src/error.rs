#![forbid(unsafe_code)]

//! Session and transport errors.

use lzviz_core::StepLogError;
use thiserror::Error;

/// Monotonic identifier of one compression submission.
pub type Generation = u64;

/// Failure reaching the compression endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The request never produced a response.
    #[error("compression endpoint unreachable: {0}")]
    Unavailable(String),

    /// The endpoint answered with a non-success status.
    #[error("compression endpoint returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The body could not be decoded.
    #[error("malformed response: {0}")]
    Decode(String),

    /// The local encoder refused the request.
    #[error("encoder failed: {0}")]
    Encoder(String),
}

/// Errors a session reports to its caller.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SessionError {
    /// Blank submission; nothing was sent and nothing changed.
    #[error("please enter some data to compress")]
    EmptyInput,

    /// The request failed; prior state is untouched.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A response whose token is not the current one. Callers normally
    /// discard this silently.
    #[error("stale response for generation {got} (current: {expected:?})")]
    StaleResponse {
        expected: Option<Generation>,
        got: Generation,
    },

    /// The response violates step-log invariants; prior state is untouched.
    #[error("invalid step log: {0}")]
    InvalidLog(#[from] StepLogError),

    /// Speed control value outside `1..=10`.
    #[error("speed must be between {min} and {max}, got {value}", min = crate::clock::Speed::MIN, max = crate::clock::Speed::MAX)]
    InvalidSpeed { value: u32 },
}

impl SessionError {
    /// Whether a front end should surface this error to the user.
    #[must_use]
    pub const fn is_reportable(&self) -> bool {
        !matches!(self, Self::StaleResponse { .. })
    }
}

pub type Result<T> = std::result::Result<T, SessionError>;
