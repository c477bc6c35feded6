use lzviz_audio::ClipError;
use lzviz_core::{ExpandError, StepLogError};
use lzviz_runtime::{ConfigError, SessionError, TransportError};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("invalid step log: {0}")]
    StepLog(#[from] StepLogError),

    #[error("cannot decompress: {0}")]
    Expand(#[from] ExpandError),

    #[error("audio clips: {0}")]
    Clip(#[from] ClipError),

    #[error("invalid argument: {message}")]
    InvalidArgument { message: String },
}

impl CliError {
    /// Process exit status: 2 for usage problems, 3 for data that fails
    /// validation, 1 otherwise.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::InvalidArgument { .. } | Self::Config(_) => 2,
            Self::StepLog(_) | Self::Expand(_) => 3,
            _ => 1,
        }
    }

    #[must_use]
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::CliError;
    use lzviz_core::StepLogError;

    #[test]
    fn invalid_argument_exits_with_usage_code() {
        let error = CliError::invalid("no input");
        assert_eq!(error.exit_code(), 2);
        assert_eq!(error.to_string(), "invalid argument: no input");
    }

    #[test]
    fn step_log_failures_exit_with_validation_code() {
        let error = CliError::from(StepLogError::RoundTripMismatch { at: 4 });
        assert_eq!(error.exit_code(), 3);
    }
}
