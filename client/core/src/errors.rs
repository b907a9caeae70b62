//! Error Taxonomy
//!
//! Two layers of failure live here:
//!
//! - [`GatewayError`]: what an Async Gateway implementation reports back for
//!   a single call (non-2xx status, empty body, or a transport fault).
//! - [`SyncError`]: how the state machines classify any failure before
//!   turning it into a popup flag or a status message.
//!
//! Neither type ever crosses the state-machine boundary as an `Err`. Surfaces
//! only ever see the resulting state fields.

use thiserror::Error;

/// Failure signal from one Async Gateway call
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The server answered with a non-2xx status
    #[error("HTTP {code}: {reason}")]
    Status {
        /// Numeric status code
        code: u16,
        /// Reason phrase supplied with the status
        reason: String,
    },

    /// The server answered 2xx but sent no body
    #[error("response body was empty")]
    EmptyBody,

    /// The call never produced a response (connection, decoding, timeout)
    #[error(transparent)]
    Transport(#[from] anyhow::Error),
}

impl GatewayError {
    /// Build a status failure
    pub fn status(code: u16, reason: impl Into<String>) -> Self {
        Self::Status {
            code,
            reason: reason.into(),
        }
    }

    /// Build a transport failure from any displayable cause
    pub fn transport(cause: impl std::fmt::Display) -> Self {
        Self::Transport(anyhow::anyhow!("{cause}"))
    }
}

/// Classified failure of a state-machine operation
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum SyncError {
    /// A required field was empty; the gateway was never contacted
    #[error("required fields are empty")]
    Validation,

    /// The pre-flight network check failed; the gateway was never contacted
    #[error("network is unavailable")]
    NetworkUnavailable,

    /// The gateway rejected the credentials or failed during login
    #[error("credentials were rejected")]
    AuthRejected,

    /// The server answered a post operation with a non-2xx status
    #[error("server error {code}: {reason}")]
    ServerFailure {
        /// Numeric status code
        code: u16,
        /// Reason phrase supplied with the status
        reason: String,
    },

    /// The server answered 2xx without a body
    #[error("server response was empty")]
    ResponseEmpty,

    /// Anything else that went wrong while the operation ran
    #[error("{0}")]
    ClientException(String),
}

impl From<GatewayError> for SyncError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::Status { code, reason } => Self::ServerFailure { code, reason },
            GatewayError::EmptyBody => Self::ResponseEmpty,
            GatewayError::Transport(cause) => Self::ClientException(cause.to_string()),
        }
    }
}
