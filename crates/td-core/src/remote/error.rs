//! Errors reported by the server collaborator

use thiserror::Error;

/// Failure of a single server call
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RemoteError {
    /// Connection-level failure (DNS, refused, reset, TLS...)
    #[error("could not reach the server: {details}")]
    Transport { details: String },

    /// The request did not complete within the configured timeout
    #[error("the request to '{path}' timed out!")]
    Timeout { path: String },

    /// The server answered with an error payload or a failure status
    #[error("{message}")]
    Server { message: String },

    /// The server answered with something that is not what we asked for
    #[error("{details}")]
    InvalidResponse { details: String },

    /// The configured server URL cannot be used
    #[error("invalid server URL '{url}': {details}")]
    InvalidUrl { url: String, details: String },
}

impl RemoteError {
    /// Whether trying again later may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, RemoteError::Transport { .. } | RemoteError::Timeout { .. })
    }

    pub(crate) fn invalid_response(details: impl Into<String>) -> Self {
        RemoteError::InvalidResponse {
            details: details.into(),
        }
    }
}

/// Result type for server calls
pub type RemoteResult<T> = Result<T, RemoteError>;
