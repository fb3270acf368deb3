//! Error types for the `PowerMemo` client.

use powermemo_core::{DecodeError, TimeFormatError};
use thiserror::Error;

/// Errors that can occur when using the `PowerMemo` client.
#[derive(Debug, Error)]
pub enum Error {
    /// Client configuration error (missing API key, bad URL, TLS setup).
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Connection error (network failure, DNS resolution, timeout, etc.).
    #[error("connection error: {0}")]
    Connection(String),

    /// The service reported a failure.
    ///
    /// `status` is set when the HTTP status was 4xx/5xx and `message` is then
    /// the status text. When the HTTP call succeeded but the envelope carried
    /// a non-zero `errno`, `status` is `None` and `message` is the server's
    /// `errmsg`.
    #[error("server error: {message}")]
    Server {
        /// HTTP status code, for transport-level failures.
        status: Option<u16>,
        /// Error message.
        message: String,
    },

    /// The response body was not a valid envelope.
    #[error("failed to decode response: {0}")]
    Decode(String),

    /// A blob envelope could not be turned into a typed blob.
    #[error(transparent)]
    Blob(#[from] DecodeError),

    /// The envelope was well formed but lacked an expected field.
    #[error("unexpected response shape: `{field}` should be {expected}")]
    ResponseShape {
        /// Name of the projected field.
        field: String,
        /// Kind of value that was expected.
        expected: &'static str,
    },

    /// A timestamp matched none of the accepted layouts.
    #[error(transparent)]
    TimeFormat(#[from] TimeFormatError),
}

impl Error {
    pub(crate) fn shape(field: impl Into<String>, expected: &'static str) -> Self {
        Self::ResponseShape {
            field: field.into(),
            expected,
        }
    }

    /// Returns `true` if retrying the same request could succeed.
    ///
    /// The client itself never retries; this is a hint for callers.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Connection(_) => true,
            Self::Server { status, .. } => status.is_some_and(|s| s >= 500),
            Self::Configuration(_)
            | Self::Decode(_)
            | Self::Blob(_)
            | Self::ResponseShape { .. }
            | Self::TimeFormat(_) => false,
        }
    }

    /// Returns `true` if this is a connection error.
    pub fn is_connection_error(&self) -> bool {
        matches!(self, Self::Connection(_))
    }

    /// Returns `true` if the service reported the failure.
    pub fn is_server_error(&self) -> bool {
        matches!(self, Self::Server { .. })
    }

    /// Returns the HTTP status code for transport-level server errors.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Server { status, .. } => *status,
            _ => None,
        }
    }
}
