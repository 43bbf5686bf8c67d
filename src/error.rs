//! Error types for the WebSocket client.
//!
//! Every failure the client can report, either directly to the caller of an
//! operation or through an [`Event::Error`](crate::Event::Error) notification.

use thiserror::Error;

use crate::connection::ConnectionState;

/// Result type alias for WebSocket client operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during WebSocket client operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    /// Target address is malformed or names no host.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Server's `Sec-WebSocket-Accept` was missing or did not match.
    #[error("Handshake rejected: {0}")]
    HandshakeRejected(String),

    /// Server's upgrade response could not be understood.
    #[error("Invalid handshake: {0}")]
    InvalidHandshake(String),

    /// Upgrade response exceeded the configured size limit.
    #[error("Handshake too large: {size} bytes (max: {max})")]
    HandshakeTooLarge {
        /// Bytes received so far.
        size: usize,
        /// Maximum allowed size.
        max: usize,
    },

    /// Upgrade did not complete within the configured timeout.
    #[error("Handshake timed out after {0:?}")]
    HandshakeTimeout(std::time::Duration),

    /// Header value would break the request framing.
    #[error("Invalid value for header {header}: {reason}")]
    InvalidHeaderValue {
        /// Header name.
        header: String,
        /// Why the value was rejected.
        reason: String,
    },

    /// Operation attempted while the connection was not connected.
    #[error("Not connected (state: {0})")]
    InvalidState(ConnectionState),

    /// `send` called with no data.
    #[error("Cannot send empty data")]
    EmptyPayload,

    /// Control frame payload too large (>125 bytes).
    #[error("Control frame payload too large: {0} bytes (max: 125)")]
    ControlFrameTooLarge(usize),

    /// I/O error occurred on the transport.
    #[error("I/O error: {0}")]
    Io(String),
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err.to_string())
    }
}

impl From<http::uri::InvalidUri> for Error {
    fn from(err: http::uri::InvalidUri) -> Self {
        Error::InvalidUrl(err.to_string())
    }
}
