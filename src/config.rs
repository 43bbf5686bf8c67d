//! Client configuration.

use std::time::Duration;

/// Default upper bound for the server's upgrade response head.
pub const DEFAULT_MAX_HANDSHAKE_SIZE: usize = 8192;

/// Default time allowed for TCP connect plus the upgrade exchange.
pub const DEFAULT_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(30);

/// WebSocket client configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Value for the `Origin` request header.
    ///
    /// Default: None (header omitted)
    pub origin: Option<String>,

    /// Deadline for connecting and completing the upgrade.
    ///
    /// If `None`, the handshake may wait indefinitely.
    /// Default: 30 seconds
    pub handshake_timeout: Option<Duration>,

    /// Maximum size of the server's response head in bytes.
    ///
    /// Default: 8 KB (8192)
    pub max_handshake_size: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            origin: None,
            handshake_timeout: Some(DEFAULT_HANDSHAKE_TIMEOUT),
            max_handshake_size: DEFAULT_MAX_HANDSHAKE_SIZE,
        }
    }
}

impl ClientConfig {
    /// Create a configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Send an `Origin` header.
    #[must_use]
    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = Some(origin.into());
        self
    }

    /// Set or clear the handshake deadline.
    #[must_use]
    pub const fn with_handshake_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.handshake_timeout = timeout;
        self
    }

    /// Set the response head size limit.
    #[must_use]
    pub const fn with_max_handshake_size(mut self, size: usize) -> Self {
        self.max_handshake_size = size;
        self
    }

    /// Validate that a response head is within limits.
    ///
    /// # Errors
    ///
    /// Returns [`Error::HandshakeTooLarge`](crate::Error::HandshakeTooLarge) if `size` exceeds the configured maximum.
    pub const fn check_handshake_size(&self, size: usize) -> Result<(), crate::Error> {
        if size > self.max_handshake_size {
            Err(crate::Error::HandshakeTooLarge {
                size,
                max: self.max_handshake_size,
            })
        } else {
            Ok(())
        }
    }
}
