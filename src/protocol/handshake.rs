//! Client side of the HTTP upgrade handshake (RFC 6455 section 4.1).
//!
//! The client sends a random `Sec-WebSocket-Key`; the server proves it read
//! the request by answering with `base64(sha1(key + GUID))` in
//! `Sec-WebSocket-Accept`.

use crate::error::{Error, Result};
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use sha1::{Digest, Sha1};
use std::collections::HashMap;
use std::collections::hash_map::Entry;

/// The WebSocket GUID used in the Sec-WebSocket-Accept calculation.
pub const WS_GUID: &str = "258EAFA5-E914-47DA-95CA-C5AB0DC85B11";

/// Protocol version sent in `Sec-WebSocket-Version`.
pub const WS_VERSION: u8 = 13;

/// Nonce used by HyBi-17 era clients that sent a fixed key.
pub const LEGACY_NONCE: &[u8] = b"HyBi-17";

/// Computes the Sec-WebSocket-Accept value from the client's Sec-WebSocket-Key.
///
/// ```
/// use hybi::protocol::handshake::compute_accept_key;
///
/// let accept = compute_accept_key("dGhlIHNhbXBsZSBub25jZQ==");
/// assert_eq!(accept, "s3pPLMBiTxaQ9kYGzzhZRbK+xOo=");
/// ```
#[must_use]
pub fn compute_accept_key(key: &str) -> String {
    let mut hasher = Sha1::new();
    hasher.update(key.as_bytes());
    hasher.update(WS_GUID.as_bytes());
    BASE64.encode(hasher.finalize())
}

/// The key sent to the server and the accept value it must echo back.
///
/// Computed once per connection attempt and never changed afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandshakeKeys {
    client_key: String,
    expected_accept: String,
}

impl HandshakeKeys {
    /// Derive keys from a fresh 16-byte random nonce.
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` if the OS random source is unavailable.
    pub fn generate() -> Result<Self> {
        let mut nonce = [0u8; 16];
        getrandom::getrandom(&mut nonce)
            .map_err(|e| Error::Io(format!("random source unavailable: {e}")))?;
        Ok(Self::from_nonce(&nonce))
    }

    /// Derive keys from a caller-chosen nonce.
    ///
    /// `from_nonce(LEGACY_NONCE)` reproduces the fixed key older HyBi-17
    /// clients sent, which is handy as a known-answer vector.
    #[must_use]
    pub fn from_nonce(nonce: &[u8]) -> Self {
        let client_key = BASE64.encode(nonce);
        let expected_accept = compute_accept_key(&client_key);
        Self {
            client_key,
            expected_accept,
        }
    }

    /// Value for the `Sec-WebSocket-Key` request header.
    #[must_use]
    pub fn client_key(&self) -> &str {
        &self.client_key
    }

    /// Value the server must return in `Sec-WebSocket-Accept`.
    #[must_use]
    pub fn expected_accept(&self) -> &str {
        &self.expected_accept
    }

    /// True iff the header is present and exactly equals the expected value.
    #[must_use]
    pub fn verify(&self, server_accept: Option<&str>) -> bool {
        server_accept == Some(self.expected_accept.as_str())
    }
}

/// Collect `name: value` pairs up to the blank line ending the head.
fn parse_headers<'a, I>(lines: I) -> Vec<(&'a str, &'a str)>
where
    I: Iterator<Item = &'a str>,
{
    lines
        .take_while(|line| !line.is_empty())
        .filter_map(|line| line.split_once(':'))
        .map(|(name, value)| (name.trim(), value.trim()))
        .collect()
}

/// Reject header values that would let a caller inject extra headers.
fn validate_header_value(header_name: &str, value: &str) -> Result<()> {
    if value.contains('\r') || value.contains('\n') {
        return Err(Error::InvalidHeaderValue {
            header: header_name.to_string(),
            reason: "contains CR or LF characters".to_string(),
        });
    }
    Ok(())
}

/// The upgrade request a client sends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandshakeRequest {
    /// Host name (without port).
    pub host: String,
    /// TCP port.
    pub port: u16,
    /// Request target, including any query string.
    pub path: String,
    /// The Sec-WebSocket-Key header value.
    pub key: String,
    /// Optional Origin header value.
    pub origin: Option<String>,
}

impl HandshakeRequest {
    /// `Host` header value; the port is omitted when it is the default.
    /// IPv6 literals are bracketed.
    #[must_use]
    pub fn host_header(&self) -> String {
        let host = if self.host.contains(':') {
            format!("[{}]", self.host)
        } else {
            self.host.clone()
        };
        if self.port == 80 {
            host
        } else {
            format!("{host}:{}", self.port)
        }
    }

    /// Serialize the HTTP request.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidHeaderValue` if the origin or path contain CR/LF.
    pub fn write(&self, buf: &mut Vec<u8>) -> Result<()> {
        validate_header_value("Request-Target", &self.path)?;
        buf.extend_from_slice(format!("GET {} HTTP/1.1\r\n", self.path).as_bytes());
        buf.extend_from_slice(format!("Host: {}\r\n", self.host_header()).as_bytes());
        buf.extend_from_slice(b"Connection: Upgrade\r\n");
        buf.extend_from_slice(b"Upgrade: websocket\r\n");
        buf.extend_from_slice(format!("Sec-WebSocket-Version: {WS_VERSION}\r\n").as_bytes());
        buf.extend_from_slice(format!("Sec-WebSocket-Key: {}\r\n", self.key).as_bytes());

        if let Some(ref origin) = self.origin {
            validate_header_value("Origin", origin)?;
            buf.extend_from_slice(format!("Origin: {origin}\r\n").as_bytes());
        }

        buf.extend_from_slice(b"\r\n");
        Ok(())
    }
}

/// A server's `101 Switching Protocols` response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandshakeResponse {
    /// The Sec-WebSocket-Accept value, if the server sent one.
    pub accept: Option<String>,
    /// All headers, keyed by lowercase name.
    pub headers: HashMap<String, String>,
}

impl HandshakeResponse {
    /// Build a response from headers delivered by an HTTP layer.
    ///
    /// Repeated headers are joined with `", "`, so a response carrying two
    /// `Sec-WebSocket-Accept` headers never verifies.
    #[must_use]
    pub fn from_headers<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut headers: HashMap<String, String> = HashMap::new();
        for (name, value) in pairs {
            let value = value.into();
            match headers.entry(name.as_ref().to_lowercase()) {
                Entry::Occupied(mut entry) => {
                    let existing = entry.get_mut();
                    existing.push_str(", ");
                    existing.push_str(&value);
                }
                Entry::Vacant(entry) => {
                    entry.insert(value);
                }
            }
        }
        Self {
            accept: headers.get("sec-websocket-accept").cloned(),
            headers,
        }
    }

    /// Parse the response head (status line and headers).
    ///
    /// A missing `Sec-WebSocket-Accept` is not a parse error; it is caught by
    /// [`HandshakeKeys::verify`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidHandshake`] if:
    /// - The data is not valid UTF-8.
    /// - The status is not `101`.
    /// - `Upgrade` is missing or not `websocket`.
    /// - `Connection` is missing or does not contain `upgrade`.
    pub fn parse(data: &[u8]) -> Result<Self> {
        let text = std::str::from_utf8(data)
            .map_err(|_| Error::InvalidHandshake("Invalid UTF-8".into()))?;

        let mut lines = text.lines();

        let status_line = lines
            .next()
            .ok_or_else(|| Error::InvalidHandshake("Empty response".into()))?;
        let mut parts = status_line.split_whitespace();
        let version = parts.next().unwrap_or_default();
        let status = parts.next().unwrap_or_default();
        if !version.starts_with("HTTP/1.") || status != "101" {
            return Err(Error::InvalidHandshake(format!(
                "Expected 101 status, got: {}",
                status_line
            )));
        }

        let response = Self::from_headers(parse_headers(lines));

        let upgrade = response
            .header("upgrade")
            .ok_or_else(|| Error::InvalidHandshake("Missing Upgrade header in response".into()))?;
        if !upgrade.eq_ignore_ascii_case("websocket") {
            return Err(Error::InvalidHandshake(format!(
                "Invalid Upgrade header: {}",
                upgrade
            )));
        }

        let connection = response.header("connection").ok_or_else(|| {
            Error::InvalidHandshake("Missing Connection header in response".into())
        })?;
        if !connection.to_lowercase().contains("upgrade") {
            return Err(Error::InvalidHandshake(format!(
                "Invalid Connection header: {}",
                connection
            )));
        }

        Ok(response)
    }

    /// Look up a header case-insensitively.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_lowercase()).map(String::as_str)
    }
}
