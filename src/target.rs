//! Parsing the address a client connects to.

use http::Uri;

use crate::error::{Error, Result};
use crate::protocol::HandshakeRequest;

/// Port used when the URL names none.
pub const DEFAULT_PORT: u16 = 80;

/// Where to connect and what to request once connected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    /// Host name or IP literal (IPv6 without brackets).
    pub host: String,
    /// TCP port.
    pub port: u16,
    /// Request target: path plus query, never empty.
    pub path: String,
}

impl Target {
    /// Parse a `ws://` (or `http://`) URL.
    ///
    /// ```
    /// use hybi::Target;
    ///
    /// let target = Target::parse("ws://example.com/chat?room=1").unwrap();
    /// assert_eq!(target.host, "example.com");
    /// assert_eq!(target.port, 80);
    /// assert_eq!(target.path, "/chat?room=1");
    /// ```
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidUrl` if the URL does not parse, names no host,
    /// or uses a scheme other than `ws`/`http` (TLS is not supported).
    pub fn parse(url: &str) -> Result<Self> {
        let uri: Uri = url.parse()?;

        match uri.scheme_str() {
            Some(s) if s.eq_ignore_ascii_case("ws") || s.eq_ignore_ascii_case("http") => {}
            Some(other) => {
                return Err(Error::InvalidUrl(format!("unsupported scheme: {other}")));
            }
            None => return Err(Error::InvalidUrl(format!("missing scheme: {url}"))),
        }

        let host = uri
            .host()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| Error::InvalidUrl(format!("no host in {url}")))?;
        let host = host.trim_start_matches('[').trim_end_matches(']').to_string();

        let port = uri.port_u16().unwrap_or(DEFAULT_PORT);
        let path = uri
            .path_and_query()
            .map(|pq| pq.as_str())
            .filter(|p| !p.is_empty())
            .unwrap_or("/");
        let path = if path.starts_with('/') {
            path.to_string()
        } else {
            format!("/{path}")
        };

        Ok(Self { host, port, path })
    }

    /// `host:port` form suitable for a socket connect.
    #[must_use]
    pub fn authority(&self) -> String {
        if self.host.contains(':') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }

    /// Build the upgrade request for this target.
    #[must_use]
    pub fn handshake_request(&self, key: &str, origin: Option<&str>) -> HandshakeRequest {
        HandshakeRequest {
            host: self.host.clone(),
            port: self.port,
            path: self.path.clone(),
            key: key.to_string(),
            origin: origin.map(str::to_string),
        }
    }
}
