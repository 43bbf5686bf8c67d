//! Outbound payloads and per-call send options.

use bytes::Bytes;

/// Data handed to [`Client::send`](crate::Client::send) and the control
/// operations.
///
/// Strings and byte buffers are told apart here, at the API boundary, so the
/// encoder only ever sees bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    /// UTF-8 text, sent as its raw bytes.
    Text(String),
    /// Arbitrary bytes.
    Binary(Bytes),
}

impl Payload {
    /// An empty payload, the default for ping, pong and close.
    #[must_use]
    pub const fn empty() -> Self {
        Payload::Binary(Bytes::new())
    }

    /// Number of payload bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Payload::Text(s) => s.len(),
            Payload::Binary(b) => b.len(),
        }
    }

    /// Whether the payload carries no bytes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Convert into the bytes that go on the wire.
    #[must_use]
    pub fn into_bytes(self) -> Bytes {
        match self {
            Payload::Text(s) => Bytes::from(s),
            Payload::Binary(b) => b,
        }
    }
}

impl Default for Payload {
    fn default() -> Self {
        Self::empty()
    }
}

impl From<String> for Payload {
    fn from(s: String) -> Self {
        Payload::Text(s)
    }
}

impl From<&str> for Payload {
    fn from(s: &str) -> Self {
        Payload::Text(s.to_owned())
    }
}

impl From<Vec<u8>> for Payload {
    fn from(v: Vec<u8>) -> Self {
        Payload::Binary(Bytes::from(v))
    }
}

impl From<&[u8]> for Payload {
    fn from(v: &[u8]) -> Self {
        Payload::Binary(Bytes::copy_from_slice(v))
    }
}

impl<const N: usize> From<&[u8; N]> for Payload {
    fn from(v: &[u8; N]) -> Self {
        Payload::Binary(Bytes::copy_from_slice(v))
    }
}

impl From<Bytes> for Payload {
    fn from(b: Bytes) -> Self {
        Payload::Binary(b)
    }
}

/// Options for [`Client::send`](crate::Client::send).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SendOptions {
    /// Send a Binary frame instead of a Text frame.
    ///
    /// Default: false
    pub binary: bool,

    /// Mask the payload with a fresh random key.
    ///
    /// Servers are required to reject unmasked client frames, so this should
    /// only be turned off against peers known to accept them.
    ///
    /// Default: true
    pub mask: bool,
}

impl Default for SendOptions {
    fn default() -> Self {
        Self {
            binary: false,
            mask: true,
        }
    }
}

impl SendOptions {
    /// Text frame, masked.
    #[must_use]
    pub fn text() -> Self {
        Self::default()
    }

    /// Binary frame, masked.
    #[must_use]
    pub fn binary() -> Self {
        Self {
            binary: true,
            ..Self::default()
        }
    }

    /// Set masking.
    #[must_use]
    pub const fn with_mask(mut self, mask: bool) -> Self {
        self.mask = mask;
        self
    }
}

/// Options for ping, pong and close.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlOptions {
    /// Mask the payload with a fresh random key.
    ///
    /// Default: true
    pub mask: bool,
}

impl Default for ControlOptions {
    fn default() -> Self {
        Self { mask: true }
    }
}

impl ControlOptions {
    /// Unmasked control frame.
    #[must_use]
    pub const fn unmasked() -> Self {
        Self { mask: false }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_from_str_and_bytes() {
        let text: Payload = "hello".into();
        assert!(matches!(text, Payload::Text(_)));
        assert_eq!(text.len(), 5);
        assert_eq!(text.into_bytes(), Bytes::from_static(b"hello"));

        let bin: Payload = vec![0xffu8, 0x00].into();
        assert!(matches!(bin, Payload::Binary(_)));
        assert_eq!(bin.into_bytes(), Bytes::from_static(&[0xff, 0x00]));

        let arr: Payload = b"abc".into();
        assert_eq!(arr.len(), 3);
    }

    #[test]
    fn test_empty_payload() {
        assert!(Payload::empty().is_empty());
        assert!(Payload::from("").is_empty());
        assert!(Payload::from(Vec::<u8>::new()).is_empty());
        assert_eq!(Payload::default(), Payload::empty());
    }

    #[test]
    fn test_multibyte_text_length_is_bytes() {
        let p = Payload::from("héllo");
        assert_eq!(p.len(), 6);
    }

    #[test]
    fn test_send_options_defaults() {
        let opts = SendOptions::default();
        assert!(!opts.binary);
        assert!(opts.mask);
        assert!(SendOptions::binary().binary);
        assert!(!SendOptions::text().with_mask(false).mask);
        assert!(ControlOptions::default().mask);
        assert!(!ControlOptions::unmasked().mask);
    }
}
