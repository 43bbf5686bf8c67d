//! Outbound frame encoding (RFC 6455 section 5.2).
//!
//! ```text
//!  0                   1                   2                   3
//!  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
//! +-+-+-+-+-------+-+-------------+-------------------------------+
//! |F|R|R|R| opcode|M| Payload len |    Extended payload length    |
//! |I|S|S|S|  (4)  |A|     (7)     |             (16/64)           |
//! |N|V|V|V|       |S|             |   (if payload len==126/127)   |
//! +-+-+-+-+-------+-+-------------+-------------------------------+
//! |                  Masking key (if MASK set)                    |
//! +---------------------------------------------------------------+
//! |                         Payload data                          |
//! +---------------------------------------------------------------+
//! ```

use bytes::{BufMut, Bytes, BytesMut};

use crate::protocol::OpCode;
use crate::protocol::mask::{apply_mask, generate_mask};

/// Maximum payload size for control frames.
pub const MAX_CONTROL_FRAME_PAYLOAD: usize = 125;

/// Largest payload that fits the 2-byte extended length.
pub const MAX_MEDIUM_PAYLOAD: usize = 65535;

/// Bit set in the second header byte when a masking key follows.
pub const MASK_BIT: u8 = 0x80;

/// The three length encodings a frame header can use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadLength {
    /// 0..=125, carried in the length byte itself.
    Short(u8),
    /// 126..=65535, length byte 126 followed by a big-endian u16.
    Medium(u16),
    /// Anything larger, length byte 127 followed by a big-endian u64.
    Long(u64),
}

impl PayloadLength {
    /// Pick the tier for a payload of `len` bytes.
    ///
    /// The 8-byte form starts at 65536; 65535 is still a 2-byte length.
    #[must_use]
    pub const fn for_len(len: usize) -> Self {
        if len <= MAX_CONTROL_FRAME_PAYLOAD {
            PayloadLength::Short(len as u8)
        } else if len <= MAX_MEDIUM_PAYLOAD {
            PayloadLength::Medium(len as u16)
        } else {
            PayloadLength::Long(len as u64)
        }
    }

    /// Value of the 7-bit length field.
    #[must_use]
    pub const fn indicator(self) -> u8 {
        match self {
            PayloadLength::Short(n) => n,
            PayloadLength::Medium(_) => 126,
            PayloadLength::Long(_) => 127,
        }
    }

    /// Size of the extended length field that follows the length byte.
    #[must_use]
    pub const fn extended_size(self) -> usize {
        match self {
            PayloadLength::Short(_) => 0,
            PayloadLength::Medium(_) => 2,
            PayloadLength::Long(_) => 8,
        }
    }
}

/// A single outbound frame.
///
/// Fragmentation is not supported, so frames built through the constructors
/// below always carry the FIN bit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Final fragment flag.
    pub fin: bool,
    /// Frame opcode.
    pub opcode: OpCode,
    payload: Bytes,
}

impl Frame {
    /// Create a frame with explicit FIN flag.
    #[must_use]
    pub fn new(fin: bool, opcode: OpCode, payload: impl Into<Bytes>) -> Self {
        Self {
            fin,
            opcode,
            payload: payload.into(),
        }
    }

    /// Create a final text frame.
    #[must_use]
    pub fn text(data: impl Into<Bytes>) -> Self {
        Self::new(true, OpCode::Text, data)
    }

    /// Create a final binary frame.
    #[must_use]
    pub fn binary(data: impl Into<Bytes>) -> Self {
        Self::new(true, OpCode::Binary, data)
    }

    /// Payload bytes, unmasked.
    #[inline]
    #[must_use]
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Total encoded size of this frame.
    #[must_use]
    pub fn wire_size(&self, masked: bool) -> usize {
        let len = PayloadLength::for_len(self.payload.len());
        let mask_size = if masked { 4 } else { 0 };
        2 + len.extended_size() + mask_size + self.payload.len()
    }

    /// Encode the frame, drawing a fresh masking key when `apply_mask` is set.
    #[must_use]
    pub fn encode(&self, apply_mask: bool) -> Bytes {
        let key = apply_mask.then(generate_mask);
        self.encode_with_mask(key)
    }

    /// Encode the frame with a caller-supplied masking key.
    #[must_use]
    pub fn encode_with_mask(&self, mask: Option<[u8; 4]>) -> Bytes {
        let mut buf = BytesMut::with_capacity(self.wire_size(mask.is_some()));
        self.write(&mut buf, mask);
        buf.freeze()
    }

    /// Append the encoded frame to `buf`.
    pub fn write(&self, buf: &mut BytesMut, mask: Option<[u8; 4]>) {
        let len = PayloadLength::for_len(self.payload.len());

        buf.put_u8(self.opcode.header_byte(self.fin));

        let mut byte1 = len.indicator();
        if mask.is_some() {
            byte1 |= MASK_BIT;
        }
        buf.put_u8(byte1);

        match len {
            PayloadLength::Short(_) => {}
            PayloadLength::Medium(n) => buf.put_u16(n),
            PayloadLength::Long(n) => buf.put_u64(n),
        }

        match mask {
            Some(key) => {
                buf.put_slice(&key);
                let start = buf.len();
                buf.put_slice(&self.payload);
                apply_mask(&mut buf[start..], key);
            }
            None => buf.put_slice(&self.payload),
        }
    }
}
