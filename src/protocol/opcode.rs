//! Frame opcodes understood by the encoder.

/// Bit set in the first header byte of a final fragment.
pub const FIN_BIT: u8 = 0x80;

/// WebSocket frame opcode.
///
/// The low nibble of the first header byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
#[non_exhaustive]
pub enum OpCode {
    /// Continuation of a fragmented message (0x0).
    Continuation = 0x0,
    /// UTF-8 text message (0x1).
    Text = 0x1,
    /// Binary message (0x2).
    Binary = 0x2,
    /// Close signal (0x8).
    Close = 0x8,
    /// Ping (0x9).
    Ping = 0x9,
    /// Pong (0xA).
    Pong = 0xA,
}

impl OpCode {
    /// Raw nibble value.
    #[inline]
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    /// First header byte for a frame carrying this opcode.
    ///
    /// Reserved bits are never set: no extensions are negotiated.
    #[inline]
    #[must_use]
    pub const fn header_byte(self, fin: bool) -> u8 {
        if fin {
            self.as_u8() | FIN_BIT
        } else {
            self.as_u8()
        }
    }
}

impl std::fmt::Display for OpCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            OpCode::Continuation => "Continuation",
            OpCode::Text => "Text",
            OpCode::Binary => "Binary",
            OpCode::Close => "Close",
            OpCode::Ping => "Ping",
            OpCode::Pong => "Pong",
        };
        f.write_str(name)
    }
}
