//! Wire-level pieces: handshake keys, opcodes, masking and frame encoding.

pub mod frame;
pub mod handshake;
pub mod mask;
pub mod opcode;

pub use frame::{Frame, PayloadLength};
pub use handshake::{
    HandshakeKeys, HandshakeRequest, HandshakeResponse, WS_GUID, compute_accept_key,
};
pub use mask::{apply_mask, generate_mask};
pub use opcode::OpCode;
