//! # hybi - WebSocket (HyBi-17 / version 13) client core
//!
//! `hybi` implements the client side of the WebSocket opening handshake and
//! outbound framing:
//!
//! - **Handshake authentication**: a per-connection `Sec-WebSocket-Key` and
//!   verification of the server's `Sec-WebSocket-Accept`
//! - **Connection lifecycle**: `Connecting` to `Connected` to `Disconnected`,
//!   reported as [`Event`]s
//! - **Frame encoding**: all three payload length tiers, with optional
//!   client masking
//! - **Transport abstraction**: the core writes into any [`Transport`]; a
//!   Tokio TCP transport ships behind the default `async-tokio` feature
//!
//! Inbound frame decoding is left to the caller, who receives raw bytes as
//! [`Event::Inbound`].
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use hybi::{ClientConfig, ControlOptions, Event, SendOptions};
//!
//! let (client, mut events) = hybi::connect("ws://127.0.0.1:9001/chat", ClientConfig::default())?;
//! while let Some(event) = events.recv().await {
//!     match event {
//!         Event::Connected => client.send("hello", SendOptions::text())?,
//!         Event::Inbound(bytes) => println!("{} bytes from server", bytes.len()),
//!         Event::Disconnected => break,
//!         Event::Error(e) => eprintln!("error: {e}"),
//!     }
//! }
//! ```

pub mod config;
pub mod connection;
pub mod error;
pub mod event;
pub mod message;
pub mod protocol;
pub mod target;
pub mod transport;

pub use config::ClientConfig;
pub use connection::{Client, ConnectionState};
pub use error::{Error, Result};
pub use event::{Event, Events};
pub use message::{ControlOptions, Payload, SendOptions};
pub use protocol::{
    Frame, HandshakeKeys, HandshakeRequest, HandshakeResponse, OpCode, PayloadLength, WS_GUID,
    compute_accept_key,
};
pub use target::Target;
pub use transport::{CloseObserver, Transport};

#[cfg(feature = "async-tokio")]
pub use transport::{TcpTransport, connect};
