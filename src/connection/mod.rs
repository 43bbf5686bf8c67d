//! Client connection state machine.
//!
//! ## Connection Lifecycle
//!
//! 1. **Connecting** - Upgrade request in flight
//! 2. **Connected** - Server's accept key verified; frames may be sent
//! 3. **Disconnected** - Peer closed, handshake rejected, or terminated
//!
//! ```text
//!  Connecting --upgrade ok--> Connected --close/terminate--> Disconnected
//!      |                                                         ^
//!      +-----------rejected / failed / terminated----------------+
//! ```

mod client;
mod state;

pub use client::Client;
pub use state::ConnectionState;
