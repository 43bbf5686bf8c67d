use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use bytes::Bytes;

use crate::config::ClientConfig;
use crate::connection::ConnectionState;
use crate::error::{Error, Result};
use crate::event::{self, Event, EventSink, Events};
use crate::message::{ControlOptions, Payload, SendOptions};
use crate::protocol::frame::MAX_CONTROL_FRAME_PAYLOAD;
use crate::protocol::{Frame, HandshakeKeys, HandshakeRequest, HandshakeResponse, OpCode};
use crate::target::Target;
use crate::transport::Transport;

/// A WebSocket client connection.
///
/// One `Client` covers exactly one connection attempt: it starts out
/// `Connecting`, becomes `Connected` once [`handle_upgrade`] verifies the
/// server's accept key, and ends `Disconnected`. It is never reused; a new
/// handshake needs a new `Client`.
///
/// `Client` is a cheap handle. Clones share the same connection, and every
/// state transition and transport write is serialized through one lock per
/// connection.
///
/// ## Example
///
/// ```rust,ignore
/// use hybi::{ClientConfig, Event, SendOptions};
///
/// let (client, mut events) = hybi::connect("ws://127.0.0.1:9001/", ClientConfig::default())?;
/// while let Some(event) = events.recv().await {
///     if event == Event::Connected {
///         client.send("hello", SendOptions::default())?;
///     }
/// }
/// ```
///
/// [`handle_upgrade`]: Client::handle_upgrade
pub struct Client<T> {
    shared: Arc<Shared<T>>,
}

struct Shared<T> {
    keys: HandshakeKeys,
    events: EventSink,
    inner: Mutex<Inner<T>>,
}

struct Inner<T> {
    state: ConnectionState,
    // Some iff state == Connected.
    transport: Option<T>,
}

impl<T> Clone for Client<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T> std::fmt::Debug for Client<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("state", &self.state())
            .field("client_key", &self.shared.keys.client_key())
            .finish()
    }
}

impl<T> Client<T> {
    /// Create a client with a fresh random handshake key.
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` if the OS random source is unavailable.
    pub fn new() -> Result<(Self, Events)> {
        Ok(Self::with_keys(HandshakeKeys::generate()?))
    }

    /// Create a client with caller-supplied handshake keys.
    #[must_use]
    pub fn with_keys(keys: HandshakeKeys) -> (Self, Events) {
        let (events, rx) = event::channel();
        let shared = Shared {
            keys,
            events,
            inner: Mutex::new(Inner {
                state: ConnectionState::Connecting,
                transport: None,
            }),
        };
        (
            Self {
                shared: Arc::new(shared),
            },
            rx,
        )
    }

    /// Get the current connection state.
    pub fn state(&self) -> ConnectionState {
        self.lock().state
    }

    /// Check if frames can be sent right now.
    pub fn is_connected(&self) -> bool {
        self.state().can_send()
    }

    /// The handshake keys for this connection attempt.
    pub fn keys(&self) -> &HandshakeKeys {
        &self.shared.keys
    }

    /// Upgrade request to send to `target`.
    pub fn handshake_request(&self, target: &Target, config: &ClientConfig) -> HandshakeRequest {
        target.handshake_request(self.shared.keys.client_key(), config.origin.as_deref())
    }

    pub(crate) fn event_sink(&self) -> EventSink {
        self.shared.events.clone()
    }

    fn lock(&self) -> MutexGuard<'_, Inner<T>> {
        // Every transition is a single field assignment, so a poisoned
        // Inner is still consistent.
        self.shared
            .inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn emit(&self, event: Event) {
        self.shared.events.emit(event);
    }
}

impl<T: Transport> Client<T> {
    /// Deliver the upgrade notification: the server's response, the upgraded
    /// transport, and any bytes that arrived after the response head.
    ///
    /// - Already terminated: emits `Disconnected` and closes `transport`.
    /// - Accept key missing or wrong: moves to `Disconnected`, emits
    ///   `Error(HandshakeRejected)` and closes `transport`.
    /// - Otherwise: disables the idle timeout, enables no-delay, binds the
    ///   transport, moves to `Connected` and emits `Connected`, followed by
    ///   `Inbound(leftover)` if `leftover` is not empty.
    pub fn handle_upgrade(&self, response: &HandshakeResponse, mut transport: T, leftover: Bytes) {
        let mut inner = self.lock();

        match inner.state {
            ConnectionState::Connecting => {}
            ConnectionState::Disconnected => {
                tracing::debug!("upgrade arrived after terminate, closing transport");
                self.emit(Event::Disconnected);
                drop(inner);
                transport.close();
                return;
            }
            ConnectionState::Connected => {
                tracing::warn!("duplicate upgrade notification, closing extra transport");
                drop(inner);
                transport.close();
                return;
            }
        }

        if !self.shared.keys.verify(response.accept.as_deref()) {
            let reason = match response.accept.as_deref() {
                None => "missing Sec-WebSocket-Accept".to_string(),
                Some(got) => format!(
                    "Sec-WebSocket-Accept mismatch: expected {}, got {}",
                    self.shared.keys.expected_accept(),
                    got
                ),
            };
            tracing::warn!(%reason, "handshake rejected");
            inner.state = ConnectionState::Disconnected;
            self.emit(Event::Error(Error::HandshakeRejected(reason)));
            drop(inner);
            transport.close();
            return;
        }

        if let Err(e) = transport.set_idle_timeout(None) {
            tracing::warn!(error = %e, "failed to disable idle timeout");
        }
        if let Err(e) = transport.set_nodelay(true) {
            tracing::warn!(error = %e, "failed to enable no-delay");
        }

        let observer = Arc::downgrade(&self.shared);
        transport.on_close(Box::new(move || on_transport_closed(&observer)));

        inner.transport = Some(transport);
        inner.state = ConnectionState::Connected;
        tracing::debug!("connected");
        self.emit(Event::Connected);
        if !leftover.is_empty() {
            self.emit(Event::Inbound(leftover));
        }
    }

    /// Report a failure that happened before any upgrade arrived (connect
    /// error, timeout, malformed response).
    ///
    /// Moves a `Connecting` client to `Disconnected` and emits the error. A
    /// client that was already terminated stays silent.
    pub fn handle_connect_failure(&self, err: Error) {
        let mut inner = self.lock();
        if inner.state != ConnectionState::Connecting {
            tracing::debug!(error = %err, state = %inner.state, "ignoring late connect failure");
            return;
        }
        tracing::warn!(error = %err, "connection attempt failed");
        inner.state = ConnectionState::Disconnected;
        self.emit(Event::Error(err));
    }

    /// Send a Text frame, or a Binary frame with `options.binary`.
    ///
    /// A transport write failure is reported as an `Error` event, not as the
    /// return value; the connection stays as it is until the transport
    /// reports its own close.
    ///
    /// ## Errors
    ///
    /// - `Error::EmptyPayload` if `data` is empty
    /// - `Error::InvalidState` if not connected
    pub fn send(&self, data: impl Into<Payload>, options: SendOptions) -> Result<()> {
        let payload = data.into();
        if payload.is_empty() {
            return Err(Error::EmptyPayload);
        }
        let opcode = if options.binary {
            OpCode::Binary
        } else {
            OpCode::Text
        };
        self.write_frame(&Frame::new(true, opcode, payload.into_bytes()), options.mask)
            .map(drop)
    }

    /// Send a Ping. Pass [`Payload::empty()`] for no payload.
    ///
    /// ## Errors
    ///
    /// - `Error::InvalidState` if not connected
    /// - `Error::ControlFrameTooLarge` if `data` exceeds 125 bytes
    pub fn ping(&self, data: impl Into<Payload>, options: ControlOptions) -> Result<()> {
        self.write_control(OpCode::Ping, data.into(), options).map(drop)
    }

    /// Send a Pong. Errors as for [`ping`](Client::ping).
    pub fn pong(&self, data: impl Into<Payload>, options: ControlOptions) -> Result<()> {
        self.write_control(OpCode::Pong, data.into(), options).map(drop)
    }

    /// Send a Close frame, then terminate immediately.
    ///
    /// If the write fails the error is emitted and the connection is left
    /// alone. Errors as for [`ping`](Client::ping).
    pub fn close(&self, data: impl Into<Payload>, options: ControlOptions) -> Result<()> {
        if self.write_control(OpCode::Close, data.into(), options)? {
            self.terminate();
        }
        Ok(())
    }

    /// Drop the connection without a close frame. Always succeeds and is
    /// idempotent.
    ///
    /// - `Connected`: releases and closes the transport, emits `Disconnected`.
    /// - `Connecting`: marks the client `Disconnected`; a later upgrade is
    ///   then closed on arrival.
    /// - `Disconnected`: nothing.
    pub fn terminate(&self) {
        let transport = {
            let mut inner = self.lock();
            match inner.state {
                ConnectionState::Connected => {
                    inner.state = ConnectionState::Disconnected;
                    tracing::debug!("terminated");
                    self.emit(Event::Disconnected);
                    inner.transport.take()
                }
                ConnectionState::Connecting => {
                    inner.state = ConnectionState::Disconnected;
                    tracing::debug!("terminated while connecting");
                    None
                }
                ConnectionState::Disconnected => None,
            }
        };
        // Outside the lock: the transport may fire its close observer here.
        if let Some(mut transport) = transport {
            transport.close();
        }
    }

    fn write_control(&self, opcode: OpCode, payload: Payload, options: ControlOptions) -> Result<bool> {
        let state = self.state();
        if !state.can_send() {
            return Err(Error::InvalidState(state));
        }
        if payload.len() > MAX_CONTROL_FRAME_PAYLOAD {
            return Err(Error::ControlFrameTooLarge(payload.len()));
        }
        self.write_frame(&Frame::new(true, opcode, payload.into_bytes()), options.mask)
    }

    /// Encode and write under the lock. `Ok(false)` means the write failed
    /// and an error event was emitted.
    fn write_frame(&self, frame: &Frame, mask: bool) -> Result<bool> {
        let mut inner = self.lock();
        let state = inner.state;
        let transport = match inner.transport.as_mut() {
            Some(transport) if state.can_send() => transport,
            _ => return Err(Error::InvalidState(state)),
        };

        let bytes = frame.encode(mask);
        tracing::trace!(opcode = %frame.opcode, len = bytes.len(), "write frame");
        match transport.write(bytes) {
            Ok(()) => Ok(true),
            Err(e) => {
                tracing::warn!(error = %e, opcode = %frame.opcode, "transport write failed");
                self.emit(Event::Error(e.into()));
                Ok(false)
            }
        }
    }

    fn handle_transport_closed(&self) {
        let released = {
            let mut inner = self.lock();
            if inner.state != ConnectionState::Connected {
                return;
            }
            inner.state = ConnectionState::Disconnected;
            tracing::debug!("transport closed");
            self.emit(Event::Disconnected);
            inner.transport.take()
        };
        drop(released);
    }
}

fn on_transport_closed<T: Transport>(shared: &Weak<Shared<T>>) {
    if let Some(shared) = shared.upgrade() {
        Client { shared }.handle_transport_closed();
    }
}
