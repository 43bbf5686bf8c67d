//! Lifecycle notifications delivered to the application.
//!
//! Each state transition produces at most one event. Events are queued in
//! transition order on an unbounded channel, so emitting never blocks the
//! connection.

use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use tokio::sync::mpsc;

use crate::error::Error;

/// Something that happened to a connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// Handshake verified; the client is ready to send.
    Connected,
    /// The connection ended (peer close, terminate, or a late upgrade after
    /// terminate).
    Disconnected,
    /// A failure that did not surface as a returned `Err`.
    Error(Error),
    /// Raw bytes received from the server, for an external frame decoder.
    Inbound(Bytes),
}

/// Sending half, held by the client and its transport driver.
#[derive(Debug, Clone)]
pub(crate) struct EventSink {
    tx: mpsc::UnboundedSender<Event>,
}

impl EventSink {
    pub(crate) fn emit(&self, event: Event) {
        tracing::trace!(?event, "emit");
        // Nobody listening is fine.
        let _ = self.tx.send(event);
    }
}

/// Receiving half handed to the application.
///
/// Also usable as a [`futures_core::Stream`].
#[derive(Debug)]
pub struct Events {
    rx: mpsc::UnboundedReceiver<Event>,
}

impl Events {
    /// Wait for the next event. `None` once the client and every transport
    /// driver have been dropped.
    pub async fn recv(&mut self) -> Option<Event> {
        self.rx.recv().await
    }

    /// Take the next event if one is already queued.
    pub fn try_recv(&mut self) -> Option<Event> {
        self.rx.try_recv().ok()
    }

    /// Drain everything queued so far.
    pub fn drain(&mut self) -> Vec<Event> {
        std::iter::from_fn(|| self.try_recv()).collect()
    }
}

impl futures_core::Stream for Events {
    type Item = Event;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Event>> {
        self.rx.poll_recv(cx)
    }
}

pub(crate) fn channel() -> (EventSink, Events) {
    let (tx, rx) = mpsc::unbounded_channel();
    (EventSink { tx }, Events { rx })
}
