//! The byte pipe a client writes frames into.
//!
//! The core never touches sockets directly. It talks to a [`Transport`]
//! that is handed over with the upgrade notification and owned exclusively by
//! the client from then on.
//!
//! With the default `async-tokio` feature, [`connect`] opens a TCP
//! connection, performs the upgrade and drives a [`TcpTransport`].

use std::io;
use std::time::Duration;

use bytes::Bytes;

#[cfg(feature = "async-tokio")]
mod tcp;

#[cfg(feature = "async-tokio")]
pub use tcp::{TcpTransport, connect};

/// Callback fired once when the transport closes, whoever closed it.
pub type CloseObserver = Box<dyn FnOnce() + Send + 'static>;

/// An upgraded, writable connection.
///
/// Implementations must preserve write order. The close observer may be
/// invoked from any thread, and from inside [`Transport::close`], but never
/// from inside [`Transport::write`] or [`Transport::on_close`]: the client
/// holds its lock across those two calls.
pub trait Transport: Send + 'static {
    /// Queue or write `frame` in full.
    ///
    /// # Errors
    ///
    /// Any I/O error; the client reports it as an error event.
    fn write(&mut self, frame: Bytes) -> io::Result<()>;

    /// Close the connection. Idempotent.
    fn close(&mut self);

    /// Register the observer to fire when the connection closes.
    fn on_close(&mut self, observer: CloseObserver);

    /// Enable or disable Nagle's algorithm.
    ///
    /// # Errors
    ///
    /// Any I/O error from the socket option.
    fn set_nodelay(&mut self, nodelay: bool) -> io::Result<()>;

    /// Close after this much inactivity, or never with `None`.
    ///
    /// # Errors
    ///
    /// Any I/O error from applying the timeout.
    fn set_idle_timeout(&mut self, timeout: Option<Duration>) -> io::Result<()>;
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn write(&mut self, frame: Bytes) -> io::Result<()> {
        (**self).write(frame)
    }

    fn close(&mut self) {
        (**self).close();
    }

    fn on_close(&mut self, observer: CloseObserver) {
        (**self).on_close(observer);
    }

    fn set_nodelay(&mut self, nodelay: bool) -> io::Result<()> {
        (**self).set_nodelay(nodelay)
    }

    fn set_idle_timeout(&mut self, timeout: Option<Duration>) -> io::Result<()> {
        (**self).set_idle_timeout(timeout)
    }
}
