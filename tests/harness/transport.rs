//! In-memory transport that records what the client writes.

use std::io;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use bytes::Bytes;
use hybi::{CloseObserver, Transport};

#[derive(Default)]
struct State {
    writes: Vec<Bytes>,
    closed: bool,
    nodelay: Option<bool>,
    idle_timeout: Option<Option<Duration>>,
    observer: Option<CloseObserver>,
}

/// Cloning shares the recording, so a test can keep one copy while the
/// client owns the other.
#[derive(Clone, Default)]
pub struct MockTransport {
    state: Arc<Mutex<State>>,
}

impl MockTransport {
    pub fn writes(&self) -> Vec<Bytes> {
        self.state.lock().unwrap().writes.clone()
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().unwrap().closed
    }

    pub fn nodelay(&self) -> Option<bool> {
        self.state.lock().unwrap().nodelay
    }

    pub fn idle_timeout(&self) -> Option<Option<Duration>> {
        self.state.lock().unwrap().idle_timeout
    }

    /// Simulate the server closing the connection.
    pub fn hang_up(&self) {
        let observer = {
            let mut state = self.state.lock().unwrap();
            state.closed = true;
            state.observer.take()
        };
        if let Some(observer) = observer {
            observer();
        }
    }
}

impl Transport for MockTransport {
    fn write(&mut self, frame: Bytes) -> io::Result<()> {
        let mut state = self.state.lock().unwrap();
        if state.closed {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"));
        }
        state.writes.push(frame);
        Ok(())
    }

    fn close(&mut self) {
        self.hang_up();
    }

    fn on_close(&mut self, observer: CloseObserver) {
        self.state.lock().unwrap().observer = Some(observer);
    }

    fn set_nodelay(&mut self, nodelay: bool) -> io::Result<()> {
        self.state.lock().unwrap().nodelay = Some(nodelay);
        Ok(())
    }

    fn set_idle_timeout(&mut self, timeout: Option<Duration>) -> io::Result<()> {
        self.state.lock().unwrap().idle_timeout = Some(timeout);
        Ok(())
    }
}
