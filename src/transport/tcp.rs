use std::io;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use bytes::{Bytes, BytesMut};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;

use crate::config::ClientConfig;
use crate::connection::Client;
use crate::error::{Error, Result};
use crate::event::{Event, EventSink, Events};
use crate::protocol::HandshakeResponse;
use crate::target::Target;
use crate::transport::{CloseObserver, Transport};

const READ_BUFFER_SIZE: usize = 8192;

type ObserverSlot = Arc<Mutex<Option<CloseObserver>>>;

enum Command {
    Write(Bytes),
    NoDelay(bool),
    IdleTimeout(Option<Duration>),
    Close,
}

/// A TCP connection driven by a background Tokio task.
///
/// Every call is turned into a command for the driver task, which owns the
/// socket, so writes never block the caller and land in submission order.
/// Bytes read from the socket are emitted as [`Event::Inbound`].
pub struct TcpTransport {
    commands: mpsc::UnboundedSender<Command>,
    observer: ObserverSlot,
}

impl TcpTransport {
    fn new(stream: TcpStream, events: EventSink) -> (Self, Driver) {
        let (tx, rx) = mpsc::unbounded_channel();
        let observer: ObserverSlot = Arc::new(Mutex::new(None));
        let transport = Self {
            commands: tx,
            observer: Arc::clone(&observer),
        };
        let driver = Driver {
            stream,
            commands: rx,
            observer,
            events,
        };
        (transport, driver)
    }

    fn command(&self, command: Command) -> io::Result<()> {
        self.commands
            .send(command)
            .map_err(|_| io::Error::new(io::ErrorKind::BrokenPipe, "transport closed"))
    }
}

impl Transport for TcpTransport {
    fn write(&mut self, frame: Bytes) -> io::Result<()> {
        self.command(Command::Write(frame))
    }

    fn close(&mut self) {
        let _ = self.command(Command::Close);
    }

    fn on_close(&mut self, observer: CloseObserver) {
        *self.observer.lock().unwrap_or_else(PoisonError::into_inner) = Some(observer);
    }

    fn set_nodelay(&mut self, nodelay: bool) -> io::Result<()> {
        self.command(Command::NoDelay(nodelay))
    }

    fn set_idle_timeout(&mut self, timeout: Option<Duration>) -> io::Result<()> {
        self.command(Command::IdleTimeout(timeout))
    }
}

struct Driver {
    stream: TcpStream,
    commands: mpsc::UnboundedReceiver<Command>,
    observer: ObserverSlot,
    events: EventSink,
}

impl Driver {
    async fn run(self) {
        let Driver {
            stream,
            mut commands,
            observer,
            events,
        } = self;
        let (mut reader, mut writer) = stream.into_split();
        let mut buf = BytesMut::with_capacity(READ_BUFFER_SIZE);
        let mut idle: Option<Duration> = None;

        loop {
            buf.reserve(READ_BUFFER_SIZE);
            let idle_deadline = async {
                match idle {
                    Some(limit) => tokio::time::sleep(limit).await,
                    None => std::future::pending().await,
                }
            };

            tokio::select! {
                command = commands.recv() => match command {
                    Some(Command::Write(frame)) => {
                        if let Err(e) = writer.write_all(&frame).await {
                            tracing::warn!(error = %e, "socket write failed");
                            events.emit(Event::Error(e.into()));
                            break;
                        }
                    }
                    Some(Command::NoDelay(on)) => {
                        if let Err(e) = writer.as_ref().set_nodelay(on) {
                            tracing::warn!(error = %e, "set_nodelay failed");
                        }
                    }
                    Some(Command::IdleTimeout(limit)) => idle = limit,
                    Some(Command::Close) | None => break,
                },
                read = reader.read_buf(&mut buf) => match read {
                    Ok(0) => {
                        tracing::debug!("peer closed the connection");
                        break;
                    }
                    Ok(n) => {
                        tracing::trace!(bytes = n, "inbound");
                        events.emit(Event::Inbound(buf.split().freeze()));
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "socket read failed");
                        break;
                    }
                },
                () = idle_deadline => {
                    tracing::debug!(?idle, "idle timeout");
                    break;
                }
            }
        }

        if let Err(e) = writer.shutdown().await {
            tracing::debug!(error = %e, "socket shutdown failed");
        }
        let observer = observer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(observer) = observer {
            observer();
        }
    }
}

/// Open a connection to `url` in the background.
///
/// Returns as soon as the URL is parsed; the client starts out `Connecting`
/// and reports progress through the returned [`Events`]. Must be called from
/// within a Tokio runtime.
///
/// # Errors
///
/// - `Error::InvalidUrl` if `url` is malformed or names no host
/// - `Error::Io` if no handshake key could be generated
pub fn connect(url: &str, config: ClientConfig) -> Result<(Client<TcpTransport>, Events)> {
    let target = Target::parse(url)?;
    let (client, events) = Client::new()?;
    tracing::debug!(target = %target.authority(), path = %target.path, "connecting");

    let task_client = client.clone();
    tokio::spawn(establish(task_client, target, config));
    Ok((client, events))
}

async fn establish(client: Client<TcpTransport>, target: Target, config: ClientConfig) {
    let attempt = handshake(&client, &target, &config);
    let outcome = match config.handshake_timeout {
        Some(limit) => tokio::time::timeout(limit, attempt)
            .await
            .unwrap_or_else(|_| Err(Error::HandshakeTimeout(limit))),
        None => attempt.await,
    };

    match outcome {
        Ok((stream, response, leftover)) => {
            let (transport, driver) = TcpTransport::new(stream, client.event_sink());
            client.handle_upgrade(&response, transport, leftover);
            // The driver must not keep the connection alive on its own.
            drop(client);
            driver.run().await;
        }
        Err(e) => client.handle_connect_failure(e),
    }
}

async fn handshake(
    client: &Client<TcpTransport>,
    target: &Target,
    config: &ClientConfig,
) -> Result<(TcpStream, HandshakeResponse, Bytes)> {
    let mut stream = TcpStream::connect((target.host.as_str(), target.port)).await?;

    let mut request = Vec::new();
    client.handshake_request(target, config).write(&mut request)?;
    stream.write_all(&request).await?;

    let (head, leftover) = read_response_head(&mut stream, config).await?;
    let response = HandshakeResponse::parse(&head)?;
    Ok((stream, response, leftover))
}

/// Read up to and including the blank line ending the response head.
/// Anything after it already belongs to the framed stream and does not count
/// against `max_handshake_size`.
async fn read_response_head(
    stream: &mut TcpStream,
    config: &ClientConfig,
) -> Result<(BytesMut, Bytes)> {
    let mut buf = BytesMut::with_capacity(1024);
    loop {
        buf.reserve(1024);
        if stream.read_buf(&mut buf).await? == 0 {
            return Err(Error::InvalidHandshake(
                "connection closed during handshake".into(),
            ));
        }

        match find_head_end(&buf) {
            Some(end) => {
                config.check_handshake_size(end)?;
                let head = buf.split_to(end);
                return Ok((head, buf.freeze()));
            }
            None => config.check_handshake_size(buf.len())?,
        }
    }
}

fn find_head_end(buf: &[u8]) -> Option<usize> {
    buf.windows(4)
        .position(|w| w == b"\r\n\r\n")
        .map(|i| i + 4)
}
