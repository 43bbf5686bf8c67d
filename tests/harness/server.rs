//! A one-shot upgrade server on a random local port.
//!
//! Accepts a single connection, answers the upgrade request according to a
//! [`Script`], then records everything the client sends until it hangs up.

use std::net::SocketAddr;
use std::time::Duration;

use hybi::compute_accept_key;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

/// How the server answers the upgrade request.
#[derive(Debug, Clone)]
pub enum Script {
    /// Correct 101 response, followed by `greeting` in the same write. With
    /// `hang_up` the server closes right after.
    Accept { greeting: Vec<u8>, hang_up: bool },
    /// 101 response with a bogus accept key.
    WrongAccept,
    /// Non-101 status line.
    Reject(u16),
    /// Never answer.
    Silent,
}

impl Script {
    pub fn accept() -> Self {
        Script::Accept {
            greeting: Vec::new(),
            hang_up: false,
        }
    }
}

/// What the server saw.
#[derive(Debug, Default)]
pub struct Captured {
    /// The upgrade request head, verbatim.
    pub request: String,
    /// Every byte after the request head.
    pub received: Vec<u8>,
}

impl Captured {
    pub fn header(&self, name: &str) -> Option<&str> {
        header(&self.request, name)
    }
}

pub struct TestServer {
    pub addr: SocketAddr,
    handle: JoinHandle<Captured>,
}

impl TestServer {
    pub async fn spawn(script: Script) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            let (socket, _) = listener.accept().await.unwrap();
            serve(socket, script).await
        });
        Self { addr, handle }
    }

    pub fn url(&self, path: &str) -> String {
        format!("ws://{}{}", self.addr, path)
    }

    /// Wait for the client to hang up and return what was captured.
    pub async fn captured(self) -> Captured {
        tokio::time::timeout(Duration::from_secs(5), self.handle)
            .await
            .expect("server did not finish in time")
            .expect("server task panicked")
    }
}

async fn serve(mut socket: TcpStream, script: Script) -> Captured {
    let (request, mut received) = read_head(&mut socket).await;
    let key = header(&request, "sec-websocket-key").unwrap_or_default().to_string();

    match script {
        Script::Accept { greeting, hang_up } => {
            let mut reply = switching_protocols(&compute_accept_key(&key)).into_bytes();
            reply.extend_from_slice(&greeting);
            socket.write_all(&reply).await.unwrap();
            if hang_up {
                return Captured { request, received };
            }
        }
        Script::WrongAccept => {
            let reply = switching_protocols("dGhlIHNhbXBsZSBub25jZQ==");
            socket.write_all(reply.as_bytes()).await.unwrap();
        }
        Script::Reject(status) => {
            let reply = format!("HTTP/1.1 {status} Nope\r\nContent-Length: 0\r\n\r\n");
            socket.write_all(reply.as_bytes()).await.unwrap();
            return Captured { request, received };
        }
        Script::Silent => {}
    }

    // Read until the client hangs up; a reset counts as a hang-up too.
    let _ = socket.read_to_end(&mut received).await;
    Captured { request, received }
}

fn switching_protocols(accept: &str) -> String {
    format!(
        "HTTP/1.1 101 Switching Protocols\r\n\
         Upgrade: websocket\r\n\
         Connection: Upgrade\r\n\
         Sec-WebSocket-Accept: {accept}\r\n\r\n"
    )
}

async fn read_head(socket: &mut TcpStream) -> (String, Vec<u8>) {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    loop {
        if let Some(end) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            let rest = buf.split_off(end + 4);
            return (String::from_utf8(buf).unwrap(), rest);
        }
        let n = socket.read(&mut chunk).await.unwrap();
        assert!(n > 0, "client hung up before finishing the request");
        buf.extend_from_slice(&chunk[..n]);
    }
}

fn header<'a>(head: &'a str, name: &str) -> Option<&'a str> {
    head.lines().skip(1).find_map(|line| {
        let (key, value) = line.split_once(':')?;
        key.trim()
            .eq_ignore_ascii_case(name)
            .then(|| value.trim())
    })
}
