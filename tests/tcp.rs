//! Connecting over real sockets to a scripted local server.

#![cfg(feature = "async-tokio")]

mod harness;

use std::time::Duration;

use harness::{Script, TestServer};
use hybi::protocol::apply_mask;
use hybi::{
    ClientConfig, ConnectionState, ControlOptions, Error, Event, Events, Payload, SendOptions,
};

async fn next_event(events: &mut Events) -> Event {
    tokio::time::timeout(Duration::from_secs(5), events.recv())
        .await
        .expect("timed out waiting for an event")
        .expect("event channel closed")
}

#[tokio::test]
async fn test_connect_send_and_close() {
    let server = TestServer::spawn(Script::accept()).await;
    let (client, mut events) = hybi::connect(&server.url("/echo"), ClientConfig::default()).unwrap();
    assert_eq!(client.state(), ConnectionState::Connecting);

    assert_eq!(next_event(&mut events).await, Event::Connected);
    client.send("hello", SendOptions::default()).unwrap();
    client.close(Payload::empty(), ControlOptions::default()).unwrap();
    assert_eq!(next_event(&mut events).await, Event::Disconnected);

    let captured = server.captured().await;
    assert!(captured.request.starts_with("GET /echo HTTP/1.1\r\n"));
    assert_eq!(captured.header("upgrade"), Some("websocket"));
    assert_eq!(captured.header("sec-websocket-version"), Some("13"));
    assert_eq!(
        captured.header("sec-websocket-key"),
        Some(client.keys().client_key())
    );

    // Masked text frame, then an empty masked close frame.
    let bytes = &captured.received;
    assert_eq!(bytes.len(), 11 + 6);
    assert_eq!(&bytes[..2], &[0x81, 0x85]);
    let key: [u8; 4] = bytes[2..6].try_into().unwrap();
    let mut payload = bytes[6..11].to_vec();
    apply_mask(&mut payload, key);
    assert_eq!(payload, b"hello");
    assert_eq!(&bytes[11..13], &[0x88, 0x80]);
}

#[tokio::test]
async fn test_wrong_accept_key_is_rejected() {
    let server = TestServer::spawn(Script::WrongAccept).await;
    let (client, mut events) = hybi::connect(&server.url("/"), ClientConfig::default()).unwrap();

    assert!(matches!(
        next_event(&mut events).await,
        Event::Error(Error::HandshakeRejected(_))
    ));
    assert_eq!(client.state(), ConnectionState::Disconnected);
    assert!(server.captured().await.received.is_empty());
}

#[tokio::test]
async fn test_non_101_status_fails() {
    let server = TestServer::spawn(Script::Reject(403)).await;
    let (client, mut events) = hybi::connect(&server.url("/"), ClientConfig::default()).unwrap();

    assert!(matches!(
        next_event(&mut events).await,
        Event::Error(Error::InvalidHandshake(_))
    ));
    assert_eq!(client.state(), ConnectionState::Disconnected);
}

#[tokio::test]
async fn test_server_hang_up_disconnects() {
    let script = Script::Accept {
        greeting: vec![0x81, 0x02, b'h', b'i'],
        hang_up: true,
    };
    let server = TestServer::spawn(script).await;
    let (client, mut events) = hybi::connect(&server.url("/"), ClientConfig::default()).unwrap();

    assert_eq!(next_event(&mut events).await, Event::Connected);

    // The greeting may arrive with the response head or in a later read.
    let mut inbound = Vec::new();
    loop {
        match next_event(&mut events).await {
            Event::Inbound(bytes) => inbound.extend_from_slice(&bytes),
            Event::Disconnected => break,
            other => panic!("unexpected event: {other:?}"),
        }
    }
    assert_eq!(inbound, [0x81, 0x02, b'h', b'i']);
    assert_eq!(
        client.send("late", SendOptions::default()),
        Err(Error::InvalidState(ConnectionState::Disconnected))
    );
}

#[tokio::test]
async fn test_handshake_timeout() {
    let server = TestServer::spawn(Script::Silent).await;
    let config = ClientConfig::new().with_handshake_timeout(Some(Duration::from_millis(100)));
    let (client, mut events) = hybi::connect(&server.url("/"), config).unwrap();

    assert_eq!(
        next_event(&mut events).await,
        Event::Error(Error::HandshakeTimeout(Duration::from_millis(100)))
    );
    assert_eq!(client.state(), ConnectionState::Disconnected);
}

#[tokio::test]
async fn test_oversized_response_head_fails() {
    let server = TestServer::spawn(Script::accept()).await;
    let config = ClientConfig::new().with_max_handshake_size(16);
    let (client, mut events) = hybi::connect(&server.url("/"), config).unwrap();

    assert!(matches!(
        next_event(&mut events).await,
        Event::Error(Error::HandshakeTooLarge { max: 16, .. })
    ));
    assert_eq!(client.state(), ConnectionState::Disconnected);
    assert!(server.captured().await.received.is_empty());
}

#[tokio::test]
async fn test_bytes_after_head_do_not_count_toward_limit() {
    let script = Script::Accept {
        greeting: vec![0x82, 0x7E, 0x00, 0xC8].into_iter().chain([0u8; 200]).collect(),
        hang_up: false,
    };
    let server = TestServer::spawn(script).await;
    // Exactly the length of the scripted 101 response head.
    let config = ClientConfig::new().with_max_handshake_size(129);
    let (client, mut events) = hybi::connect(&server.url("/"), config).unwrap();

    assert_eq!(next_event(&mut events).await, Event::Connected);
    client.terminate();
}

#[tokio::test]
async fn test_connection_refused() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let (client, mut events) =
        hybi::connect(&format!("ws://{addr}/"), ClientConfig::default()).unwrap();

    assert!(matches!(next_event(&mut events).await, Event::Error(Error::Io(_))));
    assert_eq!(client.state(), ConnectionState::Disconnected);
}

#[tokio::test]
async fn test_invalid_url_fails_immediately() {
    let result = hybi::connect("wss://example.com/", ClientConfig::default());
    assert!(matches!(result, Err(Error::InvalidUrl(_))));
}

#[tokio::test]
async fn test_terminate_while_connecting() {
    let server = TestServer::spawn(Script::accept()).await;
    let (client, mut events) = hybi::connect(&server.url("/"), ClientConfig::default()).unwrap();

    client.terminate();

    // The upgrade still completes in the background and is closed on arrival.
    assert_eq!(next_event(&mut events).await, Event::Disconnected);
    assert_eq!(client.state(), ConnectionState::Disconnected);
    assert!(server.captured().await.received.is_empty());
}
