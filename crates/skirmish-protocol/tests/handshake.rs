//! Integration tests for the opening version handshake.

use std::time::Duration;

use skirmish_codec::TxBuffer;
use skirmish_protocol::{
    perform_version_handshake, Message, ProtocolError, Version, PROTOCOL_VERSION,
};
use skirmish_transport::{MessageTransport, TransportError, POLL_INTERVAL};
use tokio::net::TcpListener;

async fn transport_pair() -> (MessageTransport, MessageTransport) {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr").to_string();
    let (client, accepted) = tokio::join!(MessageTransport::connect(&addr), async {
        let (stream, _) = listener.accept().await.expect("accept");
        MessageTransport::new(stream)
    });
    (client.expect("connect"), accepted)
}

/// Keeps a transport's buffers moving while the other side handshakes.
async fn pump(transport: &mut MessageTransport) {
    for _ in 0..200 {
        transport.poll().expect("poll");
        tokio::time::sleep(POLL_INTERVAL).await;
    }
}

#[tokio::test]
async fn test_both_sides_handshake_successfully() {
    let (mut client, mut server) = transport_pair().await;

    let (client_result, server_result) = tokio::join!(
        perform_version_handshake(&mut client, Duration::from_secs(5)),
        perform_version_handshake(&mut server, Duration::from_secs(5)),
    );
    assert_eq!(client_result.expect("client side"), PROTOCOL_VERSION);
    assert_eq!(server_result.expect("server side"), PROTOCOL_VERSION);
}

#[tokio::test]
async fn test_incompatible_minor_version_is_refused() {
    let (mut client, mut server) = transport_pair().await;

    let mut hello = TxBuffer::new();
    hello.write(&Message::Version {
        version: Version::new(PROTOCOL_VERSION.major, PROTOCOL_VERSION.minor + 1, 0),
    });
    client.send(&hello);

    let (result, ()) = tokio::join!(
        perform_version_handshake(&mut server, Duration::from_secs(5)),
        pump(&mut client),
    );
    assert!(matches!(
        result,
        Err(ProtocolError::IncompatibleVersion { .. })
    ));
}

#[tokio::test]
async fn test_non_version_first_message_is_unexpected() {
    let (mut client, mut server) = transport_pair().await;

    let mut greeting = TxBuffer::new();
    greeting.write(&Message::Echo {
        text: "hi".to_string(),
    });
    client.send(&greeting);

    let (result, ()) = tokio::join!(
        perform_version_handshake(&mut server, Duration::from_secs(5)),
        pump(&mut client),
    );
    assert!(matches!(
        result,
        Err(ProtocolError::UnexpectedMessage { .. })
    ));
}

#[tokio::test]
async fn test_silent_peer_times_the_handshake_out() {
    let (_client, mut server) = transport_pair().await;

    let result = perform_version_handshake(&mut server, Duration::from_millis(50)).await;
    assert!(matches!(
        result,
        Err(ProtocolError::Transport(TransportError::Timeout))
    ));
}
