//! End-to-end session tests: a real server on a loopback socket, driven
//! by real clients from test threads.

#![cfg(unix)]

use std::net::SocketAddr;
use std::thread::JoinHandle;

use bytes::Bytes;

use chatwire_session::{ChatClient, ChatServer, Event, SessionError, ShutdownHandle};

struct TestServer {
    addr: SocketAddr,
    shutdown: ShutdownHandle,
    thread: JoinHandle<chatwire_session::Result<()>>,
}

impl TestServer {
    fn start() -> Self {
        let (server, shutdown) = ChatServer::bind("127.0.0.1:0").expect("bind");
        let addr = server.local_addr();
        let thread = std::thread::spawn(move || server.run());
        Self {
            addr,
            shutdown,
            thread,
        }
    }

    fn stop(self) {
        self.shutdown.shutdown();
        self.thread.join().expect("server panicked").expect("server failed");
    }
}

fn connect(server: &TestServer, name: &str) -> ChatClient {
    ChatClient::connect(server.addr, name.as_bytes().to_vec()).expect("connect")
}

#[test]
fn targeted_message_reaches_recipient() {
    let server = TestServer::start();
    let mut alice = connect(&server, "alice");
    let mut bob = connect(&server, "bob");

    alice
        .send_message(&[Bytes::from_static(b"bob")], b"hello bob")
        .unwrap();

    assert_eq!(
        bob.next_event().unwrap(),
        Event::Message {
            sender: Bytes::from_static(b"alice"),
            text: Bytes::from_static(b"hello bob"),
        }
    );
    server.stop();
}

#[test]
fn duplicate_name_is_rejected() {
    let server = TestServer::start();
    let _alice = connect(&server, "alice");

    let err = ChatClient::connect(server.addr, &b"alice"[..]).unwrap_err();
    assert!(matches!(err, SessionError::HandleInUse));

    // The original holder is unaffected and can still be reached.
    let mut bob = connect(&server, "bob");
    bob.send_message(&[Bytes::from_static(b"alice")], b"still there?")
        .unwrap();
    server.stop();
}

#[test]
fn broadcast_excludes_sender() {
    let server = TestServer::start();
    let mut alice = connect(&server, "alice");
    let mut bob = connect(&server, "bob");
    let mut carol = connect(&server, "carol");

    bob.send_broadcast(b"all hands").unwrap();

    for peer in [&mut alice, &mut carol] {
        assert_eq!(
            peer.next_event().unwrap(),
            Event::Broadcast {
                sender: Bytes::from_static(b"bob"),
                text: Bytes::from_static(b"all hands"),
            }
        );
    }
    // Bob never hears his own broadcast; prove the stream moved past it
    // by sending him something observable.
    alice
        .send_message(&[Bytes::from_static(b"bob")], b"marker")
        .unwrap();
    assert_eq!(
        bob.next_event().unwrap(),
        Event::Message {
            sender: Bytes::from_static(b"alice"),
            text: Bytes::from_static(b"marker"),
        }
    );
    server.stop();
}

#[test]
fn unknown_recipient_does_not_abort_delivery() {
    let server = TestServer::start();
    let mut alice = connect(&server, "alice");
    let mut bob = connect(&server, "bob");
    let mut carol = connect(&server, "carol");

    alice
        .send_message(
            &[
                Bytes::from_static(b"bob"),
                Bytes::from_static(b"ghost"),
                Bytes::from_static(b"carol"),
            ],
            b"partial",
        )
        .unwrap();

    assert!(matches!(bob.next_event().unwrap(), Event::Message { .. }));
    assert!(matches!(carol.next_event().unwrap(), Event::Message { .. }));
    assert_eq!(
        alice.next_event().unwrap(),
        Event::UnknownRecipient {
            name: Bytes::from_static(b"ghost"),
        }
    );
    server.stop();
}

#[test]
fn listing_reflects_joins_and_exits() {
    let server = TestServer::start();
    let mut alice = connect(&server, "alice");
    let mut bob = connect(&server, "bob");
    let _carol = connect(&server, "carol");

    alice.request_listing().unwrap();
    assert_eq!(
        alice.next_event().unwrap(),
        Event::Listing(vec![
            Bytes::from_static(b"alice"),
            Bytes::from_static(b"bob"),
            Bytes::from_static(b"carol"),
        ])
    );

    // Exit is acknowledged before the server tears the connection down.
    bob.send_exit().unwrap();
    assert_eq!(bob.next_event().unwrap(), Event::ExitAcknowledged);
    assert_eq!(bob.next_event().unwrap(), Event::ServerClosed);

    alice.request_listing().unwrap();
    assert_eq!(
        alice.next_event().unwrap(),
        Event::Listing(vec![
            Bytes::from_static(b"alice"),
            Bytes::from_static(b"carol"),
        ])
    );
    server.stop();
}

#[test]
fn departed_name_can_be_claimed_again() {
    let server = TestServer::start();
    let mut alice = connect(&server, "alice");
    alice.send_exit().unwrap();
    assert_eq!(alice.next_event().unwrap(), Event::ExitAcknowledged);
    assert_eq!(alice.next_event().unwrap(), Event::ServerClosed);

    let mut reborn = connect(&server, "alice");
    reborn.request_listing().unwrap();
    assert_eq!(
        reborn.next_event().unwrap(),
        Event::Listing(vec![Bytes::from_static(b"alice")])
    );
    server.stop();
}

#[test]
fn long_text_arrives_in_order_across_frames() {
    let server = TestServer::start();
    let mut alice = connect(&server, "alice");
    let mut bob = connect(&server, "bob");

    let mut text = Vec::new();
    for i in 0..2500u32 {
        text.push((i % 251) as u8);
    }
    alice
        .send_message(&[Bytes::from_static(b"bob")], &text)
        .unwrap();

    let mut received = Vec::new();
    while received.len() < text.len() {
        match bob.next_event().unwrap() {
            Event::Message { sender, text } => {
                assert_eq!(sender, Bytes::from_static(b"alice"));
                received.extend_from_slice(&text);
            }
            other => panic!("expected message, got {other:?}"),
        }
    }
    assert_eq!(received, text);
    server.stop();
}

#[test]
fn binary_names_and_text_survive_transit() {
    let server = TestServer::start();
    let raw_name: &[u8] = &[0xff, 0x00, 0x80, b'!'];
    let mut weird = ChatClient::connect(server.addr, raw_name).expect("connect");
    let mut bob = connect(&server, "bob");

    weird
        .send_message(&[Bytes::from_static(b"bob")], &[0x00, 0x01, 0xff, 0x00])
        .unwrap();
    assert_eq!(
        bob.next_event().unwrap(),
        Event::Message {
            sender: Bytes::copy_from_slice(raw_name),
            text: Bytes::from_static(&[0x00, 0x01, 0xff, 0x00]),
        }
    );
    server.stop();
}

#[test]
fn abrupt_disconnect_unregisters_client() {
    let server = TestServer::start();
    let mut alice = connect(&server, "alice");
    let bob = connect(&server, "bob");

    // Bob vanishes without an exit exchange.
    bob.shutdown().unwrap();
    drop(bob);

    // Poll the listing until the server has noticed the dead socket.
    let deadline = std::time::Instant::now() + std::time::Duration::from_secs(5);
    loop {
        alice.request_listing().unwrap();
        match alice.next_event().unwrap() {
            Event::Listing(names) if names == vec![Bytes::from_static(b"alice")] => break,
            Event::Listing(_) if std::time::Instant::now() < deadline => {
                std::thread::sleep(std::time::Duration::from_millis(10));
            }
            other => panic!("bob never unregistered: {other:?}"),
        }
    }
    server.stop();
}

#[test]
fn shutdown_closes_connected_clients() {
    let server = TestServer::start();
    let mut alice = connect(&server, "alice");

    server.stop();
    assert_eq!(alice.next_event().unwrap(), Event::ServerClosed);
}
