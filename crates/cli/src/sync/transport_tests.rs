// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Tests for the transport module.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use super::connection::ConnectionState;
use super::transport::{Transport, TransportError, TransportResult};
use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use tidings_core::protocol::{ClientMessage, ServerMessage};
use tidings_core::{Entity, Notification};
use tokio::sync::watch;

type Responder<E> = Arc<dyn Fn(&ClientMessage) -> Vec<ServerMessage<E>> + Send + Sync>;

struct MockState<E: Entity> {
    connected: bool,
    /// Messages that will be returned by recv().
    incoming: VecDeque<ServerMessage<E>>,
    /// Messages that were sent via send().
    outgoing: Vec<ClientMessage>,
    /// (url, token) of every connect attempt.
    connects: Vec<(String, String)>,
    /// Number of upcoming connect attempts that fail.
    failing_connects: u32,
    /// Whether send() breaks the connection.
    send_fails: bool,
    /// Whether recv() reports a server close once `incoming` is drained.
    close_when_drained: bool,
    /// Produces server replies for each sent message.
    responder: Option<Responder<E>>,
    /// Connection state seen at each connect attempt.
    observer: Option<watch::Receiver<ConnectionState>>,
    observed: Vec<ConnectionState>,
}

/// Mock transport for testing without real sockets.
///
/// Clones share state, so a test can keep a handle after moving the
/// transport into a client.
pub struct MockTransport<E: Entity = Notification> {
    state: Arc<Mutex<MockState<E>>>,
}

impl<E: Entity> Clone for MockTransport<E> {
    fn clone(&self) -> Self {
        MockTransport {
            state: Arc::clone(&self.state),
        }
    }
}

impl<E: Entity> MockTransport<E> {
    pub fn new() -> Self {
        MockTransport {
            state: Arc::new(Mutex::new(MockState {
                connected: false,
                incoming: VecDeque::new(),
                outgoing: Vec::new(),
                connects: Vec::new(),
                failing_connects: 0,
                send_fails: false,
                close_when_drained: false,
                responder: None,
                observer: None,
                observed: Vec::new(),
            })),
        }
    }

    /// Add a message that will be returned by recv().
    pub fn queue_incoming(&self, msg: ServerMessage<E>) {
        self.state.lock().unwrap().incoming.push_back(msg);
    }

    /// Get all messages that were sent.
    pub fn get_outgoing(&self) -> Vec<ClientMessage> {
        self.state.lock().unwrap().outgoing.clone()
    }

    /// (url, token) pairs of every connect attempt.
    pub fn connects(&self) -> Vec<(String, String)> {
        self.state.lock().unwrap().connects.clone()
    }

    /// Make the next `count` connect attempts fail.
    pub fn fail_next_connects(&self, count: u32) {
        self.state.lock().unwrap().failing_connects = count;
    }

    /// Set whether send breaks the connection.
    pub fn set_send_fail(&self, fail: bool) {
        self.state.lock().unwrap().send_fails = fail;
    }

    /// Reply to every sent message with the messages `f` returns.
    pub fn respond_with<F>(&self, f: F)
    where
        F: Fn(&ClientMessage) -> Vec<ServerMessage<E>> + Send + Sync + 'static,
    {
        self.state.lock().unwrap().responder = Some(Arc::new(f));
    }

    /// Acknowledge every sent message.
    pub fn ack_all(&self) {
        self.respond_with(|msg| vec![ServerMessage::ack(msg.request_id())]);
    }

    /// Record the connection state at each connect attempt.
    pub fn observe(&self, rx: watch::Receiver<ConnectionState>) {
        self.state.lock().unwrap().observer = Some(rx);
    }

    pub fn observed_states(&self) -> Vec<ConnectionState> {
        self.state.lock().unwrap().observed.clone()
    }

    /// Report a server close once queued messages are consumed. Until then
    /// recv() waits forever on an empty queue, like an idle socket.
    pub fn close_when_drained(&self) {
        self.state.lock().unwrap().close_when_drained = true;
    }

    /// Simulate the server dropping the socket.
    pub fn drop_connection(&self) {
        let mut state = self.state.lock().unwrap();
        state.connected = false;
        state.incoming.clear();
    }
}

impl<E: Entity> Transport<E> for MockTransport<E> {
    fn connect(
        &mut self,
        url: &str,
        token: &str,
    ) -> Pin<Box<dyn Future<Output = TransportResult<()>> + Send + '_>> {
        let state = Arc::clone(&self.state);
        let attempt = (url.to_string(), token.to_string());
        Box::pin(async move {
            let mut state = state.lock().unwrap();
            state.connects.push(attempt);
            if let Some(observed) = state.observer.as_ref().map(|rx| *rx.borrow()) {
                state.observed.push(observed);
            }
            if state.failing_connects > 0 {
                state.failing_connects -= 1;
                Err(TransportError::ConnectionFailed("mock failure".into()))
            } else {
                state.connected = true;
                Ok(())
            }
        })
    }

    fn disconnect(&mut self) -> Pin<Box<dyn Future<Output = TransportResult<()>> + Send + '_>> {
        let state = Arc::clone(&self.state);
        Box::pin(async move {
            state.lock().unwrap().connected = false;
            Ok(())
        })
    }

    fn send(
        &mut self,
        msg: ClientMessage,
    ) -> Pin<Box<dyn Future<Output = TransportResult<()>> + Send + '_>> {
        let state = Arc::clone(&self.state);
        Box::pin(async move {
            let mut state = state.lock().unwrap();
            if !state.connected {
                return Err(TransportError::ConnectionClosed);
            }
            if state.send_fails {
                state.connected = false;
                return Err(TransportError::SendFailed("mock failure".into()));
            }
            if let Some(responder) = state.responder.clone() {
                state.incoming.extend(responder(&msg));
            }
            state.outgoing.push(msg);
            Ok(())
        })
    }

    fn recv(
        &mut self,
    ) -> Pin<Box<dyn Future<Output = TransportResult<Option<ServerMessage<E>>>> + Send + '_>> {
        let state = Arc::clone(&self.state);
        Box::pin(async move {
            let next = {
                let mut state = state.lock().unwrap();
                if !state.connected {
                    return Err(TransportError::ConnectionClosed);
                }
                match state.incoming.pop_front() {
                    Some(msg) => Some(msg),
                    None if state.close_when_drained => {
                        state.connected = false;
                        return Ok(None);
                    }
                    None => None,
                }
            };
            match next {
                Some(msg) => Ok(Some(msg)),
                None => std::future::pending().await,
            }
        })
    }

    fn is_connected(&self) -> bool {
        self.state.lock().unwrap().connected
    }
}

#[tokio::test]
async fn test_mock_transport_connect() {
    let mut transport = MockTransport::<Notification>::new();
    assert!(!transport.is_connected());

    transport.connect("ws://localhost:1234", "t").await.unwrap();
    assert!(transport.is_connected());
    assert_eq!(
        transport.connects(),
        vec![("ws://localhost:1234".to_string(), "t".to_string())]
    );

    transport.disconnect().await.unwrap();
    assert!(!transport.is_connected());
}

#[tokio::test]
async fn test_mock_transport_send_recv() {
    let mut transport = MockTransport::<Notification>::new();
    transport.ack_all();
    transport.connect("ws://localhost:1234", "t").await.unwrap();

    transport
        .send(ClientMessage::MarkAllRead { request_id: 42 })
        .await
        .unwrap();

    let outgoing = transport.get_outgoing();
    assert_eq!(outgoing.len(), 1);
    assert!(matches!(
        outgoing[0],
        ClientMessage::MarkAllRead { request_id: 42 }
    ));

    let received = transport.recv().await.unwrap();
    assert_eq!(received, Some(ServerMessage::ack(42)));

    // Drained queue reads as a server close
    transport.close_when_drained();
    let received = transport.recv().await.unwrap();
    assert!(received.is_none());
    assert!(!transport.is_connected());
}

#[tokio::test]
async fn test_mock_transport_send_when_disconnected_fails() {
    let mut transport = MockTransport::<Notification>::new();
    let result = transport
        .send(ClientMessage::GetStats { request_id: 1 })
        .await;
    assert!(matches!(result, Err(TransportError::ConnectionClosed)));
    assert!(transport.get_outgoing().is_empty());
}

#[tokio::test]
async fn test_mock_transport_connect_failures_are_counted() {
    let mut transport = MockTransport::<Notification>::new();
    transport.fail_next_connects(1);

    assert!(transport.connect("ws://x", "t").await.is_err());
    assert!(transport.connect("ws://x", "t").await.is_ok());
    assert_eq!(transport.connects().len(), 2);
}
