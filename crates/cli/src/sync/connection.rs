// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Connection lifecycle for the real-time socket.
//!
//! A [`Connection`] owns the single transport for one identity. It serializes
//! connect and disconnect: switching identity always closes the previous
//! transport before a new one is opened, so two identities never share or
//! overlap a socket. Connectivity failures are logged and demote the state to
//! [`ConnectionState::Disconnected`]; they are never fatal.

use std::fmt;
use std::marker::PhantomData;
use std::time::Duration;

use tokio::sync::watch;

use tidings_core::protocol::{ClientMessage, ServerMessage};
use tidings_core::Entity;

use super::transport::{Transport, TransportError, TransportResult};
use crate::auth::Identity;
use crate::config::ClientConfig;

/// State of the real-time connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Not connected.
    Disconnected,
    /// Attempting to connect.
    Connecting,
    /// Connected to the server.
    Connected,
}

impl ConnectionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Connected => "connected",
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Bounded exponential backoff for connection attempts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconnectPolicy {
    /// Attempts per connect (at least 1).
    pub max_retries: u32,
    /// Delay after the first failed attempt.
    pub initial_delay: Duration,
    /// Ceiling for the delay between attempts.
    pub max_delay: Duration,
}

impl ReconnectPolicy {
    pub fn from_config(config: &ClientConfig) -> Self {
        ReconnectPolicy {
            max_retries: config.reconnect_max_retries.max(1),
            initial_delay: Duration::from_millis(config.reconnect_initial_delay_ms),
            max_delay: Duration::from_secs(config.reconnect_max_delay_secs),
        }
    }

    /// Delay to wait after failed attempt number `attempt` (1-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        let delay = self.initial_delay.saturating_mul(1u32 << exponent);
        delay.min(self.max_delay)
    }
}

/// The single transport owned on behalf of one identity.
pub struct Connection<E: Entity, T: Transport<E>> {
    transport: T,
    policy: ReconnectPolicy,
    /// Identity the transport belongs to, kept across drops for reconnect.
    identity: Option<Identity>,
    state: watch::Sender<ConnectionState>,
    _entity: PhantomData<fn() -> E>,
}

impl<E: Entity, T: Transport<E>> Connection<E, T> {
    pub fn new(transport: T, policy: ReconnectPolicy) -> Self {
        let (state, _) = watch::channel(ConnectionState::Disconnected);
        Connection {
            transport,
            policy,
            identity: None,
            state,
            _entity: PhantomData,
        }
    }

    /// Get the current connection state.
    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    /// Subscribe to connection state changes.
    pub fn subscribe(&self) -> watch::Receiver<ConnectionState> {
        self.state.subscribe()
    }

    /// Check if connected.
    pub fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Connected && self.transport.is_connected()
    }

    /// Identity the connection was opened for.
    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    fn set_state(&self, next: ConnectionState) {
        self.state.send_if_modified(|current| {
            if *current == next {
                false
            } else {
                *current = next;
                true
            }
        });
    }

    /// Connect `identity` to `url` with bounded retry.
    ///
    /// A no-op for an invalid identity or when already connecting or connected
    /// for the same identity. A different identity's transport is closed first.
    /// Returns whether the connection is up afterwards.
    pub async fn connect(&mut self, identity: &Identity, url: &str, token: &str) -> bool {
        if !identity.is_valid() {
            tracing::debug!("connect skipped: no signed-in identity");
            return false;
        }

        if self.identity.as_ref() == Some(identity) {
            match self.state() {
                ConnectionState::Connected if self.transport.is_connected() => return true,
                ConnectionState::Connecting => return false,
                _ => {}
            }
        } else if self.identity.is_some() {
            self.disconnect().await;
        }

        self.identity = Some(identity.clone());
        self.set_state(ConnectionState::Connecting);

        let mut attempt = 0u32;
        loop {
            attempt = attempt.saturating_add(1);
            tracing::debug!(attempt, url, "connecting");

            match self.transport.connect(url, token).await {
                Ok(()) => {
                    tracing::info!(identity = %identity.id, "connected");
                    self.set_state(ConnectionState::Connected);
                    return true;
                }
                Err(e) if attempt >= self.policy.max_retries => {
                    tracing::warn!(attempts = attempt, error = %e, "giving up on connection");
                    self.set_state(ConnectionState::Disconnected);
                    return false;
                }
                Err(e) => {
                    let delay = self.policy.delay_for(attempt);
                    tracing::debug!(attempt, error = %e, ?delay, "connection attempt failed");
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    /// Close the transport and forget the identity. Safe to call repeatedly.
    pub async fn disconnect(&mut self) {
        if self.transport.is_connected() {
            if let Err(e) = self.transport.disconnect().await {
                tracing::debug!(error = %e, "error while closing transport");
            }
        }
        if self.identity.take().is_some() {
            tracing::info!("disconnected");
        }
        self.set_state(ConnectionState::Disconnected);
    }

    /// Record that the transport went away without forgetting the identity.
    fn mark_dropped(&mut self, reason: &str) {
        if self.state() != ConnectionState::Disconnected {
            tracing::warn!(reason, "connection lost");
        }
        self.set_state(ConnectionState::Disconnected);
    }

    /// Send a message; a failure demotes the connection.
    pub async fn send(&mut self, msg: ClientMessage) -> TransportResult<()> {
        if !self.is_connected() {
            return Err(TransportError::ConnectionClosed);
        }
        let result = self.transport.send(msg).await;
        if let Err(e) = &result {
            self.mark_dropped(&e.to_string());
        }
        result
    }

    /// Receive the next server message.
    ///
    /// Frames that fail to parse are logged and skipped. A closed or failed
    /// stream demotes the connection and yields `None`.
    pub async fn recv(&mut self) -> Option<ServerMessage<E>> {
        loop {
            if !self.is_connected() {
                self.mark_dropped("transport closed");
                return None;
            }
            match self.transport.recv().await {
                Ok(Some(msg)) => return Some(msg),
                Ok(None) => {
                    self.mark_dropped("closed by server");
                    return None;
                }
                Err(TransportError::SerializationError(e)) => {
                    tracing::warn!(error = %e, "skipping unparseable frame");
                }
                Err(e) => {
                    self.mark_dropped(&e.to_string());
                    return None;
                }
            }
        }
    }
}
