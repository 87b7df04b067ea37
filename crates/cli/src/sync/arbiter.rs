// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Transport/request arbitration.
//!
//! Every feed operation has one socket form and one request form with the
//! same semantics. The socket is tried first while connected; a rejected,
//! broken or unanswered socket round-trip falls back to the request form for
//! that operation only.

use std::fmt;
use std::time::Duration;

use tidings_core::protocol::{ClientMessage, ErrorCode, ServerMessage};
use tidings_core::{Entity, ListPage, ListQuery, Preferences, Stats};

use super::connection::{Connection, ConnectionState};
use super::request::{RequestResult, Requester};
use super::transport::{Transport, TransportError};

/// Which path serves an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Transport,
    Request,
}

impl Route {
    pub fn for_state(state: ConnectionState) -> Self {
        match state {
            ConnectionState::Connected => Route::Transport,
            ConnectionState::Connecting | ConnectionState::Disconnected => Route::Request,
        }
    }
}

/// A read or write against the feed.
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    List(ListQuery),
    MarkRead { id: String },
    MarkAllRead,
    Delete { id: String },
    Stats,
    GetPreferences,
    UpdatePreferences(Preferences),
}

impl Operation {
    /// Socket form of this operation.
    pub fn to_message(&self, request_id: u64) -> ClientMessage {
        match self {
            Operation::List(query) => ClientMessage::List {
                request_id,
                query: query.clone(),
            },
            Operation::MarkRead { id } => ClientMessage::MarkRead {
                request_id,
                id: id.clone(),
            },
            Operation::MarkAllRead => ClientMessage::MarkAllRead { request_id },
            Operation::Delete { id } => ClientMessage::Delete {
                request_id,
                id: id.clone(),
            },
            Operation::Stats => ClientMessage::GetStats { request_id },
            Operation::GetPreferences => ClientMessage::GetPreferences { request_id },
            Operation::UpdatePreferences(preferences) => ClientMessage::UpdatePreferences {
                request_id,
                preferences: preferences.clone(),
            },
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Operation::List(_) => "list",
            Operation::MarkRead { .. } => "mark_read",
            Operation::MarkAllRead => "mark_all_read",
            Operation::Delete { .. } => "delete",
            Operation::Stats => "stats",
            Operation::GetPreferences => "get_preferences",
            Operation::UpdatePreferences(_) => "update_preferences",
        }
    }

    /// Item the operation acts on, if it targets one.
    pub fn target(&self) -> Option<&str> {
        match self {
            Operation::MarkRead { id } | Operation::Delete { id } => Some(id.as_str()),
            _ => None,
        }
    }

    pub fn is_write(&self) -> bool {
        matches!(
            self,
            Operation::MarkRead { .. }
                | Operation::MarkAllRead
                | Operation::Delete { .. }
                | Operation::UpdatePreferences(_)
        )
    }
}

/// Result of an operation, independent of the path that served it.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<E: Entity> {
    Page(ListPage<E>),
    Done,
    Stats(Stats),
    Preferences(Preferences),
}

/// Why a socket round-trip did not produce an outcome.
#[derive(Debug)]
pub enum TransportFailure {
    /// The server answered with an error for this request.
    Rejected { code: ErrorCode, message: String },
    /// The socket failed; the connection has been demoted.
    Broken(TransportError),
    /// No reply arrived within the ack timeout.
    TimedOut,
    /// The reply did not match the operation.
    Mismatched(&'static str),
}

impl fmt::Display for TransportFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportFailure::Rejected { code, message } => {
                write!(f, "rejected ({:?}): {}", code, message)
            }
            TransportFailure::Broken(e) => write!(f, "{}", e),
            TransportFailure::TimedOut => write!(f, "timed out waiting for reply"),
            TransportFailure::Mismatched(op) => write!(f, "mismatched reply to {}", op),
        }
    }
}

/// Runs operations over either path.
#[derive(Debug)]
pub struct Arbiter {
    ack_timeout: Duration,
    next_request_id: u64,
}

impl Arbiter {
    pub fn new(ack_timeout: Duration) -> Self {
        Arbiter {
            ack_timeout,
            next_request_id: 0,
        }
    }

    fn allocate_request_id(&mut self) -> u64 {
        self.next_request_id += 1;
        self.next_request_id
    }

    /// Emit `op` on the socket and wait for its reply.
    ///
    /// Messages that are not the reply (pushes, late replies to earlier
    /// requests) are handed to `on_push` in arrival order.
    pub async fn via_transport<E, T, F>(
        &mut self,
        connection: &mut Connection<E, T>,
        op: &Operation,
        mut on_push: F,
    ) -> Result<Outcome<E>, TransportFailure>
    where
        E: Entity,
        T: Transport<E>,
        F: FnMut(ServerMessage<E>),
    {
        let request_id = self.allocate_request_id();
        connection
            .send(op.to_message(request_id))
            .await
            .map_err(TransportFailure::Broken)?;
        tracing::trace!(request_id, op = op.name(), "sent");

        let wait = async {
            loop {
                let Some(msg) = connection.recv().await else {
                    return Err(TransportFailure::Broken(TransportError::ConnectionClosed));
                };
                if msg.reply_to() == Some(request_id) {
                    return reply_outcome(op, msg);
                }
                on_push(msg);
            }
        };

        match tokio::time::timeout(self.ack_timeout, wait).await {
            Ok(result) => result,
            Err(_) => Err(TransportFailure::TimedOut),
        }
    }

    /// Run `op` as a request/response call.
    pub async fn via_request<E, R>(
        &self,
        requester: &R,
        token: &str,
        op: &Operation,
    ) -> RequestResult<Outcome<E>>
    where
        E: Entity,
        R: Requester<E> + ?Sized,
    {
        match op {
            Operation::List(query) => requester.list(token, query).await.map(Outcome::Page),
            Operation::MarkRead { id } => requester
                .mark_read(token, id)
                .await
                .map(|()| Outcome::Done),
            Operation::MarkAllRead => requester
                .mark_all_read(token)
                .await
                .map(|()| Outcome::Done),
            Operation::Delete { id } => requester.delete(token, id).await.map(|()| Outcome::Done),
            Operation::Stats => requester.stats(token).await.map(Outcome::Stats),
            Operation::GetPreferences => requester
                .preferences(token)
                .await
                .map(Outcome::Preferences),
            Operation::UpdatePreferences(preferences) => requester
                .update_preferences(token, preferences)
                .await
                .map(Outcome::Preferences),
        }
    }
}

fn reply_outcome<E: Entity>(
    op: &Operation,
    msg: ServerMessage<E>,
) -> Result<Outcome<E>, TransportFailure> {
    match (op, msg) {
        (_, ServerMessage::Error { code, message, .. }) => {
            Err(TransportFailure::Rejected { code, message })
        }
        (Operation::List(_), ServerMessage::List { page, .. }) => Ok(Outcome::Page(page)),
        (Operation::Stats, ServerMessage::Stats { stats, .. }) => Ok(Outcome::Stats(stats)),
        (
            Operation::GetPreferences | Operation::UpdatePreferences(_),
            ServerMessage::Preferences { preferences, .. },
        ) => Ok(Outcome::Preferences(preferences)),
        (Operation::UpdatePreferences(preferences), ServerMessage::Ack { .. }) => {
            Ok(Outcome::Preferences(preferences.clone()))
        }
        (
            Operation::MarkRead { .. } | Operation::MarkAllRead | Operation::Delete { .. },
            ServerMessage::Ack { .. },
        ) => Ok(Outcome::Done),
        (op, _) => Err(TransportFailure::Mismatched(op.name())),
    }
}
