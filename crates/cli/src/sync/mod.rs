// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Real-time feed synchronization.
//!
//! Mirrors a server-owned feed over a WebSocket, falling back to HTTP
//! requests whenever the socket is unavailable.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │   Client    │────►│  Arbiter    │────►│ Connection  │──► Transport (socket)
//! │ (SyncClient)│     │             │────►│ Requester   │──► HTTP
//! └─────────────┘     └─────────────┘     └─────────────┘
//!        │
//!        ▼
//! ┌─────────────┐     ┌─────────────┐
//! │    Feed     │────►│  FeedView   │  (watch channel)
//! │  (mirror)   │     │             │
//! └─────────────┘     └─────────────┘
//! ```
//!
//! # Features
//!
//! - One socket per signed-in identity, torn down on sign-out
//! - Bounded reconnect with exponential backoff
//! - Optimistic writes with per-operation request fallback
//! - Sequence-guarded list responses
//! - Injectable transport and requester traits for testing

mod arbiter;
mod client;
mod connection;
mod feed;
mod request;
mod throttle;
mod transport;
mod view;

pub use arbiter::{Arbiter, Operation, Outcome, Route, TransportFailure};
pub use client::SyncClient;
pub use connection::{Connection, ConnectionState, ReconnectPolicy};
pub use feed::{BatchToken, Feed, MutationToken, RemovalToken, RequestSeq};
pub use request::{classify_status, HttpRequester, RequestError, RequestResult, Requester};
pub use throttle::RefreshThrottle;
pub use transport::{Transport, TransportError, TransportResult, WebSocketTransport};
pub use view::FeedView;

#[cfg(test)]
pub(crate) mod test_helpers;


#[cfg(test)]
mod client_tests;





#[cfg(test)]
pub(crate) mod transport_tests;
