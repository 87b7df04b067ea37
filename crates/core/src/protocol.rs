// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! WebSocket protocol messages for client-server communication.
//!
//! Every frame is a JSON object `{"event": ..., "payload": ...}`. Client
//! requests carry a `request_id` that the server echoes on its reply
//! (`ack`, `error`, or a data response); everything else the server sends is
//! an unsolicited push.

use serde::{Deserialize, Serialize};

use crate::entity::Entity;
use crate::records::{ListPage, ListQuery, Preferences, Stats};

/// Messages sent from client to server.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "event", content = "payload", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Request one page of the feed.
    List { request_id: u64, query: ListQuery },

    /// Mark one item read.
    MarkRead { request_id: u64, id: String },

    /// Mark every item read.
    MarkAllRead { request_id: u64 },

    /// Delete one item.
    Delete { request_id: u64, id: String },

    /// Request aggregate stats.
    GetStats { request_id: u64 },

    /// Request delivery preferences.
    GetPreferences { request_id: u64 },

    /// Replace delivery preferences.
    UpdatePreferences {
        request_id: u64,
        preferences: Preferences,
    },
}

impl ClientMessage {
    /// The id the server will echo on its reply.
    pub fn request_id(&self) -> u64 {
        match self {
            ClientMessage::List { request_id, .. }
            | ClientMessage::MarkRead { request_id, .. }
            | ClientMessage::MarkAllRead { request_id }
            | ClientMessage::Delete { request_id, .. }
            | ClientMessage::GetStats { request_id }
            | ClientMessage::GetPreferences { request_id }
            | ClientMessage::UpdatePreferences { request_id, .. } => *request_id,
        }
    }

    /// Serializes the message to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserializes the message from JSON.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

/// Error categories reported by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    Unauthorized,
    NotFound,
    Conflict,
    Invalid,
    Internal,
    #[serde(other)]
    Unknown,
}

/// Messages sent from server to client.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(
    tag = "event",
    content = "payload",
    rename_all = "snake_case",
    bound = ""
)]
pub enum ServerMessage<E: Entity> {
    /// A page of items. Unsolicited when `request_id` is absent (initial
    /// snapshot pushed on connect).
    List {
        #[serde(default)]
        request_id: Option<u64>,
        page: ListPage<E>,
    },

    /// A new item.
    Created { item: E },

    /// A partial update to an existing item.
    Updated { id: String, patch: E::Patch },

    /// An item was removed.
    Deleted { id: String },

    /// The unread counter changed.
    Counter { count: u64 },

    /// Aggregate stats.
    Stats {
        #[serde(default)]
        request_id: Option<u64>,
        stats: Stats,
    },

    /// Delivery preferences.
    Preferences {
        #[serde(default)]
        request_id: Option<u64>,
        preferences: Preferences,
    },

    /// A request succeeded without a data response.
    Ack { request_id: u64 },

    /// A request failed, or a connection-level error occurred.
    Error {
        #[serde(default)]
        request_id: Option<u64>,
        code: ErrorCode,
        message: String,
    },
}

impl<E: Entity> ServerMessage<E> {
    /// Creates an Ack message.
    pub fn ack(request_id: u64) -> Self {
        ServerMessage::Ack { request_id }
    }

    /// Creates an Error reply to a request.
    pub fn error(request_id: u64, code: ErrorCode, message: impl Into<String>) -> Self {
        ServerMessage::Error {
            request_id: Some(request_id),
            code,
            message: message.into(),
        }
    }

    /// Creates a list reply to a request.
    pub fn list_reply(request_id: u64, page: ListPage<E>) -> Self {
        ServerMessage::List {
            request_id: Some(request_id),
            page,
        }
    }

    /// Creates an Updated push.
    pub fn updated(id: impl Into<String>, patch: E::Patch) -> Self {
        ServerMessage::Updated {
            id: id.into(),
            patch,
        }
    }

    /// The request this message answers, if any.
    pub fn reply_to(&self) -> Option<u64> {
        match self {
            ServerMessage::List { request_id, .. }
            | ServerMessage::Stats { request_id, .. }
            | ServerMessage::Preferences { request_id, .. }
            | ServerMessage::Error { request_id, .. } => *request_id,
            ServerMessage::Ack { request_id } => Some(*request_id),
            ServerMessage::Created { .. }
            | ServerMessage::Updated { .. }
            | ServerMessage::Deleted { .. }
            | ServerMessage::Counter { .. } => None,
        }
    }

    /// Serializes the message to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserializes the message from JSON.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

#[cfg(test)]
#[path = "protocol_tests.rs"]
mod tests;
