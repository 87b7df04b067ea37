// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Feed entity types.
//!
//! A feed is a server-owned, ordered collection of items identified by a
//! server-issued string id. Every item kind implements [`Entity`], which tells
//! the sync layer how to merge partial updates, which single fields may be
//! changed optimistically, and whether an item counts toward the unread badge.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// An item kind that can be mirrored from a server feed.
pub trait Entity:
    Clone + fmt::Debug + PartialEq + Serialize + DeserializeOwned + Send + Sync + 'static
{
    /// Resource name used as the socket sub-path and REST collection path.
    const RESOURCE: &'static str;

    /// Shallow partial update pushed by the server.
    type Patch: Clone + fmt::Debug + PartialEq + Serialize + DeserializeOwned + Send + Sync + 'static;

    /// A single mutable field paired with a value.
    type Field: Clone + fmt::Debug + PartialEq + Send + Sync + 'static;

    /// Server-issued unique id.
    fn id(&self) -> &str;

    /// Whether this item counts toward the unread counter.
    fn is_unread(&self) -> bool;

    /// Merges the fields present in `patch` into this item.
    fn apply_patch(&mut self, patch: &Self::Patch);

    /// Returns the current value of the field named by `field`.
    fn field_value(&self, field: &Self::Field) -> Self::Field;

    /// Writes `value` into the matching field.
    fn write_field(&mut self, value: &Self::Field);

    /// Whether `patch` sets the same field as `field`.
    fn patch_touches(patch: &Self::Patch, field: &Self::Field) -> bool;

    /// The field value that marks an item as read.
    fn mark_read_field() -> Self::Field;

    /// Writes `value` and returns the value it replaced.
    fn set_field(&mut self, value: &Self::Field) -> Self::Field {
        let previous = self.field_value(value);
        self.write_field(value);
        previous
    }
}

/// A user notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: String,
    /// Notification category (e.g. "session_request", "message").
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
    /// Free-form payload attached by the server (deep-link targets etc).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl Notification {
    /// Creates an unread notification created now.
    pub fn new(id: impl Into<String>, kind: impl Into<String>, title: impl Into<String>) -> Self {
        Notification {
            id: id.into(),
            kind: kind.into(),
            title: title.into(),
            body: String::new(),
            is_read: false,
            created_at: Utc::now(),
            data: None,
        }
    }

    /// Builder-style setter for the read flag.
    pub fn read(mut self, is_read: bool) -> Self {
        self.is_read = is_read;
        self
    }
}

/// Partial update to a [`Notification`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_read: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl NotificationPatch {
    /// A patch that only sets the read flag.
    pub fn read(is_read: bool) -> Self {
        NotificationPatch {
            is_read: Some(is_read),
            ..Default::default()
        }
    }
}

/// Optimistically mutable notification fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationField {
    Read(bool),
}

impl Entity for Notification {
    const RESOURCE: &'static str = "notifications";

    type Patch = NotificationPatch;
    type Field = NotificationField;

    fn id(&self) -> &str {
        &self.id
    }

    fn is_unread(&self) -> bool {
        !self.is_read
    }

    fn apply_patch(&mut self, patch: &NotificationPatch) {
        if let Some(is_read) = patch.is_read {
            self.is_read = is_read;
        }
        if let Some(title) = &patch.title {
            self.title = title.clone();
        }
        if let Some(body) = &patch.body {
            self.body = body.clone();
        }
        if let Some(data) = &patch.data {
            self.data = Some(data.clone());
        }
    }

    fn field_value(&self, field: &NotificationField) -> NotificationField {
        match field {
            NotificationField::Read(_) => NotificationField::Read(self.is_read),
        }
    }

    fn write_field(&mut self, value: &NotificationField) {
        match value {
            NotificationField::Read(is_read) => self.is_read = *is_read,
        }
    }

    fn patch_touches(patch: &NotificationPatch, field: &NotificationField) -> bool {
        match field {
            NotificationField::Read(_) => patch.is_read.is_some(),
        }
    }

    fn mark_read_field() -> NotificationField {
        NotificationField::Read(true)
    }
}

/// Lifecycle status of a mentoring session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// Requested by the mentee, awaiting the mentor.
    Pending,
    /// Accepted by the mentor.
    Accepted,
    /// Declined by the mentor.
    Declined,
    /// Took place.
    Completed,
    /// Called off by either party.
    Cancelled,
}

impl SessionStatus {
    /// Returns the string representation used on the wire and in display.
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Pending => "pending",
            SessionStatus::Accepted => "accepted",
            SessionStatus::Declined => "declined",
            SessionStatus::Completed => "completed",
            SessionStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SessionStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(SessionStatus::Pending),
            "accepted" => Ok(SessionStatus::Accepted),
            "declined" => Ok(SessionStatus::Declined),
            "completed" => Ok(SessionStatus::Completed),
            "cancelled" | "canceled" => Ok(SessionStatus::Cancelled),
            _ => Err(Error::InvalidStatus(s.to_string())),
        }
    }
}

/// A mentoring session record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: String,
    pub mentor_id: String,
    pub mentee_id: String,
    #[serde(default)]
    pub topic: String,
    pub status: SessionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheduled_at: Option<DateTime<Utc>>,
    /// Whether the current user has looked at the latest change.
    #[serde(default)]
    pub is_seen: bool,
    pub created_at: DateTime<Utc>,
}

impl Session {
    /// Creates an unseen pending session created now.
    pub fn new(
        id: impl Into<String>,
        mentor_id: impl Into<String>,
        mentee_id: impl Into<String>,
    ) -> Self {
        Session {
            id: id.into(),
            mentor_id: mentor_id.into(),
            mentee_id: mentee_id.into(),
            topic: String::new(),
            status: SessionStatus::Pending,
            scheduled_at: None,
            is_seen: false,
            created_at: Utc::now(),
        }
    }
}

/// Partial update to a [`Session`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<SessionStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_seen: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheduled_at: Option<DateTime<Utc>>,
}

/// Optimistically mutable session fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionField {
    Seen(bool),
    Status(SessionStatus),
}

impl Entity for Session {
    const RESOURCE: &'static str = "sessions";

    type Patch = SessionPatch;
    type Field = SessionField;

    fn id(&self) -> &str {
        &self.id
    }

    fn is_unread(&self) -> bool {
        !self.is_seen
    }

    fn apply_patch(&mut self, patch: &SessionPatch) {
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(is_seen) = patch.is_seen {
            self.is_seen = is_seen;
        }
        if let Some(topic) = &patch.topic {
            self.topic = topic.clone();
        }
        if let Some(scheduled_at) = patch.scheduled_at {
            self.scheduled_at = Some(scheduled_at);
        }
    }

    fn field_value(&self, field: &SessionField) -> SessionField {
        match field {
            SessionField::Seen(_) => SessionField::Seen(self.is_seen),
            SessionField::Status(_) => SessionField::Status(self.status),
        }
    }

    fn write_field(&mut self, value: &SessionField) {
        match value {
            SessionField::Seen(is_seen) => self.is_seen = *is_seen,
            SessionField::Status(status) => self.status = *status,
        }
    }

    fn patch_touches(patch: &SessionPatch, field: &SessionField) -> bool {
        match field {
            SessionField::Seen(_) => patch.is_seen.is_some(),
            SessionField::Status(_) => patch.status.is_some(),
        }
    }

    fn mark_read_field() -> SessionField {
        SessionField::Seen(true)
    }
}

#[cfg(test)]
#[path = "entity_tests.rs"]
mod tests;
