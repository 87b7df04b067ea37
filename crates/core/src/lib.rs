// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! tidings-core: Shared data model for the tidings sync client
//!
//! This crate provides the feed entity types, the records exchanged alongside
//! them (pages, stats, preferences) and the typed wire protocol spoken over the
//! real-time socket. It performs no I/O.

pub mod entity;
pub mod error;
pub mod protocol;
pub mod records;

pub use entity::{
    Entity, Notification, NotificationField, NotificationPatch, Session, SessionField,
    SessionPatch, SessionStatus,
};
pub use error::{Error, Result};
pub use protocol::{ClientMessage, ErrorCode, ServerMessage};
pub use records::{ListFilter, ListPage, ListQuery, Preferences, QuietHours, Stats};
