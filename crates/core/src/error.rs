// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for tidings-core operations.

use thiserror::Error;

/// All possible errors that can occur in tidings-core operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error("item not loaded: {0}\n  hint: refresh the feed before changing this item")]
    NotLoaded(String),

    #[error("invalid session status: '{0}'\n  hint: valid statuses are: pending, accepted, declined, completed, cancelled")]
    InvalidStatus(String),

    #[error("invalid page: {0}\n  hint: pages are numbered from 1")]
    InvalidPage(u32),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A specialized Result type for tidings-core operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
