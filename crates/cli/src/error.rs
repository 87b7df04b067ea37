// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use thiserror::Error;

use crate::auth::AuthError;
use crate::sync::{RequestError, TransportError};

/// All possible errors that can occur in the tidings library.
///
/// Errors provide user-friendly messages with hints for common issues.
#[derive(Debug, Error)]
pub enum Error {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("config file not found: {0}\n  hint: pass --base-url or create the file")]
    ConfigNotFound(String),

    #[error("invalid config file: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Core(#[from] tidings_core::Error),

    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("request failed: {0}")]
    Request(#[from] RequestError),

    #[error("authentication error: {0}")]
    Auth(#[from] AuthError),

    #[error("not authorized\n  hint: sign in again to refresh your credentials")]
    Unauthorized,

    #[error("not signed in")]
    SignedOut,

    #[error("no user given\n  hint: pass --user or set TIDINGS_USER")]
    UserRequired,

    #[error("config file already exists: {0}\n  hint: pass --force to overwrite it")]
    ConfigExists(String),

    #[error("unexpected reply to {0}")]
    UnexpectedReply(&'static str),
}

/// How an error should be handled by the sync layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Network or socket unreachable. Recoverable via fallback or retry.
    Connectivity,
    /// Expired or invalid credential.
    Authorization,
    /// The server rejected the action as stale or invalid.
    Validation,
    /// Anything else.
    Unexpected,
}

impl Error {
    /// Classifies this error for the propagation policy.
    pub fn class(&self) -> ErrorClass {
        match self {
            Error::Transport(_) | Error::Request(RequestError::Unreachable(_)) => {
                ErrorClass::Connectivity
            }
            Error::Request(RequestError::Unauthorized)
            | Error::Auth(_)
            | Error::Unauthorized
            | Error::SignedOut => ErrorClass::Authorization,
            Error::Request(RequestError::Conflict(_)) | Error::Core(tidings_core::Error::NotLoaded(_)) => {
                ErrorClass::Validation
            }
            _ => ErrorClass::Unexpected,
        }
    }
}

/// A specialized Result type for tidings operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
