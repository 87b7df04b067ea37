// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Authentication seam.
//!
//! The sync client never owns credentials. It asks the [`AuthProvider`] for
//! the current identity and for a bearer token just before each connect or
//! request, and reports unrecoverable authorization failures back through
//! [`AuthProvider::sign_out`].

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

/// Error type for credential operations.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// No identity is signed in.
    #[error("not signed in")]
    SignedOut,

    /// The credential could not be refreshed.
    #[error("credential refresh failed: {0}")]
    Refresh(String),
}

/// A signed-in user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub id: String,
}

impl Identity {
    pub fn new(id: impl Into<String>) -> Self {
        Identity { id: id.into() }
    }

    /// Whether this identity may open a connection.
    pub fn is_valid(&self) -> bool {
        !self.id.trim().is_empty()
    }
}

/// Supplies identity and credentials to the sync client.
pub trait AuthProvider: Send + Sync {
    /// The currently signed-in identity, if any.
    fn identity(&self) -> Option<Identity>;

    /// Obtain a bearer token, forcing a refresh when `force_refresh` is set.
    fn token(
        &self,
        force_refresh: bool,
    ) -> Pin<Box<dyn Future<Output = Result<String, AuthError>> + Send + '_>>;

    /// Sign the identity out after an unrecoverable authorization failure.
    fn sign_out(&self);

    /// Check if a usable identity is signed in.
    fn is_signed_in(&self) -> bool {
        self.identity().is_some_and(|identity| identity.is_valid())
    }
}

/// Fixed identity and token, for the command line and tests.
///
/// A forced refresh swaps in the token set by [`StaticAuth::with_refreshed_token`]
/// when one is configured.
pub struct StaticAuth {
    identity: Mutex<Option<Identity>>,
    token: Mutex<String>,
    refreshed_token: Mutex<Option<String>>,
    refreshes: AtomicU32,
}

impl StaticAuth {
    pub fn new(identity: impl Into<String>, token: impl Into<String>) -> Self {
        StaticAuth {
            identity: Mutex::new(Some(Identity::new(identity))),
            token: Mutex::new(token.into()),
            refreshed_token: Mutex::new(None),
            refreshes: AtomicU32::new(0),
        }
    }

    /// Token handed out after the next forced refresh.
    pub fn with_refreshed_token(self, token: impl Into<String>) -> Self {
        *self
            .refreshed_token
            .lock()
            .unwrap_or_else(|e| e.into_inner()) = Some(token.into());
        self
    }

    /// Replace the signed-in identity (`None` signs out).
    pub fn set_identity(&self, identity: Option<Identity>) {
        *self.identity.lock().unwrap_or_else(|e| e.into_inner()) = identity;
    }

    /// Number of forced refreshes performed.
    pub fn refresh_count(&self) -> u32 {
        self.refreshes.load(Ordering::Acquire)
    }
}

impl AuthProvider for StaticAuth {
    fn identity(&self) -> Option<Identity> {
        self.identity
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    fn token(
        &self,
        force_refresh: bool,
    ) -> Pin<Box<dyn Future<Output = Result<String, AuthError>> + Send + '_>> {
        Box::pin(async move {
            if !self.is_signed_in() {
                return Err(AuthError::SignedOut);
            }
            let mut token = self.token.lock().unwrap_or_else(|e| e.into_inner());
            if force_refresh {
                self.refreshes.fetch_add(1, Ordering::AcqRel);
                let next = self
                    .refreshed_token
                    .lock()
                    .unwrap_or_else(|e| e.into_inner())
                    .take();
                if let Some(next) = next {
                    *token = next;
                }
            }
            Ok(token.clone())
        })
    }

    fn sign_out(&self) {
        tracing::info!("signing out after authorization failure");
        self.set_identity(None);
    }
}

#[cfg(test)]
#[path = "auth_tests.rs"]
mod tests;
