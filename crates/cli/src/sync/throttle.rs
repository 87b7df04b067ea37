// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Minimum-interval gate for read refreshes.

use std::time::Duration;

use tokio::time::Instant;

/// Lets at most one read refresh through per `min_interval`.
#[derive(Debug, Clone)]
pub struct RefreshThrottle {
    min_interval: Duration,
    last: Option<Instant>,
}

impl RefreshThrottle {
    pub fn new(min_interval: Duration) -> Self {
        RefreshThrottle {
            min_interval,
            last: None,
        }
    }

    /// Take the slot if the interval has elapsed since the last refresh.
    pub fn try_acquire(&mut self) -> bool {
        self.try_acquire_at(Instant::now())
    }

    pub fn try_acquire_at(&mut self, now: Instant) -> bool {
        match self.last {
            Some(last) if now.saturating_duration_since(last) < self.min_interval => false,
            _ => {
                self.last = Some(now);
                true
            }
        }
    }

    /// Record a refresh that bypassed the gate.
    pub fn mark(&mut self) {
        self.last = Some(Instant::now());
    }

    /// Forget the last refresh, e.g. after an identity change.
    pub fn reset(&mut self) {
        self.last = None;
    }
}
