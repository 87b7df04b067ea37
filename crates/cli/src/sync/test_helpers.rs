// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test helpers for sync module tests.

use tidings_core::{ListPage, Notification};

use crate::config::ClientConfig;

/// Create a notification with the given id and read flag.
pub fn make_notification(id: &str, is_read: bool) -> Notification {
    Notification::new(id, "message", format!("Notification {}", id)).read(is_read)
}

/// Create notifications from `(id, is_read)` pairs.
pub fn make_notifications(specs: &[(&str, bool)]) -> Vec<Notification> {
    specs
        .iter()
        .map(|(id, is_read)| make_notification(id, *is_read))
        .collect()
}

/// A page of notifications with totals derived from its contents.
pub fn make_page(page: u32, specs: &[(&str, bool)]) -> ListPage<Notification> {
    let items = make_notifications(specs);
    let unread = items.iter().filter(|n| !n.is_read).count() as u64;
    ListPage::new(page, items).with_totals(specs.len() as u64, unread)
}

/// Configuration with short timeouts and no reconnect delays.
pub fn test_config() -> ClientConfig {
    let mut config = ClientConfig::new("http://localhost:3000/api");
    config.reconnect_max_retries = 2;
    config.reconnect_initial_delay_ms = 0;
    config.reconnect_max_delay_secs = 0;
    config.ack_timeout_ms = 200;
    config.refresh_min_interval_ms = 1000;
    config
}
