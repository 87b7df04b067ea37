// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Read-only snapshot of a feed for display surfaces.

use tidings_core::Entity;

use super::feed::Feed;

/// Snapshot published after every change to the feed or its status.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedView<E> {
    /// Items in display order, deduplicated.
    pub items: Vec<E>,
    pub total_count: u64,
    /// Unread items currently loaded.
    pub unread_count: usize,
    /// Server-reported unread badge.
    pub unread_total: u64,
    pub is_loading: bool,
    pub is_refreshing: bool,
    /// Last non-fatal error, cleared by the next successful operation.
    pub error: Option<String>,
    pub has_more: bool,
    pub is_connected: bool,
}

impl<E> FeedView<E> {
    pub fn empty() -> Self {
        FeedView {
            items: Vec::new(),
            total_count: 0,
            unread_count: 0,
            unread_total: 0,
            is_loading: false,
            is_refreshing: false,
            error: None,
            has_more: false,
            is_connected: false,
        }
    }
}

impl<E> Default for FeedView<E> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<E: Entity> FeedView<E> {
    /// Capture the current feed contents.
    pub fn capture(feed: &Feed<E>) -> Self {
        FeedView {
            items: feed.items().cloned().collect(),
            total_count: feed.total_count(),
            unread_count: feed.unread_count(),
            unread_total: feed.unread_total(),
            has_more: feed.has_more(),
            ..Self::empty()
        }
    }

    pub fn get(&self, id: &str) -> Option<&E> {
        self.items.iter().find(|item| item.id() == id)
    }
}
