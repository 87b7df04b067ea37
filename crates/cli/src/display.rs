// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use tidings_core::{Entity, Notification, Session, Stats};

use crate::sync::FeedView;

/// Maximum width of a summary before it is truncated.
const SUMMARY_WIDTH: usize = 72;

/// One-line description of a feed item.
pub trait Summary: Entity {
    /// Bracketed kind tag, e.g. `[message]`.
    fn tag(&self) -> String;

    /// Human-readable text shown after the tag.
    fn summary(&self) -> String;
}

impl Summary for Notification {
    fn tag(&self) -> String {
        format!("[{}]", self.kind)
    }

    fn summary(&self) -> String {
        if self.body.is_empty() {
            self.title.clone()
        } else {
            format!("{}: {}", self.title, self.body)
        }
    }
}

impl Summary for Session {
    fn tag(&self) -> String {
        format!("[{}]", self.status)
    }

    fn summary(&self) -> String {
        match self.scheduled_at {
            Some(at) => format!("{} ({})", self.topic, at.format("%Y-%m-%d %H:%M")),
            None => self.topic.clone(),
        }
    }
}

/// Truncate at a char boundary, appending an ellipsis when shortened.
pub fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let kept: String = text.chars().take(width.saturating_sub(1)).collect();
    format!("{}…", kept)
}

/// Format an item as a list line.
///
/// Output format: `* [kind] id: summary`, where the leading `*` marks an
/// unread item and is a space otherwise.
pub fn format_item_line<E: Summary>(item: &E) -> String {
    let marker = if item.is_unread() { '*' } else { ' ' };
    format!(
        "{} {} {}: {}",
        marker,
        item.tag(),
        item.id(),
        truncate(&item.summary(), SUMMARY_WIDTH)
    )
}

/// Format the counters and status line of a view.
pub fn format_view_status<E>(view: &FeedView<E>) -> String {
    let mut line = format!(
        "{} loaded, {} unread ({} total unread)",
        view.items.len(),
        view.unread_count,
        view.unread_total
    );
    if view.has_more {
        line.push_str(", more available");
    }
    line.push_str(if view.is_connected {
        " [live]"
    } else {
        " [offline]"
    });
    if let Some(error) = &view.error {
        line.push_str(&format!("\nlast error: {}", error));
    }
    line
}

/// Format aggregate stats, one `key: value` per line.
pub fn format_stats(stats: &Stats) -> Vec<String> {
    let mut lines = vec![
        format!("total: {}", stats.total),
        format!("unread: {}", stats.unread),
    ];
    for (kind, count) in &stats.by_kind {
        lines.push(format!("  {}: {}", kind, count));
    }
    lines
}

#[cfg(test)]
#[path = "display_tests.rs"]
mod tests;
