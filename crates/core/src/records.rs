// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Records exchanged alongside feed items: list queries and pages, aggregate
//! stats, and delivery preferences.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{Error, Result};

/// Parameters of a paginated list request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    /// Page number, starting at 1.
    pub page: u32,
    /// Maximum items per page.
    pub limit: u32,
    /// Only return unread items.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unread_only: Option<bool>,
    /// Only return items of this kind.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

impl ListQuery {
    /// Query for one page without filters.
    pub fn page(page: u32, limit: u32) -> Result<Self> {
        if page == 0 {
            return Err(Error::InvalidPage(page));
        }
        Ok(ListQuery {
            page,
            limit,
            unread_only: None,
            kind: None,
        })
    }

    /// Restrict to unread items.
    pub fn unread_only(mut self) -> Self {
        self.unread_only = Some(true);
        self
    }

    /// Restrict to one item kind.
    pub fn kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    /// Whether this query replaces the mirror rather than extending it.
    pub fn is_first_page(&self) -> bool {
        self.page <= 1
    }
}

/// Filters a client applies to every list request it issues.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListFilter {
    pub unread_only: bool,
    pub kind: Option<String>,
}

impl ListFilter {
    pub fn is_empty(&self) -> bool {
        !self.unread_only && self.kind.is_none()
    }

    /// Query for `page` with these filters applied.
    pub fn query(&self, page: u32, limit: u32) -> Result<ListQuery> {
        let mut query = ListQuery::page(page, limit)?;
        if self.unread_only {
            query = query.unread_only();
        }
        if let Some(kind) = &self.kind {
            query = query.kind(kind.clone());
        }
        Ok(query)
    }
}

/// One page of a list response.
///
/// `total` and `unread_count` are only authoritative on page 1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListPage<E> {
    pub items: Vec<E>,
    pub page: u32,
    #[serde(default)]
    pub limit: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unread_count: Option<u64>,
    #[serde(default)]
    pub has_more: bool,
}

impl<E> ListPage<E> {
    /// A page with no aggregate metadata.
    pub fn new(page: u32, items: Vec<E>) -> Self {
        let limit = u32::try_from(items.len()).unwrap_or(u32::MAX);
        ListPage {
            items,
            page,
            limit,
            total: None,
            unread_count: None,
            has_more: false,
        }
    }

    /// Attach server-side totals.
    pub fn with_totals(mut self, total: u64, unread_count: u64) -> Self {
        self.total = Some(total);
        self.unread_count = Some(unread_count);
        self
    }

    /// Mark that further pages exist.
    pub fn with_more(mut self, has_more: bool) -> Self {
        self.has_more = has_more;
        self
    }
}

/// Aggregate counts for a feed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    pub total: u64,
    pub unread: u64,
    #[serde(default)]
    pub by_kind: BTreeMap<String, u64>,
}

/// A daily window during which push delivery is suppressed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuietHours {
    /// Start time as "HH:MM".
    pub start: String,
    /// End time as "HH:MM".
    pub end: String,
}

/// Delivery preferences for a feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    #[serde(default = "enabled")]
    pub push_enabled: bool,
    #[serde(default = "enabled")]
    pub email_enabled: bool,
    #[serde(default = "enabled")]
    pub in_app_enabled: bool,
    /// Item kinds the user does not want delivered.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub muted_kinds: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quiet_hours: Option<QuietHours>,
}

fn enabled() -> bool {
    true
}

impl Default for Preferences {
    fn default() -> Self {
        Preferences {
            push_enabled: true,
            email_enabled: true,
            in_app_enabled: true,
            muted_kinds: Vec::new(),
            quiet_hours: None,
        }
    }
}

#[cfg(test)]
#[path = "records_tests.rs"]
mod tests;
