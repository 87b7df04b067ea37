// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Feed reconciliation engine.
//!
//! Merges three kinds of input into one ordered, deduplicated mirror:
//! list snapshots, single-item pushes, and optimistic local mutations.
//!
//! Two unread counters are kept. `unread_count` is derived from the mirror
//! and always equals the number of unread items held locally. `unread_total`
//! is the server-reported badge: replaced by page-1 snapshots, stats and
//! counter events, and adjusted incrementally by single-item changes.

use std::collections::BTreeMap;

use indexmap::IndexMap;

use tidings_core::protocol::ServerMessage;
use tidings_core::{Entity, ListPage, Stats};

/// Handle for one optimistic field change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct MutationToken(u64);

/// Handle for an optimistic mark-all, consumed by confirm or rollback.
#[derive(Debug, PartialEq, Eq)]
pub struct BatchToken {
    tokens: Vec<MutationToken>,
    previous_total: Option<u64>,
}

impl BatchToken {
    /// Number of items the batch changed.
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

/// An item removed optimistically, restorable at its original position.
#[derive(Debug)]
pub struct RemovalToken<E> {
    index: usize,
    item: E,
}

impl<E: Entity> RemovalToken<E> {
    pub fn id(&self) -> &str {
        self.item.id()
    }
}

/// Sequence number of an issued list request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct RequestSeq(u64);

#[derive(Debug, Clone)]
struct Pending<F> {
    id: String,
    previous: F,
    applied: F,
}

/// Local mirror of one server feed.
#[derive(Debug)]
pub struct Feed<E: Entity> {
    items: IndexMap<String, E>,
    pending: BTreeMap<u64, Pending<E::Field>>,
    next_token: u64,
    /// Unread items in `items`, maintained incrementally.
    unread: usize,
    /// Server-reported unread total.
    unread_total: Option<u64>,
    /// Server-reported item total.
    total: Option<u64>,
    page: u32,
    has_more: bool,
    issued_seq: u64,
    applied_seq: u64,
}

impl<E: Entity> Default for Feed<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Entity> Feed<E> {
    pub fn new() -> Self {
        Feed {
            items: IndexMap::new(),
            pending: BTreeMap::new(),
            next_token: 0,
            unread: 0,
            unread_total: None,
            total: None,
            page: 0,
            has_more: false,
            issued_seq: 0,
            applied_seq: 0,
        }
    }

    // -- accessors --

    /// Items in display order.
    pub fn items(&self) -> impl Iterator<Item = &E> + '_ {
        self.items.values()
    }

    /// Item ids in display order.
    pub fn ids(&self) -> Vec<&str> {
        self.items.keys().map(String::as_str).collect()
    }

    pub fn get(&self, id: &str) -> Option<&E> {
        self.items.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.items.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Unread items in the mirror.
    pub fn unread_count(&self) -> usize {
        self.unread
    }

    /// Unread badge: the server-reported total, never below the mirror count.
    pub fn unread_total(&self) -> u64 {
        let local = self.unread as u64;
        self.unread_total.map_or(local, |reported| reported.max(local))
    }

    /// Item total: the server-reported total, never below the mirror size.
    pub fn total_count(&self) -> u64 {
        let local = self.items.len() as u64;
        self.total.map_or(local, |reported| reported.max(local))
    }

    pub fn has_more(&self) -> bool {
        self.has_more
    }

    /// Last page applied (0 before the first snapshot).
    pub fn page(&self) -> u32 {
        self.page
    }

    /// Page to request when loading more.
    pub fn next_page(&self) -> u32 {
        self.page.saturating_add(1).max(1)
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Whether an optimistic change on `id` awaits confirmation.
    pub fn is_pending(&self, id: &str) -> bool {
        self.pending.values().any(|p| p.id == id)
    }

    /// Counts unread items from scratch.
    pub fn recount(&self) -> usize {
        self.items.values().filter(|item| item.is_unread()).count()
    }

    // -- list snapshots --

    /// Allocate the sequence number for a new list request.
    pub fn begin_request(&mut self) -> RequestSeq {
        self.issued_seq += 1;
        RequestSeq(self.issued_seq)
    }

    /// Apply a list response unless a newer one was applied already.
    pub fn apply_list_response(&mut self, seq: RequestSeq, page: ListPage<E>) -> bool {
        if seq.0 <= self.applied_seq {
            tracing::debug!(
                seq = seq.0,
                applied = self.applied_seq,
                "discarding superseded list response"
            );
            return false;
        }
        self.applied_seq = seq.0;
        self.apply_list_snapshot(page);
        true
    }

    /// Merge a page of items.
    ///
    /// Page 1 replaces the mirror and its server totals. Later pages append in
    /// server order; an id already present keeps its position and takes the
    /// fresher fields. Totals sent with later pages are ignored.
    pub fn apply_list_snapshot(&mut self, page: ListPage<E>) {
        if page.page <= 1 {
            self.items.clear();
            self.pending.clear();
            for item in page.items {
                self.items.insert(item.id().to_string(), item);
            }
            self.total = page.total;
            self.unread_total = page.unread_count;
        } else {
            for item in page.items {
                let id = item.id().to_string();
                self.pending.retain(|_, p| p.id != id);
                self.items.insert(id, item);
            }
        }
        self.page = page.page.max(1);
        self.has_more = page.has_more;
        self.unread = self.recount();
    }

    // -- pushed events --

    /// Prepend a new item. Duplicate deliveries are ignored.
    pub fn apply_pushed_create(&mut self, item: E) -> bool {
        if self.items.contains_key(item.id()) {
            tracing::trace!(id = item.id(), "ignoring duplicate create");
            return false;
        }
        let unread = item.is_unread();
        self.items.shift_insert(0, item.id().to_string(), item);
        if let Some(total) = self.total.as_mut() {
            *total += 1;
        }
        self.adjust_unread(false, unread);
        true
    }

    /// Merge a partial update into a loaded item.
    ///
    /// Pending mutations on the fields the patch sets are confirmed. Updates
    /// for items not in the mirror are dropped.
    pub fn apply_pushed_update(&mut self, id: &str, patch: &E::Patch) -> bool {
        if !self.items.contains_key(id) {
            tracing::debug!(id, "dropping update for item not in mirror");
            return false;
        }
        let before = self.pending.len();
        self.pending
            .retain(|_, p| p.id != id || !E::patch_touches(patch, &p.applied));
        let confirmed = before - self.pending.len();
        if confirmed > 0 {
            tracing::debug!(id, confirmed, "server update confirmed pending change");
        }
        self.update_item(id, |item| item.apply_patch(patch))
    }

    /// Remove a pushed deletion. Unknown ids are a no-op.
    pub fn apply_pushed_delete(&mut self, id: &str) -> bool {
        self.remove(id)
    }

    /// Replace the server unread total.
    pub fn apply_counter(&mut self, count: u64) {
        self.unread_total = Some(count);
    }

    /// Replace both server totals.
    pub fn apply_stats(&mut self, stats: &Stats) {
        self.total = Some(stats.total);
        self.unread_total = Some(stats.unread);
    }

    /// Dispatch one server message into the mirror.
    ///
    /// Returns whether the mirror or its counters changed. Replies to
    /// requests are consumed by the arbiter, so only pushes land here.
    pub fn apply_server_message(&mut self, msg: ServerMessage<E>) -> bool {
        match msg {
            ServerMessage::List {
                request_id: None,
                page,
            } => {
                let seq = self.begin_request();
                self.apply_list_response(seq, page)
            }
            ServerMessage::List {
                request_id: Some(request_id),
                ..
            } => {
                tracing::debug!(request_id, "ignoring unmatched list reply");
                false
            }
            ServerMessage::Created { item } => self.apply_pushed_create(item),
            ServerMessage::Updated { id, patch } => self.apply_pushed_update(&id, &patch),
            ServerMessage::Deleted { id } => self.apply_pushed_delete(&id),
            ServerMessage::Counter { count } => {
                self.apply_counter(count);
                true
            }
            ServerMessage::Stats { stats, .. } => {
                self.apply_stats(&stats);
                true
            }
            ServerMessage::Preferences { .. } => false,
            ServerMessage::Ack { request_id } => {
                tracing::trace!(request_id, "ignoring late ack");
                false
            }
            ServerMessage::Error {
                request_id,
                code,
                message,
            } => {
                tracing::warn!(?request_id, ?code, %message, "server reported error");
                false
            }
        }
    }

    // -- optimistic mutations --

    /// Apply `field` to a loaded item before the server confirms it.
    pub fn mark_field_optimistic(
        &mut self,
        id: &str,
        field: E::Field,
    ) -> tidings_core::Result<MutationToken> {
        let Some(item) = self.items.get_mut(id) else {
            return Err(tidings_core::Error::NotLoaded(id.to_string()));
        };
        let was_unread = item.is_unread();
        let previous = item.set_field(&field);
        let now_unread = item.is_unread();
        self.adjust_unread(was_unread, now_unread);

        self.next_token += 1;
        let token = MutationToken(self.next_token);
        self.pending.insert(
            token.0,
            Pending {
                id: id.to_string(),
                previous,
                applied: field,
            },
        );
        Ok(token)
    }

    /// Restore the value recorded for `token`. Idempotent.
    pub fn rollback(&mut self, token: MutationToken) -> bool {
        let Some(pending) = self.pending.remove(&token.0) else {
            return false;
        };
        self.update_item(&pending.id, |item| item.write_field(&pending.previous))
    }

    /// Treat the optimistic value for `token` as final. Idempotent.
    pub fn confirm(&mut self, token: MutationToken) -> bool {
        self.pending.remove(&token.0).is_some()
    }

    /// Mark every loaded item read and zero the server unread total.
    pub fn mark_all_optimistic(&mut self) -> BatchToken {
        let field = E::mark_read_field();
        let previous_total = self.unread_total;
        let unread: Vec<String> = self
            .items
            .values()
            .filter(|item| item.is_unread())
            .map(|item| item.id().to_string())
            .collect();
        let tokens = unread
            .iter()
            .filter_map(|id| self.mark_field_optimistic(id, field.clone()).ok())
            .collect();
        self.unread_total = Some(0);
        BatchToken {
            tokens,
            previous_total,
        }
    }

    pub fn rollback_batch(&mut self, batch: BatchToken) {
        for token in batch.tokens {
            self.rollback(token);
        }
        self.unread_total = batch.previous_total;
    }

    pub fn confirm_batch(&mut self, batch: BatchToken) {
        for token in batch.tokens {
            self.confirm(token);
        }
    }

    /// Remove an item before the server confirms its deletion.
    pub fn remove_optimistic(&mut self, id: &str) -> Option<RemovalToken<E>> {
        let (index, _, item) = self.items.shift_remove_full(id)?;
        self.forget_removed(&item);
        Some(RemovalToken { index, item })
    }

    /// Put an optimistically removed item back where it was.
    pub fn restore(&mut self, token: RemovalToken<E>) -> bool {
        if self.items.contains_key(token.item.id()) {
            return false;
        }
        let index = token.index.min(self.items.len());
        let unread = token.item.is_unread();
        self.items
            .shift_insert(index, token.item.id().to_string(), token.item);
        if let Some(total) = self.total.as_mut() {
            *total += 1;
        }
        self.adjust_unread(false, unread);
        true
    }

    /// Drop an item, along with any pending changes to it.
    pub fn remove(&mut self, id: &str) -> bool {
        match self.items.shift_remove(id) {
            Some(item) => {
                self.forget_removed(&item);
                true
            }
            None => false,
        }
    }

    /// Empty the mirror. List responses already in flight are discarded.
    pub fn clear(&mut self) {
        self.items.clear();
        self.pending.clear();
        self.unread = 0;
        self.unread_total = None;
        self.total = None;
        self.page = 0;
        self.has_more = false;
        self.applied_seq = self.issued_seq;
    }

    // -- internals --

    fn update_item(&mut self, id: &str, f: impl FnOnce(&mut E)) -> bool {
        let Some(item) = self.items.get_mut(id) else {
            return false;
        };
        let was_unread = item.is_unread();
        f(item);
        let now_unread = item.is_unread();
        self.adjust_unread(was_unread, now_unread);
        true
    }

    fn forget_removed(&mut self, item: &E) {
        self.pending.retain(|_, p| p.id != item.id());
        if let Some(total) = self.total.as_mut() {
            *total = total.saturating_sub(1);
        }
        self.adjust_unread(item.is_unread(), false);
    }

    fn adjust_unread(&mut self, was_unread: bool, now_unread: bool) {
        match (was_unread, now_unread) {
            (true, false) => {
                self.unread = self.unread.saturating_sub(1);
                if let Some(total) = self.unread_total.as_mut() {
                    *total = total.saturating_sub(1);
                }
            }
            (false, true) => {
                self.unread += 1;
                if let Some(total) = self.unread_total.as_mut() {
                    *total += 1;
                }
            }
            _ => {}
        }
    }
}
