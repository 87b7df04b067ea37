// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Tests for the sync client.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use super::client::SyncClient;
use super::connection::ConnectionState;
use super::request::RequestError;
use super::request_tests::{Call, MockRequester};
use super::test_helpers::{make_notification, make_page, test_config};
use super::transport_tests::MockTransport;
use crate::auth::{AuthProvider, Identity, StaticAuth};
use crate::error::Error;
use std::sync::Arc;
use std::time::Duration;
use tidings_core::protocol::{ClientMessage, ErrorCode, ServerMessage};
use tidings_core::{ListFilter, ListQuery, Notification, Stats};
use tokio_util::sync::CancellationToken;

type TestClient = SyncClient<Notification, MockTransport, MockRequester, StaticAuth>;

const FIVE_ITEMS: &[(&str, bool)] = &[
    ("n1", false),
    ("n2", false),
    ("n3", true),
    ("n4", false),
    ("n5", true),
];

struct Harness {
    client: TestClient,
    transport: MockTransport,
    requester: MockRequester,
    auth: Arc<StaticAuth>,
}

fn harness_with_auth(auth: StaticAuth) -> Harness {
    let transport = MockTransport::new();
    let requester = MockRequester::new();
    let auth = Arc::new(auth);
    let client = SyncClient::with_transport(
        test_config(),
        Arc::clone(&auth),
        transport.clone(),
        requester.clone(),
    );
    Harness {
        client,
        transport,
        requester,
        auth,
    }
}

fn harness() -> Harness {
    harness_with_auth(StaticAuth::new("u1", "token-1"))
}

/// Answer every socket request the way a live server would.
fn serve(transport: &MockTransport, items: &'static [(&'static str, bool)]) {
    transport.respond_with(move |msg| match msg {
        ClientMessage::List { request_id, query } => {
            vec![ServerMessage::list_reply(*request_id, make_page(query.page, items))]
        }
        other => vec![ServerMessage::ack(other.request_id())],
    });
}

/// A harness whose socket never comes up; everything goes over requests.
async fn offline_harness(items: &[(&str, bool)]) -> Harness {
    let mut h = harness();
    h.transport.fail_next_connects(u32::MAX);
    h.requester.push_page(make_page(1, items));
    assert!(!h.client.sync_identity().await.unwrap());
    h
}

async fn online_harness(items: &'static [(&'static str, bool)]) -> Harness {
    let mut h = harness();
    serve(&h.transport, items);
    assert!(h.client.sync_identity().await.unwrap());
    h
}

fn socket_ops(transport: &MockTransport) -> Vec<&'static str> {
    transport
        .get_outgoing()
        .iter()
        .map(|msg| match msg {
            ClientMessage::List { .. } => "list",
            ClientMessage::MarkRead { .. } => "mark_read",
            ClientMessage::MarkAllRead { .. } => "mark_all_read",
            ClientMessage::Delete { .. } => "delete",
            ClientMessage::GetStats { .. } => "get_stats",
            ClientMessage::GetPreferences { .. } => "get_preferences",
            ClientMessage::UpdatePreferences { .. } => "update_preferences",
        })
        .collect()
}

// -- lifecycle --

#[tokio::test]
async fn sign_in_mark_read_sign_out_scenario() {
    let mut h = harness();
    serve(&h.transport, FIVE_ITEMS);
    h.transport.observe(h.client.subscribe_connection());
    assert_eq!(h.client.connection_state(), ConnectionState::Disconnected);

    assert!(h.client.sync_identity().await.unwrap());

    assert_eq!(h.transport.observed_states(), vec![ConnectionState::Connecting]);
    assert_eq!(h.client.connection_state(), ConnectionState::Connected);
    let view = h.client.view();
    assert_eq!(view.items.len(), 5);
    assert_eq!(view.unread_count, 3);
    assert!(view.is_connected);

    h.client.mark_one_read("n1").await.unwrap();
    assert_eq!(h.client.view().unread_count, 2);
    assert!(h.client.view().get("n1").unwrap().is_read);

    h.auth.set_identity(None);
    assert!(!h.client.sync_identity().await.unwrap());

    let view = h.client.view();
    assert!(view.items.is_empty());
    assert_eq!(view.unread_count, 0);
    assert_eq!(h.client.connection_state(), ConnectionState::Disconnected);
    assert!(h.requester.calls().is_empty());
}

#[tokio::test]
async fn endpoint_carries_identity() {
    let h = online_harness(FIVE_ITEMS).await;
    let (url, token) = h.transport.connects().remove(0);
    assert_eq!(url, "ws://localhost:3000/socket/notifications?userId=u1");
    assert_eq!(token, "token-1");
}

#[tokio::test]
async fn identity_switch_reconnects_and_reloads() {
    let mut h = online_harness(FIVE_ITEMS).await;
    h.client.mark_one_read("n1").await.unwrap();

    h.auth.set_identity(Some(Identity::new("u2")));
    assert!(h.client.sync_identity().await.unwrap());

    let connects = h.transport.connects();
    assert_eq!(connects.len(), 2);
    assert!(connects[1].0.ends_with("userId=u2"));
    assert_eq!(h.client.identity(), Some(&Identity::new("u2")));
    // Nothing optimistic survives from the previous identity.
    assert_eq!(h.client.feed().pending_count(), 0);
    assert_eq!(h.client.view().unread_count, 3);
}

#[tokio::test]
async fn sync_identity_without_sign_in_does_nothing() {
    let mut h = harness_with_auth(StaticAuth::new("", "t"));
    assert!(!h.client.sync_identity().await.unwrap());
    assert!(h.transport.connects().is_empty());
    assert!(h.requester.calls().is_empty());
}

#[tokio::test]
async fn failed_connect_still_loads_over_requests() {
    let h = offline_harness(FIVE_ITEMS).await;
    assert_eq!(h.client.connection_state(), ConnectionState::Disconnected);
    assert_eq!(h.client.view().items.len(), 5);
    assert!(!h.client.view().is_connected);
    assert_eq!(h.requester.count(|c| matches!(c, Call::List(_))), 1);
}

// -- arbitration --

#[tokio::test]
async fn disconnected_mark_all_read_uses_request_path_only() {
    let mut h = offline_harness(FIVE_ITEMS).await;

    h.client.mark_all_read().await.unwrap();

    assert_eq!(h.requester.count(|c| *c == Call::MarkAllRead), 1);
    assert!(h.transport.get_outgoing().is_empty());
    assert_eq!(h.client.view().unread_count, 0);
    assert_eq!(h.client.view().unread_total, 0);
}

#[tokio::test]
async fn connected_write_goes_over_socket() {
    let mut h = online_harness(FIVE_ITEMS).await;

    h.client.delete_one("n2").await.unwrap();

    assert_eq!(socket_ops(&h.transport), vec!["list", "delete"]);
    assert!(h.requester.calls().is_empty());
    assert!(h.client.view().get("n2").is_none());
}

#[tokio::test]
async fn socket_error_reply_falls_back_for_that_operation_only() {
    let mut h = online_harness(FIVE_ITEMS).await;
    h.transport.respond_with(|msg| match msg {
        ClientMessage::MarkRead { request_id, .. } => {
            vec![ServerMessage::error(*request_id, ErrorCode::Internal, "busy")]
        }
        other => vec![ServerMessage::ack(other.request_id())],
    });

    h.client.mark_one_read("n1").await.unwrap();

    assert_eq!(h.requester.calls(), vec![Call::MarkRead("n1".into())]);
    assert_eq!(h.client.connection_state(), ConnectionState::Connected);

    h.client.mark_all_read().await.unwrap();
    assert_eq!(h.requester.calls().len(), 1);
}

#[tokio::test]
async fn broken_socket_demotes_and_falls_back() {
    let mut h = online_harness(FIVE_ITEMS).await;
    h.transport.set_send_fail(true);

    h.client.mark_one_read("n1").await.unwrap();

    assert_eq!(h.client.connection_state(), ConnectionState::Disconnected);
    assert_eq!(h.requester.calls(), vec![Call::MarkRead("n1".into())]);
    assert!(!h.client.view().is_connected);
}

#[tokio::test]
async fn pushes_during_round_trip_reach_the_mirror() {
    let mut h = online_harness(FIVE_ITEMS).await;
    h.transport.respond_with(|msg| {
        vec![
            ServerMessage::Created {
                item: make_notification("n0", false),
            },
            ServerMessage::ack(msg.request_id()),
        ]
    });

    h.client.mark_one_read("n1").await.unwrap();

    let view = h.client.view();
    assert_eq!(view.items[0].id, "n0");
    assert_eq!(view.unread_count, 3);
}

// -- failures --

#[tokio::test]
async fn both_paths_failing_rolls_back_and_reports() {
    let mut h = offline_harness(FIVE_ITEMS).await;
    h.requester
        .fail_next(RequestError::Unreachable("offline".into()));

    let err = h.client.mark_one_read("n1").await.unwrap_err();

    assert!(matches!(err, Error::Request(RequestError::Unreachable(_))));
    let view = h.client.view();
    assert!(!view.get("n1").unwrap().is_read);
    assert_eq!(view.unread_count, 3);
    assert!(view.error.is_some());
}

#[tokio::test]
async fn failed_delete_restores_item_in_place() {
    let mut h = offline_harness(FIVE_ITEMS).await;
    h.requester.fail_next(RequestError::Status {
        status: 500,
        message: "boom".into(),
    });

    assert!(h.client.delete_one("n3").await.is_err());

    let ids: Vec<_> = h.client.view().items.iter().map(|n| n.id.clone()).collect();
    assert_eq!(ids, vec!["n1", "n2", "n3", "n4", "n5"]);
}

#[tokio::test]
async fn failed_mark_all_restores_every_item() {
    let mut h = offline_harness(FIVE_ITEMS).await;
    h.requester
        .fail_next(RequestError::Unreachable("offline".into()));

    assert!(h.client.mark_all_read().await.is_err());

    assert_eq!(h.client.view().unread_count, 3);
    assert_eq!(h.client.view().unread_total, 3);
}

#[tokio::test]
async fn conflict_drops_stale_item_without_failing() {
    let mut h = offline_harness(FIVE_ITEMS).await;
    h.requester
        .fail_next(RequestError::Conflict("already deleted".into()));

    h.client.mark_one_read("n1").await.unwrap();

    let view = h.client.view();
    assert!(view.get("n1").is_none());
    assert_eq!(view.unread_count, 2);
    assert!(view.error.unwrap().contains("already deleted"));
    assert_eq!(h.client.feed().pending_count(), 0);
}

#[tokio::test]
async fn unanswered_socket_delete_is_confirmed_by_a_missing_item() {
    let mut h = online_harness(FIVE_ITEMS).await;
    h.transport.respond_with(|msg| match msg {
        ClientMessage::Delete { .. } => Vec::new(),
        other => vec![ServerMessage::ack(other.request_id())],
    });
    h.requester.fail_next(RequestError::Conflict("not found".into()));

    h.client.delete_one("n3").await.unwrap();

    let view = h.client.view();
    assert!(view.get("n3").is_none());
    assert!(view.error.is_none());
    assert_eq!(h.requester.calls(), vec![Call::Delete("n3".into())]);
}

#[tokio::test]
async fn rejected_socket_delete_still_reports_conflict() {
    let mut h = online_harness(FIVE_ITEMS).await;
    h.transport.respond_with(|msg| match msg {
        ClientMessage::Delete { request_id, .. } => {
            vec![ServerMessage::error(*request_id, ErrorCode::NotFound, "gone")]
        }
        other => vec![ServerMessage::ack(other.request_id())],
    });
    h.requester.fail_next(RequestError::Conflict("not found".into()));

    h.client.delete_one("n3").await.unwrap();

    let view = h.client.view();
    assert!(view.get("n3").is_none());
    assert!(view.error.unwrap().contains("not found"));
}

#[tokio::test]
async fn error_clears_after_next_success() {
    let mut h = offline_harness(FIVE_ITEMS).await;
    h.requester
        .fail_next(RequestError::Conflict("gone".into()));
    h.client.mark_one_read("n1").await.unwrap();
    assert!(h.client.view().error.is_some());

    h.client.mark_one_read("n2").await.unwrap();
    assert!(h.client.view().error.is_none());
}

#[tokio::test]
async fn marking_unloaded_item_is_rejected_locally() {
    let mut h = offline_harness(FIVE_ITEMS).await;
    let err = h.client.mark_one_read("ghost").await.unwrap_err();
    assert!(matches!(err, Error::Core(tidings_core::Error::NotLoaded(_))));
    assert_eq!(h.requester.count(|c| matches!(c, Call::MarkRead(_))), 0);
}

#[tokio::test]
async fn unreachable_refresh_keeps_cached_feed() {
    let mut h = offline_harness(FIVE_ITEMS).await;
    h.requester
        .fail_next(RequestError::Unreachable("offline".into()));

    assert!(!h.client.force_refresh().await.unwrap());

    assert_eq!(h.client.view().items.len(), 5);
    assert!(h.client.view().error.is_none());
}

// -- authorization --

#[tokio::test]
async fn rejected_credential_is_refreshed_once_and_retried() {
    let mut h = harness_with_auth(StaticAuth::new("u1", "stale").with_refreshed_token("fresh"));
    h.transport.fail_next_connects(u32::MAX);
    h.requester.push_page(make_page(1, FIVE_ITEMS));
    h.client.sync_identity().await.unwrap();
    h.requester.fail_next(RequestError::Unauthorized);

    h.client.mark_one_read("n1").await.unwrap();

    assert_eq!(h.auth.refresh_count(), 1);
    let tokens = h.requester.tokens();
    assert_eq!(&tokens[tokens.len() - 2..], &["stale", "fresh"]);
    assert!(h.client.view().get("n1").unwrap().is_read);
}

#[tokio::test]
async fn second_rejection_signs_out_and_tears_down() {
    let mut h = offline_harness(FIVE_ITEMS).await;
    h.requester.fail_next(RequestError::Unauthorized);
    h.requester.fail_next(RequestError::Unauthorized);

    let err = h.client.mark_one_read("n1").await.unwrap_err();

    assert!(matches!(err, Error::Unauthorized));
    assert!(!h.auth.is_signed_in());
    assert!(h.client.view().items.is_empty());
    assert!(h.client.identity().is_none());
    assert_eq!(h.client.connection_state(), ConnectionState::Disconnected);
}

// -- reads --

#[tokio::test]
async fn refresh_is_throttled_but_force_refresh_is_not() {
    let mut h = offline_harness(FIVE_ITEMS).await;

    assert!(!h.client.refresh().await.unwrap());
    assert!(!h.client.refresh().await.unwrap());
    assert_eq!(h.requester.count(|c| matches!(c, Call::List(_))), 1);

    h.requester.push_page(make_page(1, FIVE_ITEMS));
    assert!(h.client.force_refresh().await.unwrap());
    assert_eq!(h.requester.count(|c| matches!(c, Call::List(_))), 2);
}

#[tokio::test]
async fn writes_are_never_throttled() {
    let mut h = offline_harness(FIVE_ITEMS).await;
    h.client.mark_one_read("n1").await.unwrap();
    h.client.mark_one_read("n2").await.unwrap();
    h.client.mark_one_read("n4").await.unwrap();
    assert_eq!(h.requester.count(|c| matches!(c, Call::MarkRead(_))), 3);
}

#[tokio::test]
async fn load_more_appends_next_page() {
    let mut h = harness();
    h.transport.fail_next_connects(u32::MAX);
    h.requester
        .push_page(make_page(1, &[("a", false), ("b", true)]).with_more(true));
    h.requester
        .push_page(make_page(2, &[("b", true), ("c", false)]).with_more(false));
    h.client.sync_identity().await.unwrap();

    assert!(h.client.load_more().await.unwrap());
    assert!(!h.client.load_more().await.unwrap());

    let ids: Vec<_> = h.client.view().items.iter().map(|n| n.id.clone()).collect();
    assert_eq!(ids, vec!["a", "b", "c"]);
    assert!(!h.client.view().has_more);
    let pages: Vec<u32> = h
        .requester
        .calls()
        .iter()
        .filter_map(|c| match c {
            Call::List(query) => Some(query.page),
            _ => None,
        })
        .collect();
    assert_eq!(pages, vec![1, 2]);
}

fn list_queries(requester: &MockRequester) -> Vec<ListQuery> {
    requester
        .calls()
        .into_iter()
        .filter_map(|c| match c {
            Call::List(query) => Some(query),
            _ => None,
        })
        .collect()
}

fn unread_system() -> ListFilter {
    ListFilter {
        unread_only: true,
        kind: Some("system".into()),
    }
}

#[tokio::test]
async fn filter_set_before_sign_in_applies_to_first_load() {
    let mut h = harness();
    h.transport.fail_next_connects(u32::MAX);

    assert!(!h.client.set_filter(unread_system()).await.unwrap());
    assert!(h.requester.calls().is_empty());

    h.client.sync_identity().await.unwrap();

    let queries = list_queries(&h.requester);
    assert_eq!(queries.len(), 1);
    assert_eq!(queries[0].unread_only, Some(true));
    assert_eq!(queries[0].kind.as_deref(), Some("system"));
}

#[tokio::test]
async fn changing_filter_reloads_first_page() {
    let mut h = offline_harness(FIVE_ITEMS).await;
    h.requester
        .push_page(make_page(1, &[("n1", false), ("n2", false)]).with_more(true));
    h.requester.push_page(make_page(2, &[("n4", false)]));

    assert!(h.client.set_filter(unread_system()).await.unwrap());

    let ids: Vec<_> = h.client.view().items.iter().map(|n| n.id.clone()).collect();
    assert_eq!(ids, vec!["n1", "n2"]);
    assert_eq!(h.client.filter(), &unread_system());

    h.client.load_more().await.unwrap();
    let queries = list_queries(&h.requester);
    assert_eq!(queries.len(), 3);
    assert_eq!(queries[1].page, 1);
    assert_eq!(queries[2].page, 2);
    assert!(queries[1..]
        .iter()
        .all(|q| q.unread_only == Some(true) && q.kind.as_deref() == Some("system")));
}

#[tokio::test]
async fn unchanged_filter_does_not_reload() {
    let mut h = offline_harness(FIVE_ITEMS).await;

    assert!(!h.client.set_filter(ListFilter::default()).await.unwrap());

    assert_eq!(list_queries(&h.requester).len(), 1);
    assert_eq!(h.client.view().items.len(), 5);
}

#[tokio::test]
async fn stats_adopt_server_totals() {
    let mut h = offline_harness(FIVE_ITEMS).await;
    h.requester.set_stats(Stats {
        total: 120,
        unread: 40,
        ..Default::default()
    });

    let stats = h.client.stats().await.unwrap();

    assert_eq!(stats.total, 120);
    assert_eq!(h.client.view().unread_total, 40);
    assert_eq!(h.client.view().total_count, 120);
    assert_eq!(h.client.view().unread_count, 3);
}

#[tokio::test]
async fn preferences_round_trip_over_requests() {
    let mut h = offline_harness(FIVE_ITEMS).await;
    let mut prefs = h.client.preferences().await.unwrap();
    prefs.muted_kinds.push("marketing".into());

    let stored = h.client.update_preferences(prefs.clone()).await.unwrap();

    assert_eq!(stored, prefs);
    assert_eq!(h.client.preferences().await.unwrap().muted_kinds, vec!["marketing"]);
}

// -- pushes and reconnect --

#[tokio::test]
async fn pump_applies_pushed_events() {
    let mut h = online_harness(FIVE_ITEMS).await;
    let mut views = h.client.subscribe();
    h.transport.queue_incoming(ServerMessage::Created {
        item: make_notification("n6", false),
    });

    assert!(h.client.pump().await);

    assert!(views.has_changed().unwrap());
    let view = views.borrow_and_update().clone();
    assert_eq!(view.items[0].id, "n6");
    assert_eq!(view.unread_count, 4);
}

#[tokio::test]
async fn reconnect_after_drop_reloads_first_page() {
    let mut h = online_harness(FIVE_ITEMS).await;
    h.transport.close_when_drained();

    assert!(!h.client.pump().await);
    assert_eq!(h.client.connection_state(), ConnectionState::Disconnected);

    assert!(h.client.reconnect().await.unwrap());

    assert_eq!(h.transport.connects().len(), 2);
    assert_eq!(socket_ops(&h.transport), vec!["list", "list"]);
    assert_eq!(h.client.view().items.len(), 5);
}

#[tokio::test]
async fn run_applies_pushes_until_cancelled() {
    let mut h = online_harness(FIVE_ITEMS).await;
    h.transport.queue_incoming(ServerMessage::Deleted { id: "n1".into() });
    h.transport
        .queue_incoming(ServerMessage::Counter { count: 9 });

    let cancel = CancellationToken::new();
    let stop = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        stop.cancel();
    });
    h.client.run(cancel).await.unwrap();

    let view = h.client.view();
    assert!(view.get("n1").is_none());
    assert_eq!(view.unread_total, 9);
}

#[tokio::test]
async fn run_stops_when_signed_out() {
    let mut h = online_harness(FIVE_ITEMS).await;
    h.auth.set_identity(None);
    h.transport.drop_connection();

    h.client.run(CancellationToken::new()).await.unwrap();

    assert!(h.client.view().items.is_empty());
    assert_eq!(h.client.connection_state(), ConnectionState::Disconnected);
}

#[tokio::test]
async fn shutdown_clears_everything() {
    let mut h = online_harness(FIVE_ITEMS).await;
    h.client.shutdown().await;
    h.client.shutdown().await;

    assert!(h.client.view().items.is_empty());
    assert!(h.client.identity().is_none());
    assert_eq!(h.client.connection_state(), ConnectionState::Disconnected);
}
