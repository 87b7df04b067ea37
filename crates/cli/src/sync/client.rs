// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Sync client coordinating one identity's feed.
//!
//! Provides a high-level interface for:
//! - Following sign-in and sign-out of the auth provider
//! - Loading and paging the feed (socket first, request fallback)
//! - Optimistic writes with rollback when both paths fail
//! - Applying pushed events and reconnecting after a drop
//!
//! One `SyncClient` owns the connection and the mirror; display surfaces
//! observe it through [`SyncClient::subscribe`].

use std::sync::Arc;

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use tidings_core::{Entity, ListFilter, Preferences, Stats};

use super::arbiter::{Arbiter, Operation, Outcome, Route, TransportFailure};
use super::connection::{Connection, ConnectionState, ReconnectPolicy};
use super::feed::{BatchToken, Feed, MutationToken, RemovalToken};
use super::request::{HttpRequester, RequestError, Requester};
use super::throttle::RefreshThrottle;
use super::transport::{Transport, WebSocketTransport};
use super::view::FeedView;
use crate::auth::{AuthProvider, Identity};
use crate::config::ClientConfig;
use crate::error::{Error, ErrorClass, Result};

/// An optimistic change awaiting the server's verdict.
enum Applied<E> {
    One(MutationToken),
    Batch(BatchToken),
    Removal(RemovalToken<E>),
}

#[derive(Debug, Default)]
struct Status {
    is_loading: bool,
    is_refreshing: bool,
    error: Option<String>,
}

/// Sync client for one feed.
pub struct SyncClient<E, T = WebSocketTransport, R = HttpRequester<E>, A = dyn AuthProvider>
where
    E: Entity,
    T: Transport<E>,
    R: Requester<E>,
    A: AuthProvider + ?Sized,
{
    config: ClientConfig,
    auth: Arc<A>,
    connection: Connection<E, T>,
    requester: R,
    arbiter: Arbiter,
    feed: Feed<E>,
    filter: ListFilter,
    throttle: RefreshThrottle,
    status: Status,
    view: watch::Sender<FeedView<E>>,
}

impl<E, A> SyncClient<E, WebSocketTransport, HttpRequester<E>, A>
where
    E: Entity,
    A: AuthProvider + ?Sized,
{
    /// Create a client speaking WebSocket and HTTP to `config.base_url`.
    pub fn new(config: ClientConfig, auth: Arc<A>) -> Result<Self> {
        config.validate()?;
        let requester = HttpRequester::new(&config)?;
        Ok(Self::with_transport(
            config,
            auth,
            WebSocketTransport::new(),
            requester,
        ))
    }
}

impl<E, T, R, A> SyncClient<E, T, R, A>
where
    E: Entity,
    T: Transport<E>,
    R: Requester<E>,
    A: AuthProvider + ?Sized,
{
    /// Create a client with custom collaborators (for testing).
    pub fn with_transport(config: ClientConfig, auth: Arc<A>, transport: T, requester: R) -> Self {
        let connection = Connection::new(transport, ReconnectPolicy::from_config(&config));
        let arbiter = Arbiter::new(config.ack_timeout());
        let throttle = RefreshThrottle::new(config.refresh_min_interval());
        let (view, _) = watch::channel(FeedView::empty());

        SyncClient {
            config,
            auth,
            connection,
            requester,
            arbiter,
            feed: Feed::new(),
            filter: ListFilter::default(),
            throttle,
            status: Status::default(),
            view,
        }
    }

    /// Observe feed snapshots.
    pub fn subscribe(&self) -> watch::Receiver<FeedView<E>> {
        self.view.subscribe()
    }

    /// The latest published snapshot.
    pub fn view(&self) -> FeedView<E> {
        self.view.borrow().clone()
    }

    pub fn feed(&self) -> &Feed<E> {
        &self.feed
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.connection.state()
    }

    /// Observe connection state changes.
    pub fn subscribe_connection(&self) -> watch::Receiver<ConnectionState> {
        self.connection.subscribe()
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_connected()
    }

    pub fn filter(&self) -> &ListFilter {
        &self.filter
    }

    /// Identity the client is currently serving.
    pub fn identity(&self) -> Option<&Identity> {
        self.connection.identity()
    }

    // -- lifecycle --

    /// Follow the auth provider's current identity.
    ///
    /// Signing in connects and loads the first page; signing out or switching
    /// identity tears the previous session down first. Returns whether the
    /// socket is connected afterwards.
    pub async fn sync_identity(&mut self) -> Result<bool> {
        let current = self.auth.identity().filter(Identity::is_valid);
        let previous = self.connection.identity().cloned();

        match (current, previous) {
            (None, None) => Ok(false),
            (None, Some(previous)) => {
                tracing::info!(identity = %previous.id, "identity signed out");
                self.teardown().await;
                Ok(false)
            }
            (Some(current), Some(previous)) if current == previous => {
                if self.connection.is_connected() {
                    Ok(true)
                } else {
                    self.reconnect().await
                }
            }
            (Some(current), previous) => {
                if previous.is_some() {
                    self.teardown().await;
                }
                tracing::info!(identity = %current.id, "starting sync");
                self.throttle.reset();
                let connected = self.open(&current).await?;
                self.force_refresh().await?;
                Ok(connected)
            }
        }
    }

    /// Reopen the socket for the current identity.
    ///
    /// Order across a reconnect is not guaranteed, so a successful reconnect
    /// is always followed by a full first-page refresh.
    pub async fn reconnect(&mut self) -> Result<bool> {
        let Some(identity) = self.connection.identity().cloned() else {
            return Ok(false);
        };
        let connected = self.open(&identity).await?;
        if connected {
            self.force_refresh().await?;
        }
        Ok(connected)
    }

    async fn open(&mut self, identity: &Identity) -> Result<bool> {
        let url = self.config.endpoint_url(E::RESOURCE, &identity.id)?;
        let token = self.auth.token(false).await?;
        let connected = self.connection.connect(identity, &url, &token).await;
        self.publish();
        Ok(connected)
    }

    /// Disconnect and drop everything loaded for the current identity.
    pub async fn shutdown(&mut self) {
        tracing::debug!("shutting down sync client");
        self.teardown().await;
    }

    async fn teardown(&mut self) {
        self.connection.disconnect().await;
        self.feed.clear();
        self.status = Status::default();
        self.throttle.reset();
        self.publish();
    }

    /// Receive one pushed event and apply it.
    ///
    /// Returns `false` once the socket has gone away.
    pub async fn pump(&mut self) -> bool {
        match self.connection.recv().await {
            Some(msg) => {
                if self.feed.apply_server_message(msg) {
                    self.publish();
                }
                true
            }
            None => {
                self.publish();
                false
            }
        }
    }

    /// Apply pushed events until `cancel` fires or the identity signs out,
    /// reconnecting after drops.
    pub async fn run(&mut self, cancel: CancellationToken) -> Result<()> {
        let retry_delay = ReconnectPolicy::from_config(&self.config).max_delay;

        while !cancel.is_cancelled() {
            if !self.connection.is_connected() {
                let connected = self.sync_identity().await?;
                if self.connection.identity().is_none() {
                    break;
                }
                if !connected {
                    tokio::select! {
                        _ = cancel.cancelled() => break,
                        _ = tokio::time::sleep(retry_delay) => continue,
                    }
                }
            }

            tokio::select! {
                _ = cancel.cancelled() => break,
                alive = self.pump() => {
                    if !alive {
                        tracing::info!("socket closed, reconnecting");
                    }
                }
            }
        }
        Ok(())
    }

    // -- reads --

    /// Reload the first page, at most once per refresh interval.
    pub async fn refresh(&mut self) -> Result<bool> {
        if !self.throttle.try_acquire() {
            tracing::debug!("refresh throttled");
            return Ok(false);
        }
        self.load(1).await
    }

    /// Reload the first page regardless of the throttle.
    pub async fn force_refresh(&mut self) -> Result<bool> {
        self.throttle.mark();
        self.load(1).await
    }

    /// Replace the list filter.
    ///
    /// While an identity is active the mirror is reloaded from page 1 under
    /// the new filter; otherwise the filter applies to the first load.
    pub async fn set_filter(&mut self, filter: ListFilter) -> Result<bool> {
        if filter == self.filter {
            return Ok(false);
        }
        tracing::debug!(?filter, "list filter changed");
        self.filter = filter;
        if self.connection.identity().is_none() {
            return Ok(false);
        }
        self.force_refresh().await
    }

    /// Append the next page, if the server reported more.
    pub async fn load_more(&mut self) -> Result<bool> {
        if self.feed.page() > 0 && !self.feed.has_more() {
            return Ok(false);
        }
        self.load(self.feed.next_page()).await
    }

    async fn load(&mut self, page: u32) -> Result<bool> {
        let query = self.filter.query(page, self.config.page_limit)?;
        let seq = self.feed.begin_request();
        if !query.is_first_page() || self.feed.page() == 0 {
            self.status.is_loading = true;
        } else {
            self.status.is_refreshing = true;
        }
        self.publish();

        let result = self.perform(Operation::List(query)).await;
        self.status.is_loading = false;
        self.status.is_refreshing = false;

        match result {
            Ok(Outcome::Page(page)) => {
                let applied = self.feed.apply_list_response(seq, page);
                self.succeeded();
                Ok(applied)
            }
            Ok(_) => self.read_failed(Error::UnexpectedReply("list")),
            Err(e) => self.read_failed(e),
        }
    }

    /// Fetch aggregate stats and adopt their totals.
    pub async fn stats(&mut self) -> Result<Stats> {
        match self.perform(Operation::Stats).await {
            Ok(Outcome::Stats(stats)) => {
                self.feed.apply_stats(&stats);
                self.succeeded();
                Ok(stats)
            }
            Ok(_) => Err(self.failed(Error::UnexpectedReply("stats"))),
            Err(e) => Err(self.failed(e)),
        }
    }

    pub async fn preferences(&mut self) -> Result<Preferences> {
        let result = self.perform(Operation::GetPreferences).await;
        self.finish_preferences(result, "get_preferences")
    }

    // -- writes --

    pub async fn update_preferences(&mut self, preferences: Preferences) -> Result<Preferences> {
        let result = self
            .perform(Operation::UpdatePreferences(preferences))
            .await;
        self.finish_preferences(result, "update_preferences")
    }

    /// Mark one loaded item read.
    pub async fn mark_one_read(&mut self, id: &str) -> Result<()> {
        let token = self.feed.mark_field_optimistic(id, E::mark_read_field())?;
        self.publish();
        let result = self
            .perform(Operation::MarkRead { id: id.to_string() })
            .await;
        self.settle(Applied::One(token), Some(id), result)
    }

    /// Mark every item read.
    pub async fn mark_all_read(&mut self) -> Result<()> {
        let batch = self.feed.mark_all_optimistic();
        self.publish();
        let result = self.perform(Operation::MarkAllRead).await;
        self.settle(Applied::Batch(batch), None, result)
    }

    /// Delete one loaded item.
    pub async fn delete_one(&mut self, id: &str) -> Result<()> {
        let Some(removal) = self.feed.remove_optimistic(id) else {
            return Err(tidings_core::Error::NotLoaded(id.to_string()).into());
        };
        self.publish();
        let result = self.perform(Operation::Delete { id: id.to_string() }).await;
        self.settle(Applied::Removal(removal), Some(id), result)
    }

    // -- arbitration --

    async fn perform(&mut self, op: Operation) -> Result<Outcome<E>> {
        let mut maybe_delivered = false;
        if Route::for_state(self.connection.state()) == Route::Transport
            && self.connection.is_connected()
        {
            let feed = &mut self.feed;
            let result = self
                .arbiter
                .via_transport(&mut self.connection, &op, |msg| {
                    feed.apply_server_message(msg);
                })
                .await;
            match result {
                Ok(outcome) => return Ok(outcome),
                Err(failure) => {
                    maybe_delivered = !matches!(failure, TransportFailure::Rejected { .. });
                    if op.is_write() {
                        tracing::info!(
                            op = op.name(),
                            id = op.target(),
                            %failure,
                            "socket path failed, using request path"
                        );
                    } else {
                        tracing::debug!(op = op.name(), %failure, "socket path failed, using request path");
                    }
                }
            }
        }

        match self.request(&op).await {
            // An unanswered socket delete may already have removed the item.
            Err(Error::Request(RequestError::Conflict(message)))
                if maybe_delivered && matches!(op, Operation::Delete { .. }) =>
            {
                tracing::debug!(id = op.target(), %message, "item already gone, delete confirmed");
                Ok(Outcome::Done)
            }
            other => other,
        }
    }

    /// Request path with one credential refresh on rejection.
    async fn request(&mut self, op: &Operation) -> Result<Outcome<E>> {
        let token = self.auth.token(false).await?;
        match self
            .arbiter
            .via_request::<E, R>(&self.requester, &token, op)
            .await
        {
            Err(RequestError::Unauthorized) => {}
            other => return other.map_err(Error::from),
        }

        tracing::info!(op = op.name(), "credential rejected, retrying with a fresh one");
        let retried = match self.auth.token(true).await {
            Ok(token) => {
                self.arbiter
                    .via_request::<E, R>(&self.requester, &token, op)
                    .await
            }
            Err(e) => {
                tracing::warn!(error = %e, "credential refresh failed");
                Err(RequestError::Unauthorized)
            }
        };

        match retried {
            Err(RequestError::Unauthorized) => {
                tracing::warn!(op = op.name(), "credential rejected after refresh, signing out");
                self.auth.sign_out();
                self.teardown().await;
                Err(Error::Unauthorized)
            }
            other => other.map_err(Error::from),
        }
    }

    // -- outcome handling --

    fn settle(
        &mut self,
        applied: Applied<E>,
        target: Option<&str>,
        result: Result<Outcome<E>>,
    ) -> Result<()> {
        let err = match result {
            Ok(_) => {
                self.commit(applied);
                self.succeeded();
                return Ok(());
            }
            Err(err) => err,
        };

        if err.class() == ErrorClass::Validation {
            match applied {
                Applied::One(token) => {
                    self.feed.confirm(token);
                }
                Applied::Batch(batch) => self.feed.rollback_batch(batch),
                Applied::Removal(_) => {}
            }
            if let Some(id) = target {
                if self.feed.remove(id) {
                    tracing::info!(id, "dropped stale item");
                }
            }
            self.status.error = Some(err.to_string());
            self.publish();
            return Ok(());
        }

        // Unauthorized has already torn the session down.
        if !matches!(err, Error::Unauthorized) {
            tracing::warn!(error = %err, "action failed, rolling back");
            self.revert(applied);
        }
        self.status.error = Some(err.to_string());
        self.publish();
        Err(err)
    }

    fn commit(&mut self, applied: Applied<E>) {
        match applied {
            Applied::One(token) => {
                self.feed.confirm(token);
            }
            Applied::Batch(batch) => self.feed.confirm_batch(batch),
            Applied::Removal(_) => {}
        }
    }

    fn revert(&mut self, applied: Applied<E>) {
        match applied {
            Applied::One(token) => {
                self.feed.rollback(token);
            }
            Applied::Batch(batch) => self.feed.rollback_batch(batch),
            Applied::Removal(removal) => {
                self.feed.restore(removal);
            }
        }
    }

    fn finish_preferences(
        &mut self,
        result: Result<Outcome<E>>,
        op: &'static str,
    ) -> Result<Preferences> {
        match result {
            Ok(Outcome::Preferences(preferences)) => {
                self.succeeded();
                Ok(preferences)
            }
            Ok(_) => Err(self.failed(Error::UnexpectedReply(op))),
            Err(e) => Err(self.failed(e)),
        }
    }

    /// Reads keep the cached feed on connectivity and validation failures.
    fn read_failed(&mut self, err: Error) -> Result<bool> {
        match err.class() {
            ErrorClass::Connectivity => {
                tracing::warn!(error = %err, "read failed, keeping cached feed");
                self.publish();
                Ok(false)
            }
            ErrorClass::Validation => {
                self.status.error = Some(err.to_string());
                self.publish();
                Ok(false)
            }
            ErrorClass::Authorization | ErrorClass::Unexpected => Err(self.failed(err)),
        }
    }

    fn failed(&mut self, err: Error) -> Error {
        if err.class() != ErrorClass::Connectivity {
            tracing::warn!(error = %err, "operation failed");
            self.status.error = Some(err.to_string());
        }
        self.publish();
        err
    }

    fn succeeded(&mut self) {
        self.status.error = None;
        self.publish();
    }

    fn publish(&self) {
        let mut view = FeedView::capture(&self.feed);
        view.is_loading = self.status.is_loading;
        view.is_refreshing = self.status.is_refreshing;
        view.error = self.status.error.clone();
        view.is_connected = self.connection.is_connected();
        self.view.send_replace(view);
    }
}
