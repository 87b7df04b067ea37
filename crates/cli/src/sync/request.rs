// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Request/response collaborator used when the socket is unavailable.
//!
//! Every call returns the same logical shape as the matching socket event so
//! the feed reconciliation is indifferent to which path served it.

use std::future::Future;
use std::marker::PhantomData;
use std::pin::Pin;

use reqwest::{Client, RequestBuilder, StatusCode, Url};
use serde::de::DeserializeOwned;

use tidings_core::{Entity, ListPage, ListQuery, Preferences, Stats};

use crate::config::ClientConfig;

/// Error type for request operations.
#[derive(Debug, Clone, thiserror::Error)]
pub enum RequestError {
    /// The server could not be reached.
    #[error("server unreachable: {0}")]
    Unreachable(String),

    /// The credential was rejected.
    #[error("unauthorized")]
    Unauthorized,

    /// The action conflicts with server state (e.g. the item is gone).
    #[error("conflict: {0}")]
    Conflict(String),

    /// Any other non-success status.
    #[error("unexpected status {status}: {message}")]
    Status { status: u16, message: String },

    /// The response body could not be decoded.
    #[error("decode error: {0}")]
    Decode(String),
}

/// Result type for request operations.
pub type RequestResult<T> = Result<T, RequestError>;

type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Request/response access to one feed.
pub trait Requester<E: Entity>: Send + Sync {
    /// Fetch one page.
    fn list<'a>(
        &'a self,
        token: &'a str,
        query: &'a ListQuery,
    ) -> BoxFuture<'a, RequestResult<ListPage<E>>>;

    /// Mark one item read.
    fn mark_read<'a>(&'a self, token: &'a str, id: &'a str) -> BoxFuture<'a, RequestResult<()>>;

    /// Mark every item read.
    fn mark_all_read<'a>(&'a self, token: &'a str) -> BoxFuture<'a, RequestResult<()>>;

    /// Delete one item.
    fn delete<'a>(&'a self, token: &'a str, id: &'a str) -> BoxFuture<'a, RequestResult<()>>;

    /// Fetch aggregate stats.
    fn stats<'a>(&'a self, token: &'a str) -> BoxFuture<'a, RequestResult<Stats>>;

    /// Fetch delivery preferences.
    fn preferences<'a>(&'a self, token: &'a str) -> BoxFuture<'a, RequestResult<Preferences>>;

    /// Replace delivery preferences, returning the stored copy.
    fn update_preferences<'a>(
        &'a self,
        token: &'a str,
        preferences: &'a Preferences,
    ) -> BoxFuture<'a, RequestResult<Preferences>>;
}

/// Maps a non-success status to a request error.
pub fn classify_status(status: u16, message: String) -> RequestError {
    match status {
        401 | 403 => RequestError::Unauthorized,
        404 | 409 | 410 | 422 => RequestError::Conflict(message),
        _ => RequestError::Status { status, message },
    }
}

fn transport_error(e: reqwest::Error) -> RequestError {
    if e.is_decode() {
        RequestError::Decode(e.to_string())
    } else {
        RequestError::Unreachable(e.to_string())
    }
}

/// Extend `collection` with path segments, percent-encoding each one so an
/// id cannot escape into another path, query or fragment.
pub(crate) fn resource_url(collection: &Url, segments: &[&str]) -> RequestResult<Url> {
    let mut url = collection.clone();
    url.path_segments_mut()
        .map_err(|()| RequestError::Unreachable(format!("not a base URL: {}", collection)))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

/// HTTP implementation over reqwest.
pub struct HttpRequester<E: Entity> {
    client: Client,
    collection_url: Url,
    _entity: PhantomData<fn() -> E>,
}

impl<E: Entity> HttpRequester<E> {
    pub fn new(config: &ClientConfig) -> RequestResult<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| RequestError::Unreachable(e.to_string()))?;
        let collection_url = Url::parse(&config.rest_url(E::RESOURCE))
            .map_err(|e| RequestError::Unreachable(format!("invalid base URL: {}", e)))?;
        Ok(HttpRequester {
            client,
            collection_url,
            _entity: PhantomData,
        })
    }

    fn url(&self, segments: &[&str]) -> RequestResult<Url> {
        resource_url(&self.collection_url, segments)
    }

    async fn send(builder: RequestBuilder, token: &str) -> RequestResult<reqwest::Response> {
        let response = builder
            .bearer_auth(token)
            .send()
            .await
            .map_err(transport_error)?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = response
            .text()
            .await
            .unwrap_or_else(|_| status.canonical_reason().unwrap_or("").to_string());
        Err(classify_status(status.as_u16(), message))
    }

    async fn send_json<T: DeserializeOwned>(
        builder: RequestBuilder,
        token: &str,
    ) -> RequestResult<T> {
        let response = Self::send(builder, token).await?;
        if response.status() == StatusCode::NO_CONTENT {
            return Err(RequestError::Decode("empty response body".to_string()));
        }
        response.json::<T>().await.map_err(transport_error)
    }
}

fn list_params(query: &ListQuery) -> Vec<(&'static str, String)> {
    let mut params = vec![
        ("page", query.page.to_string()),
        ("limit", query.limit.to_string()),
    ];
    if let Some(unread_only) = query.unread_only {
        params.push(("unreadOnly", unread_only.to_string()));
    }
    if let Some(kind) = &query.kind {
        params.push(("type", kind.clone()));
    }
    params
}

impl<E: Entity> Requester<E> for HttpRequester<E> {
    fn list<'a>(
        &'a self,
        token: &'a str,
        query: &'a ListQuery,
    ) -> BoxFuture<'a, RequestResult<ListPage<E>>> {
        Box::pin(async move {
            let builder = self.client.get(self.url(&[])?).query(&list_params(query));
            Self::send_json(builder, token).await
        })
    }

    fn mark_read<'a>(&'a self, token: &'a str, id: &'a str) -> BoxFuture<'a, RequestResult<()>> {
        Box::pin(async move {
            let builder = self.client.put(self.url(&[id, "read"])?);
            Self::send(builder, token).await.map(|_| ())
        })
    }

    fn mark_all_read<'a>(&'a self, token: &'a str) -> BoxFuture<'a, RequestResult<()>> {
        Box::pin(async move {
            let builder = self.client.put(self.url(&["read-all"])?);
            Self::send(builder, token).await.map(|_| ())
        })
    }

    fn delete<'a>(&'a self, token: &'a str, id: &'a str) -> BoxFuture<'a, RequestResult<()>> {
        Box::pin(async move {
            let builder = self.client.delete(self.url(&[id])?);
            Self::send(builder, token).await.map(|_| ())
        })
    }

    fn stats<'a>(&'a self, token: &'a str) -> BoxFuture<'a, RequestResult<Stats>> {
        Box::pin(async move {
            let builder = self.client.get(self.url(&["stats"])?);
            Self::send_json(builder, token).await
        })
    }

    fn preferences<'a>(&'a self, token: &'a str) -> BoxFuture<'a, RequestResult<Preferences>> {
        Box::pin(async move {
            let builder = self.client.get(self.url(&["preferences"])?);
            Self::send_json(builder, token).await
        })
    }

    fn update_preferences<'a>(
        &'a self,
        token: &'a str,
        preferences: &'a Preferences,
    ) -> BoxFuture<'a, RequestResult<Preferences>> {
        Box::pin(async move {
            let builder = self.client.put(self.url(&["preferences"])?).json(preferences);
            Self::send_json(builder, token).await
        })
    }
}
