// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

pub mod init;
pub mod list;
pub mod stats;
pub mod watch;
pub mod write;

#[cfg(test)]
#[path = "mod_tests.rs"]
pub mod testing;

use std::path::PathBuf;

use crate::auth::{AuthProvider, StaticAuth};
use crate::cli::GlobalArgs;
use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::sync::{Requester, SyncClient, Transport};
use tidings_core::Entity;

/// Config file selected by `--config`, or the platform default.
pub fn config_path(global: &GlobalArgs) -> Result<PathBuf> {
    match &global.config {
        Some(path) => Ok(path.clone()),
        None => ClientConfig::default_path()
            .ok_or_else(|| Error::Config("no config directory on this platform".to_string())),
    }
}

/// Load the config file, letting `--base-url` override or stand in for it.
pub fn resolve_config(global: &GlobalArgs) -> Result<ClientConfig> {
    let path = config_path(global)?;
    let mut config = match (ClientConfig::load(&path), &global.base_url) {
        (Ok(config), _) => config,
        (Err(Error::ConfigNotFound(_)), Some(base_url)) => ClientConfig::new(base_url.clone()),
        (Err(e), _) => return Err(e),
    };
    if let Some(base_url) = &global.base_url {
        config.base_url = base_url.clone();
    }
    config.validate()?;
    Ok(config)
}

/// Credentials from `--user` and `--token`.
pub fn resolve_auth(global: &GlobalArgs) -> Result<StaticAuth> {
    let user = global
        .user
        .as_deref()
        .map(str::trim)
        .filter(|user| !user.is_empty())
        .ok_or(Error::UserRequired)?;
    Ok(StaticAuth::new(user, global.token.clone().unwrap_or_default()))
}

/// Start syncing and load the first page.
pub(crate) async fn start<E, T, R, A>(client: &mut SyncClient<E, T, R, A>) -> Result<()>
where
    E: Entity,
    T: Transport<E>,
    R: Requester<E>,
    A: AuthProvider + ?Sized,
{
    let connected = client.sync_identity().await?;
    if !connected {
        tracing::info!("socket unavailable, using requests only");
    }
    Ok(())
}

/// Load further pages until `id` is in the mirror or the feed runs out.
///
/// Stops early on a page that adds nothing new, so a server that keeps
/// reporting more pages cannot keep the search going forever.
pub(crate) async fn find<E, T, R, A>(client: &mut SyncClient<E, T, R, A>, id: &str) -> Result<()>
where
    E: Entity,
    T: Transport<E>,
    R: Requester<E>,
    A: AuthProvider + ?Sized,
{
    while !client.feed().contains(id) {
        let before = client.feed().len();
        if !client.load_more().await? {
            break;
        }
        if client.feed().len() == before {
            tracing::debug!(page = client.feed().page(), "page added no items, giving up");
            break;
        }
    }
    Ok(())
}
