// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! tidings - A real-time feed sync client library.
//!
//! This crate keeps a local mirror of a server-owned feed (notifications or
//! mentoring sessions) consistent with the server, and provides the `tidings`
//! CLI that drives it.
//!
//! # Main Components
//!
//! - [`SyncClient`] - Connection lifecycle, feed reconciliation and arbitration
//! - [`ClientConfig`] - Server location and reconnect/refresh tuning
//! - [`AuthProvider`](auth::AuthProvider) - Identity and bearer tokens
//! - [`Error`] - Error types for all operations
//!
//! # Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use tidings::{auth::StaticAuth, ClientConfig, SyncClient};
//! use tidings_core::Notification;
//!
//! let config = ClientConfig::new("https://api.example.com/api");
//! let auth = Arc::new(StaticAuth::new("alice", token));
//! let mut client = SyncClient::<Notification, _, _, _>::new(config, auth)?;
//!
//! client.sync_identity().await?;
//! client.mark_one_read("n1").await?;
//! println!("{} unread", client.view().unread_count);
//! ```

mod cli;
mod commands;
mod display;

pub mod auth;
pub mod config;
pub mod error;
pub mod sync;

pub use cli::{Cli, Command, FeedKind, GlobalArgs, OutputFormat};
pub use config::ClientConfig;
pub use error::{Error, Result};
pub use sync::{FeedView, SyncClient};

use std::io::Write;
use std::sync::Arc;

use tidings_core::{ListFilter, Notification, Session};
use tokio_util::sync::CancellationToken;

use auth::AuthProvider;
use display::Summary;

/// Run a parsed command line.
pub fn run(cli: Cli) -> Result<()> {
    let mut out = std::io::stdout();
    if let Command::Init { force } = cli.command {
        return commands::init::run(&cli.global, force, &mut out);
    }

    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| Error::Io(std::io::Error::other(format!("tokio: {}", e))))?;
    rt.block_on(async {
        match cli.global.feed {
            FeedKind::Notifications => {
                run_feed::<Notification>(&cli.global, cli.command, &mut out).await
            }
            FeedKind::Sessions => run_feed::<Session>(&cli.global, cli.command, &mut out).await,
        }
    })
}

async fn run_feed<E: Summary>(
    global: &GlobalArgs,
    command: Command,
    out: &mut impl Write,
) -> Result<()> {
    let config = commands::resolve_config(global)?;
    let auth: Arc<dyn AuthProvider> = Arc::new(commands::resolve_auth(global)?);
    let mut client = SyncClient::<E>::new(config, auth)?;

    let result = match command {
        // Handled before the runtime starts.
        Command::Init { .. } => Ok(()),
        Command::Watch => {
            let cancel = CancellationToken::new();
            let stop = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    stop.cancel();
                }
            });
            commands::watch::run(&mut client, cancel, out).await
        }
        Command::List {
            page,
            unread,
            kind,
            output,
        } => {
            let filter = ListFilter {
                unread_only: unread,
                kind,
            };
            commands::list::run(&mut client, filter, page, output, out).await
        }
        Command::Stats { output } => commands::stats::run(&mut client, output, out).await,
        Command::Read { id } => commands::write::read(&mut client, &id, out).await,
        Command::ReadAll => commands::write::read_all(&mut client, out).await,
        Command::Delete { id } => commands::write::delete(&mut client, &id, out).await,
    };

    client.shutdown().await;
    result
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
