// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Commands that change the feed: `read`, `read-all` and `delete`.

use std::io::Write;

use crate::auth::AuthProvider;
use crate::display::format_view_status;
use crate::error::Result;
use crate::sync::{Requester, SyncClient, Transport};
use tidings_core::Entity;

use super::{find, start};

pub async fn read<E, T, R, A>(
    client: &mut SyncClient<E, T, R, A>,
    id: &str,
    out: &mut impl Write,
) -> Result<()>
where
    E: Entity,
    T: Transport<E>,
    R: Requester<E>,
    A: AuthProvider + ?Sized,
{
    start(client).await?;
    find(client, id).await?;
    client.mark_one_read(id).await?;
    report(client, &format!("Marked {} read", id), out)
}

pub async fn read_all<E, T, R, A>(
    client: &mut SyncClient<E, T, R, A>,
    out: &mut impl Write,
) -> Result<()>
where
    E: Entity,
    T: Transport<E>,
    R: Requester<E>,
    A: AuthProvider + ?Sized,
{
    start(client).await?;
    client.mark_all_read().await?;
    report(client, "Marked all read", out)
}

pub async fn delete<E, T, R, A>(
    client: &mut SyncClient<E, T, R, A>,
    id: &str,
    out: &mut impl Write,
) -> Result<()>
where
    E: Entity,
    T: Transport<E>,
    R: Requester<E>,
    A: AuthProvider + ?Sized,
{
    start(client).await?;
    find(client, id).await?;
    client.delete_one(id).await?;
    report(client, &format!("Deleted {}", id), out)
}

/// Print the outcome, noting when the server dropped a stale item instead.
fn report<E, T, R, A>(
    client: &SyncClient<E, T, R, A>,
    done: &str,
    out: &mut impl Write,
) -> Result<()>
where
    E: Entity,
    T: Transport<E>,
    R: Requester<E>,
    A: AuthProvider + ?Sized,
{
    let view = client.view();
    if view.error.is_none() {
        writeln!(out, "{}", done)?;
    }
    writeln!(out, "{}", format_view_status(&view))?;
    Ok(())
}

#[cfg(test)]
#[path = "write_tests.rs"]
mod tests;
