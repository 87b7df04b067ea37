// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::io::Write;

use crate::auth::AuthProvider;
use crate::cli::OutputFormat;
use crate::display::format_stats;
use crate::error::Result;
use crate::sync::{Requester, SyncClient, Transport};
use tidings_core::Entity;

/// Print aggregate counts for the feed.
pub async fn run<E, T, R, A>(
    client: &mut SyncClient<E, T, R, A>,
    output: OutputFormat,
    out: &mut impl Write,
) -> Result<()>
where
    E: Entity,
    T: Transport<E>,
    R: Requester<E>,
    A: AuthProvider + ?Sized,
{
    // Stats need no mirror, only the connection.
    client.sync_identity().await?;
    let stats = client.stats().await?;

    match output {
        OutputFormat::Text => {
            for line in format_stats(&stats) {
                writeln!(out, "{}", line)?;
            }
        }
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut *out, &stats).map_err(std::io::Error::from)?;
            writeln!(out)?;
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "stats_tests.rs"]
mod tests;
