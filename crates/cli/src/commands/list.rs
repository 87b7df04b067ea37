// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::io::Write;

use serde::Serialize;

use crate::auth::AuthProvider;
use crate::cli::OutputFormat;
use crate::display::{format_item_line, format_view_status, Summary};
use crate::error::Result;
use crate::sync::{Requester, SyncClient, Transport};
use tidings_core::ListFilter;

use super::start;

/// JSON output structure for the list command.
#[derive(Serialize)]
struct ListOutputJson<'a, E> {
    items: &'a [E],
    unread_count: usize,
    unread_total: u64,
    has_more: bool,
}

/// Print the first `pages` pages of the feed matching `filter`.
pub async fn run<E, T, R, A>(
    client: &mut SyncClient<E, T, R, A>,
    filter: ListFilter,
    pages: u32,
    output: OutputFormat,
    out: &mut impl Write,
) -> Result<()>
where
    E: Summary,
    T: Transport<E>,
    R: Requester<E>,
    A: AuthProvider + ?Sized,
{
    client.set_filter(filter).await?;
    start(client).await?;
    while client.feed().page() < pages {
        if !client.load_more().await? {
            break;
        }
    }

    let view = client.view();
    match output {
        OutputFormat::Text => {
            for item in &view.items {
                writeln!(out, "{}", format_item_line(item))?;
            }
            writeln!(out, "{}", format_view_status(&view))?;
        }
        OutputFormat::Json => {
            let json = ListOutputJson {
                items: &view.items,
                unread_count: view.unread_count,
                unread_total: view.unread_total,
                has_more: view.has_more,
            };
            serde_json::to_writer_pretty(&mut *out, &json).map_err(std::io::Error::from)?;
            writeln!(out)?;
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "list_tests.rs"]
mod tests;
