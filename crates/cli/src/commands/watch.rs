// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::io::Write;

use tokio_util::sync::CancellationToken;

use crate::auth::AuthProvider;
use crate::display::{format_item_line, format_view_status, Summary};
use crate::error::{Error, Result};
use crate::sync::{FeedView, Requester, SyncClient, Transport};

/// Follow the feed, printing each change, until `cancel` fires.
pub async fn run<E, T, R, A>(
    client: &mut SyncClient<E, T, R, A>,
    cancel: CancellationToken,
    out: &mut impl Write,
) -> Result<()>
where
    E: Summary,
    T: Transport<E>,
    R: Requester<E>,
    A: AuthProvider + ?Sized,
{
    super::start(client).await?;

    let mut views = client.subscribe();
    let mut printer = Printer::default();
    printer.print(&views.borrow_and_update(), out)?;

    let printing = async {
        while views.changed().await.is_ok() {
            let view = views.borrow_and_update().clone();
            printer.print(&view, out)?;
        }
        Ok::<(), Error>(())
    };

    tokio::select! {
        result = client.run(cancel) => result,
        result = printing => result,
    }
}

/// Prints only what changed since the last view.
#[derive(Default)]
struct Printer {
    seen: Vec<String>,
    status: String,
}

impl Printer {
    fn print<E: Summary>(&mut self, view: &FeedView<E>, out: &mut impl Write) -> Result<()> {
        let lines: Vec<String> = view.items.iter().map(format_item_line).collect();
        for line in &lines {
            if !self.seen.contains(line) {
                writeln!(out, "{}", line)?;
            }
        }
        self.seen = lines;

        let status = format_view_status(view);
        if status != self.status {
            writeln!(out, "{}", status)?;
            self.status = status;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "watch_tests.rs"]
mod tests;
