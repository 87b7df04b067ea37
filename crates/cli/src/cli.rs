// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Output format for commands supporting structured output.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Which server feed to mirror.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum FeedKind {
    #[default]
    Notifications,
    Sessions,
}

const QUICKSTART_HELP: &str = "\
Get started:
  tidings init --base-url https://api.example.com/api
  tidings --user alice list          Show the first page
  tidings --user alice list --unread Show unread items only
  tidings --user alice read <id>     Mark one item read
  tidings --user alice watch         Follow live updates";

#[derive(Parser, Debug)]
#[command(name = "tidings", version)]
#[command(about = "Real-time feed sync client")]
#[command(
    long_about = "Real-time feed sync client.\n\n\
    Mirrors a server feed over a WebSocket and falls back to HTTP requests \
    whenever the socket is unavailable."
)]
#[command(after_help = QUICKSTART_HELP)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Command,
}

/// Options shared by every subcommand.
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Config file (defaults to the platform config directory)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// API base URL, overriding the config file
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// Identity to sync as
    #[arg(long, short, global = true, env = "TIDINGS_USER")]
    pub user: Option<String>,

    /// Bearer token presented to the server
    #[arg(long, global = true, env = "TIDINGS_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Feed to sync
    #[arg(long, global = true, value_enum, default_value_t)]
    pub feed: FeedKind,

    /// Log debug output to stderr
    #[arg(long, short, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Command {
    /// Write a config file
    #[command(after_help = "Examples:\n  \
        tidings init --base-url https://api.example.com/api\n  \
        tidings init --base-url http://localhost:3000/api --force")]
    Init {
        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },

    /// Connect and print feed changes until interrupted
    Watch,

    /// List loaded items
    List {
        /// Load pages up to and including this one
        #[arg(long, default_value_t = 1)]
        page: u32,

        /// Only list unread items
        #[arg(long)]
        unread: bool,

        /// Only list items of this kind
        #[arg(long)]
        kind: Option<String>,

        /// Output format
        #[arg(long, short, value_enum, default_value_t)]
        output: OutputFormat,
    },

    /// Show aggregate counts
    Stats {
        /// Output format
        #[arg(long, short, value_enum, default_value_t)]
        output: OutputFormat,
    },

    /// Mark an item read
    Read {
        /// Item id
        id: String,
    },

    /// Mark every item read
    ReadAll,

    /// Delete an item
    Delete {
        /// Item id
        id: String,
    },
}

#[cfg(test)]
#[path = "cli_tests/mod.rs"]
mod tests;
