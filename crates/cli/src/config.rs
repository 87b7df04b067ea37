// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Client configuration management.
//!
//! Configuration is stored in `<config dir>/tidings/config.toml` and includes:
//! - `base_url`: REST API base, e.g. `https://api.example.com/api`
//! - reconnect, acknowledgement and refresh tuning for the real-time socket
//!
//! The socket endpoint is derived from `base_url`: the API path segment is
//! stripped, the scheme switched to `ws`/`wss`, and `<socket_path>/<resource>`
//! appended with the identity id as the `userId` query parameter.

use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Error, Result};

const APP_DIR_NAME: &str = "tidings";
const CONFIG_FILE_NAME: &str = "config.toml";

/// Client configuration stored in `config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// REST API base URL (`http://` or `https://`).
    pub base_url: String,
    /// Trailing API path segment stripped to derive the socket origin.
    #[serde(default = "default_api_path")]
    pub api_path: String,
    /// Socket path mounted at the origin.
    #[serde(default = "default_socket_path")]
    pub socket_path: String,
    /// Connection attempts per connect before giving up (must be > 0).
    #[serde(default = "default_reconnect_max_retries")]
    pub reconnect_max_retries: u32,
    /// Initial delay for exponential backoff (milliseconds).
    #[serde(default = "default_reconnect_initial_delay_ms")]
    pub reconnect_initial_delay_ms: u64,
    /// Maximum delay between reconnection attempts (seconds).
    #[serde(default = "default_reconnect_max_delay_secs")]
    pub reconnect_max_delay_secs: u64,
    /// Max time to wait for the server to answer a socket request (milliseconds).
    #[serde(default = "default_ack_timeout_ms")]
    pub ack_timeout_ms: u64,
    /// Minimum interval between read refreshes (milliseconds).
    #[serde(default = "default_refresh_min_interval_ms")]
    pub refresh_min_interval_ms: u64,
    /// Items per page.
    #[serde(default = "default_page_limit")]
    pub page_limit: u32,
    /// HTTP request timeout (seconds).
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_api_path() -> String {
    "/api".to_string()
}

fn default_socket_path() -> String {
    "socket".to_string()
}

fn default_reconnect_max_retries() -> u32 {
    5
}

fn default_reconnect_initial_delay_ms() -> u64 {
    500
}

fn default_reconnect_max_delay_secs() -> u64 {
    10
}

fn default_ack_timeout_ms() -> u64 {
    5_000
}

fn default_refresh_min_interval_ms() -> u64 {
    1_000
}

fn default_page_limit() -> u32 {
    20
}

fn default_request_timeout_secs() -> u64 {
    15
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig::new("http://localhost:3000/api")
    }
}

impl ClientConfig {
    /// Creates a config for the given API base with default tuning.
    pub fn new(base_url: impl Into<String>) -> Self {
        ClientConfig {
            base_url: base_url.into(),
            api_path: default_api_path(),
            socket_path: default_socket_path(),
            reconnect_max_retries: default_reconnect_max_retries(),
            reconnect_initial_delay_ms: default_reconnect_initial_delay_ms(),
            reconnect_max_delay_secs: default_reconnect_max_delay_secs(),
            ack_timeout_ms: default_ack_timeout_ms(),
            refresh_min_interval_ms: default_refresh_min_interval_ms(),
            page_limit: default_page_limit(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }

    /// Default config file location, if the platform has a config dir.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Loads and validates configuration from `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::ConfigNotFound(path.display().to_string()));
            }
            Err(e) => return Err(e.into()),
        };
        let config: ClientConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Saves configuration to `path`, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("failed to serialize config: {}", e)))?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Checks that the config describes a usable, bounded client.
    pub fn validate(&self) -> Result<()> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(Error::Config(format!(
                "invalid base_url '{}': must start with http:// or https://",
                self.base_url
            )));
        }
        if self.reconnect_max_retries == 0 {
            return Err(Error::Config(
                "reconnect_max_retries must be at least 1".to_string(),
            ));
        }
        if self.page_limit == 0 {
            return Err(Error::Config("page_limit must be at least 1".to_string()));
        }
        Ok(())
    }

    /// Base URL with the trailing API path segment removed.
    pub fn origin(&self) -> &str {
        let base = self.base_url.trim_end_matches('/');
        let api = self.api_path.trim_end_matches('/');
        if api.is_empty() {
            return base;
        }
        base.strip_suffix(api).unwrap_or(base)
    }

    /// Socket endpoint for `resource`, scoped to `identity`.
    pub fn endpoint_url(&self, resource: &str, identity: &str) -> Result<String> {
        let origin = self.origin();
        let ws_origin = if let Some(rest) = origin.strip_prefix("https://") {
            format!("wss://{}", rest)
        } else if let Some(rest) = origin.strip_prefix("http://") {
            format!("ws://{}", rest)
        } else {
            return Err(Error::Config(format!("cannot derive socket url from '{}'", origin)));
        };

        let raw = format!(
            "{}/{}/{}",
            ws_origin,
            self.socket_path.trim_matches('/'),
            resource
        );
        let mut url = Url::parse(&raw)
            .map_err(|e| Error::Config(format!("invalid socket url '{}': {}", raw, e)))?;
        url.query_pairs_mut().append_pair("userId", identity);
        Ok(url.to_string())
    }

    /// REST collection URL for `resource`.
    pub fn rest_url(&self, resource: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), resource)
    }

    pub fn ack_timeout(&self) -> Duration {
        Duration::from_millis(self.ack_timeout_ms)
    }

    pub fn refresh_min_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_min_interval_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
