// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::io::Write;

use crate::cli::GlobalArgs;
use crate::config::ClientConfig;
use crate::error::{Error, Result};

use super::config_path;

/// Write a config file for `--base-url`.
pub fn run(global: &GlobalArgs, force: bool, out: &mut impl Write) -> Result<()> {
    let base_url = global
        .base_url
        .clone()
        .ok_or_else(|| Error::Config("init requires --base-url".to_string()))?;
    let path = config_path(global)?;
    if path.exists() && !force {
        return Err(Error::ConfigExists(path.display().to_string()));
    }

    let config = ClientConfig::new(base_url);
    config.validate()?;
    config.save(&path)?;

    writeln!(out, "Wrote {}", path.display())?;
    writeln!(out, "Base URL: {}", config.base_url)?;
    Ok(())
}

#[cfg(test)]
#[path = "init_tests.rs"]
mod tests;
