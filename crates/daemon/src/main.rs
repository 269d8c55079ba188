// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Ensign Contributors

//! `ensignd`: the editor-assistant daemon for one project.
//!
//! Takes the project root (containing `.ensign`) as its only argument,
//! defaulting to the working directory. The bound port is advertised via
//! the `port` file in the cache directory.

use std::path::PathBuf;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let root = match std::env::args_os().nth(1) {
        Some(arg) => PathBuf::from(arg),
        None => std::env::current_dir().context("no project root given and no cwd")?,
    };

    en_daemon::run(root).await.context("ensign daemon failed")?;
    Ok(())
}
