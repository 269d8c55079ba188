// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Ensign Contributors

//! Environment lookups.

use std::path::{Path, PathBuf};

/// Overrides the cache directory under which the `index/` subfolder and the
/// port file live.
pub const CACHE_ENV_VAR: &str = "ENSIGN_CACHE";

/// The cache directory for a project: `$ENSIGN_CACHE` when set, else
/// `.ensign_cache` under the project root.
pub fn cache_dir(root: &Path) -> PathBuf {
    match std::env::var_os(CACHE_ENV_VAR) {
        Some(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => root.join(".ensign_cache"),
    }
}

/// Name of the configuration file at the project root.
pub const CONFIG_FILE: &str = ".ensign";

/// Name of the port advertisement file inside the cache directory.
pub const PORT_FILE: &str = "port";
