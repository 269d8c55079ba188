// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Ensign Contributors

//! Re-index decision logic and classpath content hashing.
//!
//! The index directory is rebuilt when the on-disk format version is stale
//! or when the proposed classpath contains any file the last build did not
//! hash identically. Files that disappeared do not force a rebuild; their
//! documents are stale but harmless, and the conservative direction is the
//! one that catches new and changed inputs.

use std::collections::BTreeMap;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::IndexError;

/// Bumped whenever documents or tokenization change shape; readers force a
/// full rebuild on mismatch.
pub const INDEX_VERSION: u32 = 4;

/// User metadata committed atomically with every index write.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexMetadata {
    pub index_version: u32,
    pub file_hashes: BTreeMap<String, String>,
}

/// True when the on-disk index must be torn down and rebuilt for the
/// proposed classpath hashes.
pub fn should_reindex(on_disk: &IndexMetadata, proposed: &BTreeMap<String, String>) -> bool {
    if on_disk.index_version < INDEX_VERSION {
        return true;
    }
    proposed
        .iter()
        .any(|(path, hash)| on_disk.file_hashes.get(path) != Some(hash))
}

/// Hash every file a classpath scan would read: archives whole, directory
/// trees per contained class file. Entries that cannot be read are skipped;
/// they will be skipped by the walker too.
pub fn hash_classpath(entries: &[PathBuf]) -> BTreeMap<String, String> {
    let mut hashes = BTreeMap::new();
    for entry in entries {
        if entry.is_dir() {
            hash_class_dir(entry, &mut hashes);
        } else if entry.is_file() {
            match sha256_file(entry) {
                Ok(hash) => {
                    hashes.insert(entry.to_string_lossy().into_owned(), hash);
                }
                Err(e) => tracing::warn!(path = %entry.display(), "skipping unreadable classpath entry: {}", e),
            }
        }
    }
    hashes
}

fn hash_class_dir(dir: &Path, hashes: &mut BTreeMap<String, String>) {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(_) => return,
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            hash_class_dir(&path, hashes);
        } else if path.extension().and_then(|e| e.to_str()) == Some("class") {
            if let Ok(hash) = sha256_file(&path) {
                hashes.insert(path.to_string_lossy().into_owned(), hash);
            }
        }
    }
}

pub(crate) fn sha256_file(path: &Path) -> Result<String, IndexError> {
    let mut file = fs::File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buf = [0u8; 64 * 1024];
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(format!("{:x}", hasher.finalize()))
}

#[cfg(test)]
#[path = "reindex_tests.rs"]
mod tests;
