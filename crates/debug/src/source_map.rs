// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Ensign Contributors

//! Basename → canonical-source-file index.
//!
//! VM locations only carry unqualified source names (plus a package-derived
//! source path); this map turns them back into the project files the editor
//! has open. Rebuilt whenever project sources change.

use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};

use en_core::LineSourcePosition;

use crate::vm::VmLocation;

#[derive(Debug, Default, Clone)]
pub struct SourceMap {
    by_basename: HashMap<String, BTreeSet<PathBuf>>,
}

impl SourceMap {
    pub fn from_files(files: impl IntoIterator<Item = PathBuf>) -> Self {
        let mut map = Self::default();
        for file in files {
            map.add(file);
        }
        map
    }

    pub fn add(&mut self, file: PathBuf) {
        if let Some(name) = file.file_name().and_then(|n| n.to_str()) {
            self.by_basename.entry(name.to_string()).or_default().insert(file);
        }
    }

    pub fn files_for(&self, basename: &str) -> impl Iterator<Item = &PathBuf> {
        self.by_basename.get(basename).into_iter().flatten()
    }

    /// The canonical position of a resolved VM location, when any project
    /// file carries its source name. Prefers the candidate whose path ends
    /// with the location's package-qualified source path.
    pub fn position(&self, location: &VmLocation) -> Option<LineSourcePosition> {
        let candidates = self.by_basename.get(&location.source_name)?;
        let file = candidates
            .iter()
            .find(|path| ends_with_path(path, &location.source_path))
            .or_else(|| candidates.iter().next())?;
        Some(LineSourcePosition { file: file.clone(), line: location.line })
    }
}

fn ends_with_path(path: &Path, suffix: &str) -> bool {
    if suffix.is_empty() {
        return false;
    }
    let path = path.to_string_lossy();
    path.ends_with(suffix)
}

#[cfg(test)]
#[path = "source_map_tests.rs"]
mod tests;
