// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Ensign Contributors

//! Project configuration, immutable after load.
//!
//! The daemon crate parses the on-disk keyword map (including subproject
//! merging) into this struct; everything downstream reads it through
//! accessors.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use regex::Regex;

/// Resolved project configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub root_dir: PathBuf,
    pub name: String,
    pub source_roots: Vec<PathBuf>,
    pub reference_source_roots: Vec<PathBuf>,
    pub compile_deps: Vec<PathBuf>,
    pub compile_jars: Vec<PathBuf>,
    pub runtime_deps: Vec<PathBuf>,
    pub runtime_jars: Vec<PathBuf>,
    pub test_deps: Vec<PathBuf>,
    pub target: Option<PathBuf>,
    pub test_target: Option<PathBuf>,
    pub only_include_in_index: Vec<Regex>,
    pub exclude_from_index: Vec<Regex>,
    pub compiler_args: Vec<String>,
    pub java_compiler_args: Vec<String>,
    pub formatting_prefs: BTreeMap<String, String>,
    pub index_on_startup: bool,
    pub source_load_on_startup: bool,
    pub include_scala_jars: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            root_dir: PathBuf::new(),
            name: String::new(),
            source_roots: Vec::new(),
            reference_source_roots: Vec::new(),
            compile_deps: Vec::new(),
            compile_jars: Vec::new(),
            runtime_deps: Vec::new(),
            runtime_jars: Vec::new(),
            test_deps: Vec::new(),
            target: None,
            test_target: None,
            only_include_in_index: Vec::new(),
            exclude_from_index: Vec::new(),
            compiler_args: Vec::new(),
            java_compiler_args: Vec::new(),
            formatting_prefs: BTreeMap::new(),
            index_on_startup: true,
            source_load_on_startup: true,
            include_scala_jars: true,
        }
    }
}

impl Config {
    /// Classpath used to compile the project.
    pub fn compile_classpath(&self) -> Vec<PathBuf> {
        let mut cp = Vec::new();
        cp.extend(self.compile_deps.iter().cloned());
        cp.extend(self.compile_jars.iter().cloned());
        dedup_in_order(&mut cp);
        cp
    }

    /// Classpath visible at runtime, a superset of the compile classpath.
    pub fn runtime_classpath(&self) -> Vec<PathBuf> {
        let mut cp = self.compile_classpath();
        cp.extend(self.runtime_deps.iter().cloned());
        cp.extend(self.runtime_jars.iter().cloned());
        cp.extend(self.target.iter().cloned());
        dedup_in_order(&mut cp);
        cp
    }

    /// Entries handed to the symbol indexer: everything the project can see,
    /// minus the standard-library jars when those are toggled off.
    pub fn index_classpath(&self) -> Vec<PathBuf> {
        let mut cp = self.runtime_classpath();
        cp.extend(self.test_deps.iter().cloned());
        cp.extend(self.test_target.iter().cloned());
        if !self.include_scala_jars {
            cp.retain(|p| !is_scala_jar(p));
        }
        dedup_in_order(&mut cp);
        cp
    }

    /// True when `path` passes the include/exclude regex filters.
    ///
    /// An empty include list admits everything; excludes always win.
    pub fn index_filter(&self, name: &str) -> bool {
        if !self.only_include_in_index.is_empty()
            && !self.only_include_in_index.iter().any(|re| re.is_match(name))
        {
            return false;
        }
        !self.exclude_from_index.iter().any(|re| re.is_match(name))
    }
}

/// Standard-library jar detection by file name.
pub fn is_scala_jar(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    ["scala-library", "scala-compiler", "scala-reflect", "scalap"]
        .iter()
        .any(|prefix| name.starts_with(prefix) && name.ends_with(".jar"))
}

fn dedup_in_order(paths: &mut Vec<PathBuf>) {
    let mut seen = std::collections::HashSet::new();
    paths.retain(|p| seen.insert(p.clone()));
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
