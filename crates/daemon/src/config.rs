// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Ensign Contributors

//! Configuration loading: one keyword map in the wire dialect, read once at
//! startup from `.ensign` at the project root.
//!
//! Multi-module projects put shared settings at the top level and per-module
//! overrides under `:subprojects`; `:active-subproject` picks one, and its
//! `:depends-on-modules` are merged in transitively. List-valued keys
//! concatenate, scalar keys override.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use en_core::Config;
use en_wire::SExp;
use regex::Regex;
use thiserror::Error;

use crate::env::CONFIG_FILE;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config io: {0}")]
    Io(#[from] std::io::Error),

    #[error("config parse: {0}")]
    Parse(String),

    #[error("config is not a keyword map")]
    NotAMap,

    #[error("config key {key} has an unexpected value")]
    InvalidValue { key: String },

    #[error("bad regex {pattern:?} in {key}: {message}")]
    Regex { key: String, pattern: String, message: String },

    #[error("active subproject {0:?} is not defined")]
    UnknownSubproject(String),
}

/// Keys whose values concatenate across subproject merges. Everything else
/// is scalar and the overlay wins.
const LIST_KEYS: &[&str] = &[
    "compile-deps",
    "compile-jars",
    "runtime-deps",
    "runtime-jars",
    "test-deps",
    "source-roots",
    "sources",
    "reference-source-roots",
    "only-include-in-index",
    "exclude-from-index",
    "compiler-args",
    "builder-args",
    "java-compiler-args",
    "depends-on-modules",
];

/// Load and resolve the configuration for the project at `root`.
pub fn load_config(root: &Path) -> Result<Config, ConfigError> {
    let path = root.join(CONFIG_FILE);
    let text = std::fs::read_to_string(&path)?;
    let sexp = en_wire::parse(&text).map_err(|e| ConfigError::Parse(e.to_string()))?;
    parse_config(root, &sexp)
}

/// Resolve a parsed keyword map into a [`Config`].
pub fn parse_config(root: &Path, sexp: &SExp) -> Result<Config, ConfigError> {
    let main = PList::from_sexp(sexp)?;
    let merged = merge_active_subproject(&main)?;

    let root_dir = match merged.get_str("root-dir") {
        Some(dir) => resolve_path(root, &dir),
        None => root.to_path_buf(),
    };

    let mut config = Config {
        name: merged
            .get_any_str(&["name", "project-name"])
            .unwrap_or_default(),
        source_roots: merged.paths(&root_dir, &["source-roots", "sources"])?,
        reference_source_roots: merged.paths(&root_dir, &["reference-source-roots"])?,
        compile_deps: merged.paths(&root_dir, &["compile-deps"])?,
        compile_jars: merged.paths(&root_dir, &["compile-jars"])?,
        runtime_deps: merged.paths(&root_dir, &["runtime-deps"])?,
        runtime_jars: merged.paths(&root_dir, &["runtime-jars"])?,
        test_deps: merged.paths(&root_dir, &["test-deps"])?,
        target: merged.get_str("target").map(|p| resolve_path(&root_dir, &p)),
        test_target: merged.get_str("test-target").map(|p| resolve_path(&root_dir, &p)),
        only_include_in_index: merged.regexes("only-include-in-index")?,
        exclude_from_index: merged.regexes("exclude-from-index")?,
        compiler_args: merged.strings("compiler-args")?,
        java_compiler_args: merged.strings("java-compiler-args")?,
        formatting_prefs: merged.formatting_prefs()?,
        index_on_startup: !merged.flag("disable-index-on-startup"),
        source_load_on_startup: !merged.flag("disable-source-load-on-startup"),
        include_scala_jars: !merged.flag("disable-scala-jars-on-classpath"),
        root_dir,
    };

    // A project with no declared source roots means "the root is the
    // source tree".
    if config.source_roots.is_empty() {
        config.source_roots.push(config.root_dir.clone());
    }
    Ok(config)
}

fn resolve_path(root: &Path, path: &str) -> PathBuf {
    let path = Path::new(path);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    }
}

/// Ordered keyword map over parsed config forms.
#[derive(Debug, Clone, Default)]
struct PList {
    entries: Vec<(String, SExp)>,
}

impl PList {
    fn from_sexp(sexp: &SExp) -> Result<Self, ConfigError> {
        let items = sexp.as_list().ok_or(ConfigError::NotAMap)?;
        if items.len() % 2 != 0 {
            return Err(ConfigError::NotAMap);
        }
        let mut entries = Vec::with_capacity(items.len() / 2);
        for pair in items.chunks(2) {
            match &pair[0] {
                SExp::Key(name) => entries.push((name.clone(), pair[1].clone())),
                _ => return Err(ConfigError::NotAMap),
            }
        }
        Ok(Self { entries })
    }

    fn get(&self, key: &str) -> Option<&SExp> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    fn get_str(&self, key: &str) -> Option<String> {
        self.get(key).and_then(|v| v.as_str()).map(str::to_string)
    }

    fn get_any_str(&self, keys: &[&str]) -> Option<String> {
        keys.iter().find_map(|key| self.get_str(key))
    }

    fn flag(&self, key: &str) -> bool {
        self.get(key).map(SExp::as_bool).unwrap_or(false)
    }

    fn string_list(&self, key: &str) -> Result<Vec<String>, ConfigError> {
        let Some(value) = self.get(key) else {
            return Ok(Vec::new());
        };
        let items = value
            .as_list()
            .ok_or_else(|| ConfigError::InvalidValue { key: key.to_string() })?;
        items
            .iter()
            .map(|item| item.as_str().map(str::to_string))
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| ConfigError::InvalidValue { key: key.to_string() })
    }

    fn strings(&self, key: &str) -> Result<Vec<String>, ConfigError> {
        self.string_list(key)
    }

    fn paths(&self, root: &Path, keys: &[&str]) -> Result<Vec<PathBuf>, ConfigError> {
        let mut out = Vec::new();
        for key in keys {
            out.extend(
                self.string_list(key)?
                    .into_iter()
                    .map(|p| resolve_path(root, &p)),
            );
        }
        Ok(out)
    }

    fn regexes(&self, key: &str) -> Result<Vec<Regex>, ConfigError> {
        self.string_list(key)?
            .into_iter()
            .map(|pattern| {
                Regex::new(&pattern).map_err(|e| ConfigError::Regex {
                    key: key.to_string(),
                    pattern,
                    message: e.to_string(),
                })
            })
            .collect()
    }

    fn formatting_prefs(&self) -> Result<BTreeMap<String, String>, ConfigError> {
        let Some(value) = self.get("formatting-prefs") else {
            return Ok(BTreeMap::new());
        };
        let prefs = PList::from_sexp(value)
            .map_err(|_| ConfigError::InvalidValue { key: "formatting-prefs".to_string() })?;
        Ok(prefs
            .entries
            .into_iter()
            .map(|(key, value)| {
                let rendered = match value {
                    SExp::Str(s) => s,
                    SExp::T => "true".to_string(),
                    SExp::Nil => "false".to_string(),
                    other => other.to_string(),
                };
                (key, rendered)
            })
            .collect())
    }

    /// Overlay `other` on self: list keys concatenate, scalars replace.
    fn absorb(&mut self, other: &PList) {
        for (key, value) in &other.entries {
            if LIST_KEYS.contains(&key.as_str()) {
                match self.entries.iter_mut().find(|(k, _)| k == key) {
                    Some((_, existing)) => {
                        let mut items = existing.as_list().unwrap_or_default().to_vec();
                        items.extend(value.as_list().unwrap_or_default().iter().cloned());
                        *existing = if items.is_empty() { SExp::Nil } else { SExp::List(items) };
                    }
                    None => self.entries.push((key.clone(), value.clone())),
                }
            } else {
                match self.entries.iter_mut().find(|(k, _)| k == key) {
                    Some((_, existing)) => *existing = value.clone(),
                    None => self.entries.push((key.clone(), value.clone())),
                }
            }
        }
    }
}

/// Merge the active subproject (and its module dependencies, transitively)
/// over the main map. Without `:active-subproject` the main map stands.
fn merge_active_subproject(main: &PList) -> Result<PList, ConfigError> {
    let mut base = PList {
        entries: main
            .entries
            .iter()
            .filter(|(k, _)| k != "subprojects" && k != "active-subproject")
            .cloned()
            .collect(),
    };
    let Some(active) = main.get_str("active-subproject") else {
        return Ok(base);
    };

    let mut subprojects = Vec::new();
    if let Some(value) = main.get("subprojects") {
        let items = value
            .as_list()
            .ok_or_else(|| ConfigError::InvalidValue { key: "subprojects".to_string() })?;
        for item in items {
            subprojects.push(PList::from_sexp(item)?);
        }
    }

    let mut merged = Vec::new();
    absorb_module(&active, &subprojects, &mut merged, &mut base)?;
    Ok(base)
}

/// Depth-first module merge: dependencies land before the module that
/// needs them; cycles merge each module once.
fn absorb_module(
    name: &str,
    subprojects: &[PList],
    merged: &mut Vec<String>,
    base: &mut PList,
) -> Result<(), ConfigError> {
    if merged.iter().any(|m| m == name) {
        return Ok(());
    }
    merged.push(name.to_string());

    let sub = subprojects
        .iter()
        .find(|sub| sub.get_any_str(&["module-name", "name"]).as_deref() == Some(name))
        .ok_or_else(|| ConfigError::UnknownSubproject(name.to_string()))?;
    for dep in sub.string_list("depends-on-modules")? {
        absorb_module(&dep, subprojects, merged, base)?;
    }
    base.absorb(sub);
    Ok(())
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
