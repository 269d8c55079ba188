// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Ensign Contributors

//! Classpath walking: directories and jar archives down to class files,
//! class files down to symbol results.

use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use en_core::symbol::{local_name_of, DeclaredAs, OffsetSourcePosition, SymbolSearchResult};
use regex::Regex;

use crate::classfile::{parse_class, ClassInfo};
use crate::IndexError;

/// Include/exclude filter over fully qualified names. An empty include list
/// admits everything; excludes always win.
#[derive(Debug, Clone, Default)]
pub struct IndexFilter {
    pub includes: Vec<Regex>,
    pub excludes: Vec<Regex>,
}

impl IndexFilter {
    pub fn accepts(&self, name: &str) -> bool {
        if !self.includes.is_empty() && !self.includes.iter().any(|re| re.is_match(name)) {
            return false;
        }
        !self.excludes.iter().any(|re| re.is_match(name))
    }
}

/// A type name is indexable when `$` appears either not at all or only as
/// the final character. That keeps companion-object markers and drops
/// synthetic inner classes.
pub fn valid_type(name: &str) -> bool {
    match name.find('$') {
        None => true,
        Some(at) => at == name.len() - 1,
    }
}

/// A method name is indexable when it carries no `$` and is neither a
/// constructor nor the self reference.
pub fn valid_method(name: &str) -> bool {
    !name.contains('$') && name != "<init>" && name != "this"
}

/// Walk every classpath entry, handing each accepted symbol to `emit`.
/// `emit` returning an error aborts the walk (the writer went away).
///
/// Unreadable entries and malformed class files are skipped with a log
/// line; a classpath with junk in it is normal.
pub fn scan_classpath<E>(
    entries: &[PathBuf],
    filter: &IndexFilter,
    emit: &mut E,
) -> Result<ScanStats, IndexError>
where
    E: FnMut(SymbolSearchResult) -> Result<(), IndexError>,
{
    let mut stats = ScanStats::default();
    for entry in entries {
        if entry.is_dir() {
            scan_class_dir(entry, filter, emit, &mut stats)?;
        } else if is_archive(entry) {
            scan_archive(entry, filter, emit, &mut stats)?;
        }
    }
    tracing::info!(
        classes = stats.classes,
        symbols = stats.symbols,
        skipped = stats.skipped,
        "classpath scan finished"
    );
    Ok(stats)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanStats {
    /// Class files successfully parsed.
    pub classes: usize,
    /// Symbols accepted and emitted.
    pub symbols: usize,
    /// Class files skipped as unreadable or malformed.
    pub skipped: usize,
}

fn is_archive(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("jar") | Some("zip")
    )
}

fn scan_class_dir<E>(
    dir: &Path,
    filter: &IndexFilter,
    emit: &mut E,
    stats: &mut ScanStats,
) -> Result<(), IndexError>
where
    E: FnMut(SymbolSearchResult) -> Result<(), IndexError>,
{
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::debug!(path = %dir.display(), "skipping unreadable dir: {}", e);
            return Ok(());
        }
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            scan_class_dir(&path, filter, emit, stats)?;
        } else if path.extension().and_then(|e| e.to_str()) == Some("class") {
            match fs::read(&path).map_err(IndexError::Io).and_then(|b| parse_class(&b)) {
                Ok(info) => {
                    stats.classes += 1;
                    emit_symbols(&info, Some(&path), filter, emit, stats)?;
                }
                Err(e) => {
                    stats.skipped += 1;
                    tracing::debug!(path = %path.display(), "skipping class file: {}", e);
                }
            }
        }
    }
    Ok(())
}

fn scan_archive<E>(
    archive: &Path,
    filter: &IndexFilter,
    emit: &mut E,
    stats: &mut ScanStats,
) -> Result<(), IndexError>
where
    E: FnMut(SymbolSearchResult) -> Result<(), IndexError>,
{
    let file = match fs::File::open(archive) {
        Ok(file) => file,
        Err(e) => {
            tracing::warn!(path = %archive.display(), "skipping unreadable archive: {}", e);
            return Ok(());
        }
    };
    let mut zip = match zip::ZipArchive::new(file) {
        Ok(zip) => zip,
        Err(e) => {
            tracing::warn!(path = %archive.display(), "skipping malformed archive: {}", e);
            return Ok(());
        }
    };

    let mut bytes = Vec::new();
    for i in 0..zip.len() {
        let mut entry = match zip.by_index(i) {
            Ok(entry) => entry,
            Err(_) => {
                stats.skipped += 1;
                continue;
            }
        };
        if !entry.name().ends_with(".class") {
            continue;
        }
        bytes.clear();
        if entry.read_to_end(&mut bytes).is_err() {
            stats.skipped += 1;
            continue;
        }
        match parse_class(&bytes) {
            Ok(info) => {
                stats.classes += 1;
                emit_symbols(&info, None, filter, emit, stats)?;
            }
            Err(e) => {
                stats.skipped += 1;
                tracing::debug!(archive = %archive.display(), entry = entry.name(), "skipping class file: {}", e);
            }
        }
    }
    Ok(())
}

/// Accepted symbols of one parsed class: the type itself plus its public,
/// valid methods.
fn emit_symbols<E>(
    info: &ClassInfo,
    class_file: Option<&Path>,
    filter: &IndexFilter,
    emit: &mut E,
    stats: &mut ScanStats,
) -> Result<(), IndexError>
where
    E: FnMut(SymbolSearchResult) -> Result<(), IndexError>,
{
    if !info.is_public() || !valid_type(&info.name) || !filter.accepts(&info.name) {
        return Ok(());
    }

    let decl_as = if info.is_interface() {
        DeclaredAs::Trait
    } else if info.name.ends_with('$') {
        DeclaredAs::Object
    } else {
        DeclaredAs::Class
    };
    let pos = class_file.map(|file| OffsetSourcePosition { file: file.to_path_buf(), offset: 0 });

    emit(SymbolSearchResult::Type {
        name: info.name.clone(),
        local_name: local_name_of(&info.name).to_string(),
        decl_as,
        pos: pos.clone(),
    })?;
    stats.symbols += 1;

    for method in &info.methods {
        if !method.is_public() || !valid_method(&method.name) {
            continue;
        }
        let full = format!("{}.{}", info.name, method.name);
        if !filter.accepts(&full) {
            continue;
        }
        emit(SymbolSearchResult::Method {
            local_name: method.name.clone(),
            owner: info.name.clone(),
            name: full,
            pos: pos.clone(),
        })?;
        stats.symbols += 1;
    }
    Ok(())
}

#[cfg(test)]
#[path = "walker_tests.rs"]
mod tests;
