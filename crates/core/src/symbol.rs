// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Ensign Contributors

//! Symbol search results produced by the classpath index.

use std::path::PathBuf;

/// Position of a definition as a file plus a character offset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OffsetSourcePosition {
    pub file: PathBuf,
    pub offset: u32,
}

/// How a symbol is declared in source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeclaredAs {
    Class,
    Trait,
    Object,
    Method,
}

impl DeclaredAs {
    /// Wire symbol for this declaration kind.
    pub fn wire_name(self) -> &'static str {
        match self {
            DeclaredAs::Class => "class",
            DeclaredAs::Trait => "trait",
            DeclaredAs::Object => "object",
            DeclaredAs::Method => "method",
        }
    }
}

/// A hit from the symbol index: either a type or a method.
///
/// `local_name` is always the trailing segment of `name`, and a method's
/// `owner` names a type present in the same classpath scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SymbolSearchResult {
    Type {
        name: String,
        local_name: String,
        decl_as: DeclaredAs,
        pos: Option<OffsetSourcePosition>,
    },
    Method {
        name: String,
        local_name: String,
        owner: String,
        pos: Option<OffsetSourcePosition>,
    },
}

impl SymbolSearchResult {
    pub fn name(&self) -> &str {
        match self {
            SymbolSearchResult::Type { name, .. } | SymbolSearchResult::Method { name, .. } => name,
        }
    }

    pub fn local_name(&self) -> &str {
        match self {
            SymbolSearchResult::Type { local_name, .. }
            | SymbolSearchResult::Method { local_name, .. } => local_name,
        }
    }

    pub fn pos(&self) -> Option<&OffsetSourcePosition> {
        match self {
            SymbolSearchResult::Type { pos, .. } | SymbolSearchResult::Method { pos, .. } => {
                pos.as_ref()
            }
        }
    }

    pub fn decl_as(&self) -> DeclaredAs {
        match self {
            SymbolSearchResult::Type { decl_as, .. } => *decl_as,
            SymbolSearchResult::Method { .. } => DeclaredAs::Method,
        }
    }

    pub fn is_type(&self) -> bool {
        matches!(self, SymbolSearchResult::Type { .. })
    }
}

/// The trailing segment of a dotted fully qualified name.
pub fn local_name_of(name: &str) -> &str {
    name.rsplit('.').next().unwrap_or(name)
}

#[cfg(test)]
#[path = "symbol_tests.rs"]
mod tests;
