// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Ensign Contributors

//! Semantic values produced by the compiler seams and shipped to the client.

use std::path::PathBuf;

use crate::symbol::{DeclaredAs, OffsetSourcePosition};

/// One completion candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionInfo {
    pub name: String,
    pub type_sig: String,
    pub type_id: i64,
    pub is_callable: bool,
    pub relevance: i32,
    pub to_insert: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionInfoList {
    pub prefix: String,
    pub completions: Vec<CompletionInfo>,
}

/// A character range inside a source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceRange {
    pub file: PathBuf,
    pub start: u32,
    pub end: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeInfo {
    pub name: String,
    pub full_name: String,
    pub decl_as: DeclaredAs,
    pub type_id: i64,
    pub pos: Option<OffsetSourcePosition>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolInfo {
    pub name: String,
    pub local_name: String,
    pub decl_pos: Option<OffsetSourcePosition>,
    pub tpe: TypeInfo,
    pub is_callable: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageInfo {
    pub name: String,
    pub full_name: String,
    pub members: Vec<TypeInfo>,
}

/// Semantic highlighting classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolDesignationKind {
    Object,
    Class,
    Trait,
    Package,
    Method,
    Val,
    Var,
    Param,
    TypeParam,
}

impl SymbolDesignationKind {
    pub fn wire_name(self) -> &'static str {
        match self {
            SymbolDesignationKind::Object => "object",
            SymbolDesignationKind::Class => "class",
            SymbolDesignationKind::Trait => "trait",
            SymbolDesignationKind::Package => "package",
            SymbolDesignationKind::Method => "method",
            SymbolDesignationKind::Val => "val",
            SymbolDesignationKind::Var => "var",
            SymbolDesignationKind::Param => "param",
            SymbolDesignationKind::TypeParam => "typeParam",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "object" => Some(Self::Object),
            "class" => Some(Self::Class),
            "trait" => Some(Self::Trait),
            "package" => Some(Self::Package),
            "method" => Some(Self::Method),
            "val" => Some(Self::Val),
            "var" => Some(Self::Var),
            "param" => Some(Self::Param),
            "typeParam" => Some(Self::TypeParam),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolDesignation {
    pub start: u32,
    pub end: u32,
    pub kind: SymbolDesignationKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolDesignations {
    pub file: PathBuf,
    pub designations: Vec<SymbolDesignation>,
}

/// One parameter section of a callable signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamSection {
    pub params: Vec<(String, TypeInfo)>,
}

/// Signature help for a call under construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallCompletionInfo {
    pub result_type: TypeInfo,
    pub param_sections: Vec<ParamSection>,
}

/// One textual change produced by a refactoring.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEdit {
    pub file: PathBuf,
    pub from: u32,
    pub to: u32,
    pub text: String,
}

/// A prepared refactoring, held server-side until executed or cancelled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefactorEffect {
    pub procedure_id: i64,
    pub kind: String,
    pub changes: Vec<FileEdit>,
}
