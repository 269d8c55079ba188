// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Ensign Contributors

//! Seams to the external language tooling: the presentation compiler, the
//! Java compiler, the source formatter, and the refactoring transformer.
//!
//! The analyzer actor only mediates; everything semantic happens behind
//! these traits.

use std::path::{Path, PathBuf};

use en_core::event::Note;
use en_core::semantic::{
    CallCompletionInfo, CompletionInfo, CompletionInfoList, PackageInfo, RefactorEffect,
    SourceRange, SymbolDesignationKind, SymbolDesignations, SymbolInfo, TypeInfo,
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CompilerError {
    #[error("{0}")]
    Failed(String),
}

pub type CompilerResult<T> = Result<T, CompilerError>;

/// The incremental type-checker for the target language.
pub trait SemanticCompiler: Send + Sync + 'static {
    /// Type-check every known source. Blocking; runs on a background task.
    fn full_typecheck(&self) -> CompilerResult<Vec<Note>>;

    fn remove_file(&self, file: &Path) -> CompilerResult<()>;
    fn reload_files(&self, files: &[PathBuf]) -> CompilerResult<Vec<Note>>;
    /// Replace one source with already-patched text, without touching disk.
    fn reload_patched(&self, file: &Path, text: String) -> CompilerResult<()>;

    fn completions(
        &self,
        file: &Path,
        point: u32,
        max_results: usize,
        case_sensitive: bool,
        reload: bool,
    ) -> CompilerResult<CompletionInfoList>;
    fn uses_of_sym_at_point(&self, file: &Path, point: u32) -> CompilerResult<Vec<SourceRange>>;
    fn package_member_completion(
        &self,
        path: &str,
        prefix: &str,
    ) -> CompilerResult<Vec<CompletionInfo>>;

    fn inspect_type_at_point(&self, file: &Path, point: u32) -> CompilerResult<Option<TypeInfo>>;
    fn inspect_type_by_id(&self, id: i64) -> CompilerResult<Option<TypeInfo>>;
    fn symbol_at_point(&self, file: &Path, point: u32) -> CompilerResult<Option<SymbolInfo>>;
    fn inspect_package_by_path(&self, path: &str) -> CompilerResult<Option<PackageInfo>>;
    fn type_at_point(&self, file: &Path, point: u32) -> CompilerResult<Option<TypeInfo>>;
    fn type_by_id(&self, id: i64) -> CompilerResult<Option<TypeInfo>>;
    fn type_by_name(&self, name: &str) -> CompilerResult<Option<TypeInfo>>;
    /// Like [`Self::type_by_name`], but resolved in the scope around
    /// `point`.
    fn type_by_name_at_point(
        &self,
        name: &str,
        file: &Path,
        point: u32,
    ) -> CompilerResult<Option<TypeInfo>>;
    fn call_completion(&self, id: i64) -> CompilerResult<Option<CallCompletionInfo>>;
    fn symbol_designations(
        &self,
        file: &Path,
        start: u32,
        end: u32,
        kinds: &[SymbolDesignationKind],
    ) -> CompilerResult<SymbolDesignations>;
}

/// The Java half of the project, reload-only.
pub trait JavaCompiler: Send + Sync + 'static {
    fn reload_files(&self, files: &[PathBuf]) -> CompilerResult<Vec<Note>>;
}

pub trait SourceFormatter: Send + Sync + 'static {
    fn format_files(&self, files: &[PathBuf]) -> CompilerResult<()>;
}

pub trait RefactorTransformer: Send + Sync + 'static {
    fn prepare(
        &self,
        procedure_id: i64,
        kind: &str,
        params: &[(String, String)],
    ) -> CompilerResult<RefactorEffect>;
    fn execute(&self, effect: &RefactorEffect) -> CompilerResult<()>;
}

/// Stands in until a real compiler backend is wired up: every query
/// answers empty rather than failing, so the rest of the daemon (indexer,
/// debugger) stays usable.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopCompiler;

impl SemanticCompiler for NoopCompiler {
    fn full_typecheck(&self) -> CompilerResult<Vec<Note>> {
        Ok(Vec::new())
    }

    fn remove_file(&self, _file: &Path) -> CompilerResult<()> {
        Ok(())
    }

    fn reload_files(&self, _files: &[PathBuf]) -> CompilerResult<Vec<Note>> {
        Ok(Vec::new())
    }

    fn reload_patched(&self, _file: &Path, _text: String) -> CompilerResult<()> {
        Ok(())
    }

    fn completions(
        &self,
        _file: &Path,
        _point: u32,
        _max_results: usize,
        _case_sensitive: bool,
        _reload: bool,
    ) -> CompilerResult<CompletionInfoList> {
        Ok(CompletionInfoList { prefix: String::new(), completions: Vec::new() })
    }

    fn uses_of_sym_at_point(&self, _file: &Path, _point: u32) -> CompilerResult<Vec<SourceRange>> {
        Ok(Vec::new())
    }

    fn package_member_completion(
        &self,
        _path: &str,
        _prefix: &str,
    ) -> CompilerResult<Vec<CompletionInfo>> {
        Ok(Vec::new())
    }

    fn inspect_type_at_point(
        &self,
        _file: &Path,
        _point: u32,
    ) -> CompilerResult<Option<TypeInfo>> {
        Ok(None)
    }

    fn inspect_type_by_id(&self, _id: i64) -> CompilerResult<Option<TypeInfo>> {
        Ok(None)
    }

    fn symbol_at_point(&self, _file: &Path, _point: u32) -> CompilerResult<Option<SymbolInfo>> {
        Ok(None)
    }

    fn inspect_package_by_path(&self, _path: &str) -> CompilerResult<Option<PackageInfo>> {
        Ok(None)
    }

    fn type_at_point(&self, _file: &Path, _point: u32) -> CompilerResult<Option<TypeInfo>> {
        Ok(None)
    }

    fn type_by_id(&self, _id: i64) -> CompilerResult<Option<TypeInfo>> {
        Ok(None)
    }

    fn type_by_name(&self, _name: &str) -> CompilerResult<Option<TypeInfo>> {
        Ok(None)
    }

    fn type_by_name_at_point(
        &self,
        _name: &str,
        _file: &Path,
        _point: u32,
    ) -> CompilerResult<Option<TypeInfo>> {
        Ok(None)
    }

    fn call_completion(&self, _id: i64) -> CompilerResult<Option<CallCompletionInfo>> {
        Ok(None)
    }

    fn symbol_designations(
        &self,
        file: &Path,
        _start: u32,
        _end: u32,
        _kinds: &[SymbolDesignationKind],
    ) -> CompilerResult<SymbolDesignations> {
        Ok(SymbolDesignations { file: file.to_path_buf(), designations: Vec::new() })
    }
}

impl JavaCompiler for NoopCompiler {
    fn reload_files(&self, _files: &[PathBuf]) -> CompilerResult<Vec<Note>> {
        Ok(Vec::new())
    }
}

impl SourceFormatter for NoopCompiler {
    fn format_files(&self, _files: &[PathBuf]) -> CompilerResult<()> {
        Ok(())
    }
}

impl RefactorTransformer for NoopCompiler {
    fn prepare(
        &self,
        _procedure_id: i64,
        kind: &str,
        _params: &[(String, String)],
    ) -> CompilerResult<RefactorEffect> {
        Err(CompilerError::Failed(format!("no transformer for {:?}", kind)))
    }

    fn execute(&self, _effect: &RefactorEffect) -> CompilerResult<()> {
        Err(CompilerError::Failed("no transformer".to_string()))
    }
}
