// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Ensign Contributors

//! Scripted compiler fakes for the actor tests.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use en_core::event::Note;
use en_core::semantic::{
    CallCompletionInfo, CompletionInfo, CompletionInfoList, PackageInfo, RefactorEffect,
    SourceRange, SymbolDesignationKind, SymbolDesignations, SymbolInfo, TypeInfo,
};
use parking_lot::Mutex;

use crate::compiler::{
    CompilerError, CompilerResult, JavaCompiler, RefactorTransformer, SemanticCompiler,
    SourceFormatter,
};

#[derive(Debug, Default)]
pub struct FakeCompilerState {
    pub completions: Vec<CompletionInfo>,
    pub initial_notes: Vec<Note>,
    pub reloaded: Vec<PathBuf>,
    pub java_reloaded: Vec<PathBuf>,
    pub removed: Vec<PathBuf>,
    pub patched: Vec<(PathBuf, String)>,
    pub formatted: Vec<PathBuf>,
    pub typechecks: usize,
    pub fail_completions: bool,
}

/// A compiler whose initial typecheck blocks until [`FakeCompiler::release`]
/// is called, so tests can observe the readiness gate.
pub struct FakeCompiler {
    pub state: Arc<Mutex<FakeCompilerState>>,
    gate: Arc<Mutex<Option<std::sync::mpsc::Receiver<()>>>>,
    release_tx: std::sync::mpsc::Sender<()>,
}

impl FakeCompiler {
    pub fn new() -> (Arc<Self>, Arc<Mutex<FakeCompilerState>>) {
        let state = Arc::new(Mutex::new(FakeCompilerState::default()));
        let (release_tx, release_rx) = std::sync::mpsc::channel();
        let fake = Arc::new(FakeCompiler {
            state: Arc::clone(&state),
            gate: Arc::new(Mutex::new(Some(release_rx))),
            release_tx,
        });
        (fake, state)
    }

    /// Let the pending initial typecheck finish.
    pub fn release(&self) {
        let _ = self.release_tx.send(());
    }
}

impl SemanticCompiler for FakeCompiler {
    fn full_typecheck(&self) -> CompilerResult<Vec<Note>> {
        // Only the first typecheck waits on the gate.
        let gate = self.gate.lock().take();
        if let Some(gate) = gate {
            let _ = gate.recv();
        }
        let mut state = self.state.lock();
        state.typechecks += 1;
        Ok(state.initial_notes.clone())
    }

    fn remove_file(&self, file: &Path) -> CompilerResult<()> {
        self.state.lock().removed.push(file.to_path_buf());
        Ok(())
    }

    fn reload_files(&self, files: &[PathBuf]) -> CompilerResult<Vec<Note>> {
        self.state.lock().reloaded.extend_from_slice(files);
        Ok(Vec::new())
    }

    fn reload_patched(&self, file: &Path, text: String) -> CompilerResult<()> {
        self.state.lock().patched.push((file.to_path_buf(), text));
        Ok(())
    }

    fn completions(
        &self,
        _file: &Path,
        _point: u32,
        max_results: usize,
        _case_sensitive: bool,
        _reload: bool,
    ) -> CompilerResult<CompletionInfoList> {
        let state = self.state.lock();
        if state.fail_completions {
            return Err(CompilerError::Failed("compiler crashed".to_string()));
        }
        Ok(CompletionInfoList {
            prefix: "fo".to_string(),
            completions: state.completions.iter().take(max_results).cloned().collect(),
        })
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
        kinds: &[SymbolDesignationKind],
    ) -> CompilerResult<SymbolDesignations> {
        // One designation per requested kind, so tests can see routing.
        Ok(SymbolDesignations {
            file: file.to_path_buf(),
            designations: kinds
                .iter()
                .enumerate()
                .map(|(i, kind)| en_core::semantic::SymbolDesignation {
                    start: i as u32,
                    end: i as u32 + 1,
                    kind: *kind,
                })
                .collect(),
        })
    }
}

impl JavaCompiler for FakeCompiler {
    fn reload_files(&self, files: &[PathBuf]) -> CompilerResult<Vec<Note>> {
        self.state.lock().java_reloaded.extend_from_slice(files);
        Ok(Vec::new())
    }
}

impl SourceFormatter for FakeCompiler {
    fn format_files(&self, files: &[PathBuf]) -> CompilerResult<()> {
        self.state.lock().formatted.extend_from_slice(files);
        Ok(())
    }
}

impl RefactorTransformer for FakeCompiler {
    fn prepare(
        &self,
        procedure_id: i64,
        kind: &str,
        _params: &[(String, String)],
    ) -> CompilerResult<RefactorEffect> {
        Ok(RefactorEffect { procedure_id, kind: kind.to_string(), changes: Vec::new() })
    }

    fn execute(&self, _effect: &RefactorEffect) -> CompilerResult<()> {
        Ok(())
    }
}
