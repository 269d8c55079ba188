// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Ensign Contributors

//! The analyzer actor: readiness gate plus request mediation.
//!
//! Until the initial full typecheck completes every RPC aborts with
//! `analyzer-not-ready`; afterwards requests run on the actor thread and
//! any handler error becomes `analyzer-exception` rather than propagating.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use en_core::event::{EnsignEvent, Note, NoteLang};
use en_core::rpc::{AnalyzerReq, CallId, Outbound, RpcResponse};
use en_core::semantic::RefactorEffect;
use en_core::ErrorKind;
use en_index::IndexerMsg;
use tokio::sync::mpsc;

use crate::compiler::{
    CompilerError, JavaCompiler, RefactorTransformer, SemanticCompiler, SourceFormatter,
};
use crate::patch::apply_edits;
use crate::AnalyzerError;

/// Mailbox of the analyzer actor.
#[derive(Debug)]
pub enum AnalyzerMsg {
    Rpc {
        req: AnalyzerReq,
        call_id: CallId,
    },
    /// A background typecheck finished.
    CheckDone {
        notes: Result<Vec<Note>, CompilerError>,
        initial: bool,
    },
}

/// External tooling behind the actor.
pub struct AnalyzerDeps {
    pub compiler: Arc<dyn SemanticCompiler>,
    pub java: Arc<dyn JavaCompiler>,
    pub formatter: Arc<dyn SourceFormatter>,
    pub refactoring: Arc<dyn RefactorTransformer>,
}

pub struct Analyzer {
    deps: AnalyzerDeps,
    outbound: mpsc::Sender<Outbound>,
    indexer: mpsc::Sender<IndexerMsg>,
    self_tx: mpsc::Sender<AnalyzerMsg>,
    rx: mpsc::Receiver<AnalyzerMsg>,
    ready: bool,
    /// Prepared refactorings by procedure id, dropped on exec or cancel.
    refactorings: HashMap<i64, RefactorEffect>,
}

impl Analyzer {
    /// Start the actor and kick the initial typecheck in the background.
    /// With `load_sources_on_startup` off the initial check is skipped and
    /// the gate opens immediately.
    pub fn spawn(
        deps: AnalyzerDeps,
        indexer: mpsc::Sender<IndexerMsg>,
        outbound: mpsc::Sender<Outbound>,
        load_sources_on_startup: bool,
    ) -> mpsc::Sender<AnalyzerMsg> {
        let (tx, rx) = mpsc::channel(64);
        let actor = Analyzer {
            deps,
            outbound,
            indexer,
            self_tx: tx.clone(),
            rx,
            ready: false,
            refactorings: HashMap::new(),
        };
        if load_sources_on_startup {
            actor.kick_typecheck(true);
        } else {
            let self_tx = tx.clone();
            tokio::spawn(async move {
                let _ = self_tx
                    .send(AnalyzerMsg::CheckDone { notes: Ok(Vec::new()), initial: true })
                    .await;
            });
        }
        tokio::spawn(actor.run());
        tx
    }

    fn kick_typecheck(&self, initial: bool) {
        let compiler = Arc::clone(&self.deps.compiler);
        let self_tx = self.self_tx.clone();
        tokio::task::spawn_blocking(move || {
            let notes = compiler.full_typecheck();
            let _ = self_tx.blocking_send(AnalyzerMsg::CheckDone { notes, initial });
        });
    }

    async fn run(mut self) {
        while let Some(msg) = self.rx.recv().await {
            match msg {
                AnalyzerMsg::Rpc { req, call_id } => self.handle_rpc(req, call_id).await,
                AnalyzerMsg::CheckDone { notes, initial } => {
                    self.on_check_done(notes, initial).await;
                }
            }
        }
        tracing::debug!("analyzer mailbox closed");
    }

    async fn on_check_done(&mut self, notes: Result<Vec<Note>, CompilerError>, initial: bool) {
        match notes {
            Ok(notes) => self.publish_notes(NoteLang::Scala, notes).await,
            Err(e) => tracing::error!("full typecheck failed: {}", e),
        }
        self.send_event(EnsignEvent::FullTypeCheckComplete).await;
        if initial {
            self.ready = true;
            self.send_event(EnsignEvent::AnalyzerReady).await;
            let _ = self.indexer.send(IndexerMsg::Commit).await;
            tracing::info!("analyzer ready");
        }
    }

    async fn publish_notes(&self, lang: NoteLang, notes: Vec<Note>) {
        self.send_event(EnsignEvent::ClearAllNotes { lang }).await;
        if !notes.is_empty() {
            self.send_event(EnsignEvent::NewNotes { lang, notes }).await;
        }
    }

    async fn send_event(&self, event: EnsignEvent) {
        let _ = self.outbound.send(Outbound::Event(event)).await;
    }

    async fn handle_rpc(&mut self, req: AnalyzerReq, call_id: CallId) {
        if !self.ready {
            let _ = self
                .outbound
                .send(Outbound::Abort {
                    call_id,
                    kind: ErrorKind::AnalyzerNotReady,
                    detail: "analyzer is not ready".to_string(),
                })
                .await;
            return;
        }

        match self.dispatch(req, call_id).await {
            Ok(Some(value)) => {
                let _ = self.outbound.send(Outbound::Reply { call_id, value }).await;
            }
            // Forwarded elsewhere; the owner replies under this call id.
            Ok(None) => {}
            Err(e) => {
                tracing::error!(call_id, "analyzer request failed: {}", e);
                let _ = self
                    .outbound
                    .send(Outbound::Abort { call_id, kind: e.kind(), detail: e.to_string() })
                    .await;
            }
        }
    }

    async fn dispatch(
        &mut self,
        req: AnalyzerReq,
        call_id: CallId,
    ) -> Result<Option<RpcResponse>, AnalyzerError> {
        use AnalyzerReq as A;
        let compiler = &self.deps.compiler;
        let reply = match req {
            A::RemoveFile { file } => {
                compiler.remove_file(&file)?;
                RpcResponse::True
            }
            A::ReloadAll => {
                self.kick_typecheck(false);
                RpcResponse::True
            }
            A::ReloadFiles { files } => {
                self.reload_files(files).await?;
                RpcResponse::True
            }
            A::PatchSource { file, edits } => {
                let original = std::fs::read_to_string(&file)
                    .map_err(|_| AnalyzerError::FileNotFound(file.clone()))?;
                let patched = apply_edits(&original, &edits);
                compiler.reload_patched(&file, patched)?;
                RpcResponse::True
            }
            A::Completions { file, point, max_results, case_sensitive, reload } => {
                RpcResponse::Completions(compiler.completions(
                    &file,
                    point,
                    max_results,
                    case_sensitive,
                    reload,
                )?)
            }
            A::UsesOfSymAtPoint { file, point } => {
                RpcResponse::SourceRanges(compiler.uses_of_sym_at_point(&file, point)?)
            }
            A::PackageMemberCompletion { path, prefix } => {
                RpcResponse::CompletionList(compiler.package_member_completion(&path, &prefix)?)
            }
            A::InspectTypeAtPoint { file, point } => {
                RpcResponse::TypeInfo(compiler.inspect_type_at_point(&file, point)?)
            }
            A::InspectTypeById { id } => RpcResponse::TypeInfo(compiler.inspect_type_by_id(id)?),
            A::SymbolAtPoint { file, point } => {
                RpcResponse::SymbolInfo(compiler.symbol_at_point(&file, point)?)
            }
            A::InspectPackageByPath { path } => {
                RpcResponse::PackageInfo(compiler.inspect_package_by_path(&path)?)
            }
            A::TypeAtPoint { file, point } => {
                RpcResponse::TypeInfo(compiler.type_at_point(&file, point)?)
            }
            A::TypeById { id } => RpcResponse::TypeInfo(compiler.type_by_id(id)?),
            A::TypeByName { name } => RpcResponse::TypeInfo(compiler.type_by_name(&name)?),
            A::TypeByNameAtPoint { name, file, point } => {
                RpcResponse::TypeInfo(compiler.type_by_name_at_point(&name, &file, point)?)
            }
            A::CallCompletion { id } => RpcResponse::CallCompletion(compiler.call_completion(id)?),
            A::SymbolDesignations { file, start, end, kinds } => {
                if is_target_language(&file) {
                    RpcResponse::Designations(
                        compiler.symbol_designations(&file, start, end, &kinds)?,
                    )
                } else {
                    RpcResponse::Designations(en_core::semantic::SymbolDesignations {
                        file,
                        designations: Vec::new(),
                    })
                }
            }
            A::FormatSource { files } => {
                self.deps
                    .formatter
                    .format_files(&files)
                    .map_err(|e| AnalyzerError::Format(e.to_string()))?;
                RpcResponse::True
            }
            A::PrepareRefactor { procedure_id, kind, params } => {
                let effect = self.deps.refactoring.prepare(procedure_id, &kind, &params)?;
                self.refactorings.insert(procedure_id, effect.clone());
                RpcResponse::Refactor(effect)
            }
            A::ExecRefactor { procedure_id } => {
                let effect = self.refactorings.remove(&procedure_id).ok_or_else(|| {
                    AnalyzerError::Compiler(CompilerError::Failed(format!(
                        "no prepared refactoring {}",
                        procedure_id
                    )))
                })?;
                self.deps.refactoring.execute(&effect)?;
                RpcResponse::Refactor(effect)
            }
            A::CancelRefactor { procedure_id } => {
                self.refactorings.remove(&procedure_id);
                RpcResponse::True
            }
            A::ImportSuggestions { names, max_results, .. } => {
                let _ = self
                    .indexer
                    .send(IndexerMsg::ImportSuggestions { names, max_results, call_id })
                    .await;
                return Ok(None);
            }
            A::PublicSymbolSearch { keywords, max_results } => {
                let _ = self
                    .indexer
                    .send(IndexerMsg::KeywordSearch {
                        keywords,
                        max_results,
                        types_only: false,
                        call_id,
                    })
                    .await;
                return Ok(None);
            }
        };
        Ok(Some(reply))
    }

    /// Route java sources to the java compiler and everything else to the
    /// presentation compiler, publishing both compilers' notes.
    async fn reload_files(&self, files: Vec<PathBuf>) -> Result<(), AnalyzerError> {
        let (java, scala): (Vec<PathBuf>, Vec<PathBuf>) =
            files.into_iter().partition(|f| is_java(f));

        if !scala.is_empty() {
            let notes = self.deps.compiler.reload_files(&scala)?;
            self.publish_notes(NoteLang::Scala, notes).await;
        }
        if !java.is_empty() {
            let notes = self.deps.java.reload_files(&java)?;
            self.publish_notes(NoteLang::Java, notes).await;
        }
        Ok(())
    }
}

fn is_java(file: &Path) -> bool {
    file.extension().and_then(|e| e.to_str()) == Some("java")
}

fn is_target_language(file: &Path) -> bool {
    file.extension().and_then(|e| e.to_str()) == Some("scala")
}

#[cfg(test)]
#[path = "actor_tests.rs"]
mod tests;
