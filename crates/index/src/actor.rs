// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Ensign Contributors

//! The indexer actor: one mailbox, exclusive ownership of the index
//! directory.

use std::path::PathBuf;

use en_core::rpc::{CallId, Outbound, RpcResponse};
use en_core::symbol::SymbolSearchResult;
use en_core::{EnsignEvent, ErrorKind};
use regex::Regex;
use tokio::sync::mpsc;

use crate::store::SearchIndex;
use crate::suggest::{import_suggestions, EditDistanceCache};
use crate::walker::IndexFilter;
use crate::writer;
use crate::IndexError;

/// Mailbox of the indexer actor.
#[derive(Debug)]
pub enum IndexerMsg {
    /// Decide whether to re-index; rebuild if so; emit `IndexerReady` when
    /// the index is usable. No reply.
    Initialize {
        classpath: Vec<PathBuf>,
        includes: Vec<Regex>,
        excludes: Vec<Regex>,
    },
    /// Upsert one symbol. Fire-and-forget.
    Insert(SymbolSearchResult),
    /// Delete by exact fully qualified name. Fire-and-forget.
    Remove { name: String },
    /// Flush outstanding writes and refresh the reader. Fire-and-forget.
    Commit,
    KeywordSearch {
        keywords: Vec<String>,
        max_results: usize,
        types_only: bool,
        call_id: CallId,
    },
    ImportSuggestions {
        names: Vec<String>,
        max_results: usize,
        call_id: CallId,
    },
}

pub struct Indexer {
    dir: PathBuf,
    /// None only after a failed initialize left the directory unusable.
    store: Option<SearchIndex>,
    distances: EditDistanceCache,
    outbound: mpsc::Sender<Outbound>,
    rx: mpsc::Receiver<IndexerMsg>,
}

impl Indexer {
    /// Open the index under `dir` and start the actor.
    pub fn spawn(
        dir: PathBuf,
        outbound: mpsc::Sender<Outbound>,
    ) -> Result<mpsc::Sender<IndexerMsg>, IndexError> {
        let store = SearchIndex::open(&dir)?;
        let (tx, rx) = mpsc::channel(64);
        let actor = Indexer {
            dir,
            store: Some(store),
            distances: EditDistanceCache::default(),
            outbound,
            rx,
        };
        tokio::spawn(actor.run());
        Ok(tx)
    }

    async fn run(mut self) {
        while let Some(msg) = self.rx.recv().await {
            self.handle(msg).await;
        }
        tracing::debug!("indexer mailbox closed");
    }

    async fn handle(&mut self, msg: IndexerMsg) {
        match msg {
            IndexerMsg::Initialize { classpath, includes, excludes } => {
                self.initialize(classpath, IndexFilter { includes, excludes }).await;
            }
            IndexerMsg::Insert(symbol) => {
                if let Some(store) = self.store.as_mut() {
                    if let Err(e) = store.insert(&symbol) {
                        tracing::error!("index insert failed: {}", e);
                    }
                }
            }
            IndexerMsg::Remove { name } => {
                if let Some(store) = self.store.as_mut() {
                    store.remove(&name);
                }
            }
            IndexerMsg::Commit => {
                if let Some(store) = self.store.as_mut() {
                    if let Err(e) = store.commit() {
                        tracing::error!("index commit failed: {}", e);
                    }
                }
            }
            IndexerMsg::KeywordSearch { keywords, max_results, types_only, call_id } => {
                let result = self.with_store(|store, _| {
                    store.keyword_search(&keywords, max_results, types_only, false)
                });
                self.reply(call_id, result.map(RpcResponse::SymbolSearch)).await;
            }
            IndexerMsg::ImportSuggestions { names, max_results, call_id } => {
                let result = self.with_store(|store, distances| {
                    import_suggestions(store, distances, &names, max_results)
                });
                self.reply(call_id, result.map(RpcResponse::ImportSuggestions)).await;
            }
        }
    }

    /// Tear down and rebuild as needed; exceeding the timeout fails this
    /// attempt but not the process.
    async fn initialize(&mut self, classpath: Vec<PathBuf>, filter: IndexFilter) {
        let Some(store) = self.store.take() else {
            tracing::error!("initialize with no usable index directory");
            return;
        };
        match writer::initialize(store, classpath, filter).await {
            Ok((store, reindexed)) => {
                tracing::info!(reindexed, docs = store.num_docs(), "index initialized");
                self.store = Some(store);
                let _ = self.outbound.send(Outbound::Event(EnsignEvent::IndexerReady)).await;
            }
            Err(e) => {
                tracing::error!("index initialization failed: {}", e);
                match SearchIndex::open(&self.dir) {
                    Ok(store) => self.store = Some(store),
                    Err(e) => tracing::error!("could not reopen index: {}", e),
                }
            }
        }
    }

    fn with_store<T>(
        &mut self,
        f: impl FnOnce(&SearchIndex, &mut EditDistanceCache) -> Result<T, IndexError>,
    ) -> Result<T, IndexError> {
        match self.store.as_ref() {
            Some(store) => f(store, &mut self.distances),
            None => Err(IndexError::Unavailable),
        }
    }

    async fn reply(&self, call_id: CallId, result: Result<RpcResponse, IndexError>) {
        let message = match result {
            Ok(value) => Outbound::Reply { call_id, value },
            Err(e) => {
                tracing::error!(call_id, "indexer request failed: {}", e);
                Outbound::Abort {
                    call_id,
                    kind: ErrorKind::IndexerException,
                    detail: e.to_string(),
                }
            }
        };
        let _ = self.outbound.send(message).await;
    }
}

#[cfg(test)]
#[path = "actor_tests.rs"]
mod tests;
