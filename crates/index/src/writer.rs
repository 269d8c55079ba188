// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Ensign Contributors

//! The producer/consumer build pipeline behind `initialize`.
//!
//! A blocking walker task scans the classpath as fast as disk permits and
//! enqueues symbols on a bounded mailbox; a dedicated writer task drains it
//! sequentially into the index. Walk completion enqueues [`WriteEvent::Stop`]
//! and the caller blocks until the writer acknowledges by handing the store
//! back.

use std::path::PathBuf;
use std::time::Duration;

use en_core::symbol::SymbolSearchResult;
use tokio::sync::mpsc;

use crate::reindex::{hash_classpath, should_reindex, IndexMetadata, INDEX_VERSION};
use crate::store::SearchIndex;
use crate::walker::{scan_classpath, IndexFilter};
use crate::IndexError;

/// Mailbox depth between the walker and the writer.
const WRITER_QUEUE: usize = 1024;

/// Generous upper bound on one initialization attempt.
pub const INITIALIZE_TIMEOUT: Duration = Duration::from_secs(3 * 60 * 60);

pub(crate) enum WriteEvent {
    Insert(SymbolSearchResult),
    Stop,
}

/// Decide whether the on-disk index matches the classpath, rebuilding it if
/// not. Returns the (possibly fresh) store and whether a rebuild ran.
///
/// Consumes the store because a rebuild must drop the writer lock before
/// the directory is torn down. On error the store is gone; the caller
/// reopens.
pub async fn initialize(
    store: SearchIndex,
    classpath: Vec<PathBuf>,
    filter: IndexFilter,
) -> Result<(SearchIndex, bool), IndexError> {
    let hash_input = classpath.clone();
    let proposed = tokio::task::spawn_blocking(move || hash_classpath(&hash_input))
        .await
        .map_err(|_| IndexError::WriterStopped)?;

    if !should_reindex(store.metadata(), &proposed) {
        tracing::info!(entries = proposed.len(), "index is up to date");
        return Ok((store, false));
    }

    let dir = store.path().to_path_buf();
    tracing::info!(path = %dir.display(), entries = proposed.len(), "rebuilding index");
    drop(store);
    SearchIndex::wipe(&dir)?;
    let mut store = SearchIndex::open(&dir)?;
    store.set_metadata(IndexMetadata { index_version: INDEX_VERSION, file_hashes: proposed });

    let (tx, rx) = mpsc::channel(WRITER_QUEUE);
    let walker = tokio::task::spawn_blocking(move || {
        let result = scan_classpath(&classpath, &filter, &mut |symbol| {
            tx.blocking_send(WriteEvent::Insert(symbol))
                .map_err(|_| IndexError::WriterStopped)
        });
        // Stop even after a failed walk so the writer commits what it has.
        let _ = tx.blocking_send(WriteEvent::Stop);
        result
    });
    let writer = tokio::task::spawn_blocking(move || drain(store, rx));

    let store = match tokio::time::timeout(INITIALIZE_TIMEOUT, writer).await {
        Ok(joined) => joined.map_err(|_| IndexError::WriterStopped)??,
        Err(_) => return Err(IndexError::Timeout),
    };
    match walker.await {
        Ok(Ok(_stats)) => {}
        Ok(Err(e)) => tracing::warn!("classpath walk ended early: {}", e),
        Err(e) => tracing::warn!("classpath walker panicked: {}", e),
    }

    Ok((store, true))
}

/// The writer actor body: sequentially drain the mailbox, then commit.
fn drain(
    mut store: SearchIndex,
    mut rx: mpsc::Receiver<WriteEvent>,
) -> Result<SearchIndex, IndexError> {
    let mut written = 0usize;
    while let Some(event) = rx.blocking_recv() {
        match event {
            WriteEvent::Insert(symbol) => {
                store.insert(&symbol)?;
                written += 1;
                if written % 10_000 == 0 {
                    tracing::debug!(written, "index write progress");
                }
            }
            WriteEvent::Stop => break,
        }
    }
    store.commit()?;
    tracing::info!(written, "index build committed");
    Ok(store)
}

#[cfg(test)]
#[path = "writer_tests.rs"]
mod tests;
