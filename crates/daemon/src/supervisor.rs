// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Ensign Contributors

//! Daemon startup: load configuration, wire the actors, bind the socket,
//! advertise the port, then serve one client at a time.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use en_analyzer::{Analyzer, AnalyzerDeps, NoopCompiler};
use en_core::Config;
use en_debug::{DebugManager, JdwpConnector, SourceMap};
use en_index::{Indexer, IndexerMsg};
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::{mpsc, Notify};
use tracing::{error, info};

use crate::config::{load_config, ConfigError};
use crate::env;
use crate::router::{Router, RouterCtrl, RpcHandles};

#[derive(Debug, Error)]
pub enum StartError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("index: {0}")]
    Index(#[from] en_index::IndexError),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

/// A started daemon, listening but not yet serving.
pub struct Daemon {
    config: Arc<Config>,
    cache_dir: PathBuf,
    port: u16,
    listener: TcpListener,
    ctrl_tx: mpsc::Sender<RouterCtrl>,
    handles: RpcHandles,
    shutdown: Arc<Notify>,
}

impl Daemon {
    /// Wire everything up and bind the client socket.
    pub async fn start(root: &Path) -> Result<Daemon, StartError> {
        let config = Arc::new(load_config(root)?);
        let cache_dir = env::cache_dir(&config.root_dir);
        std::fs::create_dir_all(&cache_dir)?;

        let (out_tx, out_rx) = mpsc::channel(256);
        let (ctrl_tx, ctrl_rx) = mpsc::channel(4);
        Router::spawn(out_rx, ctrl_rx);

        let indexer = Indexer::spawn(cache_dir.join("index"), out_tx.clone())?;

        let compiler = Arc::new(NoopCompiler);
        let analyzer = Analyzer::spawn(
            AnalyzerDeps {
                compiler: compiler.clone(),
                java: compiler.clone(),
                formatter: compiler.clone(),
                refactoring: compiler,
            },
            indexer.clone(),
            out_tx.clone(),
            config.source_load_on_startup,
        );

        let sources = scan_sources(&config);
        info!(files = sources.len(), "scanned project sources");
        let debugger = DebugManager::spawn(
            Arc::new(JdwpConnector::new(config.runtime_classpath())),
            SourceMap::from_files(sources),
            out_tx.clone(),
        );

        if config.index_on_startup {
            let _ = indexer
                .send(IndexerMsg::Initialize {
                    classpath: config.index_classpath(),
                    includes: config.only_include_in_index.clone(),
                    excludes: config.exclude_from_index.clone(),
                })
                .await;
        }

        let listener = TcpListener::bind(("127.0.0.1", 0)).await?;
        let port = listener.local_addr()?.port();
        std::fs::write(cache_dir.join(env::PORT_FILE), port.to_string())?;
        info!(port, project = %config.name, "ensign listening");

        let shutdown = Arc::new(Notify::new());
        let handles = RpcHandles {
            analyzer,
            debugger,
            outbound: out_tx,
            config: Arc::clone(&config),
            implementation: "ensign".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            shutdown: Arc::clone(&shutdown),
        };

        Ok(Daemon { config, cache_dir, port, listener, ctrl_tx, handles, shutdown })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn config(&self) -> &Config {
        self.config.as_ref()
    }

    /// Accept clients sequentially until a shutdown request arrives.
    pub async fn serve(self) -> Result<(), StartError> {
        loop {
            tokio::select! {
                _ = self.shutdown.notified() => break,
                accepted = self.listener.accept() => {
                    let (stream, addr) = match accepted {
                        Ok(accepted) => accepted,
                        Err(e) => {
                            error!("accept failed: {}", e);
                            continue;
                        }
                    };
                    info!(%addr, "client connected");
                    let (read_half, write_half) = stream.into_split();
                    let _ = self
                        .ctrl_tx
                        .send(RouterCtrl::Connected(Box::new(write_half)))
                        .await;
                    crate::router::serve_client(read_half, &self.handles).await;
                    let _ = self.ctrl_tx.send(RouterCtrl::Disconnected).await;
                }
            }
        }

        info!("shutting down");
        let _ = std::fs::remove_file(self.cache_dir.join(env::PORT_FILE));
        Ok(())
    }
}

/// Start and serve until shutdown.
pub async fn run(root: PathBuf) -> Result<(), StartError> {
    Daemon::start(&root).await?.serve().await
}

/// Every target-language and java source under the configured roots.
pub(crate) fn scan_sources(config: &Config) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for root in config.source_roots.iter().chain(&config.reference_source_roots) {
        collect_sources(root, &mut files);
    }
    files
}

fn collect_sources(dir: &Path, files: &mut Vec<PathBuf>) {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(_) => return,
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
            if name.starts_with('.') {
                continue;
            }
        }
        if path.is_dir() {
            collect_sources(&path, files);
        } else if matches!(
            path.extension().and_then(|e| e.to_str()),
            Some("scala") | Some("java")
        ) {
            files.push(path);
        }
    }
}

#[cfg(test)]
#[path = "supervisor_tests.rs"]
mod tests;
