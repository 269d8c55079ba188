// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Ensign Contributors

//! The project router: owns the client socket, tags requests with their
//! call-ids, and multiplexes component replies and events back out.
//!
//! Writes are serialized by a single writer actor draining the shared
//! outbound channel, which is what keeps replies for one call-id in order.
//! Only one client is active at a time; outbound messages with no client
//! attached are dropped.

use std::sync::Arc;

use en_analyzer::AnalyzerMsg;
use en_core::rpc::{AnalyzerReq, Outbound, RpcRequest, RpcResponse};
use en_core::Config;
use en_debug::DebugMsg;
use en_wire::{outbound_to_wire, parse_frame, read_frame, ProtocolError};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::{mpsc, Notify};

/// Writer-side control: clients attach and detach.
pub enum RouterCtrl {
    Connected(Box<dyn AsyncWrite + Send + Unpin>),
    Disconnected,
}

/// The writer actor: drains outbound traffic onto the attached client.
pub struct Router {
    out_rx: mpsc::Receiver<Outbound>,
    ctrl_rx: mpsc::Receiver<RouterCtrl>,
    client: Option<Box<dyn AsyncWrite + Send + Unpin>>,
}

impl Router {
    pub fn spawn(
        out_rx: mpsc::Receiver<Outbound>,
        ctrl_rx: mpsc::Receiver<RouterCtrl>,
    ) -> tokio::task::JoinHandle<()> {
        let router = Router { out_rx, ctrl_rx, client: None };
        tokio::spawn(router.run())
    }

    async fn run(mut self) {
        loop {
            tokio::select! {
                ctrl = self.ctrl_rx.recv() => match ctrl {
                    Some(RouterCtrl::Connected(writer)) => self.client = Some(writer),
                    Some(RouterCtrl::Disconnected) => self.client = None,
                    None => break,
                },
                out = self.out_rx.recv() => match out {
                    Some(message) => self.write(message).await,
                    None => break,
                },
            }
        }
        tracing::debug!("router writer stopped");
    }

    async fn write(&mut self, message: Outbound) {
        let Some(client) = self.client.as_mut() else {
            tracing::debug!("no client attached, dropping outbound message");
            return;
        };
        let wire = outbound_to_wire(&message);
        if let Err(e) = en_wire::write_frame(client, &wire).await {
            tracing::warn!("client write failed: {}", e);
            self.client = None;
        }
    }
}

/// Component mailboxes plus what the router answers directly.
#[derive(Clone)]
pub struct RpcHandles {
    pub analyzer: mpsc::Sender<AnalyzerMsg>,
    pub debugger: mpsc::Sender<DebugMsg>,
    pub outbound: mpsc::Sender<Outbound>,
    pub config: Arc<Config>,
    pub implementation: String,
    pub version: String,
    pub shutdown: Arc<Notify>,
}

/// Read frames off one client until it goes away, routing each request to
/// its owning component.
pub async fn serve_client<R>(mut reader: R, handles: &RpcHandles)
where
    R: AsyncRead + Unpin,
{
    loop {
        let frame = match read_frame(&mut reader).await {
            Ok(frame) => frame,
            Err(ProtocolError::ConnectionClosed) => break,
            Err(e) => {
                // A bad payload leaves the framing intact; anything wrong
                // with the framing itself desynchronizes the stream.
                let recoverable = matches!(e, ProtocolError::Parse(_));
                let _ = handles
                    .outbound
                    .send(Outbound::ProtocolError { kind: e.kind(), detail: e.to_string() })
                    .await;
                if recoverable {
                    continue;
                }
                break;
            }
        };

        match parse_frame(&frame) {
            Ok((request, call_id)) => route(request, call_id, handles).await,
            Err(e) => {
                tracing::warn!("bad rpc frame: {}", e);
                let _ = handles
                    .outbound
                    .send(Outbound::ProtocolError { kind: e.kind(), detail: e.to_string() })
                    .await;
            }
        }
    }
    tracing::info!("client disconnected");
}

async fn route(request: RpcRequest, call_id: i64, handles: &RpcHandles) {
    match request {
        RpcRequest::ConnectionInfo => {
            let _ = handles
                .outbound
                .send(Outbound::Reply {
                    call_id,
                    value: RpcResponse::ConnectionInfo {
                        implementation: handles.implementation.clone(),
                        version: handles.version.clone(),
                    },
                })
                .await;
        }
        RpcRequest::ShutdownServer => {
            let _ = handles
                .outbound
                .send(Outbound::Reply { call_id, value: RpcResponse::True })
                .await;
            handles.shutdown.notify_one();
        }
        RpcRequest::Analyzer(req) => {
            // Reloads change what the project's sources look like; the
            // debugger's basename map follows along.
            if matches!(req, AnalyzerReq::ReloadAll | AnalyzerReq::ReloadFiles { .. }) {
                let files = crate::supervisor::scan_sources(&handles.config);
                let _ = handles.debugger.send(DebugMsg::SourcesChanged { files }).await;
            }
            let _ = handles.analyzer.send(AnalyzerMsg::Rpc { req, call_id }).await;
        }
        RpcRequest::Debug(req) => {
            let _ = handles.debugger.send(DebugMsg::Rpc { req, call_id }).await;
        }
    }
}

#[cfg(test)]
#[path = "router_tests.rs"]
mod tests;
