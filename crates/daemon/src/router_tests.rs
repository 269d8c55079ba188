// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Ensign Contributors

use std::sync::Arc;
use std::time::Duration;

use en_analyzer::AnalyzerMsg;
use en_core::rpc::{AnalyzerReq, DebugReq, Outbound, RpcResponse};
use en_core::{EnsignEvent, ErrorKind};
use en_debug::DebugMsg;
use en_wire::{read_frame, write_frame, SExp};
use tokio::io::AsyncWriteExt;

use super::*;

struct Harness {
    /// Client side of the duplex socket.
    client_read: tokio::io::ReadHalf<tokio::io::DuplexStream>,
    client_write: tokio::io::WriteHalf<tokio::io::DuplexStream>,
    outbound: mpsc::Sender<Outbound>,
    analyzer_rx: mpsc::Receiver<AnalyzerMsg>,
    debugger_rx: mpsc::Receiver<DebugMsg>,
    shutdown: Arc<Notify>,
}

fn harness() -> Harness {
    let (client, server) = tokio::io::duplex(64 * 1024);
    let (client_read, client_write) = tokio::io::split(client);
    let (server_read, server_write) = tokio::io::split(server);

    let (out_tx, out_rx) = mpsc::channel(64);
    let (ctrl_tx, ctrl_rx) = mpsc::channel(4);
    Router::spawn(out_rx, ctrl_rx);

    let (analyzer_tx, analyzer_rx) = mpsc::channel(16);
    let (debugger_tx, debugger_rx) = mpsc::channel(16);
    let shutdown = Arc::new(Notify::new());
    let handles = RpcHandles {
        analyzer: analyzer_tx,
        debugger: debugger_tx,
        outbound: out_tx.clone(),
        config: Arc::new(Config::default()),
        implementation: "ensign".to_string(),
        version: "0.4.0".to_string(),
        shutdown: Arc::clone(&shutdown),
    };

    tokio::spawn(async move {
        let _ = ctrl_tx.send(RouterCtrl::Connected(Box::new(server_write))).await;
        serve_client(server_read, &handles).await;
        let _ = ctrl_tx.send(RouterCtrl::Disconnected).await;
    });

    Harness { client_read, client_write, outbound: out_tx, analyzer_rx, debugger_rx, shutdown }
}

impl Harness {
    async fn send(&mut self, text: &str) {
        write_frame(&mut self.client_write, &en_wire::parse(text).unwrap()).await.unwrap();
    }

    async fn recv(&mut self) -> SExp {
        tokio::time::timeout(Duration::from_secs(10), read_frame(&mut self.client_read))
            .await
            .expect("timed out reading frame")
            .expect("read failed")
    }
}

#[tokio::test]
async fn connection_info_is_answered_by_the_router() {
    let mut h = harness();
    h.send("(:swank-rpc (swank:connection-info) 1)").await;
    let reply = h.recv().await;
    assert_eq!(
        reply.as_list().unwrap()[0],
        SExp::Key("return".to_string())
    );
    assert_eq!(reply.as_list().unwrap()[2], SExp::Int(1));
    let ok = reply.as_list().unwrap()[1].clone();
    let payload = ok.as_list().unwrap()[1].clone();
    assert_eq!(
        payload.plist_get("version").and_then(|v| v.as_str()),
        Some("0.4.0")
    );
}

#[tokio::test]
async fn analyzer_requests_route_with_their_call_id() {
    let mut h = harness();
    h.send("(:swank-rpc (swank:typecheck-all) 7)").await;
    match h.analyzer_rx.recv().await {
        Some(AnalyzerMsg::Rpc { req: AnalyzerReq::ReloadAll, call_id: 7 }) => {}
        other => panic!("expected routed analyzer request, got {other:?}"),
    }
}

#[tokio::test]
async fn debug_requests_route_to_the_debugger() {
    let mut h = harness();
    h.send("(:swank-rpc (swank:debug-list-breakpoints) 9)").await;
    match h.debugger_rx.recv().await {
        Some(DebugMsg::Rpc { req: DebugReq::ListBreakpoints, call_id: 9 }) => {}
        other => panic!("expected routed debug request, got {other:?}"),
    }
}

#[tokio::test]
async fn component_replies_and_events_reach_the_wire() {
    let mut h = harness();
    h.outbound
        .send(Outbound::Reply { call_id: 3, value: RpcResponse::True })
        .await
        .unwrap();
    assert_eq!(h.recv().await, en_wire::parse("(:return (:ok t) 3)").unwrap());

    h.outbound.send(Outbound::Event(EnsignEvent::IndexerReady)).await.unwrap();
    assert_eq!(h.recv().await, en_wire::parse("(:indexer-ready t)").unwrap());
}

#[tokio::test]
async fn replies_preserve_outbound_order() {
    let mut h = harness();
    for call_id in 1..=5 {
        h.outbound
            .send(Outbound::Reply { call_id, value: RpcResponse::True })
            .await
            .unwrap();
    }
    for call_id in 1..=5 {
        let reply = h.recv().await;
        assert_eq!(reply.as_list().unwrap()[2], SExp::Int(call_id));
    }
}

#[tokio::test]
async fn unknown_rpc_yields_unsolicited_reader_error() {
    let mut h = harness();
    h.send("(:swank-rpc (swank:no-such-op) 4)").await;
    let frame = h.recv().await;
    let items = frame.as_list().unwrap();
    assert_eq!(items[0], SExp::Key("reader-error".to_string()));
    assert_eq!(items[1], SExp::Int(ErrorKind::UnrecognizedRpc.code()));

    // The connection survives an unknown rpc.
    h.send("(:swank-rpc (swank:connection-info) 5)").await;
    let reply = h.recv().await;
    assert_eq!(reply.as_list().unwrap()[2], SExp::Int(5));
}

#[tokio::test]
async fn malformed_payload_yields_202_and_keeps_the_connection() {
    let mut h = harness();
    // Valid framing, unparseable payload.
    let payload = b"(:swank-rpc";
    let header = format!("{:06x}", payload.len());
    h.client_write.write_all(header.as_bytes()).await.unwrap();
    h.client_write.write_all(payload).await.unwrap();

    let frame = h.recv().await;
    let items = frame.as_list().unwrap();
    assert_eq!(items[0], SExp::Key("reader-error".to_string()));
    assert_eq!(items[1], SExp::Int(ErrorKind::MalformedRpc.code()));

    h.send("(:swank-rpc (swank:connection-info) 6)").await;
    assert_eq!(h.recv().await.as_list().unwrap()[2], SExp::Int(6));
}

#[tokio::test]
async fn shutdown_server_notifies_and_replies() {
    let mut h = harness();
    let notified = {
        let shutdown = Arc::clone(&h.shutdown);
        tokio::spawn(async move { shutdown.notified().await })
    };
    h.send("(:swank-rpc (swank:shutdown-server) 2)").await;
    assert_eq!(h.recv().await, en_wire::parse("(:return (:ok t) 2)").unwrap());
    tokio::time::timeout(Duration::from_secs(10), notified)
        .await
        .expect("shutdown was not notified")
        .unwrap();
}
