// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Ensign Contributors

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use en_core::debug::DebugValue;
use en_core::event::{DebugEvent, EnsignEvent};
use en_core::rpc::{DebugReq, Outbound, RpcResponse, StepDepth};
use en_core::{DebugLocation, ErrorKind, ObjectId, ThreadId};
use parking_lot::Mutex;

use super::*;
use crate::test_support::{widget_class, widget_location, FakeConnector, FakeVmState};
use crate::vm::{VmFrame, VmLocal, VmValue};

const WIDGET_SOURCE: &str = "/proj/src/com/example/Widget.scala";

struct Harness {
    tx: mpsc::Sender<DebugMsg>,
    out: mpsc::Receiver<Outbound>,
    state: Arc<Mutex<FakeVmState>>,
}

fn harness() -> Harness {
    let state = FakeVmState::shared();
    let (out_tx, out_rx) = mpsc::channel(64);
    let sources = SourceMap::from_files([PathBuf::from(WIDGET_SOURCE)]);
    let tx = DebugManager::spawn(
        Arc::new(FakeConnector { state: Arc::clone(&state) }),
        sources,
        out_tx,
    );
    Harness { tx, out: out_rx, state }
}

impl Harness {
    async fn recv(&mut self) -> Outbound {
        tokio::time::timeout(Duration::from_secs(10), self.out.recv())
            .await
            .expect("timed out waiting for outbound")
            .expect("outbound closed")
    }

    /// Send an RPC and return its reply, buffering nothing: events emitted
    /// before the reply are skipped.
    async fn rpc(&mut self, req: DebugReq, call_id: i64) -> Outbound {
        self.tx.send(DebugMsg::Rpc { req, call_id }).await.unwrap();
        loop {
            match self.recv().await {
                Outbound::Event(_) => continue,
                reply => return reply,
            }
        }
    }

    async fn expect_true(&mut self, req: DebugReq, call_id: i64) {
        match self.rpc(req, call_id).await {
            Outbound::Reply { value: RpcResponse::True, .. } => {}
            other => panic!("expected true reply, got {other:?}"),
        }
    }

    async fn next_debug_event(&mut self) -> DebugEvent {
        loop {
            if let Outbound::Event(EnsignEvent::Debug(event)) = self.recv().await {
                return event;
            }
        }
    }

    /// Start the VM and deliver its start event.
    async fn start(&mut self) {
        self.expect_true(DebugReq::StartVm { command_line: "com.example.Main".into() }, 1).await;
        self.tx.send(DebugMsg::Vm(VmEvent::VmStart)).await.unwrap();
        assert_eq!(self.next_debug_event().await, DebugEvent::VmStart);
    }

    async fn breakpoint_lists(&mut self, call_id: i64) -> (usize, usize) {
        match self.rpc(DebugReq::ListBreakpoints, call_id).await {
            Outbound::Reply { value: RpcResponse::Breakpoints { active, pending }, .. } => {
                (active.len(), pending.len())
            }
            other => panic!("expected breakpoint list, got {other:?}"),
        }
    }
}

fn seed_widget_line(state: &Arc<Mutex<FakeVmState>>, line: u32) {
    let mut state = state.lock();
    state.classes = vec![widget_class()];
    state.locations.insert((1, line), vec![widget_location(line)]);
}

#[tokio::test]
async fn vm_start_enables_events_and_scans_classes() {
    let mut h = harness();
    seed_widget_line(&h.state, 42);
    h.start().await;
    assert!(h.state.lock().events_enabled);
}

#[tokio::test]
async fn pending_breakpoint_promotes_on_class_prepare() {
    let mut h = harness();
    h.start().await;

    // No class loaded yet: success reply, parked as pending.
    h.expect_true(
        DebugReq::SetBreakpoint { file: PathBuf::from(WIDGET_SOURCE), line: 42 },
        2,
    )
    .await;
    assert_eq!(h.breakpoint_lists(3).await, (0, 1));

    // The class arrives; no client action required.
    seed_widget_line(&h.state, 42);
    h.tx
        .send(DebugMsg::Vm(VmEvent::ClassPrepare { class: widget_class() }))
        .await
        .unwrap();

    // Synchronize on the mailbox before inspecting.
    assert_eq!(h.breakpoint_lists(4).await, (1, 0));
    assert_eq!(h.state.lock().installed.len(), 1);
}

#[tokio::test]
async fn breakpoints_set_before_start_install_on_vm_start() {
    let mut h = harness();
    h.expect_true(
        DebugReq::SetBreakpoint { file: PathBuf::from(WIDGET_SOURCE), line: 42 },
        1,
    )
    .await;

    seed_widget_line(&h.state, 42);
    h.expect_true(DebugReq::StartVm { command_line: "com.example.Main".into() }, 2).await;
    h.tx.send(DebugMsg::Vm(VmEvent::VmStart)).await.unwrap();
    assert_eq!(h.next_debug_event().await, DebugEvent::VmStart);

    assert_eq!(h.breakpoint_lists(3).await, (1, 0));
}

#[tokio::test]
async fn set_and_clear_same_line_resolve_in_mailbox_order() {
    let mut h = harness();
    seed_widget_line(&h.state, 42);
    h.start().await;

    let file = PathBuf::from(WIDGET_SOURCE);
    h.expect_true(DebugReq::SetBreakpoint { file: file.clone(), line: 42 }, 2).await;
    h.expect_true(DebugReq::ClearBreakpoint { file: file.clone(), line: 42 }, 3).await;
    h.expect_true(DebugReq::SetBreakpoint { file: file.clone(), line: 42 }, 4).await;
    h.expect_true(DebugReq::ClearBreakpoint { file, line: 42 }, 5).await;

    // Last arrival wins: the line ends cleared, and both installed
    // requests were cleared in the VM.
    assert_eq!(h.breakpoint_lists(6).await, (0, 0));
    let state = h.state.lock();
    assert!(state.installed.is_empty());
    assert_eq!(state.cleared_requests.len(), 2);
}

#[tokio::test]
async fn disconnect_migrates_active_breakpoints_to_pending() {
    let mut h = harness();
    seed_widget_line(&h.state, 42);
    h.start().await;
    h.expect_true(
        DebugReq::SetBreakpoint { file: PathBuf::from(WIDGET_SOURCE), line: 42 },
        2,
    )
    .await;
    assert_eq!(h.breakpoint_lists(3).await, (1, 0));

    h.tx.send(DebugMsg::Vm(VmEvent::VmDeath)).await.unwrap();
    assert_eq!(h.next_debug_event().await, DebugEvent::VmDisconnect);
    assert!(h.state.lock().disposed);
    assert_eq!(h.breakpoint_lists(4).await, (0, 1));
}

#[tokio::test]
async fn breakpoint_event_resolves_to_project_source() {
    let mut h = harness();
    seed_widget_line(&h.state, 42);
    h.start().await;

    h.tx
        .send(DebugMsg::Vm(VmEvent::Breakpoint {
            thread: ThreadId(1),
            location: Some(widget_location(42)),
        }))
        .await
        .unwrap();
    match h.next_debug_event().await {
        DebugEvent::Breakpoint { thread_id, thread_name, pos } => {
            assert_eq!(thread_id, ThreadId(1));
            assert_eq!(thread_name, "main");
            assert_eq!(pos.file, PathBuf::from(WIDGET_SOURCE));
            assert_eq!(pos.line, 42);
        }
        other => panic!("expected breakpoint event, got {other:?}"),
    }
}

#[tokio::test]
async fn unresolvable_event_locations_are_dropped() {
    let mut h = harness();
    h.start().await;

    let mut elsewhere = widget_location(7);
    elsewhere.source_name = "Elsewhere.scala".to_string();
    h.tx
        .send(DebugMsg::Vm(VmEvent::Breakpoint {
            thread: ThreadId(1),
            location: Some(elsewhere),
        }))
        .await
        .unwrap();
    // The next observable event is the marker, not a breakpoint event.
    h.tx
        .send(DebugMsg::Vm(VmEvent::Output { body: "marker".into() }))
        .await
        .unwrap();
    assert_eq!(h.next_debug_event().await, DebugEvent::Output { body: "marker".into() });
}

#[tokio::test]
async fn step_deletes_existing_requests_then_resumes() {
    let mut h = harness();
    seed_widget_line(&h.state, 42);
    h.start().await;

    h.expect_true(DebugReq::Step { thread_id: ThreadId(1), depth: StepDepth::Over }, 2).await;
    let state = h.state.lock();
    assert_eq!(state.deleted_step_requests, 1);
    assert_eq!(state.step_requests, vec![(ThreadId(1), StepDepth::Over)]);
    assert_eq!(state.resumes, 1);
}

fn seed_suspended_frame(state: &Arc<Mutex<FakeVmState>>) {
    let mut guard = state.lock();
    guard.frames.insert(
        1,
        vec![VmFrame {
            index: 0,
            class_name: Some("com.example.Widget".into()),
            method_name: Some("render".into()),
            locals: vec![VmLocal {
                slot: 0,
                name: "count".into(),
                type_name: "int".into(),
                value: VmValue::Int(5),
            }],
            num_args: 0,
            location: Some(widget_location(42)),
            this_object: Some(ObjectId(17)),
        }],
    );
    guard.objects.insert(17, "com.example.Widget".into());
    guard
        .fields
        .insert((17, "name".into()), VmValue::String { id: ObjectId(40), value: "bob".into() });
}

#[tokio::test]
async fn pinned_values_roundtrip_across_requests() {
    let mut h = harness();
    seed_widget_line(&h.state, 42);
    seed_suspended_frame(&h.state);
    h.start().await;

    // Backtrace exposes `this` as object id 17.
    match h.rpc(DebugReq::Backtrace { thread_id: ThreadId(1), index: 0, count: -1 }, 2).await {
        Outbound::Reply { value: RpcResponse::Backtrace(bt), .. } => {
            assert_eq!(bt.thread_name, "main");
            assert_eq!(bt.frames.len(), 1);
            assert_eq!(bt.frames[0].this_object_id, ObjectId(17));
            assert_eq!(bt.frames[0].class_name, "com.example.Widget");
            assert_eq!(bt.frames[0].locals[0].summary, "5");
            assert_eq!(bt.frames[0].pc_location.file, PathBuf::from(WIDGET_SOURCE));
        }
        other => panic!("expected backtrace, got {other:?}"),
    }

    // Dereference a field of the pinned object; the reply pins the string.
    let field = DebugLocation::ObjectField { object_id: ObjectId(17), field: "name".into() };
    let string_id = match h.rpc(DebugReq::Value { loc: field }, 3).await {
        Outbound::Reply {
            value: RpcResponse::DebugValue(DebugValue::StringInstance { object_id, summary }),
            ..
        } => {
            assert_eq!(summary, "\"bob\"");
            object_id
        }
        other => panic!("expected string value, got {other:?}"),
    };

    // The freshly pinned id dereferences to the same value.
    let reference = DebugLocation::ObjectReference { object_id: string_id };
    match h.rpc(DebugReq::Value { loc: reference }, 4).await {
        Outbound::Reply {
            value: RpcResponse::DebugValue(DebugValue::StringInstance { object_id, summary }),
            ..
        } => {
            assert_eq!(object_id, string_id);
            assert_eq!(summary, "\"bob\"");
        }
        other => panic!("expected pinned string, got {other:?}"),
    }
}

#[tokio::test]
async fn set_value_mirrors_into_stack_slots_only() {
    let mut h = harness();
    seed_widget_line(&h.state, 42);
    seed_suspended_frame(&h.state);
    h.start().await;

    let slot = DebugLocation::StackSlot { thread_id: ThreadId(1), frame: 0, offset: 0 };
    h.expect_true(DebugReq::SetValue { loc: slot.clone(), value: "42".into() }, 2).await;
    assert_eq!(
        h.state.lock().set_slots,
        vec![(ThreadId(1), 0, 0, crate::vm::MirrorValue::Int(42))]
    );

    // Unparseable text for the declared type fails without aborting.
    match h.rpc(DebugReq::SetValue { loc: slot, value: "not a number".into() }, 3).await {
        Outbound::Reply { value: RpcResponse::False, .. } => {}
        other => panic!("expected false, got {other:?}"),
    }

    // Non-slot locations are not mutable.
    let reference = DebugLocation::ObjectReference { object_id: ObjectId(17) };
    match h.rpc(DebugReq::SetValue { loc: reference, value: "1".into() }, 4).await {
        Outbound::Reply { value: RpcResponse::False, .. } => {}
        other => panic!("expected false, got {other:?}"),
    }
}

#[tokio::test]
async fn exceptions_pin_the_thrown_object() {
    let mut h = harness();
    seed_widget_line(&h.state, 42);
    h.start().await;
    h.state.lock().objects.insert(23, "java.lang.IllegalStateException".into());

    h.tx
        .send(DebugMsg::Vm(VmEvent::Exception {
            thread: ThreadId(1),
            exception: ObjectId(23),
            catch_location: None,
        }))
        .await
        .unwrap();
    match h.next_debug_event().await {
        DebugEvent::Exception { exception_id, catch_pos, .. } => {
            assert_eq!(exception_id, ObjectId(23));
            assert!(catch_pos.is_none());
        }
        other => panic!("expected exception event, got {other:?}"),
    }

    // The pinned exception can be dereferenced.
    let loc = DebugLocation::ObjectReference { object_id: ObjectId(23) };
    match h.rpc(DebugReq::Value { loc }, 2).await {
        Outbound::Reply { value: RpcResponse::DebugValue(DebugValue::Object { type_name, .. }), .. } => {
            assert_eq!(type_name, "java.lang.IllegalStateException");
        }
        other => panic!("expected object value, got {other:?}"),
    }
}

#[tokio::test]
async fn requests_without_a_vm_abort_with_debugger_exception() {
    let mut h = harness();
    match h.rpc(DebugReq::Backtrace { thread_id: ThreadId(1), index: 0, count: -1 }, 1).await {
        Outbound::Abort { kind, .. } => assert_eq!(kind, ErrorKind::DebuggerException),
        other => panic!("expected abort, got {other:?}"),
    }

    // ActiveVm is answerable in any state.
    match h.rpc(DebugReq::ActiveVm, 2).await {
        Outbound::Reply { value: RpcResponse::False, .. } => {}
        other => panic!("expected false, got {other:?}"),
    }
}
