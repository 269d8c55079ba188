// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Ensign Contributors

//! The debug manager actor.
//!
//! States: `Disconnected` → `Connecting` (VM created, waiting for its
//! start event) → `Running`. RPCs and pump events share one mailbox, so
//! concurrent set/clear requests for the same line resolve in arrival
//! order and the final state reflects the last one.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

use en_core::debug::{Breakpoint, DebugValue, LineSourcePosition};
use en_core::event::{DebugEvent, EnsignEvent};
use en_core::rpc::{CallId, DebugReq, Outbound, RpcResponse};
use en_core::{DebugLocation, ErrorKind, ObjectId, ThreadId};
use parking_lot::Mutex;
use tokio::sync::mpsc;

use crate::backtrace;
use crate::breakpoints::{BreakpointManager, ClassMap};
use crate::pin::PinTable;
use crate::source_map::SourceMap;
use crate::summary::{mirror_from_text, summarize, to_string_of};
use crate::vm::{TargetVm, VmConnector, VmEvent, VmValue};
use crate::DebugError;

/// Mailbox of the debug manager actor.
#[derive(Debug)]
pub enum DebugMsg {
    Rpc { req: DebugReq, call_id: CallId },
    Vm(VmEvent),
    /// Project sources changed; rebuild the basename → file map.
    SourcesChanged { files: Vec<PathBuf> },
}

type VmHandle = Arc<Mutex<Box<dyn TargetVm>>>;

enum Conn {
    Disconnected,
    /// VM created, waiting for its start event.
    Connecting(VmHandle),
    Running(VmHandle),
}

impl Conn {
    fn handle(&self) -> Option<&VmHandle> {
        match self {
            Conn::Disconnected => None,
            Conn::Connecting(vm) | Conn::Running(vm) => Some(vm),
        }
    }
}

pub struct DebugManager {
    connector: Arc<dyn VmConnector>,
    outbound: mpsc::Sender<Outbound>,
    self_tx: mpsc::Sender<DebugMsg>,
    rx: mpsc::Receiver<DebugMsg>,
    conn: Conn,
    classes: ClassMap,
    sources: SourceMap,
    breakpoints: BreakpointManager,
    pins: PinTable,
}

impl DebugManager {
    /// Start the actor. `sources` is the basename map over the project's
    /// source files, used to resolve VM locations for events.
    pub fn spawn(
        connector: Arc<dyn VmConnector>,
        sources: SourceMap,
        outbound: mpsc::Sender<Outbound>,
    ) -> mpsc::Sender<DebugMsg> {
        let (tx, rx) = mpsc::channel(256);
        let actor = DebugManager {
            connector,
            outbound,
            self_tx: tx.clone(),
            rx,
            conn: Conn::Disconnected,
            classes: ClassMap::default(),
            sources,
            breakpoints: BreakpointManager::default(),
            pins: PinTable::default(),
        };
        tokio::spawn(actor.run());
        tx
    }

    async fn run(mut self) {
        while let Some(msg) = self.rx.recv().await {
            match msg {
                DebugMsg::Rpc { req, call_id } => self.handle_rpc(req, call_id).await,
                DebugMsg::Vm(event) => self.handle_vm_event(event).await,
                DebugMsg::SourcesChanged { files } => {
                    self.sources = SourceMap::from_files(files);
                }
            }
        }
        tracing::debug!("debug manager mailbox closed");
    }

    async fn handle_rpc(&mut self, req: DebugReq, call_id: CallId) {
        let result = self.dispatch(req).await;
        let message = match result {
            Ok(value) => Outbound::Reply { call_id, value },
            Err(e) => {
                tracing::error!(call_id, "debug request failed: {}", e);
                Outbound::Abort {
                    call_id,
                    kind: ErrorKind::DebuggerException,
                    detail: e.to_string(),
                }
            }
        };
        let _ = self.outbound.send(message).await;
    }

    async fn dispatch(&mut self, req: DebugReq) -> Result<RpcResponse, DebugError> {
        match req {
            DebugReq::ActiveVm => Ok(match self.conn {
                Conn::Running(_) => RpcResponse::True,
                _ => RpcResponse::False,
            }),

            DebugReq::StartVm { command_line } => {
                self.connect(move |connector, events| connector.launch(&command_line, events))
                    .await
            }
            DebugReq::AttachVm { hostname, port } => {
                self.connect(move |connector, events| connector.attach(&hostname, port, events))
                    .await
            }
            DebugReq::StopVm => {
                self.disconnect().await;
                Ok(RpcResponse::True)
            }

            DebugReq::SetBreakpoint { file, line } => {
                let bp = Breakpoint { pos: LineSourcePosition { file, line } };
                self.set_breakpoint(bp)?;
                Ok(RpcResponse::True)
            }
            DebugReq::ClearBreakpoint { file, line } => {
                let bp = Breakpoint { pos: LineSourcePosition { file, line } };
                if let Some(request_ids) = self.breakpoints.remove(&bp) {
                    if let Some(vm) = self.conn.handle() {
                        vm.lock().clear_breakpoints(&request_ids)?;
                    }
                }
                Ok(RpcResponse::True)
            }
            DebugReq::ClearAllBreakpoints => {
                let request_ids = self.breakpoints.clear();
                if !request_ids.is_empty() {
                    if let Some(vm) = self.conn.handle() {
                        vm.lock().clear_all_breakpoints()?;
                    }
                }
                Ok(RpcResponse::True)
            }
            DebugReq::ListBreakpoints => {
                let (active, pending) = self.breakpoints.lists();
                Ok(RpcResponse::Breakpoints { active, pending })
            }

            DebugReq::Run | DebugReq::Continue { .. } => {
                self.vm()?.lock().resume()?;
                Ok(RpcResponse::True)
            }
            DebugReq::Step { thread_id, depth } => {
                let vm = self.vm()?;
                let mut vm = vm.lock();
                vm.delete_step_requests()?;
                vm.request_step(thread_id, depth)?;
                vm.resume()?;
                Ok(RpcResponse::True)
            }

            DebugReq::Backtrace { thread_id, index, count } => {
                let vm = self.vm()?;
                let mut vm = vm.lock();
                let backtrace = backtrace::materialize(
                    vm.as_mut(),
                    &mut self.pins,
                    &self.sources,
                    thread_id,
                    index,
                    count,
                )?;
                Ok(RpcResponse::Backtrace(backtrace))
            }

            DebugReq::Value { loc } => {
                let vm = self.vm()?;
                let mut vm = vm.lock();
                let value = self.resolve_value(vm.as_mut(), &loc)?;
                Ok(RpcResponse::DebugValue(self.expose(vm.as_mut(), value)))
            }
            DebugReq::ToString { thread_id, loc } => {
                let vm = self.vm()?;
                let mut vm = vm.lock();
                let value = self.resolve_value(vm.as_mut(), &loc)?;
                let text = to_string_of(vm.as_mut(), &mut self.pins, thread_id, &value);
                Ok(RpcResponse::StringVal(text))
            }
            DebugReq::SetValue { loc, value } => {
                let DebugLocation::StackSlot { thread_id, frame, offset } = loc else {
                    // Only stack slots are mutable.
                    return Ok(RpcResponse::False);
                };
                let vm = self.vm()?;
                let mut vm = vm.lock();
                let local = vm.slot(thread_id, frame, offset)?;
                match mirror_from_text(&local.type_name, &value) {
                    Some(mirror) => {
                        vm.set_slot(thread_id, frame, offset, &mirror)?;
                        Ok(RpcResponse::True)
                    }
                    None => {
                        tracing::warn!(
                            type_name = %local.type_name,
                            "unsupported target type for set-value"
                        );
                        Ok(RpcResponse::False)
                    }
                }
            }
        }
    }

    fn vm(&self) -> Result<VmHandle, DebugError> {
        self.conn.handle().cloned().ok_or(DebugError::NotConnected)
    }

    /// Create a VM via the connector, off the actor thread, and enter
    /// `Connecting` until its start event arrives.
    async fn connect<F>(&mut self, create: F) -> Result<RpcResponse, DebugError>
    where
        F: FnOnce(
                Arc<dyn VmConnector>,
                mpsc::Sender<VmEvent>,
            ) -> Result<Box<dyn TargetVm>, DebugError>
            + Send
            + 'static,
    {
        // A lingering previous VM is torn down first; last request wins.
        self.disconnect().await;

        let (events_tx, mut events_rx) = mpsc::channel(256);
        let self_tx = self.self_tx.clone();
        tokio::spawn(async move {
            while let Some(event) = events_rx.recv().await {
                if self_tx.send(DebugMsg::Vm(event)).await.is_err() {
                    break;
                }
            }
        });

        let connector = Arc::clone(&self.connector);
        let vm = tokio::task::spawn_blocking(move || create(connector, events_tx))
            .await
            .map_err(|e| DebugError::Launch(e.to_string()))??;
        self.conn = Conn::Connecting(Arc::new(Mutex::new(vm)));
        Ok(RpcResponse::True)
    }

    /// Tear down any VM connection and emit the disconnect event once.
    async fn disconnect(&mut self) {
        if matches!(self.conn, Conn::Disconnected) {
            return;
        }
        if let Some(vm) = self.conn.handle() {
            vm.lock().dispose();
        }
        self.conn = Conn::Disconnected;
        self.breakpoints.migrate_active_to_pending();
        self.pins.clear();
        self.classes.clear();
        self.emit(DebugEvent::VmDisconnect).await;
    }

    /// Install where possible, otherwise park as pending. Always succeeds
    /// from the client's point of view.
    fn set_breakpoint(&mut self, bp: Breakpoint) -> Result<(), DebugError> {
        let running = match &self.conn {
            Conn::Running(vm) => Some(Arc::clone(vm)),
            _ => None,
        };
        match running {
            Some(vm) => {
                if !self.try_install(&vm, &bp)? {
                    tracing::debug!(
                        file = %bp.pos.file.display(),
                        line = bp.pos.line,
                        "no loaded class for breakpoint, parking as pending"
                    );
                    if let Some(old) = self.breakpoints.set_pending(bp) {
                        vm.lock().clear_breakpoints(&old)?;
                    }
                }
            }
            None => {
                self.breakpoints.set_pending(bp);
            }
        }
        Ok(())
    }

    /// Try to install one breakpoint against the currently loaded classes.
    /// Returns false when no location matched.
    fn try_install(&mut self, vm: &VmHandle, bp: &Breakpoint) -> Result<bool, DebugError> {
        let basename = match bp.pos.file.file_name().and_then(|n| n.to_str()) {
            Some(name) => name,
            None => return Ok(false),
        };
        let classes: Vec<i64> =
            self.classes.classes_for(basename).iter().map(|c| c.ref_id).collect();

        let mut vm = vm.lock();
        let mut locations = Vec::new();
        for class_id in classes {
            match vm.locations_of_line(class_id, bp.pos.line) {
                Ok(found) => locations.extend(found),
                Err(e) => {
                    tracing::debug!(class_id, "line lookup failed: {}", e)
                }
            }
        }

        let mut seen = HashSet::new();
        locations.retain(|loc| {
            seen.insert((loc.source_path.clone(), loc.source_name.clone(), loc.line))
        });
        if locations.is_empty() {
            return Ok(false);
        }

        let mut request_ids = Vec::with_capacity(locations.len());
        for location in &locations {
            request_ids.push(vm.install_breakpoint(location)?);
        }
        tracing::info!(
            file = %bp.pos.file.display(),
            line = bp.pos.line,
            requests = request_ids.len(),
            "breakpoint installed"
        );
        if let Some(old) = self.breakpoints.set_active(bp.clone(), request_ids) {
            vm.clear_breakpoints(&old)?;
        }
        Ok(true)
    }

    async fn handle_vm_event(&mut self, event: VmEvent) {
        match event {
            VmEvent::VmStart => self.on_vm_start().await,
            VmEvent::VmDeath | VmEvent::VmDisconnected => self.disconnect().await,
            VmEvent::ClassPrepare { class } => self.on_class_prepare(class).await,
            VmEvent::Breakpoint { thread, location } => {
                if let Some((thread_name, pos)) = self.locate(thread, location) {
                    self.emit(DebugEvent::Breakpoint { thread_id: thread, thread_name, pos })
                        .await;
                }
            }
            VmEvent::Step { thread, location } => {
                if let Some((thread_name, pos)) = self.locate(thread, location) {
                    self.emit(DebugEvent::Step { thread_id: thread, thread_name, pos }).await;
                }
            }
            VmEvent::Exception { thread, exception, catch_location } => {
                self.on_exception(thread, exception, catch_location).await;
            }
            VmEvent::ThreadStart { thread } => {
                self.emit(DebugEvent::ThreadStart { thread_id: thread }).await;
            }
            VmEvent::ThreadDeath { thread } => {
                self.emit(DebugEvent::ThreadDeath { thread_id: thread }).await;
            }
            VmEvent::Output { body } => {
                self.emit(DebugEvent::Output { body }).await;
            }
        }
    }

    async fn on_vm_start(&mut self) {
        let vm = match std::mem::replace(&mut self.conn, Conn::Disconnected) {
            Conn::Connecting(vm) | Conn::Running(vm) => vm,
            Conn::Disconnected => {
                tracing::warn!("vm start event without a connection");
                return;
            }
        };
        self.conn = Conn::Running(Arc::clone(&vm));

        {
            let mut guard = vm.lock();
            if let Err(e) = guard.enable_vm_events() {
                tracing::error!("could not enable vm events: {}", e);
            }
            self.classes.clear();
            match guard.all_classes() {
                Ok(classes) => {
                    for class in classes {
                        self.classes.add(class);
                    }
                }
                Err(e) => tracing::error!("initial class scan failed: {}", e),
            }
        }

        // Breakpoints requested before the VM existed.
        for bp in self.breakpoints.all_pending() {
            if let Err(e) = self.try_install(&vm, &bp) {
                tracing::warn!("initial breakpoint install failed: {}", e);
            }
        }

        self.emit(DebugEvent::VmStart).await;
    }

    async fn on_class_prepare(&mut self, mut class: crate::vm::VmClass) {
        let Some(vm) = self.conn.handle().cloned() else {
            return;
        };
        if class.source_name.is_none() {
            class.source_name = vm.lock().class_source_name(class.ref_id).unwrap_or(None);
        }
        let basename = class.source_name.clone();
        self.classes.add(class);

        if let Some(basename) = basename {
            for bp in self.breakpoints.pending_for_basename(&basename) {
                if let Err(e) = self.try_install(&vm, &bp) {
                    tracing::warn!("pending breakpoint retry failed: {}", e);
                }
            }
        }
    }

    async fn on_exception(
        &mut self,
        thread: ThreadId,
        exception: ObjectId,
        catch_location: Option<crate::vm::VmLocation>,
    ) {
        let Some(vm) = self.conn.handle().cloned() else {
            return;
        };
        let (thread_name, type_name, catch_pos) = {
            let mut vm = vm.lock();
            let thread_name = vm.thread_name(thread).unwrap_or_default();
            let type_name = vm
                .object_type_name(exception)
                .unwrap_or_else(|_| "java.lang.Throwable".to_string());
            let catch_pos = catch_location
                .and_then(|raw| vm.resolve_location(&raw).ok())
                .and_then(|resolved| self.sources.position(&resolved));
            (thread_name, type_name, catch_pos)
        };
        self.pins.pin(&VmValue::Object { id: exception, type_name });
        self.emit(DebugEvent::Exception {
            exception_id: exception,
            thread_id: thread,
            thread_name,
            catch_pos,
        })
        .await;
    }

    /// Resolve a pump location to a thread name and canonical position;
    /// warns and yields nothing when it cannot be mapped to a source file.
    fn locate(
        &mut self,
        thread: ThreadId,
        location: Option<crate::vm::VmLocation>,
    ) -> Option<(String, LineSourcePosition)> {
        let Some(vm) = self.conn.handle() else {
            return None;
        };
        let mut vm = vm.lock();
        let Some(raw) = location else {
            tracing::warn!("vm event with no location");
            return None;
        };
        let resolved = match vm.resolve_location(&raw) {
            Ok(resolved) => resolved,
            Err(e) => {
                tracing::warn!("vm location did not resolve: {}", e);
                return None;
            }
        };
        match self.sources.position(&resolved) {
            Some(pos) => {
                let thread_name = vm.thread_name(thread).unwrap_or_default();
                Some((thread_name, pos))
            }
            None => {
                tracing::warn!(
                    source = %resolved.source_name,
                    line = resolved.line,
                    "no project source for vm location"
                );
                None
            }
        }
    }

    fn resolve_value(
        &mut self,
        vm: &mut dyn TargetVm,
        loc: &DebugLocation,
    ) -> Result<VmValue, DebugError> {
        let value = match loc {
            DebugLocation::ObjectReference { object_id } => self
                .pins
                .get(*object_id)
                .cloned()
                .ok_or_else(|| DebugError::Invalid(format!("unknown object id {}", object_id)))?,
            DebugLocation::ObjectField { object_id, field } => {
                vm.field_value(*object_id, field)?
            }
            DebugLocation::ArrayElement { object_id, index } => vm
                .array_elements(*object_id, *index, 1)?
                .into_iter()
                .next()
                .ok_or_else(|| DebugError::Invalid(format!("no element {}", index)))?,
            DebugLocation::StackSlot { thread_id, frame, offset } => {
                vm.slot(*thread_id, *frame, *offset)?.value
            }
        };
        self.pins.pin(&value);
        Ok(value)
    }

    /// Pin and convert a raw value for the client.
    fn expose(&mut self, vm: &mut dyn TargetVm, value: VmValue) -> DebugValue {
        self.pins.pin(&value);
        match value {
            VmValue::Null => DebugValue::Null,
            VmValue::String { id, value } => DebugValue::StringInstance {
                object_id: id,
                summary: format!("\"{}\"", value),
            },
            VmValue::Object { id, type_name } => {
                DebugValue::Object { object_id: id, type_name }
            }
            VmValue::Array { id, length, element_type } => {
                DebugValue::Array { object_id: id, length, element_type }
            }
            primitive => {
                let type_name = primitive_type_name(&primitive);
                DebugValue::Primitive {
                    summary: summarize(vm, &mut self.pins, &primitive),
                    type_name: type_name.to_string(),
                }
            }
        }
    }

    async fn emit(&self, event: DebugEvent) {
        let _ = self.outbound.send(Outbound::Event(EnsignEvent::Debug(event))).await;
    }
}

fn primitive_type_name(value: &VmValue) -> &'static str {
    match value {
        VmValue::Boolean(_) => "boolean",
        VmValue::Byte(_) => "byte",
        VmValue::Char(_) => "char",
        VmValue::Short(_) => "short",
        VmValue::Int(_) => "int",
        VmValue::Long(_) => "long",
        VmValue::Float(_) => "float",
        VmValue::Double(_) => "double",
        _ => "object",
    }
}

#[cfg(test)]
#[path = "controller_tests.rs"]
mod tests;
