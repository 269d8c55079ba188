// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Ensign Contributors

//! The adapter seam over the platform debug wire protocol.
//!
//! The controller only ever talks to [`TargetVm`]; the JDWP backend in
//! [`crate::jdwp`] is the production implementation and the scripted fake in
//! `test_support` the test one. Adapter calls run under the controller's
//! mutex; VM events arrive out-of-band from the backend's pump thread as
//! [`VmEvent`] messages.

use en_core::rpc::StepDepth;
use en_core::{ObjectId, ThreadId};
use tokio::sync::mpsc;

use crate::DebugError;

/// A reference type loaded in the target VM.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VmClass {
    pub ref_id: i64,
    /// Dotted fully qualified name.
    pub name: String,
    /// Unqualified source file name, when the class file recorded one.
    pub source_name: Option<String>,
}

/// A code location inside a loaded class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VmLocation {
    pub class_id: i64,
    pub method_id: i64,
    pub code_index: u64,
    /// Package-qualified source path (`com/example/Widget.scala`).
    pub source_path: String,
    /// Unqualified source name (`Widget.scala`).
    pub source_name: String,
    pub line: u32,
}

/// A value mirrored out of the target VM, with reference metadata already
/// resolved.
#[derive(Debug, Clone, PartialEq)]
pub enum VmValue {
    Boolean(bool),
    Byte(i8),
    Char(char),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    String { id: ObjectId, value: String },
    Object { id: ObjectId, type_name: String },
    Array { id: ObjectId, length: u32, element_type: String },
    Null,
}

impl VmValue {
    /// The object id when this value is a reference.
    pub fn object_id(&self) -> Option<ObjectId> {
        match self {
            VmValue::String { id, .. } | VmValue::Object { id, .. } | VmValue::Array { id, .. } => {
                Some(*id)
            }
            _ => None,
        }
    }
}

/// A local slot in a stack frame, with its declared type.
#[derive(Debug, Clone, PartialEq)]
pub struct VmLocal {
    pub slot: u32,
    pub name: String,
    /// Declared type in source notation (`int`, `java.lang.String`).
    pub type_name: String,
    pub value: VmValue,
}

/// One frame of a suspended thread.
#[derive(Debug, Clone, PartialEq)]
pub struct VmFrame {
    pub index: u32,
    pub class_name: Option<String>,
    pub method_name: Option<String>,
    pub locals: Vec<VmLocal>,
    pub num_args: u32,
    pub location: Option<VmLocation>,
    pub this_object: Option<ObjectId>,
}

/// A primitive or string mirror to write into the target VM.
#[derive(Debug, Clone, PartialEq)]
pub enum MirrorValue {
    Boolean(bool),
    Byte(i8),
    Char(char),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Str(String),
}

/// Events posted by the backend's pump thread.
#[derive(Debug, Clone, PartialEq)]
pub enum VmEvent {
    VmStart,
    VmDeath,
    VmDisconnected,
    ClassPrepare { class: VmClass },
    Breakpoint { thread: ThreadId, location: Option<VmLocation> },
    Step { thread: ThreadId, location: Option<VmLocation> },
    Exception { thread: ThreadId, exception: ObjectId, catch_location: Option<VmLocation> },
    ThreadStart { thread: ThreadId },
    ThreadDeath { thread: ThreadId },
    /// A line captured from the target process output.
    Output { body: String },
}

/// Synchronous adapter over one target VM connection.
///
/// `dispose` must be idempotent and safe after the VM already went away;
/// every other call may fail with [`DebugError::Disconnected`] once it has.
pub trait TargetVm: Send {
    fn resume(&mut self) -> Result<(), DebugError>;
    fn dispose(&mut self);
    /// False only for connections that cannot mutate the target (e.g. core
    /// dump style backends); socket attach/launch are modifiable.
    fn is_modifiable(&self) -> bool;

    /// Ask the target to report class prepares, thread lifecycle, and
    /// uncaught exceptions. Called once, before the first resume.
    fn enable_vm_events(&mut self) -> Result<(), DebugError>;

    fn all_classes(&mut self) -> Result<Vec<VmClass>, DebugError>;
    /// Source file recorded in a loaded class, if any. Completes
    /// class-prepare events, whose pump-side decoding cannot issue
    /// commands.
    fn class_source_name(&mut self, class_id: i64) -> Result<Option<String>, DebugError>;
    fn thread_name(&mut self, thread: ThreadId) -> Result<String, DebugError>;
    fn object_type_name(&mut self, object: ObjectId) -> Result<String, DebugError>;

    /// Fill in source path, source name, and line for a raw pump location.
    fn resolve_location(&mut self, location: &VmLocation) -> Result<VmLocation, DebugError>;

    /// All locations of `line` across the methods of the class (and the
    /// class itself, for pre-method code).
    fn locations_of_line(&mut self, class_id: i64, line: u32)
        -> Result<Vec<VmLocation>, DebugError>;
    /// Install a breakpoint request (SUSPEND_ALL) and return its request id.
    fn install_breakpoint(&mut self, location: &VmLocation) -> Result<i32, DebugError>;
    fn clear_breakpoints(&mut self, request_ids: &[i32]) -> Result<(), DebugError>;
    fn clear_all_breakpoints(&mut self) -> Result<(), DebugError>;

    /// Delete every outstanding step request. The protocol disallows more
    /// than one per thread, and at most one stepping operation is
    /// outstanding across all threads by UX contract.
    fn delete_step_requests(&mut self) -> Result<(), DebugError>;
    /// Install a line step with count filter 1. Does not resume.
    fn request_step(&mut self, thread: ThreadId, depth: StepDepth) -> Result<(), DebugError>;

    /// Frames `[from, from+count)`, or to the end when `count` is `None`.
    fn frames(
        &mut self,
        thread: ThreadId,
        from: u32,
        count: Option<u32>,
    ) -> Result<Vec<VmFrame>, DebugError>;

    fn field_value(&mut self, object: ObjectId, field: &str) -> Result<VmValue, DebugError>;
    fn array_elements(
        &mut self,
        object: ObjectId,
        from: u32,
        count: u32,
    ) -> Result<Vec<VmValue>, DebugError>;
    fn slot(&mut self, thread: ThreadId, frame: u32, slot: u32) -> Result<VmLocal, DebugError>;
    fn set_slot(
        &mut self,
        thread: ThreadId,
        frame: u32,
        slot: u32,
        value: &MirrorValue,
    ) -> Result<(), DebugError>;

    /// Invoke the target's `toString()` on `thread`, single-threaded.
    fn invoke_to_string(
        &mut self,
        thread: ThreadId,
        object: ObjectId,
    ) -> Result<String, DebugError>;
}

/// Factory for VM connections; the daemon wires the JDWP implementation,
/// tests wire scripted fakes.
pub trait VmConnector: Send + Sync + 'static {
    fn launch(
        &self,
        command_line: &str,
        events: mpsc::Sender<VmEvent>,
    ) -> Result<Box<dyn TargetVm>, DebugError>;

    fn attach(
        &self,
        hostname: &str,
        port: u16,
        events: mpsc::Sender<VmEvent>,
    ) -> Result<Box<dyn TargetVm>, DebugError>;
}
