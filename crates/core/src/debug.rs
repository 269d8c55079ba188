// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Ensign Contributors

//! Debugger value and location types shared between the debug manager and
//! the wire layer.

use std::path::PathBuf;

/// Identity of an object inside the target VM, as assigned by the debug
/// backend. Valid only while the VM connection that produced it lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(pub i64);

/// Identity of a thread inside the target VM.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ThreadId(pub i64);

impl std::fmt::Display for ObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::fmt::Display for ThreadId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Position in a source file as a canonical path and a 1-based line.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LineSourcePosition {
    pub file: PathBuf,
    pub line: u32,
}

/// A user breakpoint, unique by source position.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Breakpoint {
    pub pos: LineSourcePosition,
}

/// A slot in the target VM that a value can be read from (and, for stack
/// slots, written to).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DebugLocation {
    ObjectReference {
        object_id: ObjectId,
    },
    ObjectField {
        object_id: ObjectId,
        field: String,
    },
    ArrayElement {
        object_id: ObjectId,
        index: u32,
    },
    StackSlot {
        thread_id: ThreadId,
        frame: u32,
        offset: u32,
    },
}

/// A mirrored value read out of the target VM.
///
/// Reference-typed values carry the object id under which they were pinned,
/// so the client can dereference them later.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DebugValue {
    Primitive {
        summary: String,
        type_name: String,
    },
    StringInstance {
        object_id: ObjectId,
        summary: String,
    },
    Object {
        object_id: ObjectId,
        type_name: String,
    },
    Array {
        object_id: ObjectId,
        length: u32,
        element_type: String,
    },
    Null,
}

/// One local slot in a stack frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DebugStackLocal {
    pub index: u32,
    pub name: String,
    pub type_name: String,
    pub summary: String,
}

/// One materialized stack frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DebugStackFrame {
    pub index: u32,
    pub locals: Vec<DebugStackLocal>,
    pub num_args: u32,
    pub class_name: String,
    pub method_name: String,
    pub pc_location: LineSourcePosition,
    /// Pinned id of `this`, or -1 for static frames.
    pub this_object_id: ObjectId,
}

/// A window of a thread's call stack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DebugBacktrace {
    pub frames: Vec<DebugStackFrame>,
    pub thread_id: ThreadId,
    pub thread_name: String,
}
