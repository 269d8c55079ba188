// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Ensign Contributors

//! Asynchronous events pushed to the client, independent of any call-id.

use std::path::PathBuf;

use crate::debug::{LineSourcePosition, ObjectId, ThreadId};

/// Which compiler a batch of notes came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteLang {
    Scala,
    Java,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteSeverity {
    Error,
    Warn,
    Info,
}

impl NoteSeverity {
    pub fn wire_name(self) -> &'static str {
        match self {
            NoteSeverity::Error => "error",
            NoteSeverity::Warn => "warn",
            NoteSeverity::Info => "info",
        }
    }
}

/// One compiler diagnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Note {
    pub file: PathBuf,
    pub msg: String,
    pub severity: NoteSeverity,
    pub beg: u32,
    pub end: u32,
    pub line: u32,
    pub col: u32,
}

/// Events translated from the target VM's event stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DebugEvent {
    VmStart,
    VmDisconnect,
    Breakpoint {
        thread_id: ThreadId,
        thread_name: String,
        pos: LineSourcePosition,
    },
    Step {
        thread_id: ThreadId,
        thread_name: String,
        pos: LineSourcePosition,
    },
    Exception {
        exception_id: ObjectId,
        thread_id: ThreadId,
        thread_name: String,
        catch_pos: Option<LineSourcePosition>,
    },
    ThreadStart {
        thread_id: ThreadId,
    },
    ThreadDeath {
        thread_id: ThreadId,
    },
    /// A line of output captured from the target process.
    Output {
        body: String,
    },
}

/// Everything the server pushes to the client unsolicited.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnsignEvent {
    /// The analyzer finished its initial full typecheck and accepts RPCs.
    AnalyzerReady,
    /// A full typecheck pass (initial or re-kicked) completed.
    FullTypeCheckComplete,
    /// The classpath index finished building.
    IndexerReady,
    ClearAllNotes {
        lang: NoteLang,
    },
    NewNotes {
        lang: NoteLang,
        notes: Vec<Note>,
    },
    Debug(DebugEvent),
}
