// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Ensign Contributors

//! RPC request/response enums and the router's outbound message type.
//!
//! The wire crate parses frames into [`RpcRequest`] and renders
//! [`RpcResponse`] / [`crate::EnsignEvent`] back out; between those two
//! points everything is plain domain values.

use std::path::PathBuf;

use crate::debug::{DebugBacktrace, DebugLocation, DebugValue, ThreadId};
use crate::error::ErrorKind;
use crate::event::EnsignEvent;
use crate::semantic::{
    CallCompletionInfo, CompletionInfo, CompletionInfoList, PackageInfo, RefactorEffect,
    SourceRange, SymbolDesignationKind, SymbolDesignations, SymbolInfo, TypeInfo,
};
use crate::symbol::SymbolSearchResult;

/// Client-assigned integer tying a reply to a request.
pub type CallId = i64;

/// One edit applied to a source file, with offsets interpreted against the
/// original text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceEdit {
    Insert { offset: u32, text: String },
    Delete { from: u32, to: u32 },
    Replace { from: u32, to: u32, text: String },
}

/// Step granularity relative to the current frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepDepth {
    Into,
    Over,
    Out,
}

/// Requests owned by the analyzer actor.
#[derive(Debug, Clone, PartialEq)]
pub enum AnalyzerReq {
    RemoveFile {
        file: PathBuf,
    },
    ReloadAll,
    ReloadFiles {
        files: Vec<PathBuf>,
    },
    PatchSource {
        file: PathBuf,
        edits: Vec<SourceEdit>,
    },
    Completions {
        file: PathBuf,
        point: u32,
        max_results: usize,
        case_sensitive: bool,
        reload: bool,
    },
    UsesOfSymAtPoint {
        file: PathBuf,
        point: u32,
    },
    PackageMemberCompletion {
        path: String,
        prefix: String,
    },
    InspectTypeAtPoint {
        file: PathBuf,
        point: u32,
    },
    InspectTypeById {
        id: i64,
    },
    SymbolAtPoint {
        file: PathBuf,
        point: u32,
    },
    InspectPackageByPath {
        path: String,
    },
    TypeAtPoint {
        file: PathBuf,
        point: u32,
    },
    TypeById {
        id: i64,
    },
    TypeByName {
        name: String,
    },
    TypeByNameAtPoint {
        name: String,
        file: PathBuf,
        point: u32,
    },
    CallCompletion {
        id: i64,
    },
    SymbolDesignations {
        file: PathBuf,
        start: u32,
        end: u32,
        kinds: Vec<SymbolDesignationKind>,
    },
    FormatSource {
        files: Vec<PathBuf>,
    },
    PrepareRefactor {
        procedure_id: i64,
        kind: String,
        params: Vec<(String, String)>,
    },
    ExecRefactor {
        procedure_id: i64,
    },
    CancelRefactor {
        procedure_id: i64,
    },
    /// Forwarded to the indexer verbatim.
    ImportSuggestions {
        file: PathBuf,
        point: u32,
        names: Vec<String>,
        max_results: usize,
    },
    /// Forwarded to the indexer verbatim.
    PublicSymbolSearch {
        keywords: Vec<String>,
        max_results: usize,
    },
}

/// Requests owned by the debug manager actor.
#[derive(Debug, Clone, PartialEq)]
pub enum DebugReq {
    ActiveVm,
    StartVm {
        command_line: String,
    },
    AttachVm {
        hostname: String,
        port: u16,
    },
    StopVm,
    SetBreakpoint {
        file: PathBuf,
        line: u32,
    },
    ClearBreakpoint {
        file: PathBuf,
        line: u32,
    },
    ClearAllBreakpoints,
    ListBreakpoints,
    Run,
    Continue {
        thread_id: ThreadId,
    },
    Step {
        thread_id: ThreadId,
        depth: StepDepth,
    },
    Backtrace {
        thread_id: ThreadId,
        index: u32,
        /// Number of frames, or -1 for all remaining.
        count: i32,
    },
    Value {
        loc: DebugLocation,
    },
    ToString {
        thread_id: ThreadId,
        loc: DebugLocation,
    },
    SetValue {
        loc: DebugLocation,
        value: String,
    },
}

/// Every RPC the server understands, routed by owning component.
#[derive(Debug, Clone, PartialEq)]
pub enum RpcRequest {
    ConnectionInfo,
    ShutdownServer,
    Analyzer(AnalyzerReq),
    Debug(DebugReq),
}

/// Result payload of a successful RPC.
#[derive(Debug, Clone, PartialEq)]
pub enum RpcResponse {
    True,
    False,
    StringVal(String),
    ConnectionInfo {
        implementation: String,
        version: String,
    },
    Completions(CompletionInfoList),
    CompletionList(Vec<CompletionInfo>),
    SourceRanges(Vec<SourceRange>),
    TypeInfo(Option<TypeInfo>),
    SymbolInfo(Option<SymbolInfo>),
    PackageInfo(Option<PackageInfo>),
    CallCompletion(Option<CallCompletionInfo>),
    Designations(SymbolDesignations),
    SymbolSearch(Vec<SymbolSearchResult>),
    ImportSuggestions(Vec<Vec<SymbolSearchResult>>),
    Refactor(RefactorEffect),
    Breakpoints {
        active: Vec<crate::debug::Breakpoint>,
        pending: Vec<crate::debug::Breakpoint>,
    },
    DebugValue(DebugValue),
    Backtrace(DebugBacktrace),
}

/// Everything a component can hand the router for the client socket.
///
/// The router serializes these onto the wire in arrival order, which is what
/// keeps replies for one call-id unreordered.
#[derive(Debug, Clone, PartialEq)]
pub enum Outbound {
    Reply {
        call_id: CallId,
        value: RpcResponse,
    },
    Abort {
        call_id: CallId,
        kind: ErrorKind,
        detail: String,
    },
    Event(EnsignEvent),
    /// Unsolicited protocol error, no call-id.
    ProtocolError {
        kind: ErrorKind,
        detail: String,
    },
}
