// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Ensign Contributors

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! en-core: domain types shared by every ensign crate.
//!
//! The daemon is split into independent actors (router, analyzer, indexer,
//! debug manager) that exchange typed messages. This crate holds the types
//! that cross those boundaries: the numeric error-kind space, the project
//! configuration model, symbol search results, debugger value/location
//! types, protocol events, and the RPC request/response enums.

pub mod config;
pub mod debug;
pub mod error;
pub mod event;
pub mod rpc;
pub mod semantic;
pub mod symbol;

pub use config::Config;
pub use debug::{
    Breakpoint, DebugBacktrace, DebugLocation, DebugStackFrame, DebugStackLocal, DebugValue,
    LineSourcePosition, ObjectId, ThreadId,
};
pub use error::ErrorKind;
pub use event::{DebugEvent, EnsignEvent, Note, NoteLang, NoteSeverity};
pub use rpc::{
    AnalyzerReq, CallId, DebugReq, Outbound, RpcRequest, RpcResponse, SourceEdit, StepDepth,
};
pub use semantic::{
    CallCompletionInfo, CompletionInfo, CompletionInfoList, FileEdit, PackageInfo, ParamSection,
    RefactorEffect, SourceRange, SymbolDesignation, SymbolDesignationKind, SymbolDesignations,
    SymbolInfo, TypeInfo,
};
pub use symbol::{DeclaredAs, OffsetSourcePosition, SymbolSearchResult};
