// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Ensign Contributors

//! Domain values → wire trees.
//!
//! Everything the server sends goes through [`outbound_to_wire`]; the
//! individual shapers are public for tests.

use en_core::debug::{
    Breakpoint, DebugBacktrace, DebugStackFrame, DebugStackLocal, DebugValue, LineSourcePosition,
    ObjectId,
};
use en_core::event::{DebugEvent, EnsignEvent, Note, NoteLang};
use en_core::rpc::{Outbound, RpcResponse};
use en_core::semantic::{
    CallCompletionInfo, CompletionInfo, PackageInfo, RefactorEffect, SourceRange, SymbolInfo,
    TypeInfo,
};
use en_core::symbol::{OffsetSourcePosition, SymbolSearchResult};

use crate::sexp::SExp;

/// Render one outbound message as a complete frame payload.
pub fn outbound_to_wire(message: &Outbound) -> SExp {
    match message {
        Outbound::Reply { call_id, value } => SExp::List(vec![
            SExp::key("return"),
            SExp::List(vec![SExp::key("ok"), response_to_wire(value)]),
            SExp::Int(*call_id),
        ]),
        Outbound::Abort { call_id, kind, detail } => SExp::List(vec![
            SExp::key("return"),
            SExp::List(vec![SExp::key("abort"), SExp::Int(kind.code()), SExp::str(detail)]),
            SExp::Int(*call_id),
        ]),
        Outbound::Event(event) => event_to_wire(event),
        Outbound::ProtocolError { kind, detail } => SExp::List(vec![
            SExp::key("reader-error"),
            SExp::Int(kind.code()),
            SExp::str(detail),
        ]),
    }
}

pub fn response_to_wire(value: &RpcResponse) -> SExp {
    match value {
        RpcResponse::True => SExp::T,
        RpcResponse::False => SExp::Nil,
        RpcResponse::StringVal(s) => SExp::str(s),
        RpcResponse::ConnectionInfo { implementation, version } => SExp::List(vec![
            SExp::key("pid"),
            SExp::Nil,
            SExp::key("implementation"),
            SExp::List(vec![SExp::key("name"), SExp::str(implementation)]),
            SExp::key("version"),
            SExp::str(version),
        ]),
        RpcResponse::Completions(list) => SExp::List(vec![
            SExp::key("prefix"),
            SExp::str(&list.prefix),
            SExp::key("completions"),
            sexp_list(list.completions.iter().map(completion_to_wire)),
        ]),
        RpcResponse::CompletionList(completions) => {
            sexp_list(completions.iter().map(completion_to_wire))
        }
        RpcResponse::SourceRanges(ranges) => sexp_list(ranges.iter().map(range_to_wire)),
        RpcResponse::TypeInfo(info) => SExp::opt(info.as_ref().map(type_info_to_wire)),
        RpcResponse::SymbolInfo(info) => SExp::opt(info.as_ref().map(symbol_info_to_wire)),
        RpcResponse::PackageInfo(info) => SExp::opt(info.as_ref().map(package_info_to_wire)),
        RpcResponse::CallCompletion(info) => {
            SExp::opt(info.as_ref().map(call_completion_to_wire))
        }
        RpcResponse::Designations(designations) => SExp::List(vec![
            SExp::key("file"),
            path_to_wire(&designations.file),
            SExp::key("syms"),
            sexp_list(designations.designations.iter().map(|d| {
                SExp::List(vec![
                    SExp::sym(d.kind.wire_name()),
                    SExp::Int(d.start as i64),
                    SExp::Int(d.end as i64),
                ])
            })),
        ]),
        RpcResponse::SymbolSearch(results) => sexp_list(results.iter().map(symbol_to_wire)),
        RpcResponse::ImportSuggestions(groups) => {
            sexp_list(groups.iter().map(|group| sexp_list(group.iter().map(symbol_to_wire))))
        }
        RpcResponse::Refactor(effect) => refactor_to_wire(effect),
        RpcResponse::Breakpoints { active, pending } => SExp::List(vec![
            SExp::key("active"),
            sexp_list(active.iter().map(breakpoint_to_wire)),
            SExp::key("pending"),
            sexp_list(pending.iter().map(breakpoint_to_wire)),
        ]),
        RpcResponse::DebugValue(value) => debug_value_to_wire(value),
        RpcResponse::Backtrace(backtrace) => backtrace_to_wire(backtrace),
    }
}

pub fn event_to_wire(event: &EnsignEvent) -> SExp {
    match event {
        EnsignEvent::AnalyzerReady => SExp::List(vec![SExp::key("compiler-ready"), SExp::T]),
        EnsignEvent::FullTypeCheckComplete => {
            SExp::List(vec![SExp::key("full-typecheck-finished"), SExp::T])
        }
        EnsignEvent::IndexerReady => SExp::List(vec![SExp::key("indexer-ready"), SExp::T]),
        EnsignEvent::ClearAllNotes { lang } => SExp::List(vec![
            SExp::key(match lang {
                NoteLang::Scala => "clear-all-scala-notes",
                NoteLang::Java => "clear-all-java-notes",
            }),
            SExp::T,
        ]),
        EnsignEvent::NewNotes { lang, notes } => SExp::List(vec![
            SExp::key(match lang {
                NoteLang::Scala => "scala-notes",
                NoteLang::Java => "java-notes",
            }),
            SExp::List(vec![
                SExp::key("is-full"),
                SExp::Nil,
                SExp::key("notes"),
                sexp_list(notes.iter().map(note_to_wire)),
            ]),
        ]),
        EnsignEvent::Debug(event) => {
            SExp::List(vec![SExp::key("debug-event"), debug_event_to_wire(event)])
        }
    }
}

fn debug_event_to_wire(event: &DebugEvent) -> SExp {
    let mut plist = vec![SExp::key("type")];
    match event {
        DebugEvent::VmStart => plist.push(SExp::sym("start")),
        DebugEvent::VmDisconnect => plist.push(SExp::sym("disconnect")),
        DebugEvent::Breakpoint { thread_id, thread_name, pos } => {
            plist.push(SExp::sym("breakpoint"));
            plist.extend(thread_fields(thread_id.0, thread_name));
            plist.extend(line_pos_fields(pos));
        }
        DebugEvent::Step { thread_id, thread_name, pos } => {
            plist.push(SExp::sym("step"));
            plist.extend(thread_fields(thread_id.0, thread_name));
            plist.extend(line_pos_fields(pos));
        }
        DebugEvent::Exception { exception_id, thread_id, thread_name, catch_pos } => {
            plist.push(SExp::sym("exception"));
            plist.push(SExp::key("exception"));
            plist.push(SExp::str(exception_id.0.to_string()));
            plist.extend(thread_fields(thread_id.0, thread_name));
            if let Some(pos) = catch_pos {
                plist.extend(line_pos_fields(pos));
            }
        }
        DebugEvent::ThreadStart { thread_id } => {
            plist.push(SExp::sym("threadStart"));
            plist.push(SExp::key("thread-id"));
            plist.push(SExp::str(thread_id.0.to_string()));
        }
        DebugEvent::ThreadDeath { thread_id } => {
            plist.push(SExp::sym("threadDeath"));
            plist.push(SExp::key("thread-id"));
            plist.push(SExp::str(thread_id.0.to_string()));
        }
        DebugEvent::Output { body } => {
            plist.push(SExp::sym("output"));
            plist.push(SExp::key("body"));
            plist.push(SExp::str(body));
        }
    }
    SExp::List(plist)
}

fn thread_fields(id: i64, name: &str) -> Vec<SExp> {
    vec![
        SExp::key("thread-id"),
        SExp::str(id.to_string()),
        SExp::key("thread-name"),
        SExp::str(name),
    ]
}

fn line_pos_fields(pos: &LineSourcePosition) -> Vec<SExp> {
    vec![
        SExp::key("file"),
        path_to_wire(&pos.file),
        SExp::key("line"),
        SExp::Int(pos.line as i64),
    ]
}

pub fn symbol_to_wire(result: &SymbolSearchResult) -> SExp {
    let mut plist = vec![
        SExp::key("name"),
        SExp::str(result.name()),
        SExp::key("local-name"),
        SExp::str(result.local_name()),
        SExp::key("decl-as"),
        SExp::sym(result.decl_as().wire_name()),
    ];
    if let SymbolSearchResult::Method { owner, .. } = result {
        plist.push(SExp::key("owner-name"));
        plist.push(SExp::str(owner));
    }
    if let Some(pos) = result.pos() {
        plist.push(SExp::key("pos"));
        plist.push(offset_pos_to_wire(pos));
    }
    SExp::List(plist)
}

fn completion_to_wire(info: &CompletionInfo) -> SExp {
    let mut plist = vec![
        SExp::key("name"),
        SExp::str(&info.name),
        SExp::key("type-sig"),
        SExp::str(&info.type_sig),
        SExp::key("type-id"),
        SExp::Int(info.type_id),
        SExp::key("is-callable"),
        SExp::bool(info.is_callable),
        SExp::key("relevance"),
        SExp::Int(info.relevance as i64),
    ];
    if let Some(text) = &info.to_insert {
        plist.push(SExp::key("to-insert"));
        plist.push(SExp::str(text));
    }
    SExp::List(plist)
}

fn range_to_wire(range: &SourceRange) -> SExp {
    SExp::List(vec![
        SExp::key("file"),
        path_to_wire(&range.file),
        SExp::key("start"),
        SExp::Int(range.start as i64),
        SExp::key("end"),
        SExp::Int(range.end as i64),
    ])
}

pub fn type_info_to_wire(info: &TypeInfo) -> SExp {
    let mut plist = vec![
        SExp::key("name"),
        SExp::str(&info.name),
        SExp::key("full-name"),
        SExp::str(&info.full_name),
        SExp::key("decl-as"),
        SExp::sym(info.decl_as.wire_name()),
        SExp::key("type-id"),
        SExp::Int(info.type_id),
    ];
    if let Some(pos) = &info.pos {
        plist.push(SExp::key("pos"));
        plist.push(offset_pos_to_wire(pos));
    }
    SExp::List(plist)
}

fn symbol_info_to_wire(info: &SymbolInfo) -> SExp {
    let mut plist = vec![
        SExp::key("name"),
        SExp::str(&info.name),
        SExp::key("local-name"),
        SExp::str(&info.local_name),
    ];
    if let Some(pos) = &info.decl_pos {
        plist.push(SExp::key("decl-pos"));
        plist.push(offset_pos_to_wire(pos));
    }
    plist.push(SExp::key("type"));
    plist.push(type_info_to_wire(&info.tpe));
    plist.push(SExp::key("is-callable"));
    plist.push(SExp::bool(info.is_callable));
    SExp::List(plist)
}

fn package_info_to_wire(info: &PackageInfo) -> SExp {
    SExp::List(vec![
        SExp::key("name"),
        SExp::str(&info.name),
        SExp::key("full-name"),
        SExp::str(&info.full_name),
        SExp::key("members"),
        sexp_list(info.members.iter().map(type_info_to_wire)),
    ])
}

fn call_completion_to_wire(info: &CallCompletionInfo) -> SExp {
    SExp::List(vec![
        SExp::key("result-type"),
        type_info_to_wire(&info.result_type),
        SExp::key("param-sections"),
        sexp_list(info.param_sections.iter().map(|section| {
            SExp::List(vec![
                SExp::key("params"),
                sexp_list(section.params.iter().map(|(name, tpe)| {
                    SExp::List(vec![SExp::str(name), type_info_to_wire(tpe)])
                })),
            ])
        })),
    ])
}

fn refactor_to_wire(effect: &RefactorEffect) -> SExp {
    SExp::List(vec![
        SExp::key("procedure-id"),
        SExp::Int(effect.procedure_id),
        SExp::key("refactor-type"),
        SExp::sym(&effect.kind),
        SExp::key("changes"),
        sexp_list(effect.changes.iter().map(|change| {
            SExp::List(vec![
                SExp::key("file"),
                path_to_wire(&change.file),
                SExp::key("from"),
                SExp::Int(change.from as i64),
                SExp::key("to"),
                SExp::Int(change.to as i64),
                SExp::key("text"),
                SExp::str(&change.text),
            ])
        })),
    ])
}

fn breakpoint_to_wire(bp: &Breakpoint) -> SExp {
    SExp::List(vec![
        SExp::key("file"),
        path_to_wire(&bp.pos.file),
        SExp::key("line"),
        SExp::Int(bp.pos.line as i64),
    ])
}

pub fn debug_value_to_wire(value: &DebugValue) -> SExp {
    match value {
        DebugValue::Primitive { summary, type_name } => SExp::List(vec![
            SExp::key("val-type"),
            SExp::sym("prim"),
            SExp::key("summary"),
            SExp::str(summary),
            SExp::key("type-name"),
            SExp::str(type_name),
        ]),
        DebugValue::StringInstance { object_id, summary } => SExp::List(vec![
            SExp::key("val-type"),
            SExp::sym("str"),
            SExp::key("object-id"),
            object_id_to_wire(*object_id),
            SExp::key("summary"),
            SExp::str(summary),
            SExp::key("type-name"),
            SExp::str("java.lang.String"),
        ]),
        DebugValue::Object { object_id, type_name } => SExp::List(vec![
            SExp::key("val-type"),
            SExp::sym("obj"),
            SExp::key("object-id"),
            object_id_to_wire(*object_id),
            SExp::key("type-name"),
            SExp::str(type_name),
        ]),
        DebugValue::Array { object_id, length, element_type } => SExp::List(vec![
            SExp::key("val-type"),
            SExp::sym("arr"),
            SExp::key("object-id"),
            object_id_to_wire(*object_id),
            SExp::key("length"),
            SExp::Int(*length as i64),
            SExp::key("element-type-name"),
            SExp::str(element_type),
        ]),
        DebugValue::Null => SExp::List(vec![SExp::key("val-type"), SExp::sym("null")]),
    }
}

fn backtrace_to_wire(backtrace: &DebugBacktrace) -> SExp {
    SExp::List(vec![
        SExp::key("frames"),
        sexp_list(backtrace.frames.iter().map(frame_to_wire)),
        SExp::key("thread-id"),
        SExp::str(backtrace.thread_id.0.to_string()),
        SExp::key("thread-name"),
        SExp::str(&backtrace.thread_name),
    ])
}

fn frame_to_wire(frame: &DebugStackFrame) -> SExp {
    SExp::List(vec![
        SExp::key("index"),
        SExp::Int(frame.index as i64),
        SExp::key("locals"),
        sexp_list(frame.locals.iter().map(local_to_wire)),
        SExp::key("num-args"),
        SExp::Int(frame.num_args as i64),
        SExp::key("class-name"),
        SExp::str(&frame.class_name),
        SExp::key("method-name"),
        SExp::str(&frame.method_name),
        SExp::key("pc-location"),
        SExp::List(line_pos_fields(&frame.pc_location)),
        SExp::key("this-object-id"),
        object_id_to_wire(frame.this_object_id),
    ])
}

fn local_to_wire(local: &DebugStackLocal) -> SExp {
    SExp::List(vec![
        SExp::key("index"),
        SExp::Int(local.index as i64),
        SExp::key("name"),
        SExp::str(&local.name),
        SExp::key("type-name"),
        SExp::str(&local.type_name),
        SExp::key("summary"),
        SExp::str(&local.summary),
    ])
}

fn note_to_wire(note: &Note) -> SExp {
    SExp::List(vec![
        SExp::key("file"),
        path_to_wire(&note.file),
        SExp::key("msg"),
        SExp::str(&note.msg),
        SExp::key("severity"),
        SExp::sym(note.severity.wire_name()),
        SExp::key("beg"),
        SExp::Int(note.beg as i64),
        SExp::key("end"),
        SExp::Int(note.end as i64),
        SExp::key("line"),
        SExp::Int(note.line as i64),
        SExp::key("col"),
        SExp::Int(note.col as i64),
    ])
}

fn offset_pos_to_wire(pos: &OffsetSourcePosition) -> SExp {
    SExp::List(vec![
        SExp::key("file"),
        path_to_wire(&pos.file),
        SExp::key("offset"),
        SExp::Int(pos.offset as i64),
    ])
}

fn object_id_to_wire(id: ObjectId) -> SExp {
    // 64-bit ids travel as strings so 32-bit clients survive them.
    SExp::str(id.0.to_string())
}

fn path_to_wire(path: &std::path::Path) -> SExp {
    SExp::str(path.to_string_lossy())
}

fn sexp_list(items: impl Iterator<Item = SExp>) -> SExp {
    let items: Vec<SExp> = items.collect();
    if items.is_empty() {
        SExp::Nil
    } else {
        SExp::List(items)
    }
}

#[cfg(test)]
#[path = "convert_tests.rs"]
mod tests;
