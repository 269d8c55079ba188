// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Ensign Contributors

use std::path::PathBuf;

use en_core::rpc::{AnalyzerReq, DebugReq, RpcRequest, SourceEdit, StepDepth};
use en_core::{DebugLocation, ObjectId, ThreadId};

use super::*;
use crate::sexp::parse;
use crate::ProtocolError;

fn parse_req(text: &str) -> (RpcRequest, i64) {
    parse_frame(&parse(text).unwrap()).unwrap()
}

#[test]
fn parses_connection_info() {
    let (req, id) = parse_req("(:swank-rpc (swank:connection-info) 42)");
    assert_eq!(req, RpcRequest::ConnectionInfo);
    assert_eq!(id, 42);
}

#[test]
fn parses_completions() {
    let (req, _) = parse_req(
        r#"(:swank-rpc (swank:completions "/src/Foo.scala" 117 10 t nil) 7)"#,
    );
    assert_eq!(
        req,
        RpcRequest::Analyzer(AnalyzerReq::Completions {
            file: PathBuf::from("/src/Foo.scala"),
            point: 117,
            max_results: 10,
            case_sensitive: true,
            reload: false,
        })
    );
}

#[test]
fn parses_patch_source_edits() {
    let (req, _) = parse_req(
        r#"(:swank-rpc (swank:patch-source "Foo.scala" (("+" 6461 "Inc") ("-" 7127 7128) ("*" 7200 7300 "dude"))) 3)"#,
    );
    assert_eq!(
        req,
        RpcRequest::Analyzer(AnalyzerReq::PatchSource {
            file: PathBuf::from("Foo.scala"),
            edits: vec![
                SourceEdit::Insert { offset: 6461, text: "Inc".into() },
                SourceEdit::Delete { from: 7127, to: 7128 },
                SourceEdit::Replace { from: 7200, to: 7300, text: "dude".into() },
            ],
        })
    );
}

#[test]
fn parses_public_symbol_search() {
    let (req, _) =
        parse_req(r#"(:swank-rpc (swank:public-symbol-search ("java" "util") 50) 11)"#);
    assert_eq!(
        req,
        RpcRequest::Analyzer(AnalyzerReq::PublicSymbolSearch {
            keywords: vec!["java".into(), "util".into()],
            max_results: 50,
        })
    );
}

#[test]
fn parses_import_suggestions() {
    let (req, _) = parse_req(
        r#"(:swank-rpc (swank:import-suggestions "/src/Foo.scala" 2300 ("List") 5) 12)"#,
    );
    assert_eq!(
        req,
        RpcRequest::Analyzer(AnalyzerReq::ImportSuggestions {
            file: PathBuf::from("/src/Foo.scala"),
            point: 2300,
            names: vec!["List".into()],
            max_results: 5,
        })
    );
}

#[test]
fn parses_debug_breakpoint_ops() {
    let (req, _) = parse_req(r#"(:swank-rpc (swank:debug-set-break "Foo.scala" 42) 1)"#);
    assert_eq!(
        req,
        RpcRequest::Debug(DebugReq::SetBreakpoint { file: PathBuf::from("Foo.scala"), line: 42 })
    );

    let (req, _) = parse_req("(:swank-rpc (swank:debug-clear-all-breaks) 2)");
    assert_eq!(req, RpcRequest::Debug(DebugReq::ClearAllBreakpoints));
}

#[test]
fn parses_step_variants() {
    for (op, depth) in [
        ("swank:debug-step", StepDepth::Into),
        ("swank:debug-next", StepDepth::Over),
        ("swank:debug-step-out", StepDepth::Out),
    ] {
        let (req, _) = parse_req(&format!(r#"(:swank-rpc ({} "9") 1)"#, op));
        assert_eq!(req, RpcRequest::Debug(DebugReq::Step { thread_id: ThreadId(9), depth }));
    }
}

#[test]
fn parses_debug_locations() {
    let (req, _) = parse_req(
        r#"(:swank-rpc (swank:debug-value (:type field :object-id "17" :field "name")) 5)"#,
    );
    assert_eq!(
        req,
        RpcRequest::Debug(DebugReq::Value {
            loc: DebugLocation::ObjectField { object_id: ObjectId(17), field: "name".into() },
        })
    );

    let (req, _) = parse_req(
        r#"(:swank-rpc (swank:debug-set-value (:type slot :thread-id "2" :frame 0 :offset 3) "42") 6)"#,
    );
    assert_eq!(
        req,
        RpcRequest::Debug(DebugReq::SetValue {
            loc: DebugLocation::StackSlot { thread_id: ThreadId(2), frame: 0, offset: 3 },
            value: "42".into(),
        })
    );
}

#[test]
fn unknown_envelope_is_unrecognized_form() {
    let err = parse_frame(&parse("(:swank-bad (swank:connection-info) 1)").unwrap()).unwrap_err();
    assert!(matches!(err, ProtocolError::UnrecognizedForm(_)));
}

#[test]
fn unknown_op_is_unrecognized_rpc() {
    let err = parse_frame(&parse("(:swank-rpc (swank:no-such-op) 1)").unwrap()).unwrap_err();
    assert!(matches!(err, ProtocolError::UnrecognizedRpc(_)));
}

#[test]
fn missing_call_id_is_malformed() {
    let err = parse_frame(&parse("(:swank-rpc (swank:connection-info))").unwrap()).unwrap_err();
    assert!(matches!(err, ProtocolError::Malformed(_)));
}

#[test]
fn wrong_arg_type_is_malformed() {
    let err =
        parse_frame(&parse(r#"(:swank-rpc (swank:typecheck-file 42) 1)"#).unwrap()).unwrap_err();
    assert!(matches!(err, ProtocolError::Malformed(_)));
}

#[test]
fn extra_args_are_malformed() {
    let err = parse_frame(&parse(r#"(:swank-rpc (swank:connection-info "x") 1)"#).unwrap())
        .unwrap_err();
    assert!(matches!(err, ProtocolError::Malformed(_)));
}
