// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Ensign Contributors

//! Inbound frame → [`RpcRequest`] parsing.
//!
//! The three failure kinds are distinct on the wire and clients match on
//! them: an unknown envelope is `unrecognized-form` (203), a known envelope
//! with a broken shape is `malformed-rpc` (202), and a well-formed
//! `swank:` call the server does not know is `unrecognized-rpc` (204).

use std::path::PathBuf;

use en_core::rpc::{AnalyzerReq, CallId, DebugReq, RpcRequest, SourceEdit, StepDepth};
use en_core::semantic::SymbolDesignationKind;
use en_core::{DebugLocation, ObjectId, ThreadId};

use crate::sexp::SExp;
use crate::ProtocolError;

/// Parse one inbound frame into a routed request plus its call-id.
pub fn parse_frame(frame: &SExp) -> Result<(RpcRequest, CallId), ProtocolError> {
    let items = match frame {
        SExp::List(items) => items.as_slice(),
        other => {
            return Err(ProtocolError::UnrecognizedForm(format!("not a form: {}", other)));
        }
    };
    match items.first() {
        Some(SExp::Key(tag)) if tag == "swank-rpc" => {}
        Some(other) => {
            return Err(ProtocolError::UnrecognizedForm(format!("unknown envelope: {}", other)));
        }
        None => return Err(ProtocolError::UnrecognizedForm("empty form".into())),
    }
    let (form, call_id) = match items {
        [_, form, SExp::Int(id)] => (form, *id),
        _ => {
            return Err(ProtocolError::Malformed("swank-rpc wants (form call-id)".into()));
        }
    };

    let form_items = form
        .as_list()
        .ok_or_else(|| ProtocolError::Malformed("rpc form is not a list".into()))?;
    let (op, args) = match form_items.split_first() {
        Some((SExp::Sym(op), rest)) => (op.as_str(), rest),
        _ => return Err(ProtocolError::Malformed("rpc form has no operation symbol".into())),
    };

    let request = parse_op(op, args)?;
    Ok((request, call_id))
}

fn parse_op(op: &str, args: &[SExp]) -> Result<RpcRequest, ProtocolError> {
    use AnalyzerReq as A;
    use DebugReq as D;

    let mut args = Args { op, items: args, at: 0 };
    let req = match op {
        "swank:connection-info" => RpcRequest::ConnectionInfo,
        "swank:shutdown-server" => RpcRequest::ShutdownServer,

        "swank:remove-file" => RpcRequest::Analyzer(A::RemoveFile { file: args.path()? }),
        "swank:typecheck-all" => RpcRequest::Analyzer(A::ReloadAll),
        "swank:typecheck-file" => {
            RpcRequest::Analyzer(A::ReloadFiles { files: vec![args.path()?] })
        }
        "swank:typecheck-files" => {
            RpcRequest::Analyzer(A::ReloadFiles { files: args.path_list()? })
        }
        "swank:patch-source" => RpcRequest::Analyzer(A::PatchSource {
            file: args.path()?,
            edits: args.edits()?,
        }),
        "swank:completions" => RpcRequest::Analyzer(A::Completions {
            file: args.path()?,
            point: args.u32()?,
            max_results: args.usize()?,
            case_sensitive: args.bool()?,
            reload: args.bool()?,
        }),
        "swank:uses-of-symbol-at-point" => RpcRequest::Analyzer(A::UsesOfSymAtPoint {
            file: args.path()?,
            point: args.u32()?,
        }),
        "swank:package-member-completion" => RpcRequest::Analyzer(A::PackageMemberCompletion {
            path: args.str()?,
            prefix: args.str()?,
        }),
        "swank:inspect-type-at-point" => RpcRequest::Analyzer(A::InspectTypeAtPoint {
            file: args.path()?,
            point: args.u32()?,
        }),
        "swank:inspect-type-by-id" => {
            RpcRequest::Analyzer(A::InspectTypeById { id: args.int()? })
        }
        "swank:symbol-at-point" => RpcRequest::Analyzer(A::SymbolAtPoint {
            file: args.path()?,
            point: args.u32()?,
        }),
        "swank:inspect-package-by-path" => {
            RpcRequest::Analyzer(A::InspectPackageByPath { path: args.str()? })
        }
        "swank:type-at-point" => RpcRequest::Analyzer(A::TypeAtPoint {
            file: args.path()?,
            point: args.u32()?,
        }),
        "swank:type-by-id" => RpcRequest::Analyzer(A::TypeById { id: args.int()? }),
        "swank:type-by-name" => RpcRequest::Analyzer(A::TypeByName { name: args.str()? }),
        "swank:type-by-name-at-point" => RpcRequest::Analyzer(A::TypeByNameAtPoint {
            name: args.str()?,
            file: args.path()?,
            point: args.u32()?,
        }),
        "swank:call-completion" => RpcRequest::Analyzer(A::CallCompletion { id: args.int()? }),
        "swank:symbol-designations" => RpcRequest::Analyzer(A::SymbolDesignations {
            file: args.path()?,
            start: args.u32()?,
            end: args.u32()?,
            kinds: args.designation_kinds()?,
        }),
        "swank:format-source" => {
            RpcRequest::Analyzer(A::FormatSource { files: args.path_list()? })
        }
        "swank:prepare-refactor" => RpcRequest::Analyzer(A::PrepareRefactor {
            procedure_id: args.int()?,
            kind: args.sym()?,
            params: args.param_pairs()?,
        }),
        "swank:exec-refactor" => {
            RpcRequest::Analyzer(A::ExecRefactor { procedure_id: args.int()? })
        }
        "swank:cancel-refactor" => {
            RpcRequest::Analyzer(A::CancelRefactor { procedure_id: args.int()? })
        }
        "swank:import-suggestions" => RpcRequest::Analyzer(A::ImportSuggestions {
            file: args.path()?,
            point: args.u32()?,
            names: args.str_list()?,
            max_results: args.usize()?,
        }),
        "swank:public-symbol-search" => RpcRequest::Analyzer(A::PublicSymbolSearch {
            keywords: args.str_list()?,
            max_results: args.usize()?,
        }),

        "swank:debug-active-vm" => RpcRequest::Debug(D::ActiveVm),
        "swank:debug-start" => RpcRequest::Debug(D::StartVm { command_line: args.str()? }),
        "swank:debug-attach" => RpcRequest::Debug(D::AttachVm {
            hostname: args.str()?,
            port: args.port()?,
        }),
        "swank:debug-stop" => RpcRequest::Debug(D::StopVm),
        "swank:debug-set-break" => RpcRequest::Debug(D::SetBreakpoint {
            file: args.path()?,
            line: args.u32()?,
        }),
        "swank:debug-clear-break" => RpcRequest::Debug(D::ClearBreakpoint {
            file: args.path()?,
            line: args.u32()?,
        }),
        "swank:debug-clear-all-breaks" => RpcRequest::Debug(D::ClearAllBreakpoints),
        "swank:debug-list-breakpoints" => RpcRequest::Debug(D::ListBreakpoints),
        "swank:debug-run" => RpcRequest::Debug(D::Run),
        "swank:debug-continue" => {
            RpcRequest::Debug(D::Continue { thread_id: args.thread_id()? })
        }
        "swank:debug-step" => RpcRequest::Debug(D::Step {
            thread_id: args.thread_id()?,
            depth: StepDepth::Into,
        }),
        "swank:debug-next" => RpcRequest::Debug(D::Step {
            thread_id: args.thread_id()?,
            depth: StepDepth::Over,
        }),
        "swank:debug-step-out" => RpcRequest::Debug(D::Step {
            thread_id: args.thread_id()?,
            depth: StepDepth::Out,
        }),
        "swank:debug-backtrace" => RpcRequest::Debug(D::Backtrace {
            thread_id: args.thread_id()?,
            index: args.u32()?,
            count: args.int()? as i32,
        }),
        "swank:debug-value" => RpcRequest::Debug(D::Value { loc: args.location()? }),
        "swank:debug-to-string" => RpcRequest::Debug(D::ToString {
            thread_id: args.thread_id()?,
            loc: args.location()?,
        }),
        "swank:debug-set-value" => RpcRequest::Debug(D::SetValue {
            loc: args.location()?,
            value: args.str()?,
        }),

        _ => return Err(ProtocolError::UnrecognizedRpc(op.to_string())),
    };
    args.finish()?;
    Ok(req)
}

/// Positional argument cursor with op-tagged malformed errors.
struct Args<'a> {
    op: &'a str,
    items: &'a [SExp],
    at: usize,
}

impl<'a> Args<'a> {
    fn malformed(&self, want: &str) -> ProtocolError {
        ProtocolError::Malformed(format!("{}: argument {} wants {}", self.op, self.at, want))
    }

    fn next(&mut self, want: &str) -> Result<&'a SExp, ProtocolError> {
        let item = self.items.get(self.at).ok_or_else(|| self.malformed(want))?;
        self.at += 1;
        Ok(item)
    }

    fn finish(self) -> Result<(), ProtocolError> {
        if self.at == self.items.len() {
            Ok(())
        } else {
            Err(ProtocolError::Malformed(format!(
                "{}: {} extra argument(s)",
                self.op,
                self.items.len() - self.at
            )))
        }
    }

    fn str(&mut self) -> Result<String, ProtocolError> {
        let item = self.next("a string")?;
        item.as_str().map(str::to_string).ok_or_else(|| self.malformed("a string"))
    }

    fn sym(&mut self) -> Result<String, ProtocolError> {
        let item = self.next("a symbol")?;
        item.as_sym().map(str::to_string).ok_or_else(|| self.malformed("a symbol"))
    }

    fn int(&mut self) -> Result<i64, ProtocolError> {
        let item = self.next("an integer")?;
        item.as_int().ok_or_else(|| self.malformed("an integer"))
    }

    fn u32(&mut self) -> Result<u32, ProtocolError> {
        let n = self.int()?;
        u32::try_from(n).map_err(|_| self.malformed("a non-negative integer"))
    }

    fn usize(&mut self) -> Result<usize, ProtocolError> {
        let n = self.int()?;
        usize::try_from(n).map_err(|_| self.malformed("a non-negative integer"))
    }

    fn port(&mut self) -> Result<u16, ProtocolError> {
        // Ports travel as strings in this protocol.
        let s = self.str()?;
        s.parse().map_err(|_| self.malformed("a port number"))
    }

    fn bool(&mut self) -> Result<bool, ProtocolError> {
        Ok(self.next("t or nil")?.as_bool())
    }

    fn path(&mut self) -> Result<PathBuf, ProtocolError> {
        Ok(PathBuf::from(self.str()?))
    }

    fn thread_id(&mut self) -> Result<ThreadId, ProtocolError> {
        // Thread ids also travel as strings, being 64-bit.
        let s = self.str()?;
        let n = s.parse().map_err(|_| self.malformed("a thread id"))?;
        Ok(ThreadId(n))
    }

    fn list(&mut self) -> Result<&'a [SExp], ProtocolError> {
        let item = self.next("a list")?;
        item.as_list().ok_or_else(|| self.malformed("a list"))
    }

    fn str_list(&mut self) -> Result<Vec<String>, ProtocolError> {
        let items = self.list()?;
        items
            .iter()
            .map(|i| i.as_str().map(str::to_string))
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| self.malformed("a list of strings"))
    }

    fn path_list(&mut self) -> Result<Vec<PathBuf>, ProtocolError> {
        Ok(self.str_list()?.into_iter().map(PathBuf::from).collect())
    }

    fn designation_kinds(&mut self) -> Result<Vec<SymbolDesignationKind>, ProtocolError> {
        let items = self.list()?;
        items
            .iter()
            .map(|i| i.as_sym().and_then(SymbolDesignationKind::parse))
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| self.malformed("a list of designation kinds"))
    }

    /// Flat plist of refactor parameters: `(name "x" file "y" ...)`.
    fn param_pairs(&mut self) -> Result<Vec<(String, String)>, ProtocolError> {
        let items = self.list()?;
        if items.len() % 2 != 0 {
            return Err(self.malformed("key/value pairs"));
        }
        let mut pairs = Vec::with_capacity(items.len() / 2);
        for kv in items.chunks(2) {
            let key = match &kv[0] {
                SExp::Sym(s) | SExp::Key(s) => s.clone(),
                _ => return Err(self.malformed("a parameter name")),
            };
            let value = match &kv[1] {
                SExp::Str(s) => s.clone(),
                SExp::Sym(s) => s.clone(),
                SExp::Int(n) => n.to_string(),
                other => other.to_string(),
            };
            pairs.push((key, value));
        }
        Ok(pairs)
    }

    /// Edits: `(("+" OFFSET TEXT) ("-" FROM TO) ("*" FROM TO TEXT) ...)`.
    fn edits(&mut self) -> Result<Vec<SourceEdit>, ProtocolError> {
        let items = self.list()?;
        let mut edits = Vec::with_capacity(items.len());
        for item in items {
            let parts = item.as_list().ok_or_else(|| self.malformed("an edit list"))?;
            let edit = match parts {
                [SExp::Str(tag), SExp::Int(offset), SExp::Str(text)] if tag == "+" => {
                    SourceEdit::Insert {
                        offset: to_u32(*offset).ok_or_else(|| self.malformed("an offset"))?,
                        text: text.clone(),
                    }
                }
                [SExp::Str(tag), SExp::Int(from), SExp::Int(to)] if tag == "-" => {
                    SourceEdit::Delete {
                        from: to_u32(*from).ok_or_else(|| self.malformed("an offset"))?,
                        to: to_u32(*to).ok_or_else(|| self.malformed("an offset"))?,
                    }
                }
                [SExp::Str(tag), SExp::Int(from), SExp::Int(to), SExp::Str(text)]
                    if tag == "*" =>
                {
                    SourceEdit::Replace {
                        from: to_u32(*from).ok_or_else(|| self.malformed("an offset"))?,
                        to: to_u32(*to).ok_or_else(|| self.malformed("an offset"))?,
                        text: text.clone(),
                    }
                }
                _ => return Err(self.malformed("an edit (+/-/* form)")),
            };
            edits.push(edit);
        }
        Ok(edits)
    }

    /// A debug location plist, discriminated by `:type`.
    fn location(&mut self) -> Result<DebugLocation, ProtocolError> {
        let item = self.next("a debug location")?;
        let type_name = item
            .plist_get("type")
            .and_then(|v| v.as_sym())
            .ok_or_else(|| self.malformed("a location :type"))?;

        let object_id = |key: &str| -> Result<ObjectId, ProtocolError> {
            item.plist_get(key)
                .and_then(|v| v.as_str())
                .and_then(|s| s.parse().ok())
                .map(ObjectId)
                .ok_or_else(|| self.malformed("an object id"))
        };
        let num = |key: &str| -> Result<u32, ProtocolError> {
            item.plist_get(key)
                .and_then(|v| v.as_int())
                .and_then(|n| to_u32(n))
                .ok_or_else(|| self.malformed("a non-negative integer"))
        };

        match type_name {
            "reference" => Ok(DebugLocation::ObjectReference { object_id: object_id("object-id")? }),
            "field" => Ok(DebugLocation::ObjectField {
                object_id: object_id("object-id")?,
                field: item
                    .plist_get("field")
                    .and_then(|v| v.as_str())
                    .map(str::to_string)
                    .ok_or_else(|| self.malformed("a field name"))?,
            }),
            "element" => Ok(DebugLocation::ArrayElement {
                object_id: object_id("object-id")?,
                index: num("index")?,
            }),
            "slot" => Ok(DebugLocation::StackSlot {
                thread_id: item
                    .plist_get("thread-id")
                    .and_then(|v| v.as_str())
                    .and_then(|s| s.parse().ok())
                    .map(ThreadId)
                    .ok_or_else(|| self.malformed("a thread id"))?,
                frame: num("frame")?,
                offset: num("offset")?,
            }),
            other => Err(ProtocolError::Malformed(format!(
                "{}: unknown location type {:?}",
                self.op, other
            ))),
        }
    }
}

fn to_u32(n: i64) -> Option<u32> {
    u32::try_from(n).ok()
}

#[cfg(test)]
#[path = "rpc_tests.rs"]
mod tests;
