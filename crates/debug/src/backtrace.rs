// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Ensign Contributors

//! Backtrace materialization: raw VM frames → wire stack frames.

use std::path::PathBuf;

use en_core::debug::{DebugBacktrace, DebugStackFrame, DebugStackLocal, LineSourcePosition, ObjectId, ThreadId};

use crate::pin::PinTable;
use crate::source_map::SourceMap;
use crate::summary::summarize;
use crate::vm::{TargetVm, VmValue};
use crate::DebugError;

/// Frames `[from, from+count)` of a suspended thread, or to the end when
/// `count` is negative. Missing per-frame information degrades to defaults
/// rather than failing the whole backtrace.
pub fn materialize(
    vm: &mut dyn TargetVm,
    pins: &mut PinTable,
    sources: &SourceMap,
    thread: ThreadId,
    from: u32,
    count: i32,
) -> Result<DebugBacktrace, DebugError> {
    let count = u32::try_from(count).ok();
    let raw_frames = vm.frames(thread, from, count)?;
    let thread_name = vm.thread_name(thread).unwrap_or_default();

    let mut frames = Vec::with_capacity(raw_frames.len());
    for frame in raw_frames {
        let locals = frame
            .locals
            .iter()
            .map(|local| DebugStackLocal {
                index: local.slot,
                name: local.name.clone(),
                type_name: local.type_name.clone(),
                summary: summarize(vm, pins, &local.value),
            })
            .collect();

        let class_name = frame.class_name.clone().unwrap_or_else(|| "Class".to_string());
        let pc_location = frame
            .location
            .as_ref()
            .map(|location| {
                sources.position(location).unwrap_or_else(|| LineSourcePosition {
                    // The raw source path is still a useful hint when no
                    // project file matches.
                    file: PathBuf::from(&location.source_path),
                    line: location.line,
                })
            })
            .unwrap_or_else(|| LineSourcePosition { file: PathBuf::new(), line: 0 });

        let this_object_id = match frame.this_object {
            Some(id) => {
                pins.pin(&VmValue::Object { id, type_name: class_name.clone() });
                id
            }
            None => ObjectId(-1),
        };

        frames.push(DebugStackFrame {
            index: frame.index,
            locals,
            num_args: frame.num_args,
            class_name,
            method_name: frame.method_name.clone().unwrap_or_else(|| "Method".to_string()),
            pc_location,
            this_object_id,
        });
    }

    Ok(DebugBacktrace { frames, thread_id: thread, thread_name })
}
