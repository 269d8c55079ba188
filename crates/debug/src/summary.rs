// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Ensign Contributors

//! Value rendering and text-to-mirror parsing.

use std::sync::OnceLock;

use regex::Regex;

use crate::pin::PinTable;
use crate::vm::{MirrorValue, TargetVm, VmValue};

/// Boxed reference-cell types the runtime wraps captured variables in;
/// summaries dereference them to their `elem` field.
fn ref_cell_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^scala\.runtime\.(Volatile)?(Boolean|Byte|Char|Short|Int|Long|Float|Double|Object)Ref$")
            .expect("ref cell regex")
    })
}

/// How many array elements a summary shows.
const ARRAY_PREVIEW: u32 = 3;

/// A non-ambiguous one-line rendering of a value. Every reference touched
/// along the way is pinned.
pub fn summarize(vm: &mut dyn TargetVm, pins: &mut PinTable, value: &VmValue) -> String {
    pins.pin(value);
    match value {
        VmValue::Boolean(v) => v.to_string(),
        VmValue::Byte(v) => v.to_string(),
        VmValue::Char(v) => format!("'{}'", v),
        VmValue::Short(v) => v.to_string(),
        VmValue::Int(v) => v.to_string(),
        VmValue::Long(v) => v.to_string(),
        VmValue::Float(v) => v.to_string(),
        VmValue::Double(v) => v.to_string(),
        VmValue::String { value, .. } => format!("\"{}\"", value),
        VmValue::Array { id, length, .. } => {
            let shown = (*length).min(ARRAY_PREVIEW);
            let elements = match vm.array_elements(*id, 0, shown) {
                Ok(elements) => elements
                    .iter()
                    .map(|e| summarize(vm, pins, e))
                    .collect::<Vec<_>>()
                    .join(", "),
                Err(_) => String::new(),
            };
            format!("Array[{}]", elements)
        }
        VmValue::Object { id, type_name } if ref_cell_regex().is_match(type_name) => {
            match vm.field_value(*id, "elem") {
                Ok(elem) => summarize(vm, pins, &elem),
                Err(_) => instance_of(type_name),
            }
        }
        VmValue::Object { type_name, .. } => instance_of(type_name),
        VmValue::Null => "null".to_string(),
    }
}

fn instance_of(type_name: &str) -> String {
    let local = type_name.rsplit('.').next().unwrap_or(type_name);
    format!("Instance of {}", local)
}

/// The `debug-to-string` rendering: arrays by element count, strings raw,
/// other objects via the target's own `toString` when the VM permits it.
pub fn to_string_of(
    vm: &mut dyn TargetVm,
    pins: &mut PinTable,
    thread: en_core::ThreadId,
    value: &VmValue,
) -> String {
    pins.pin(value);
    match value {
        VmValue::Array { length, .. } => format!("<array of {} element(s)>", length),
        VmValue::String { value, .. } => value.clone(),
        VmValue::Object { id, .. } if vm.is_modifiable() => {
            match vm.invoke_to_string(thread, *id) {
                Ok(text) => text,
                Err(e) => {
                    tracing::warn!("toString invocation failed: {}", e);
                    summarize(vm, pins, value)
                }
            }
        }
        other => summarize(vm, pins, other),
    }
}

/// Parse client text into a mirror matching the declared type. `None` for
/// unsupported target types and unparseable text.
pub fn mirror_from_text(type_name: &str, text: &str) -> Option<MirrorValue> {
    match type_name {
        "boolean" => text.trim().parse().ok().map(MirrorValue::Boolean),
        "byte" => text.trim().parse().ok().map(MirrorValue::Byte),
        "char" => text.chars().next().map(MirrorValue::Char),
        "short" => text.trim().parse().ok().map(MirrorValue::Short),
        "int" => text.trim().parse().ok().map(MirrorValue::Int),
        "long" => text.trim().parse().ok().map(MirrorValue::Long),
        "float" => text.trim().parse().ok().map(MirrorValue::Float),
        "double" => text.trim().parse().ok().map(MirrorValue::Double),
        "java.lang.String" => {
            let trimmed = text
                .strip_prefix('"')
                .and_then(|t| t.strip_suffix('"'))
                .unwrap_or(text);
            Some(MirrorValue::Str(trimmed.to_string()))
        }
        _ => None,
    }
}

#[cfg(test)]
#[path = "summary_tests.rs"]
mod tests;
