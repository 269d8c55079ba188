// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Ensign Contributors

use std::sync::Arc;

use en_core::{ObjectId, ThreadId};

use super::*;
use crate::test_support::{FakeVm, FakeVmState};

fn fake() -> (FakeVm, Arc<parking_lot::Mutex<FakeVmState>>) {
    let state = FakeVmState::shared();
    (FakeVm { state: Arc::clone(&state) }, state)
}

#[test]
fn primitives_render_as_decimal() {
    let (mut vm, _state) = fake();
    let mut pins = PinTable::default();
    assert_eq!(summarize(&mut vm, &mut pins, &VmValue::Int(42)), "42");
    assert_eq!(summarize(&mut vm, &mut pins, &VmValue::Long(-7)), "-7");
    assert_eq!(summarize(&mut vm, &mut pins, &VmValue::Boolean(true)), "true");
    assert_eq!(summarize(&mut vm, &mut pins, &VmValue::Double(1.5)), "1.5");
    assert!(pins.is_empty());
}

#[test]
fn chars_and_strings_are_quoted() {
    let (mut vm, _state) = fake();
    let mut pins = PinTable::default();
    assert_eq!(summarize(&mut vm, &mut pins, &VmValue::Char('x')), "'x'");
    let s = VmValue::String { id: ObjectId(5), value: "hi".into() };
    assert_eq!(summarize(&mut vm, &mut pins, &s), "\"hi\"");
    assert_eq!(pins.len(), 1);
}

#[test]
fn arrays_preview_three_elements() {
    let (mut vm, state) = fake();
    state.lock().arrays.insert(
        9,
        vec![VmValue::Int(1), VmValue::Int(2), VmValue::Int(3), VmValue::Int(4)],
    );
    let mut pins = PinTable::default();
    let arr = VmValue::Array { id: ObjectId(9), length: 4, element_type: "int".into() };
    assert_eq!(summarize(&mut vm, &mut pins, &arr), "Array[1, 2, 3]");
}

#[test]
fn reference_cells_deref_to_elem() {
    let (mut vm, state) = fake();
    state
        .lock()
        .fields
        .insert((7, "elem".into()), VmValue::Int(99));
    let mut pins = PinTable::default();
    let cell = VmValue::Object { id: ObjectId(7), type_name: "scala.runtime.IntRef".into() };
    assert_eq!(summarize(&mut vm, &mut pins, &cell), "99");
}

#[test]
fn plain_objects_render_instance_of() {
    let (mut vm, _state) = fake();
    let mut pins = PinTable::default();
    let obj = VmValue::Object { id: ObjectId(3), type_name: "com.example.Widget".into() };
    assert_eq!(summarize(&mut vm, &mut pins, &obj), "Instance of Widget");
    assert_eq!(summarize(&mut vm, &mut pins, &VmValue::Null), "null");
}

#[test]
fn to_string_of_arrays_and_strings() {
    let (mut vm, _state) = fake();
    let mut pins = PinTable::default();
    let arr = VmValue::Array { id: ObjectId(9), length: 4, element_type: "int".into() };
    assert_eq!(to_string_of(&mut vm, &mut pins, ThreadId(1), &arr), "<array of 4 element(s)>");

    let s = VmValue::String { id: ObjectId(5), value: "raw chars".into() };
    assert_eq!(to_string_of(&mut vm, &mut pins, ThreadId(1), &s), "raw chars");
}

#[test]
fn to_string_of_objects_invokes_target() {
    let (mut vm, state) = fake();
    state.lock().to_strings.insert(4, "Widget(1)".to_string());
    let mut pins = PinTable::default();
    let obj = VmValue::Object { id: ObjectId(4), type_name: "com.example.Widget".into() };
    assert_eq!(to_string_of(&mut vm, &mut pins, ThreadId(1), &obj), "Widget(1)");
}

#[test]
fn to_string_of_unmodifiable_vm_falls_back_to_summary() {
    let (mut vm, state) = fake();
    state.lock().modifiable = false;
    let mut pins = PinTable::default();
    let obj = VmValue::Object { id: ObjectId(4), type_name: "com.example.Widget".into() };
    assert_eq!(to_string_of(&mut vm, &mut pins, ThreadId(1), &obj), "Instance of Widget");
}

#[test]
fn mirrors_parse_by_declared_type() {
    assert_eq!(mirror_from_text("int", "42"), Some(MirrorValue::Int(42)));
    assert_eq!(mirror_from_text("long", " -9 "), Some(MirrorValue::Long(-9)));
    assert_eq!(mirror_from_text("boolean", "true"), Some(MirrorValue::Boolean(true)));
    assert_eq!(mirror_from_text("char", "abc"), Some(MirrorValue::Char('a')));
    assert_eq!(mirror_from_text("double", "1.25"), Some(MirrorValue::Double(1.25)));
}

#[test]
fn string_mirrors_trim_surrounding_quotes() {
    assert_eq!(
        mirror_from_text("java.lang.String", "\"quoted\""),
        Some(MirrorValue::Str("quoted".into()))
    );
    assert_eq!(
        mirror_from_text("java.lang.String", "bare"),
        Some(MirrorValue::Str("bare".into()))
    );
    // A lone quote is not a quoted string.
    assert_eq!(
        mirror_from_text("java.lang.String", "\"half"),
        Some(MirrorValue::Str("\"half".into()))
    );
}

#[test]
fn unsupported_mirror_types_are_none() {
    assert_eq!(mirror_from_text("com.example.Widget", "x"), None);
    assert_eq!(mirror_from_text("int", "not a number"), None);
}
