// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Ensign Contributors

use en_core::rpc::SourceEdit;

use super::apply_edits;

#[test]
fn insert_at_offset() {
    let got = apply_edits("hello world", &[SourceEdit::Insert { offset: 5, text: ",".into() }]);
    assert_eq!(got, "hello, world");
}

#[test]
fn delete_range_is_half_open() {
    let got = apply_edits("hello world", &[SourceEdit::Delete { from: 5, to: 11 }]);
    assert_eq!(got, "hello");
}

#[test]
fn replace_swaps_range() {
    let got = apply_edits(
        "val x = 1",
        &[SourceEdit::Replace { from: 8, to: 9, text: "42".into() }],
    );
    assert_eq!(got, "val x = 42");
}

#[test]
fn later_offsets_address_the_original_text() {
    // Insert early, then delete a range given in original coordinates.
    let got = apply_edits(
        "abcdef",
        &[
            SourceEdit::Insert { offset: 0, text: "XY".into() },
            SourceEdit::Delete { from: 2, to: 4 },
        ],
    );
    assert_eq!(got, "XYabef");
}

#[test]
fn mixed_sequence_matches_expected() {
    let got = apply_edits(
        "0123456789",
        &[
            SourceEdit::Insert { offset: 2, text: "AA".into() },
            SourceEdit::Delete { from: 4, to: 6 },
            SourceEdit::Replace { from: 8, to: 9, text: "B".into() },
        ],
    );
    // Original coords: insert before '2', drop "45", replace '8'.
    assert_eq!(got, "01AA2367B9");
}

#[test]
fn offsets_are_characters_not_bytes() {
    let got = apply_edits("héllo", &[SourceEdit::Insert { offset: 2, text: "X".into() }]);
    assert_eq!(got, "héXllo");
}

#[test]
fn out_of_range_offsets_clamp() {
    let got = apply_edits("ab", &[SourceEdit::Insert { offset: 99, text: "!".into() }]);
    assert_eq!(got, "ab!");
    let got = apply_edits("ab", &[SourceEdit::Delete { from: 1, to: 99 }]);
    assert_eq!(got, "a");
}

#[test]
fn empty_edit_list_is_identity() {
    assert_eq!(apply_edits("unchanged", &[]), "unchanged");
}
