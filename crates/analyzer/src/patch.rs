// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Ensign Contributors

//! Source patching with original-text offset semantics.
//!
//! Every edit's offsets address the UNPATCHED text; earlier edits shift
//! later ones by their accumulated character delta. Offsets are character
//! counts, not bytes.

use en_core::rpc::SourceEdit;

/// Apply ordered edits to `text`.
///
/// Offsets beyond the end clamp to the end; a delete range that inverted
/// after clamping removes nothing.
pub fn apply_edits(text: &str, edits: &[SourceEdit]) -> String {
    let mut chars: Vec<char> = text.chars().collect();
    // Positive when insertions outweigh deletions so far.
    let mut delta: i64 = 0;

    for edit in edits {
        match edit {
            SourceEdit::Insert { offset, text } => {
                let at = shifted(*offset, delta, chars.len());
                let insert: Vec<char> = text.chars().collect();
                delta += insert.len() as i64;
                chars.splice(at..at, insert);
            }
            SourceEdit::Delete { from, to } => {
                let start = shifted(*from, delta, chars.len());
                let end = shifted(*to, delta, chars.len()).max(start);
                delta -= (end - start) as i64;
                chars.splice(start..end, std::iter::empty());
            }
            SourceEdit::Replace { from, to, text } => {
                let start = shifted(*from, delta, chars.len());
                let end = shifted(*to, delta, chars.len()).max(start);
                let insert: Vec<char> = text.chars().collect();
                delta += insert.len() as i64 - (end - start) as i64;
                chars.splice(start..end, insert);
            }
        }
    }
    chars.into_iter().collect()
}

fn shifted(original: u32, delta: i64, len: usize) -> usize {
    let at = i64::from(original) + delta;
    at.clamp(0, len as i64) as usize
}

#[cfg(test)]
#[path = "patch_tests.rs"]
mod tests;
