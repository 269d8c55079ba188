// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Ensign Contributors

//! Tokenization feeding the index's analyzed fields.
//!
//! The token text for a symbol is its lowercased name followed by every
//! distinct word obtained by splitting on spaces, dots, and camel-case
//! boundaries. Splits already present as words are not repeated, which is
//! what makes the function idempotent on its own output.

use std::collections::HashSet;

/// Produce the analyzed token text for `input`.
pub fn tokenize(input: &str) -> String {
    let lower = input.to_lowercase();
    let mut seen: HashSet<String> =
        lower.split(' ').filter(|w| !w.is_empty()).map(str::to_string).collect();

    let mut out = lower.clone();
    for word in input.split([' ', '.']) {
        for part in split_type_name(word) {
            let token = part.to_lowercase();
            if seen.insert(token.clone()) {
                out.push(' ');
                out.push_str(&token);
            }
        }
    }
    out
}

/// Split a name on camel-case boundaries. Every uppercase character starts
/// a new token, wherever it sits.
///
/// `"FooBarBaz"` → `["Foo", "Bar", "Baz"]`; `"URLParser"` → `["U", "R",
/// "L", "Parser"]`; `""` → `[]`.
pub fn split_type_name(name: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    for c in name.chars() {
        if c.is_uppercase() && !current.is_empty() {
            parts.push(std::mem::take(&mut current));
        }
        current.push(c);
    }
    if !current.is_empty() {
        parts.push(current);
    }
    parts
}

#[cfg(test)]
#[path = "tokenize_tests.rs"]
mod tests;
