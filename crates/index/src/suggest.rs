// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Ensign Contributors

//! Import suggestions: fuzzy type search reranked by edit distance.

use std::collections::{HashMap, HashSet};

use en_core::symbol::SymbolSearchResult;

use crate::store::SearchIndex;
use crate::tokenize::split_type_name;
use crate::IndexError;

/// Levenshtein distances memoized across the daemon run. Editors re-ask for
/// the same unresolved names on every keystroke.
#[derive(Debug, Default)]
pub struct EditDistanceCache {
    memo: HashMap<(String, String), usize>,
}

impl EditDistanceCache {
    pub fn distance(&mut self, a: &str, b: &str) -> usize {
        if let Some(d) = self.memo.get(&(a.to_string(), b.to_string())) {
            return *d;
        }
        let d = levenshtein(a, b);
        self.memo.insert((a.to_string(), b.to_string()), d);
        d
    }
}

fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut current = vec![0usize; b.len() + 1];
    for (i, ca) in a.iter().enumerate() {
        current[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            current[j + 1] = (prev[j + 1] + 1).min(current[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut current);
    }
    prev[b.len()]
}

/// For each requested type name, a ranked list of candidate types: fuzzy
/// types-only search over the name and its camel-case splits, distinct by
/// fully qualified name, ordered by (edit distance of the local name to the
/// request, then full-name length).
pub fn import_suggestions(
    index: &SearchIndex,
    distances: &mut EditDistanceCache,
    names: &[String],
    max_results: usize,
) -> Result<Vec<Vec<SymbolSearchResult>>, IndexError> {
    names
        .iter()
        .map(|name| {
            let mut keywords = vec![name.clone()];
            keywords.extend(split_type_name(name));

            let hits = index.keyword_search(&keywords, max_results, true, true)?;
            let mut seen = HashSet::new();
            let mut candidates: Vec<SymbolSearchResult> = hits
                .into_iter()
                .filter(|hit| seen.insert(hit.name().to_string()))
                .collect();

            candidates.sort_by_key(|hit| {
                (distances.distance(hit.local_name(), name), hit.name().len())
            });
            candidates.truncate(max_results);
            Ok(candidates)
        })
        .collect()
}

#[cfg(test)]
#[path = "suggest_tests.rs"]
mod tests;
