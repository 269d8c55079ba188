// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Ensign Contributors

//! Breakpoint bookkeeping and the loaded-class basename map.
//!
//! Active and pending sets are disjoint and together hold exactly the
//! user's requested breakpoints. A breakpoint is unique by source position;
//! re-adding one replaces the previous entry.

use std::collections::{HashMap, HashSet};

use en_core::debug::Breakpoint;

use crate::vm::VmClass;

/// Loaded classes indexed by the basename of their source file.
#[derive(Debug, Default)]
pub struct ClassMap {
    by_basename: HashMap<String, Vec<VmClass>>,
}

impl ClassMap {
    pub fn clear(&mut self) {
        self.by_basename.clear();
    }

    /// Register a loaded class. Classes without source information cannot
    /// anchor breakpoints and are skipped.
    pub fn add(&mut self, class: VmClass) {
        let Some(source) = class.source_name.clone() else {
            return;
        };
        let entry = self.by_basename.entry(source).or_default();
        if !entry.iter().any(|c| c.ref_id == class.ref_id) {
            entry.push(class);
        }
    }

    pub fn classes_for(&self, basename: &str) -> &[VmClass] {
        self.by_basename.get(basename).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// The active/pending partition of user breakpoints.
#[derive(Debug, Default)]
pub struct BreakpointManager {
    active: HashMap<Breakpoint, Vec<i32>>,
    pending: HashSet<Breakpoint>,
}

impl BreakpointManager {
    /// Record a breakpoint as installed, with its VM request ids. Returns
    /// request ids of a previously active instance, which the caller must
    /// clear in the VM.
    pub fn set_active(&mut self, bp: Breakpoint, request_ids: Vec<i32>) -> Option<Vec<i32>> {
        self.pending.remove(&bp);
        self.active.insert(bp, request_ids)
    }

    /// Record a breakpoint whose class is not loaded yet.
    pub fn set_pending(&mut self, bp: Breakpoint) -> Option<Vec<i32>> {
        let previous = self.active.remove(&bp);
        self.pending.insert(bp);
        previous
    }

    /// Drop a breakpoint entirely. Returns request ids to clear when it was
    /// active.
    pub fn remove(&mut self, bp: &Breakpoint) -> Option<Vec<i32>> {
        self.pending.remove(bp);
        self.active.remove(bp)
    }

    /// Drop everything. Request ids of formerly active breakpoints are
    /// returned for VM cleanup.
    pub fn clear(&mut self) -> Vec<i32> {
        self.pending.clear();
        self.active.drain().flat_map(|(_, ids)| ids).collect()
    }

    /// On VM disconnect: every active breakpoint becomes pending again so a
    /// subsequent VM start re-installs it.
    pub fn migrate_active_to_pending(&mut self) {
        for (bp, _) in self.active.drain() {
            self.pending.insert(bp);
        }
    }

    /// Pending breakpoints whose file matches `basename`, for retry after a
    /// class prepare.
    pub fn pending_for_basename(&self, basename: &str) -> Vec<Breakpoint> {
        self.pending
            .iter()
            .filter(|bp| {
                bp.pos.file.file_name().and_then(|n| n.to_str()) == Some(basename)
            })
            .cloned()
            .collect()
    }

    pub fn all_pending(&self) -> Vec<Breakpoint> {
        self.pending.iter().cloned().collect()
    }

    /// Sorted snapshots for the breakpoint-list reply.
    pub fn lists(&self) -> (Vec<Breakpoint>, Vec<Breakpoint>) {
        let mut active: Vec<Breakpoint> = self.active.keys().cloned().collect();
        let mut pending: Vec<Breakpoint> = self.pending.iter().cloned().collect();
        let key = |bp: &Breakpoint| (bp.pos.file.clone(), bp.pos.line);
        active.sort_by_key(key);
        pending.sort_by_key(key);
        (active, pending)
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty() && self.pending.is_empty()
    }
}

#[cfg(test)]
#[path = "breakpoints_tests.rs"]
mod tests;
