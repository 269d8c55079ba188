// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Ensign Contributors

//! The pinning table.
//!
//! Every object reference shown to the client is recorded here so a later
//! `debug-value` can dereference it across suspend/resume boundaries.
//! Without this the ids in old replies would dangle at the whim of the
//! target's collector. Cleared on VM disconnect.

use std::collections::HashMap;

use en_core::ObjectId;

use crate::vm::VmValue;

#[derive(Debug, Default)]
pub struct PinTable {
    pinned: HashMap<ObjectId, VmValue>,
}

impl PinTable {
    /// Record a reference value. Primitives and null pass through unpinned.
    pub fn pin(&mut self, value: &VmValue) {
        if let Some(id) = value.object_id() {
            self.pinned.insert(id, value.clone());
        }
    }

    pub fn get(&self, id: ObjectId) -> Option<&VmValue> {
        self.pinned.get(&id)
    }

    pub fn clear(&mut self) {
        self.pinned.clear();
    }

    pub fn len(&self) -> usize {
        self.pinned.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pinned.is_empty()
    }
}

#[cfg(test)]
#[path = "pin_tests.rs"]
mod tests;
