// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Ensign Contributors

//! Scripted VM fake shared by the controller and summary tests.

use std::collections::HashMap;
use std::sync::Arc;

use en_core::rpc::StepDepth;
use en_core::{ObjectId, ThreadId};
use parking_lot::Mutex;
use tokio::sync::mpsc;

use crate::vm::{
    MirrorValue, TargetVm, VmClass, VmConnector, VmEvent, VmFrame, VmLocal, VmLocation, VmValue,
};
use crate::DebugError;

/// Scripted state, shared with the test so it can inspect interactions
/// after the adapter moved into the controller.
#[derive(Debug, Default)]
pub struct FakeVmState {
    pub classes: Vec<VmClass>,
    /// (class_id, line) → locations reported for that line.
    pub locations: HashMap<(i64, u32), Vec<VmLocation>>,
    pub installed: Vec<(i32, VmLocation)>,
    pub cleared_requests: Vec<i32>,
    pub cleared_all: usize,
    pub resumes: usize,
    pub step_requests: Vec<(ThreadId, StepDepth)>,
    pub deleted_step_requests: usize,
    pub frames: HashMap<i64, Vec<VmFrame>>,
    pub fields: HashMap<(i64, String), VmValue>,
    pub arrays: HashMap<i64, Vec<VmValue>>,
    pub objects: HashMap<i64, String>,
    pub thread_names: HashMap<i64, String>,
    pub set_slots: Vec<(ThreadId, u32, u32, MirrorValue)>,
    pub to_strings: HashMap<i64, String>,
    pub modifiable: bool,
    pub disposed: bool,
    pub events_enabled: bool,
    next_request_id: i32,
}

impl FakeVmState {
    pub fn shared() -> Arc<Mutex<FakeVmState>> {
        Arc::new(Mutex::new(FakeVmState { modifiable: true, ..FakeVmState::default() }))
    }
}

pub struct FakeVm {
    pub state: Arc<Mutex<FakeVmState>>,
}

impl TargetVm for FakeVm {
    fn resume(&mut self) -> Result<(), DebugError> {
        self.state.lock().resumes += 1;
        Ok(())
    }

    fn dispose(&mut self) {
        self.state.lock().disposed = true;
    }

    fn is_modifiable(&self) -> bool {
        self.state.lock().modifiable
    }

    fn enable_vm_events(&mut self) -> Result<(), DebugError> {
        self.state.lock().events_enabled = true;
        Ok(())
    }

    fn all_classes(&mut self) -> Result<Vec<VmClass>, DebugError> {
        Ok(self.state.lock().classes.clone())
    }

    fn class_source_name(&mut self, class_id: i64) -> Result<Option<String>, DebugError> {
        Ok(self
            .state
            .lock()
            .classes
            .iter()
            .find(|c| c.ref_id == class_id)
            .and_then(|c| c.source_name.clone()))
    }

    fn thread_name(&mut self, thread: ThreadId) -> Result<String, DebugError> {
        Ok(self
            .state
            .lock()
            .thread_names
            .get(&thread.0)
            .cloned()
            .unwrap_or_else(|| "main".to_string()))
    }

    fn object_type_name(&mut self, object: ObjectId) -> Result<String, DebugError> {
        self.state
            .lock()
            .objects
            .get(&object.0)
            .cloned()
            .ok_or_else(|| DebugError::Invalid(format!("unknown object {}", object)))
    }

    fn resolve_location(&mut self, location: &VmLocation) -> Result<VmLocation, DebugError> {
        // Scripted locations are born resolved.
        Ok(location.clone())
    }

    fn locations_of_line(
        &mut self,
        class_id: i64,
        line: u32,
    ) -> Result<Vec<VmLocation>, DebugError> {
        Ok(self
            .state
            .lock()
            .locations
            .get(&(class_id, line))
            .cloned()
            .unwrap_or_default())
    }

    fn install_breakpoint(&mut self, location: &VmLocation) -> Result<i32, DebugError> {
        let mut state = self.state.lock();
        state.next_request_id += 1;
        let id = state.next_request_id;
        state.installed.push((id, location.clone()));
        Ok(id)
    }

    fn clear_breakpoints(&mut self, request_ids: &[i32]) -> Result<(), DebugError> {
        let mut state = self.state.lock();
        state.cleared_requests.extend_from_slice(request_ids);
        state.installed.retain(|(id, _)| !request_ids.contains(id));
        Ok(())
    }

    fn clear_all_breakpoints(&mut self) -> Result<(), DebugError> {
        let mut state = self.state.lock();
        state.cleared_all += 1;
        state.installed.clear();
        Ok(())
    }

    fn delete_step_requests(&mut self) -> Result<(), DebugError> {
        self.state.lock().deleted_step_requests += 1;
        Ok(())
    }

    fn request_step(&mut self, thread: ThreadId, depth: StepDepth) -> Result<(), DebugError> {
        self.state.lock().step_requests.push((thread, depth));
        Ok(())
    }

    fn frames(
        &mut self,
        thread: ThreadId,
        from: u32,
        count: Option<u32>,
    ) -> Result<Vec<VmFrame>, DebugError> {
        let all = self
            .state
            .lock()
            .frames
            .get(&thread.0)
            .cloned()
            .unwrap_or_default();
        let from = from as usize;
        if from >= all.len() {
            return Ok(Vec::new());
        }
        let end = match count {
            Some(count) => (from + count as usize).min(all.len()),
            None => all.len(),
        };
        Ok(all[from..end].to_vec())
    }

    fn field_value(&mut self, object: ObjectId, field: &str) -> Result<VmValue, DebugError> {
        self.state
            .lock()
            .fields
            .get(&(object.0, field.to_string()))
            .cloned()
            .ok_or_else(|| DebugError::Invalid(format!("no field {:?}", field)))
    }

    fn array_elements(
        &mut self,
        object: ObjectId,
        from: u32,
        count: u32,
    ) -> Result<Vec<VmValue>, DebugError> {
        let state = self.state.lock();
        let all = state
            .arrays
            .get(&object.0)
            .ok_or_else(|| DebugError::Invalid(format!("not an array: {}", object)))?;
        let from = from as usize;
        let end = (from + count as usize).min(all.len());
        Ok(all.get(from..end).unwrap_or_default().to_vec())
    }

    fn slot(&mut self, thread: ThreadId, frame: u32, slot: u32) -> Result<VmLocal, DebugError> {
        self.frames(thread, frame, Some(1))?
            .into_iter()
            .next()
            .and_then(|f| f.locals.into_iter().find(|local| local.slot == slot))
            .ok_or_else(|| DebugError::Invalid(format!("no local in slot {}", slot)))
    }

    fn set_slot(
        &mut self,
        thread: ThreadId,
        frame: u32,
        slot: u32,
        value: &MirrorValue,
    ) -> Result<(), DebugError> {
        self.state.lock().set_slots.push((thread, frame, slot, value.clone()));
        Ok(())
    }

    fn invoke_to_string(
        &mut self,
        _thread: ThreadId,
        object: ObjectId,
    ) -> Result<String, DebugError> {
        self.state
            .lock()
            .to_strings
            .get(&object.0)
            .cloned()
            .ok_or_else(|| DebugError::Invalid(format!("no toString for {}", object)))
    }
}

/// Connector handing out fakes over one shared state.
pub struct FakeConnector {
    pub state: Arc<Mutex<FakeVmState>>,
}

impl VmConnector for FakeConnector {
    fn launch(
        &self,
        _command_line: &str,
        _events: mpsc::Sender<VmEvent>,
    ) -> Result<Box<dyn TargetVm>, DebugError> {
        Ok(Box::new(FakeVm { state: Arc::clone(&self.state) }))
    }

    fn attach(
        &self,
        _hostname: &str,
        _port: u16,
        _events: mpsc::Sender<VmEvent>,
    ) -> Result<Box<dyn TargetVm>, DebugError> {
        Ok(Box::new(FakeVm { state: Arc::clone(&self.state) }))
    }
}

/// A resolved location in `Widget.scala`.
pub fn widget_location(line: u32) -> VmLocation {
    VmLocation {
        class_id: 1,
        method_id: 10,
        code_index: 0,
        source_path: "com/example/Widget.scala".to_string(),
        source_name: "Widget.scala".to_string(),
        line,
    }
}

pub fn widget_class() -> VmClass {
    VmClass {
        ref_id: 1,
        name: "com.example.Widget".to_string(),
        source_name: Some("Widget.scala".to_string()),
    }
}
