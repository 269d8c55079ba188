// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Ensign Contributors

//! JDWP backend: the production [`TargetVm`] over a debug-agent socket.
//!
//! Only the command subset the controller consumes is implemented. The
//! pump thread lives in [`client`]; everything here runs on the caller's
//! thread under the controller's adapter mutex.

mod client;
pub(crate) mod wire;

use std::io::{BufRead, BufReader};
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};

use en_core::rpc::StepDepth;
use en_core::{ObjectId, ThreadId};
use tokio::sync::mpsc;

use self::client::JdwpClient;
use self::wire::{Builder, Cursor};
use crate::vm::{
    MirrorValue, TargetVm, VmClass, VmConnector, VmEvent, VmFrame, VmLocal, VmLocation, VmValue,
};
use crate::DebugError;

/// Command sets and commands, as numbered by the protocol.
pub(crate) mod cmd {
    pub const VM: u8 = 1;
    pub const VM_ALL_CLASSES: u8 = 3;
    pub const VM_DISPOSE: u8 = 6;
    pub const VM_ID_SIZES: u8 = 7;
    pub const VM_RESUME: u8 = 9;
    pub const VM_CREATE_STRING: u8 = 11;

    pub const REF_TYPE: u8 = 2;
    pub const REF_SIGNATURE: u8 = 1;
    pub const REF_FIELDS: u8 = 4;
    pub const REF_METHODS: u8 = 5;
    pub const REF_SOURCE_FILE: u8 = 7;

    pub const CLASS_TYPE: u8 = 3;
    pub const CLASS_SUPERCLASS: u8 = 3;

    pub const METHOD: u8 = 6;
    pub const METHOD_LINE_TABLE: u8 = 1;
    pub const METHOD_VARIABLE_TABLE: u8 = 2;

    pub const OBJ: u8 = 9;
    pub const OBJ_REFERENCE_TYPE: u8 = 1;
    pub const OBJ_GET_VALUES: u8 = 2;
    pub const OBJ_INVOKE_METHOD: u8 = 6;

    pub const STRING_REF: u8 = 10;
    pub const STRING_VALUE: u8 = 1;

    pub const THREAD: u8 = 11;
    pub const THREAD_NAME: u8 = 1;
    pub const THREAD_FRAMES: u8 = 6;

    pub const ARRAY: u8 = 13;
    pub const ARRAY_LENGTH: u8 = 1;
    pub const ARRAY_GET_VALUES: u8 = 2;

    pub const EVENT_REQ: u8 = 15;
    pub const EVENT_REQ_SET: u8 = 1;
    pub const EVENT_REQ_CLEAR: u8 = 2;
    pub const EVENT_REQ_CLEAR_ALL_BREAKPOINTS: u8 = 3;

    pub const STACK_FRAME: u8 = 16;
    pub const FRAME_GET_VALUES: u8 = 1;
    pub const FRAME_SET_VALUES: u8 = 2;
    pub const FRAME_THIS_OBJECT: u8 = 3;

    pub const EVENT: u8 = 64;
    pub const EVENT_COMPOSITE: u8 = 100;
}

pub(crate) mod event_kind {
    pub const SINGLE_STEP: u8 = 1;
    pub const BREAKPOINT: u8 = 2;
    pub const EXCEPTION: u8 = 4;
    pub const THREAD_START: u8 = 6;
    pub const THREAD_DEATH: u8 = 7;
    pub const CLASS_PREPARE: u8 = 8;
    pub const VM_START: u8 = 90;
    pub const VM_DEATH: u8 = 99;
}

mod tag {
    pub const ARRAY: u8 = b'[';
    pub const BYTE: u8 = b'B';
    pub const CHAR: u8 = b'C';
    pub const OBJECT: u8 = b'L';
    pub const FLOAT: u8 = b'F';
    pub const DOUBLE: u8 = b'D';
    pub const INT: u8 = b'I';
    pub const LONG: u8 = b'J';
    pub const SHORT: u8 = b'S';
    pub const VOID: u8 = b'V';
    pub const BOOLEAN: u8 = b'Z';
    pub const STRING: u8 = b's';
    pub const THREAD: u8 = b't';
    pub const THREAD_GROUP: u8 = b'g';
    pub const CLASS_LOADER: u8 = b'l';
    pub const CLASS_OBJECT: u8 = b'c';
}

const JDWP_ABSENT_INFORMATION: u16 = 101;

const SUSPEND_ALL: u8 = 2;
const STEP_SIZE_LINE: u32 = 1;
const INVOKE_SINGLE_THREADED: u32 = 0x02;
const MOD_KIND_COUNT: u8 = 1;
const MOD_KIND_LOCATION_ONLY: u8 = 7;
const MOD_KIND_STEP: u8 = 10;
const LOCATION_TAG_CLASS: u8 = 1;

/// `Lcom/foo/Bar;` → `com.foo.Bar`, with primitive and array signatures
/// rendered in source notation.
pub(crate) fn signature_to_name(signature: &str) -> String {
    let mut sig = signature;
    let mut dimensions = 0;
    while let Some(rest) = sig.strip_prefix('[') {
        dimensions += 1;
        sig = rest;
    }
    let base = match sig.as_bytes().first().copied() {
        Some(b'L') => sig
            .strip_prefix('L')
            .and_then(|s| s.strip_suffix(';'))
            .unwrap_or(sig)
            .replace('/', "."),
        Some(b'Z') => "boolean".to_string(),
        Some(b'B') => "byte".to_string(),
        Some(b'C') => "char".to_string(),
        Some(b'S') => "short".to_string(),
        Some(b'I') => "int".to_string(),
        Some(b'J') => "long".to_string(),
        Some(b'F') => "float".to_string(),
        Some(b'D') => "double".to_string(),
        Some(b'V') => "void".to_string(),
        _ => sig.to_string(),
    };
    format!("{}{}", base, "[]".repeat(dimensions))
}

/// The production VM adapter over one JDWP connection.
pub struct JdwpVm {
    client: JdwpClient,
    /// The spawned target process, when this adapter launched it.
    child: Option<Child>,
    step_requests: Vec<u32>,
    disposed: bool,
}

impl JdwpVm {
    fn sizes(&self) -> wire::IdSizes {
        self.client.id_sizes
    }

    fn ref_signature(&self, class_id: i64) -> Result<String, DebugError> {
        let data = self.client.command(
            (cmd::REF_TYPE, cmd::REF_SIGNATURE),
            &Builder::new().id(self.sizes().reference, class_id).build(),
        )?;
        Cursor::new(&data).string()
    }

    fn class_name(&self, class_id: i64) -> Result<String, DebugError> {
        Ok(signature_to_name(&self.ref_signature(class_id)?))
    }

    fn source_file(&self, class_id: i64) -> Result<Option<String>, DebugError> {
        let result = self.client.command(
            (cmd::REF_TYPE, cmd::REF_SOURCE_FILE),
            &Builder::new().id(self.sizes().reference, class_id).build(),
        );
        match result {
            Ok(data) => Ok(Some(Cursor::new(&data).string()?)),
            Err(DebugError::Command { code: JDWP_ABSENT_INFORMATION }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// `(method_id, name, signature)` triples of one class.
    fn methods(&self, class_id: i64) -> Result<Vec<(i64, String, String)>, DebugError> {
        let data = self.client.command(
            (cmd::REF_TYPE, cmd::REF_METHODS),
            &Builder::new().id(self.sizes().reference, class_id).build(),
        )?;
        let mut c = Cursor::new(&data);
        let count = c.u32()?;
        let mut out = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let id = c.id(self.sizes().method)?;
            let name = c.string()?;
            let signature = c.string()?;
            let _mod_bits = c.u32()?;
            out.push((id, name, signature));
        }
        Ok(out)
    }

    fn fields(&self, class_id: i64) -> Result<Vec<(i64, String, String)>, DebugError> {
        let data = self.client.command(
            (cmd::REF_TYPE, cmd::REF_FIELDS),
            &Builder::new().id(self.sizes().reference, class_id).build(),
        )?;
        let mut c = Cursor::new(&data);
        let count = c.u32()?;
        let mut out = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let id = c.id(self.sizes().field)?;
            let name = c.string()?;
            let signature = c.string()?;
            let _mod_bits = c.u32()?;
            out.push((id, name, signature));
        }
        Ok(out)
    }

    fn superclass(&self, class_id: i64) -> Result<i64, DebugError> {
        let data = self.client.command(
            (cmd::CLASS_TYPE, cmd::CLASS_SUPERCLASS),
            &Builder::new().id(self.sizes().reference, class_id).build(),
        )?;
        Cursor::new(&data).id(self.sizes().reference)
    }

    /// `(code_index, line)` pairs, empty for native or absent-info methods.
    fn line_table(&self, class_id: i64, method_id: i64) -> Result<Vec<(u64, u32)>, DebugError> {
        let result = self.client.command(
            (cmd::METHOD, cmd::METHOD_LINE_TABLE),
            &Builder::new()
                .id(self.sizes().reference, class_id)
                .id(self.sizes().method, method_id)
                .build(),
        );
        let data = match result {
            Ok(data) => data,
            Err(DebugError::Command { .. }) => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };
        let mut c = Cursor::new(&data);
        let _start = c.i64()?;
        let _end = c.i64()?;
        let count = c.u32()?;
        let mut out = Vec::with_capacity(count as usize);
        for _ in 0..count {
            out.push((c.u64()?, c.u32()?));
        }
        Ok(out)
    }

    /// Variable table of one method: `(arg_count, entries)` where each
    /// entry is `(code_index, name, signature, length, slot)`.
    #[allow(clippy::type_complexity)]
    fn variable_table(
        &self,
        class_id: i64,
        method_id: i64,
    ) -> Result<(u32, Vec<(u64, String, String, u32, u32)>), DebugError> {
        let result = self.client.command(
            (cmd::METHOD, cmd::METHOD_VARIABLE_TABLE),
            &Builder::new()
                .id(self.sizes().reference, class_id)
                .id(self.sizes().method, method_id)
                .build(),
        );
        let data = match result {
            Ok(data) => data,
            Err(DebugError::Command { .. }) => return Ok((0, Vec::new())),
            Err(e) => return Err(e),
        };
        let mut c = Cursor::new(&data);
        let arg_count = c.u32()?;
        let count = c.u32()?;
        let mut out = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let code_index = c.u64()?;
            let name = c.string()?;
            let signature = c.string()?;
            let length = c.u32()?;
            let slot = c.u32()?;
            out.push((code_index, name, signature, length, slot));
        }
        Ok((arg_count, out))
    }

    fn string_contents(&self, id: i64) -> Result<String, DebugError> {
        let data = self.client.command(
            (cmd::STRING_REF, cmd::STRING_VALUE),
            &Builder::new().id(self.sizes().object, id).build(),
        )?;
        Cursor::new(&data).string()
    }

    fn array_length_of(&self, id: i64) -> Result<u32, DebugError> {
        let data = self.client.command(
            (cmd::ARRAY, cmd::ARRAY_LENGTH),
            &Builder::new().id(self.sizes().object, id).build(),
        )?;
        Ok(Cursor::new(&data).i32()?.max(0) as u32)
    }

    fn reference_type_of(&self, object: ObjectId) -> Result<i64, DebugError> {
        let data = self.client.command(
            (cmd::OBJ, cmd::OBJ_REFERENCE_TYPE),
            &Builder::new().id(self.sizes().object, object.0).build(),
        )?;
        let mut c = Cursor::new(&data);
        let _ref_type_tag = c.u8()?;
        c.id(self.sizes().reference)
    }

    /// Read one tagged value, resolving reference metadata eagerly.
    fn decode_tagged_value(&self, c: &mut Cursor<'_>) -> Result<VmValue, DebugError> {
        let tag = c.u8()?;
        self.decode_value(tag, c)
    }

    fn decode_value(&self, value_tag: u8, c: &mut Cursor<'_>) -> Result<VmValue, DebugError> {
        let sizes = self.sizes();
        Ok(match value_tag {
            tag::BOOLEAN => VmValue::Boolean(c.u8()? != 0),
            tag::BYTE => VmValue::Byte(c.u8()? as i8),
            tag::CHAR => {
                VmValue::Char(char::from_u32(c.u16()? as u32).unwrap_or(char::REPLACEMENT_CHARACTER))
            }
            tag::SHORT => VmValue::Short(c.u16()? as i16),
            tag::INT => VmValue::Int(c.i32()?),
            tag::LONG => VmValue::Long(c.i64()?),
            tag::FLOAT => VmValue::Float(f32::from_bits(c.u32()?)),
            tag::DOUBLE => VmValue::Double(f64::from_bits(c.u64()?)),
            tag::VOID => VmValue::Null,
            tag::STRING => {
                let id = c.id(sizes.object)?;
                if id == 0 {
                    VmValue::Null
                } else {
                    VmValue::String { id: ObjectId(id), value: self.string_contents(id)? }
                }
            }
            tag::ARRAY => {
                let id = c.id(sizes.object)?;
                if id == 0 {
                    VmValue::Null
                } else {
                    let type_id = self.reference_type_of(ObjectId(id))?;
                    let signature = self.ref_signature(type_id)?;
                    let element = signature.strip_prefix('[').unwrap_or(&signature);
                    VmValue::Array {
                        id: ObjectId(id),
                        length: self.array_length_of(id)?,
                        element_type: signature_to_name(element),
                    }
                }
            }
            tag::OBJECT | tag::THREAD | tag::THREAD_GROUP | tag::CLASS_LOADER
            | tag::CLASS_OBJECT => {
                let id = c.id(sizes.object)?;
                if id == 0 {
                    VmValue::Null
                } else {
                    let type_id = self.reference_type_of(ObjectId(id))?;
                    VmValue::Object { id: ObjectId(id), type_name: self.class_name(type_id)? }
                }
            }
            other => {
                return Err(DebugError::Protocol(format!("unknown value tag {}", other)));
            }
        })
    }

    /// Raw frames of a thread: `(frame_id, location)`.
    fn raw_frames(
        &self,
        thread: ThreadId,
        from: u32,
        count: Option<u32>,
    ) -> Result<Vec<(i64, VmLocation)>, DebugError> {
        let sizes = self.sizes();
        let length = count.map(|n| n as i32).unwrap_or(-1);
        let data = self.client.command(
            (cmd::THREAD, cmd::THREAD_FRAMES),
            &Builder::new()
                .id(sizes.object, thread.0)
                .u32(from)
                .i32(length)
                .build(),
        )?;
        let mut c = Cursor::new(&data);
        let count = c.u32()?;
        let mut out = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let frame_id = c.id(sizes.frame)?;
            let _type_tag = c.u8()?;
            let class_id = c.id(sizes.reference)?;
            let method_id = c.id(sizes.method)?;
            let code_index = c.u64()?;
            out.push((
                frame_id,
                VmLocation {
                    class_id,
                    method_id,
                    code_index,
                    source_path: String::new(),
                    source_name: String::new(),
                    line: 0,
                },
            ));
        }
        Ok(out)
    }

    fn find_method(
        &self,
        type_id: i64,
        name: &str,
        signature: &str,
    ) -> Result<(i64, i64), DebugError> {
        let mut current = type_id;
        loop {
            for (id, m_name, m_sig) in self.methods(current)? {
                if m_name == name && m_sig == signature {
                    return Ok((current, id));
                }
            }
            current = self.superclass(current)?;
            if current == 0 {
                return Err(DebugError::Invalid(format!("no method {}{}", name, signature)));
            }
        }
    }

    fn source_path_of(&self, class_id: i64, source_name: &str) -> Result<String, DebugError> {
        let class_name = self.class_name(class_id)?;
        Ok(match class_name.rsplit_once('.') {
            Some((package, _)) => format!("{}/{}", package.replace('.', "/"), source_name),
            None => source_name.to_string(),
        })
    }

    fn encode_mirror(&self, b: Builder, value: &MirrorValue) -> Result<Builder, DebugError> {
        let sizes = self.sizes();
        Ok(match value {
            MirrorValue::Boolean(v) => b.u8(tag::BOOLEAN).u8(u8::from(*v)),
            MirrorValue::Byte(v) => b.u8(tag::BYTE).u8(*v as u8),
            MirrorValue::Char(v) => b.u8(tag::CHAR).raw(&(*v as u32 as u16).to_be_bytes()),
            MirrorValue::Short(v) => b.u8(tag::SHORT).raw(&v.to_be_bytes()),
            MirrorValue::Int(v) => b.u8(tag::INT).i32(*v),
            MirrorValue::Long(v) => b.u8(tag::LONG).u64(*v as u64),
            MirrorValue::Float(v) => b.u8(tag::FLOAT).u32(v.to_bits()),
            MirrorValue::Double(v) => b.u8(tag::DOUBLE).u64(v.to_bits()),
            MirrorValue::Str(text) => {
                let data = self.client.command(
                    (cmd::VM, cmd::VM_CREATE_STRING),
                    &Builder::new().string(text).build(),
                )?;
                let id = Cursor::new(&data).id(sizes.object)?;
                b.u8(tag::STRING).id(sizes.object, id)
            }
        })
    }
}

impl TargetVm for JdwpVm {
    fn resume(&mut self) -> Result<(), DebugError> {
        self.client.command((cmd::VM, cmd::VM_RESUME), &[])?;
        Ok(())
    }

    fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;
        if let Err(e) = self.client.command((cmd::VM, cmd::VM_DISPOSE), &[]) {
            tracing::debug!("vm dispose: {}", e);
        }
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
    }

    fn is_modifiable(&self) -> bool {
        // Socket-attached and launched VMs are always modifiable.
        true
    }

    fn enable_vm_events(&mut self) -> Result<(), DebugError> {
        const SUSPEND_NONE: u8 = 0;
        const MOD_KIND_EXCEPTION_ONLY: u8 = 8;
        for kind in [
            event_kind::CLASS_PREPARE,
            event_kind::THREAD_START,
            event_kind::THREAD_DEATH,
        ] {
            let payload = Builder::new().u8(kind).u8(SUSPEND_NONE).u32(0).build();
            self.client.command((cmd::EVENT_REQ, cmd::EVENT_REQ_SET), &payload)?;
        }
        // Uncaught exceptions only; any-type filter (null reference id).
        let payload = Builder::new()
            .u8(event_kind::EXCEPTION)
            .u8(SUSPEND_ALL)
            .u32(1)
            .u8(MOD_KIND_EXCEPTION_ONLY)
            .id(self.sizes().reference, 0)
            .u8(0) // caught
            .u8(1) // uncaught
            .build();
        self.client.command((cmd::EVENT_REQ, cmd::EVENT_REQ_SET), &payload)?;
        Ok(())
    }

    fn all_classes(&mut self) -> Result<Vec<VmClass>, DebugError> {
        let data = self.client.command((cmd::VM, cmd::VM_ALL_CLASSES), &[])?;
        let mut c = Cursor::new(&data);
        let count = c.u32()?;
        let mut out = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let ref_type_tag = c.u8()?;
            let ref_id = c.id(self.sizes().reference)?;
            let signature = c.string()?;
            let _status = c.u32()?;
            // Array and primitive pseudo-types carry no source.
            if ref_type_tag != 1 && ref_type_tag != 2 {
                continue;
            }
            let source_name = self.source_file(ref_id).unwrap_or(None);
            out.push(VmClass { ref_id, name: signature_to_name(&signature), source_name });
        }
        Ok(out)
    }

    fn class_source_name(&mut self, class_id: i64) -> Result<Option<String>, DebugError> {
        self.source_file(class_id)
    }

    fn thread_name(&mut self, thread: ThreadId) -> Result<String, DebugError> {
        let data = self.client.command(
            (cmd::THREAD, cmd::THREAD_NAME),
            &Builder::new().id(self.sizes().object, thread.0).build(),
        )?;
        Cursor::new(&data).string()
    }

    fn object_type_name(&mut self, object: ObjectId) -> Result<String, DebugError> {
        let type_id = self.reference_type_of(object)?;
        self.class_name(type_id)
    }

    fn resolve_location(&mut self, location: &VmLocation) -> Result<VmLocation, DebugError> {
        let source_name = self
            .source_file(location.class_id)?
            .ok_or_else(|| DebugError::Invalid("location has no source".into()))?;
        let line = self
            .line_table(location.class_id, location.method_id)?
            .into_iter()
            .filter(|(index, _)| *index <= location.code_index)
            .max_by_key(|(index, _)| *index)
            .map(|(_, line)| line)
            .ok_or_else(|| DebugError::Invalid("location outside line table".into()))?;
        Ok(VmLocation {
            source_path: self.source_path_of(location.class_id, &source_name)?,
            source_name,
            line,
            ..location.clone()
        })
    }

    fn locations_of_line(
        &mut self,
        class_id: i64,
        line: u32,
    ) -> Result<Vec<VmLocation>, DebugError> {
        let source_name = self.source_file(class_id)?.unwrap_or_default();
        let source_path = self.source_path_of(class_id, &source_name)?;
        let mut out = Vec::new();
        for (method_id, _, _) in self.methods(class_id)? {
            for (code_index, entry_line) in self.line_table(class_id, method_id)? {
                if entry_line == line {
                    out.push(VmLocation {
                        class_id,
                        method_id,
                        code_index,
                        source_path: source_path.clone(),
                        source_name: source_name.clone(),
                        line,
                    });
                }
            }
        }
        Ok(out)
    }

    fn install_breakpoint(&mut self, location: &VmLocation) -> Result<i32, DebugError> {
        let sizes = self.sizes();
        let payload = Builder::new()
            .u8(event_kind::BREAKPOINT)
            .u8(SUSPEND_ALL)
            .u32(1)
            .u8(MOD_KIND_LOCATION_ONLY)
            .u8(LOCATION_TAG_CLASS)
            .id(sizes.reference, location.class_id)
            .id(sizes.method, location.method_id)
            .u64(location.code_index)
            .build();
        let data = self.client.command((cmd::EVENT_REQ, cmd::EVENT_REQ_SET), &payload)?;
        Cursor::new(&data).i32()
    }

    fn clear_breakpoints(&mut self, request_ids: &[i32]) -> Result<(), DebugError> {
        for id in request_ids {
            let payload = Builder::new().u8(event_kind::BREAKPOINT).u32(*id as u32).build();
            if let Err(e) = self.client.command((cmd::EVENT_REQ, cmd::EVENT_REQ_CLEAR), &payload) {
                tracing::debug!(request = id, "clear breakpoint: {}", e);
            }
        }
        Ok(())
    }

    fn clear_all_breakpoints(&mut self) -> Result<(), DebugError> {
        self.client
            .command((cmd::EVENT_REQ, cmd::EVENT_REQ_CLEAR_ALL_BREAKPOINTS), &[])?;
        Ok(())
    }

    fn delete_step_requests(&mut self) -> Result<(), DebugError> {
        for id in std::mem::take(&mut self.step_requests) {
            let payload = Builder::new().u8(event_kind::SINGLE_STEP).u32(id).build();
            if let Err(e) = self.client.command((cmd::EVENT_REQ, cmd::EVENT_REQ_CLEAR), &payload) {
                tracing::debug!(request = id, "clear step request: {}", e);
            }
        }
        Ok(())
    }

    fn request_step(&mut self, thread: ThreadId, depth: StepDepth) -> Result<(), DebugError> {
        let depth = match depth {
            StepDepth::Into => 0u32,
            StepDepth::Over => 1,
            StepDepth::Out => 2,
        };
        let payload = Builder::new()
            .u8(event_kind::SINGLE_STEP)
            .u8(SUSPEND_ALL)
            .u32(2)
            .u8(MOD_KIND_STEP)
            .id(self.sizes().object, thread.0)
            .u32(STEP_SIZE_LINE)
            .u32(depth)
            .u8(MOD_KIND_COUNT)
            .u32(1)
            .build();
        let data = self.client.command((cmd::EVENT_REQ, cmd::EVENT_REQ_SET), &payload)?;
        self.step_requests.push(Cursor::new(&data).i32()? as u32);
        Ok(())
    }

    fn frames(
        &mut self,
        thread: ThreadId,
        from: u32,
        count: Option<u32>,
    ) -> Result<Vec<VmFrame>, DebugError> {
        let sizes = self.sizes();
        let raw = self.raw_frames(thread, from, count)?;
        let mut out = Vec::with_capacity(raw.len());
        for (i, (frame_id, raw_location)) in raw.into_iter().enumerate() {
            let class_name = self.class_name(raw_location.class_id).ok();
            let method_name = self
                .methods(raw_location.class_id)
                .ok()
                .and_then(|methods| {
                    methods
                        .into_iter()
                        .find(|(id, _, _)| *id == raw_location.method_id)
                        .map(|(_, name, _)| name)
                });
            let location = self.resolve_location(&raw_location).ok();

            let (num_args, variables) =
                self.variable_table(raw_location.class_id, raw_location.method_id)?;
            let visible: Vec<&(u64, String, String, u32, u32)> = variables
                .iter()
                .filter(|(start, _, _, length, _)| {
                    *start <= raw_location.code_index
                        && raw_location.code_index < *start + u64::from(*length)
                })
                .collect();

            let mut locals = Vec::with_capacity(visible.len());
            if !visible.is_empty() {
                let mut payload = Builder::new()
                    .id(sizes.object, thread.0)
                    .id(sizes.frame, frame_id)
                    .u32(visible.len() as u32);
                for (_, _, signature, _, slot) in &visible {
                    let sig_byte = signature.as_bytes().first().copied().unwrap_or(tag::OBJECT);
                    payload = payload.u32(*slot).u8(sig_byte);
                }
                let values = self
                    .client
                    .command((cmd::STACK_FRAME, cmd::FRAME_GET_VALUES), &payload.build());
                if let Ok(data) = values {
                    let mut c = Cursor::new(&data);
                    let n = c.u32()? as usize;
                    for (_, name, signature, _, slot) in visible.iter().take(n) {
                        let value = self.decode_tagged_value(&mut c)?;
                        locals.push(VmLocal {
                            slot: *slot,
                            name: name.clone(),
                            type_name: signature_to_name(signature),
                            value,
                        });
                    }
                }
            }

            let this_object = {
                let payload = Builder::new()
                    .id(sizes.object, thread.0)
                    .id(sizes.frame, frame_id)
                    .build();
                self.client
                    .command((cmd::STACK_FRAME, cmd::FRAME_THIS_OBJECT), &payload)
                    .ok()
                    .and_then(|data| {
                        let mut c = Cursor::new(&data);
                        let _tag = c.u8().ok()?;
                        let id = c.id(sizes.object).ok()?;
                        (id != 0).then_some(ObjectId(id))
                    })
            };

            out.push(VmFrame {
                index: from + i as u32,
                class_name,
                method_name,
                locals,
                num_args,
                location,
                this_object,
            });
        }
        Ok(out)
    }

    fn field_value(&mut self, object: ObjectId, field: &str) -> Result<VmValue, DebugError> {
        let sizes = self.sizes();
        let mut current = self.reference_type_of(object)?;
        let field_id = loop {
            if let Some((id, _, _)) =
                self.fields(current)?.into_iter().find(|(_, name, _)| name == field)
            {
                break id;
            }
            current = self.superclass(current)?;
            if current == 0 {
                return Err(DebugError::Invalid(format!("no field {:?}", field)));
            }
        };
        let payload = Builder::new()
            .id(sizes.object, object.0)
            .u32(1)
            .id(sizes.field, field_id)
            .build();
        let data = self.client.command((cmd::OBJ, cmd::OBJ_GET_VALUES), &payload)?;
        let mut c = Cursor::new(&data);
        let _count = c.u32()?;
        self.decode_tagged_value(&mut c)
    }

    fn array_elements(
        &mut self,
        object: ObjectId,
        from: u32,
        count: u32,
    ) -> Result<Vec<VmValue>, DebugError> {
        let payload = Builder::new()
            .id(self.sizes().object, object.0)
            .u32(from)
            .u32(count)
            .build();
        let data = self.client.command((cmd::ARRAY, cmd::ARRAY_GET_VALUES), &payload)?;
        let mut c = Cursor::new(&data);
        let region_tag = c.u8()?;
        let n = c.u32()?;
        let tagged = matches!(
            region_tag,
            tag::OBJECT
                | tag::ARRAY
                | tag::STRING
                | tag::THREAD
                | tag::THREAD_GROUP
                | tag::CLASS_LOADER
                | tag::CLASS_OBJECT
        );
        let mut out = Vec::with_capacity(n as usize);
        for _ in 0..n {
            let value = if tagged {
                self.decode_tagged_value(&mut c)?
            } else {
                self.decode_value(region_tag, &mut c)?
            };
            out.push(value);
        }
        Ok(out)
    }

    fn slot(&mut self, thread: ThreadId, frame: u32, slot: u32) -> Result<VmLocal, DebugError> {
        let frames = self.frames(thread, frame, Some(1))?;
        frames
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
        let sizes = self.sizes();
        let (frame_id, _) = self
            .raw_frames(thread, frame, Some(1))?
            .into_iter()
            .next()
            .ok_or_else(|| DebugError::Invalid(format!("no frame {}", frame)))?;
        let payload = Builder::new()
            .id(sizes.object, thread.0)
            .id(sizes.frame, frame_id)
            .u32(1)
            .u32(slot);
        let payload = self.encode_mirror(payload, value)?;
        self.client
            .command((cmd::STACK_FRAME, cmd::FRAME_SET_VALUES), &payload.build())?;
        Ok(())
    }

    fn invoke_to_string(
        &mut self,
        thread: ThreadId,
        object: ObjectId,
    ) -> Result<String, DebugError> {
        let sizes = self.sizes();
        let type_id = self.reference_type_of(object)?;
        let (clazz, method) = self.find_method(type_id, "toString", "()Ljava/lang/String;")?;
        let payload = Builder::new()
            .id(sizes.object, object.0)
            .id(sizes.object, thread.0)
            .id(sizes.reference, clazz)
            .id(sizes.method, method)
            .u32(0)
            .u32(INVOKE_SINGLE_THREADED)
            .build();
        let data = self.client.command((cmd::OBJ, cmd::OBJ_INVOKE_METHOD), &payload)?;
        let mut c = Cursor::new(&data);
        let value = self.decode_tagged_value(&mut c)?;
        let _exception_tag = c.u8()?;
        let exception = c.id(sizes.object)?;
        if exception != 0 {
            return Err(DebugError::Invalid("toString threw in the target".into()));
        }
        match value {
            VmValue::String { value, .. } => Ok(value),
            VmValue::Null => Ok("null".to_string()),
            other => Err(DebugError::Protocol(format!("toString returned {:?}", other))),
        }
    }
}

impl Drop for JdwpVm {
    fn drop(&mut self) {
        self.dispose();
    }
}

/// Launch/attach factory used by the daemon.
pub struct JdwpConnector {
    pub java_command: String,
    pub classpath: Vec<PathBuf>,
}

impl JdwpConnector {
    pub fn new(classpath: Vec<PathBuf>) -> Self {
        Self { java_command: "java".to_string(), classpath }
    }

    fn classpath_arg(&self) -> String {
        let parts: Vec<String> = self
            .classpath
            .iter()
            .map(|p| p.to_string_lossy().into_owned())
            .collect();
        parts.join(if cfg!(windows) { ";" } else { ":" })
    }
}

impl VmConnector for JdwpConnector {
    fn launch(
        &self,
        command_line: &str,
        events: mpsc::Sender<VmEvent>,
    ) -> Result<Box<dyn TargetVm>, DebugError> {
        let mut command = Command::new(&self.java_command);
        if !self.classpath.is_empty() {
            command.arg("-cp").arg(self.classpath_arg());
        }
        command
            .arg("-agentlib:jdwp=transport=dt_socket,server=y,suspend=y,address=127.0.0.1:0")
            .args(command_line.split_whitespace())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        let mut child = command
            .spawn()
            .map_err(|e| DebugError::Launch(format!("spawn {}: {}", self.java_command, e)))?;

        let stdout = child.stdout.take().ok_or_else(|| DebugError::Launch("no stdout".into()))?;
        let stderr = child.stderr.take().ok_or_else(|| DebugError::Launch("no stderr".into()))?;

        // The agent prints the port it bound before the VM runs anything.
        let mut reader = BufReader::new(stdout);
        let port = loop {
            let mut line = String::new();
            let n = reader
                .read_line(&mut line)
                .map_err(|e| DebugError::Launch(e.to_string()))?;
            if n == 0 {
                let _ = child.kill();
                return Err(DebugError::Launch("target exited before listening".into()));
            }
            let line = line.trim();
            if let Some(rest) = line.strip_prefix("Listening for transport dt_socket at address:")
            {
                match rest.trim().parse::<u16>() {
                    Ok(port) => break port,
                    Err(_) => {
                        let _ = child.kill();
                        return Err(DebugError::Launch(format!("bad agent address {:?}", rest)));
                    }
                }
            }
            let _ = events.blocking_send(VmEvent::Output { body: line.to_string() });
        };

        spawn_output_monitor(reader, events.clone());
        spawn_output_monitor(BufReader::new(stderr), events.clone());

        let client = JdwpClient::connect("127.0.0.1", port, events)?;
        Ok(Box::new(JdwpVm {
            client,
            child: Some(child),
            step_requests: Vec::new(),
            disposed: false,
        }))
    }

    fn attach(
        &self,
        hostname: &str,
        port: u16,
        events: mpsc::Sender<VmEvent>,
    ) -> Result<Box<dyn TargetVm>, DebugError> {
        let client = JdwpClient::connect(hostname, port, events)?;
        Ok(Box::new(JdwpVm {
            client,
            child: None,
            step_requests: Vec::new(),
            disposed: false,
        }))
    }
}

/// Forward target process output lines as events until EOF.
fn spawn_output_monitor<R: std::io::Read + Send + 'static>(
    mut reader: BufReader<R>,
    events: mpsc::Sender<VmEvent>,
) {
    std::thread::spawn(move || loop {
        let mut line = String::new();
        match reader.read_line(&mut line) {
            Ok(0) | Err(_) => break,
            Ok(_) => {
                let body = line.trim_end_matches(['\n', '\r']).to_string();
                if events.blocking_send(VmEvent::Output { body }).is_err() {
                    break;
                }
            }
        }
    });
}

#[cfg(test)]
#[path = "jdwp_tests.rs"]
mod tests;
