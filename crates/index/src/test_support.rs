// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Ensign Contributors

//! Class-file byte assembly for tests.

/// Raw big-endian byte assembler, starting from a valid magic and version.
pub(crate) struct ClassBytes {
    pub bytes: Vec<u8>,
}

impl ClassBytes {
    pub fn new() -> Self {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&0xCAFE_BABEu32.to_be_bytes());
        bytes.extend_from_slice(&[0, 0, 0, 52]); // version
        Self { bytes }
    }

    pub fn u8(&mut self, v: u8) -> &mut Self {
        self.bytes.push(v);
        self
    }

    pub fn u16(&mut self, v: u16) -> &mut Self {
        self.bytes.extend_from_slice(&v.to_be_bytes());
        self
    }

    pub fn u32(&mut self, v: u32) -> &mut Self {
        self.bytes.extend_from_slice(&v.to_be_bytes());
        self
    }

    pub fn utf8(&mut self, s: &str) -> &mut Self {
        self.u8(1).u16(s.len() as u16);
        self.bytes.extend_from_slice(s.as_bytes());
        self
    }
}

/// A minimal class file: dotted `name`, class `access` flags, and methods
/// as `(name, access)` pairs. No fields, no SourceFile attribute.
pub(crate) fn class_file(name: &str, access: u16, methods: &[(&str, u16)]) -> Vec<u8> {
    let internal = name.replace('.', "/");
    let mut b = ClassBytes::new();

    // pool: 1 = class name utf8, 2 = Class, 3 = "()V", 4.. = method names
    b.u16(4 + methods.len() as u16);
    b.utf8(&internal);
    b.u8(7).u16(1);
    b.utf8("()V");
    for (method, _) in methods {
        b.utf8(method);
    }

    b.u16(access);
    b.u16(2); // this_class
    b.u16(0); // super_class
    b.u16(0); // interfaces
    b.u16(0); // fields

    b.u16(methods.len() as u16);
    for (i, (_, method_access)) in methods.iter().enumerate() {
        b.u16(*method_access).u16(4 + i as u16).u16(3).u16(0);
    }

    b.u16(0); // class attributes
    b.bytes
}
