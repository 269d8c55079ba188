// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Ensign Contributors

//! Class-file header parsing.
//!
//! Reads just enough of the JVM class file format to recover the class
//! name, access flags, member names, and the SourceFile attribute. Bytecode
//! bodies are skipped via attribute lengths and never decoded.

use crate::IndexError;

pub const ACC_PUBLIC: u16 = 0x0001;
pub const ACC_INTERFACE: u16 = 0x0200;

const MAGIC: u32 = 0xCAFE_BABE;

/// Symbolic header of one class file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassInfo {
    /// Dotted fully qualified name (`java.util.List`).
    pub name: String,
    pub access: u16,
    pub methods: Vec<MemberInfo>,
    pub fields: Vec<MemberInfo>,
    /// Unqualified source file name from the SourceFile attribute.
    pub source_file: Option<String>,
}

impl ClassInfo {
    pub fn is_public(&self) -> bool {
        self.access & ACC_PUBLIC != 0
    }

    pub fn is_interface(&self) -> bool {
        self.access & ACC_INTERFACE != 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberInfo {
    pub name: String,
    pub access: u16,
}

impl MemberInfo {
    pub fn is_public(&self) -> bool {
        self.access & ACC_PUBLIC != 0
    }
}

/// Parse the symbolic header of a class file.
pub fn parse_class(bytes: &[u8]) -> Result<ClassInfo, IndexError> {
    let mut r = Reader { bytes, at: 0 };

    if r.u32()? != MAGIC {
        return Err(malformed("bad magic"));
    }
    r.skip(4)?; // minor, major version

    let pool = ConstantPool::parse(&mut r)?;

    let access = r.u16()?;
    let this_class = r.u16()?;
    let name = pool.class_name(this_class)?.replace('/', ".");

    r.skip(2)?; // super_class
    let interface_count = r.u16()? as usize;
    r.skip(interface_count * 2)?;

    let fields = parse_members(&mut r, &pool)?;
    let methods = parse_members(&mut r, &pool)?;

    let mut source_file = None;
    let attr_count = r.u16()? as usize;
    for _ in 0..attr_count {
        let attr_name = r.u16()?;
        let len = r.u32()? as usize;
        if pool.utf8(attr_name).ok() == Some("SourceFile") && len == 2 {
            source_file = Some(pool.utf8(r.u16()?)?.to_string());
        } else {
            r.skip(len)?;
        }
    }

    Ok(ClassInfo { name, access, methods, fields, source_file })
}

fn parse_members(r: &mut Reader<'_>, pool: &ConstantPool) -> Result<Vec<MemberInfo>, IndexError> {
    let count = r.u16()? as usize;
    let mut members = Vec::with_capacity(count);
    for _ in 0..count {
        let access = r.u16()?;
        let name = pool.utf8(r.u16()?)?.to_string();
        r.skip(2)?; // descriptor
        let attr_count = r.u16()? as usize;
        for _ in 0..attr_count {
            r.skip(2)?; // attribute name
            let len = r.u32()? as usize;
            r.skip(len)?;
        }
        members.push(MemberInfo { name, access });
    }
    Ok(members)
}

/// The constant pool, retaining only the entries the header needs.
struct ConstantPool {
    entries: Vec<CpEntry>,
}

enum CpEntry {
    Utf8(String),
    Class(u16),
    Other,
    /// Second slot of a long/double entry.
    Reserved,
}

impl ConstantPool {
    fn parse(r: &mut Reader<'_>) -> Result<Self, IndexError> {
        let count = r.u16()? as usize;
        if count == 0 {
            return Err(malformed("empty constant pool"));
        }
        let mut entries = Vec::with_capacity(count);
        entries.push(CpEntry::Reserved); // index 0 is unused
        while entries.len() < count {
            let tag = r.u8()?;
            let entry = match tag {
                1 => {
                    let len = r.u16()? as usize;
                    let bytes = r.take(len)?;
                    // Modified UTF-8 differs from UTF-8 only for NUL and
                    // supplementary characters, neither of which occurs in
                    // class or member names we keep.
                    CpEntry::Utf8(String::from_utf8_lossy(bytes).into_owned())
                }
                7 => CpEntry::Class(r.u16()?),
                3 | 4 => {
                    r.skip(4)?;
                    CpEntry::Other
                }
                5 | 6 => {
                    r.skip(8)?;
                    entries.push(CpEntry::Other);
                    CpEntry::Reserved
                }
                8 | 16 | 19 | 20 => {
                    r.skip(2)?;
                    CpEntry::Other
                }
                9 | 10 | 11 | 12 | 17 | 18 => {
                    r.skip(4)?;
                    CpEntry::Other
                }
                15 => {
                    r.skip(3)?;
                    CpEntry::Other
                }
                other => return Err(malformed(&format!("constant pool tag {}", other))),
            };
            entries.push(entry);
        }
        Ok(Self { entries })
    }

    fn utf8(&self, index: u16) -> Result<&str, IndexError> {
        match self.entries.get(index as usize) {
            Some(CpEntry::Utf8(s)) => Ok(s),
            _ => Err(malformed(&format!("index {} is not utf8", index))),
        }
    }

    fn class_name(&self, index: u16) -> Result<&str, IndexError> {
        match self.entries.get(index as usize) {
            Some(CpEntry::Class(name_index)) => self.utf8(*name_index),
            _ => Err(malformed(&format!("index {} is not a class", index))),
        }
    }
}

struct Reader<'a> {
    bytes: &'a [u8],
    at: usize,
}

impl<'a> Reader<'a> {
    fn take(&mut self, n: usize) -> Result<&'a [u8], IndexError> {
        let end = self.at.checked_add(n).filter(|end| *end <= self.bytes.len());
        match end {
            Some(end) => {
                let slice = &self.bytes[self.at..end];
                self.at = end;
                Ok(slice)
            }
            None => Err(malformed("truncated class file")),
        }
    }

    fn skip(&mut self, n: usize) -> Result<(), IndexError> {
        self.take(n).map(|_| ())
    }

    fn u8(&mut self) -> Result<u8, IndexError> {
        Ok(self.take(1)?[0])
    }

    fn u16(&mut self) -> Result<u16, IndexError> {
        let b = self.take(2)?;
        Ok(u16::from_be_bytes([b[0], b[1]]))
    }

    fn u32(&mut self) -> Result<u32, IndexError> {
        let b = self.take(4)?;
        Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }
}

fn malformed(detail: &str) -> IndexError {
    IndexError::ClassFile(detail.to_string())
}

#[cfg(test)]
#[path = "classfile_tests.rs"]
mod tests;
