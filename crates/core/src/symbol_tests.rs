// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Ensign Contributors

use super::*;

#[test]
fn local_name_is_trailing_segment() {
    assert_eq!(local_name_of("java.util.List"), "List");
    assert_eq!(local_name_of("List"), "List");
    assert_eq!(local_name_of("a.b.C$"), "C$");
}

#[test]
fn decl_as_of_method_is_method() {
    let m = SymbolSearchResult::Method {
        name: "java.util.List.size".into(),
        local_name: "size".into(),
        owner: "java.util.List".into(),
        pos: None,
    };
    assert_eq!(m.decl_as(), DeclaredAs::Method);
    assert!(!m.is_type());
}

#[test]
fn accessors_cover_both_variants() {
    let t = SymbolSearchResult::Type {
        name: "scala.Option".into(),
        local_name: "Option".into(),
        decl_as: DeclaredAs::Class,
        pos: Some(OffsetSourcePosition { file: "Option.scala".into(), offset: 12 }),
    };
    assert_eq!(t.name(), "scala.Option");
    assert_eq!(t.local_name(), "Option");
    assert_eq!(t.pos().map(|p| p.offset), Some(12));
    assert!(t.is_type());
}
