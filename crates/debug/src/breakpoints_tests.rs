// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Ensign Contributors

use std::path::PathBuf;

use en_core::LineSourcePosition;

use super::*;

fn bp(file: &str, line: u32) -> Breakpoint {
    Breakpoint { pos: LineSourcePosition { file: PathBuf::from(file), line } }
}

#[test]
fn sets_stay_disjoint() {
    let mut mgr = BreakpointManager::default();
    mgr.set_pending(bp("Foo.scala", 42));
    mgr.set_active(bp("Foo.scala", 42), vec![1, 2]);

    let (active, pending) = mgr.lists();
    assert_eq!(active.len(), 1);
    assert!(pending.is_empty());

    mgr.set_pending(bp("Foo.scala", 42));
    let (active, pending) = mgr.lists();
    assert!(active.is_empty());
    assert_eq!(pending.len(), 1);
}

#[test]
fn replacing_active_returns_old_request_ids() {
    let mut mgr = BreakpointManager::default();
    assert_eq!(mgr.set_active(bp("Foo.scala", 1), vec![7]), None);
    assert_eq!(mgr.set_active(bp("Foo.scala", 1), vec![8]), Some(vec![7]));
}

#[test]
fn remove_covers_both_sets() {
    let mut mgr = BreakpointManager::default();
    mgr.set_active(bp("A.scala", 1), vec![5]);
    mgr.set_pending(bp("B.scala", 2));

    assert_eq!(mgr.remove(&bp("A.scala", 1)), Some(vec![5]));
    assert_eq!(mgr.remove(&bp("B.scala", 2)), None);
    assert!(mgr.is_empty());
}

#[test]
fn migration_moves_all_active() {
    let mut mgr = BreakpointManager::default();
    mgr.set_active(bp("A.scala", 1), vec![1]);
    mgr.set_active(bp("B.scala", 2), vec![2]);
    mgr.set_pending(bp("C.scala", 3));

    mgr.migrate_active_to_pending();
    let (active, pending) = mgr.lists();
    assert!(active.is_empty());
    assert_eq!(pending.len(), 3);
}

#[test]
fn pending_lookup_is_by_basename() {
    let mut mgr = BreakpointManager::default();
    mgr.set_pending(bp("/src/com/foo/Foo.scala", 42));
    mgr.set_pending(bp("/src/com/foo/Bar.scala", 1));

    let hits = mgr.pending_for_basename("Foo.scala");
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].pos.line, 42);
}

#[test]
fn class_map_requires_source_names() {
    let mut map = ClassMap::default();
    map.add(VmClass { ref_id: 1, name: "com.foo.Widget".into(), source_name: None });
    assert!(map.classes_for("Widget.scala").is_empty());

    map.add(VmClass {
        ref_id: 2,
        name: "com.foo.Widget".into(),
        source_name: Some("Widget.scala".into()),
    });
    map.add(VmClass {
        ref_id: 2,
        name: "com.foo.Widget".into(),
        source_name: Some("Widget.scala".into()),
    });
    assert_eq!(map.classes_for("Widget.scala").len(), 1);
}
