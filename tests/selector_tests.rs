//! Path selection and patch operations

mod common;

use common::{init_logging, nested_tree};
use fold_schema::{ErrorKind, PatchOp, Selection, Value};

#[test]
fn test_select_nested_paths() {
    init_logging();
    let tree = nested_tree();
    let root = tree.root();

    assert_eq!(tree.select_value(root, "$.b.l[0].i"), Some(Value::from("fir")));
    assert_eq!(
        tree.select_value(root, "$.b.l[0:2].i"),
        Some(Value::list(["fir", "sec"]))
    );
    assert_eq!(tree.select_value(root, "$.b.l[-1].i"), Some(Value::from("sec")));
    assert_eq!(tree.select(root, "$.nonexistent"), None);
    assert_eq!(tree.select(root, "$.b.l[5].i"), None);
}

/// Out of range and extreme slice bounds select what exists and never fail
#[test]
fn test_extreme_slice_bounds() {
    let tree = nested_tree();
    let root = tree.root();

    assert_eq!(
        tree.select_value(root, "$.b.l[0:2:9223372036854775807].i"),
        Some(Value::list(["fir"]))
    );
    assert_eq!(
        tree.select_value(root, "$.b.l[::-9223372036854775808].i"),
        Some(Value::list(["sec"]))
    );
    assert_eq!(
        tree.select_value(root, "$.b.l[-9223372036854775808:9223372036854775807].i"),
        Some(Value::list(["fir", "sec"]))
    );
    assert_eq!(
        tree.select_value(root, "$.b.l[5:9].i"),
        Some(Value::List(Vec::new()))
    );
    assert_eq!(tree.select(root, "$.b.l[9223372036854775807].i"), None);
    assert_eq!(tree.select(root, "$.b.l[-9223372036854775808].i"), None);
    assert_eq!(tree.select(root, "$.b.l[0:2:0].i"), None);
}

#[test]
fn test_selection_shapes() {
    let tree = nested_tree();
    let root = tree.root();

    let single = tree.select(root, "$.b.l[1]").expect("selection");
    let node = single.node().expect("single node");
    assert_eq!(tree.path_name(node), "$.b.l[1]");

    let many = tree.select(root, "$.b.l[:].i").expect("selection");
    assert!(matches!(many, Selection::List(_)));
    assert_eq!(many.node(), None);
    assert_eq!(many.nodes().len(), 2);
    assert_eq!(many.value(&tree), Value::list(["fir", "sec"]));
}

#[test]
fn test_relative_paths_and_node_refs() {
    let tree = nested_tree();
    let root = tree.root();
    let b = tree.lookup(root, "$.b").expect("b");

    assert_eq!(tree.select_value(b, "@.l[1].i"), Some(Value::from("sec")));
    assert_eq!(tree.select_value(b, "$.b.l[1].i"), Some(Value::from("sec")));

    let list = tree.node(b).get("l").expect("l");
    assert_eq!(list.len(), 2);
    let first = list.item(0).expect("first item");
    assert_eq!(first.value_of("i"), Value::from("fir"));
    assert_eq!(first.parent().map(|p| p.id()), Some(list.id()));
    assert_eq!(first.root().id(), root);
    assert_eq!(
        tree.root_ref().lookup("$.b.l[1].i").map(|n| n.value()),
        Some(Value::from("sec"))
    );
}

#[test]
fn test_multi_select() {
    let tree = nested_tree();
    let root = tree.root();
    let found = tree.multi_select(root, &["$.b.l[0].i", "$.missing", "$.b.l[1:].i"]);
    assert_eq!(found.len(), 3);
    assert_eq!(
        found[0].as_ref().map(|s| s.value(&tree)),
        Some(Value::from("fir"))
    );
    assert!(found[1].is_none());
    assert_eq!(
        found[2].as_ref().map(|s| s.value(&tree)),
        Some(Value::list(["sec"]))
    );
}

/// Replace touches a single leaf
#[test]
fn test_patch_replace_changes_one_leaf() {
    init_logging();
    let mut tree = nested_tree();
    let root = tree.root();

    tree.patch(root, "replace", "$.b.l[0].i", "next").expect("Failed to patch");
    assert_eq!(tree.select_value(root, "$.b.l[0].i"), Some(Value::from("next")));
    assert_eq!(tree.select_value(root, "$.b.l[1].i"), Some(Value::from("sec")));
}

/// Remove shortens the sequence and renumbers what is left
#[test]
fn test_patch_remove_renumbers() {
    let mut tree = nested_tree();
    let root = tree.root();

    tree.patch(root, "remove", "$.b.l[0]", Value::Null).expect("Failed to patch");
    let list = tree.lookup(root, "$.b.l").expect("list");
    assert_eq!(tree.len(list), 1);
    let first = tree.lookup(root, "$.b.l[0].i").expect("first item");
    assert_eq!(tree.value(first), Value::from("sec"));
    assert_eq!(tree.path_name(first), "$.b.l[0].i");
    assert_eq!(tree.select(root, "$.b.l[1]"), None);
}

#[test]
fn test_patch_add_and_test() {
    let mut tree = nested_tree();
    let root = tree.root();

    tree.patch(root, "add", "$.b.l", Value::map([("i", "thi")])).expect("Failed to add");
    assert_eq!(tree.select_value(root, "$.b.l[2].i"), Some(Value::from("thi")));

    tree.patch(root, "test", "$.b.l[2].i", "any").expect("Failed to test");
    let err = tree.patch(root, "test", "$.b.l[2].i", 3).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::TypeMismatch);
    assert_eq!(tree.select_value(root, "$.b.l[2].i"), Some(Value::from("thi")));

    tree.apply_patch(root, PatchOp::Remove, "$.b.l", Value::Int(-1))
        .expect("Failed to remove by index");
    assert_eq!(tree.len(tree.lookup(root, "$.b.l").expect("list")), 2);
}

#[test]
fn test_patch_errors() {
    let mut tree = nested_tree();
    let root = tree.root();

    let err = tree.patch(root, "copy", "$.b", Value::Null).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Syntax);
    let err = tree.patch(root, "replace", "$.nope", 1).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    let err = tree.patch(root, "add", "$.b.l[0].i", "x").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Syntax);
    let err = tree.patch(root, "replace", "$.b.l[0:2].i", "x").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Syntax);
    assert_eq!(
        tree.select_value(root, "$.b.l[0:2].i"),
        Some(Value::list(["fir", "sec"]))
    );
}
